//! Posts collection scenario

use apiprobe_domain::request::{RequestSpec, join_path};
use apiprobe_domain::testing::Assertion;
use apiprobe_domain::{DomainResult, SuiteSettings};

use super::schemas;
use crate::workflow::{Step, Workflow};

/// Scenario name.
pub const GET_ALL_POSTS: &str = "Get all posts";

/// Content type the posts service must declare.
pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Reads the whole posts collection and checks status, content type and shape.
///
/// # Errors
///
/// Returns an error if the posts base URL is malformed.
pub fn all_posts(settings: &SuiteSettings) -> DomainResult<Workflow> {
    let url = join_path(&settings.posts_base_url, &["posts"])?;

    Ok(Workflow::new(GET_ALL_POSTS).step(
        Step::fixed(RequestSpec::get("List posts", url))
            .expect(Assertion::schema("posts", schemas::posts_collection()))
            .expect(Assertion::status(200))
            .expect(Assertion::header_equals("content-type", JSON_UTF8)),
    ))
}
