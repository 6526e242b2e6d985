//! Suite scenarios
//!
//! Each scenario is a [`Workflow`] built from the suite settings. The
//! standard set mirrors the checks the suite exists to make against the
//! booking and posts services.

pub mod booking;
pub mod posts;
pub mod schemas;

use apiprobe_domain::{DomainResult, SuiteSettings};

use crate::workflow::Workflow;

pub use booking::{CREATE_BOOKING, FULL_BOOKING_PATH, UPDATE_REJECTIONS};
pub use posts::GET_ALL_POSTS;

/// Builds every standard scenario in run order.
///
/// # Errors
///
/// Returns an error if a base URL or the credential settings are unusable.
pub fn standard_scenarios(settings: &SuiteSettings) -> DomainResult<Vec<Workflow>> {
    Ok(vec![
        booking::full_booking_path(settings)?,
        posts::all_posts(settings)?,
        booking::update_rejections(settings)?,
        booking::create_booking(settings)?,
    ])
}
