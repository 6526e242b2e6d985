//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the suite logic and the outside
//! world. Each port is a trait implemented by an adapter in the
//! infrastructure layer, or by a mock in tests.

mod clock;
mod http_client;
mod verifier;

pub use clock::Clock;
pub use http_client::{HttpClient, HttpClientError, HttpFuture};
pub use verifier::ResponseVerifier;
