//! Authentication domain types

mod credential;

pub use credential::Credential;
