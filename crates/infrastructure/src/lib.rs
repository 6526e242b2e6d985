//! Apiprobe Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading
//! and logging setup for the binary.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod testing;

pub use adapters::{ReqwestHttpClient, SystemClock};
pub use self::config::{ConfigError, ConfigResult, load_settings, load_settings_from};
pub use logging::init_logging;
pub use testing::TestRunner;
