//! Suite configuration loading.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `APIPROBE__*` environment variables (`__` separates nested keys, e.g.
//! `APIPROBE__RETRY__MAX_ATTEMPTS=5`). The result is validated once.

use std::path::{Path, PathBuf};

use apiprobe_domain::{DomainError, SuiteSettings};
use ::config::{Config, Environment, File, FileFormat};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "APIPROBE_CONFIG";

/// File read from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "apiprobe.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "APIPROBE";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    /// The merged settings are unusable.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] DomainError),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Loads settings from `APIPROBE_CONFIG` (or `apiprobe.toml` if present)
/// and the process environment.
///
/// # Errors
///
/// Returns an error if `APIPROBE_CONFIG` names a missing file, a source is
/// malformed, or the merged settings fail validation.
pub fn load_settings() -> ConfigResult<SuiteSettings> {
    let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    load_settings_from(explicit.as_deref(), environment())
}

/// Loads settings from an optional file and the given environment source.
///
/// Without `path`, `apiprobe.toml` in the working directory is used when it
/// exists.
///
/// # Errors
///
/// Returns an error if `path` does not exist, a source is malformed, or the
/// merged settings fail validation.
pub fn load_settings_from(path: Option<&Path>, env: Environment) -> ConfigResult<SuiteSettings> {
    let file = match path {
        Some(path) if !path.is_file() => return Err(ConfigError::MissingFile(path.to_path_buf())),
        Some(path) => {
            debug!(path = %path.display(), "reading configuration file");
            File::from(path).format(FileFormat::Toml).required(true)
        }
        None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
    };

    let settings: SuiteSettings = Config::builder()
        .add_source(file)
        .add_source(env)
        .build()?
        .try_deserialize()?;
    settings.validate()?;

    info!(
        booking = %settings.booking_base_url,
        posts = %settings.posts_base_url,
        "configuration loaded"
    );
    Ok(settings)
}

/// Environment source for `APIPROBE__*` overrides.
#[must_use]
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
