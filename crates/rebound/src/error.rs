//! Error types for backoff execution
//!
//! Three kinds of errors exist:
//!
//! - [`ConfigError`]: a configuration mutator rejected its input. Raised while
//!   the configuration is being built, before any attempt runs.
//! - [`RetryError`]: the terminal error of a reported run. Generic over `E`,
//!   the operation's own error type, which is always reachable through
//!   [`RetryError::into_source`].
//! - [`SettingsError`]: a settings file could not be read, parsed or
//!   validated.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while building a configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The retry count is outside the accepted range
    #[error("invalid number of retries: {count} (must be between {min} and {max})")]
    InvalidRetriesCount { count: u32, min: u32, max: u32 },
}

/// Result type for configuration building
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading [`BackoffSettings`](crate::settings::BackoffSettings)
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to render TOML settings: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported settings format: {0:?}")]
    UnsupportedFormat(String),

    #[error("time_scale must be whole milliseconds, got {0:?}")]
    SubMillisecondTimeScale(Duration),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Result type for settings loading
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Terminal errors of a backoff run
///
/// Exhaustion and unrecoverable failures both carry the operation's own
/// error so callers can inspect the cause.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// A configuration mutator rejected its input; no attempt was made
    #[error("invalid backoff configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// Every attempt failed with a recoverable error
    #[error("{label}: giving up after {attempts} attempts: {source}")]
    Exhausted { label: String, attempts: u32, source: E },

    /// An attempt failed with an error marked as unrecoverable
    #[error("{label}: unrecoverable failure on attempt {attempt}: {source}")]
    Unrecoverable { label: String, attempt: u32, source: E },
}

/// Result type for reported backoff runs
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

impl<E> RetryError<E> {
    /// Number of times the operation was invoked before this error
    pub fn attempts(&self) -> u32 {
        match self {
            Self::InvalidConfiguration(_) => 0,
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Unrecoverable { attempt, .. } => *attempt,
        }
    }

    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Unrecoverable { .. })
    }

    /// Borrow the operation error, if the run got far enough to produce one
    pub fn source_ref(&self) -> Option<&E> {
        match self {
            Self::InvalidConfiguration(_) => None,
            Self::Exhausted { source, .. } | Self::Unrecoverable { source, .. } => Some(source),
        }
    }

    /// Consume the error and return the operation error, if any
    ///
    /// For an exhausted run this is the last recoverable failure; for an
    /// unrecoverable one it is the unwrapped cause.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::InvalidConfiguration(_) => None,
            Self::Exhausted { source, .. } | Self::Unrecoverable { source, .. } => Some(source),
        }
    }

    /// The configuration error, if building the configuration failed
    pub fn config_error(&self) -> Option<&ConfigError> {
        match self {
            Self::InvalidConfiguration(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for error.
    use std::error::Error as _;

    use super::*;

    /// Validates the display format of `ConfigError::InvalidRetriesCount`.
    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidRetriesCount { count: 101, min: 1, max: 100 };

        assert_eq!(err.to_string(), "invalid number of retries: 101 (must be between 1 and 100)");
    }

    /// Validates that a config error converts into `RetryError` and reports
    /// zero attempts.
    #[test]
    fn test_invalid_configuration_from_config_error() {
        let err: RetryError<io::Error> =
            ConfigError::InvalidRetriesCount { count: 0, min: 1, max: 100 }.into();

        assert!(err.is_invalid_configuration());
        assert_eq!(err.attempts(), 0);
        assert!(err.source_ref().is_none());
        assert_eq!(
            err.config_error(),
            Some(&ConfigError::InvalidRetriesCount { count: 0, min: 1, max: 100 })
        );
    }

    /// Validates accessors on the exhausted variant.
    #[test]
    fn test_exhausted_accessors() {
        let err = RetryError::Exhausted {
            label: "fetch".to_string(),
            attempts: 3,
            source: io::Error::other("connection reset"),
        };

        assert!(err.is_exhausted());
        assert!(!err.is_unrecoverable());
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.to_string(), "fetch: giving up after 3 attempts: connection reset");
        assert_eq!(err.source().map(ToString::to_string), Some("connection reset".to_string()));
    }

    /// Validates that settings errors keep the configuration error intact.
    #[test]
    fn test_settings_error_wraps_config_error() {
        let err: SettingsError = ConfigError::InvalidRetriesCount { count: 0, min: 1, max: 100 }.into();

        assert_eq!(err.to_string(), "invalid number of retries: 0 (must be between 1 and 100)");
        assert_eq!(
            SettingsError::UnsupportedFormat("ini".to_string()).to_string(),
            "unsupported settings format: \"ini\""
        );
        assert_eq!(
            SettingsError::SubMillisecondTimeScale(Duration::from_micros(1_500)).to_string(),
            "time_scale must be whole milliseconds, got 1.5ms"
        );
    }

    /// Validates that `into_source` returns the unwrapped cause of an
    /// unrecoverable failure.
    #[test]
    fn test_unrecoverable_into_source() {
        let err = RetryError::Unrecoverable {
            label: "auth".to_string(),
            attempt: 1,
            source: "permission denied".to_string(),
        };

        assert!(err.is_unrecoverable());
        assert_eq!(err.attempts(), 1);
        assert_eq!(err.into_source(), Some("permission denied".to_string()));
    }
}
