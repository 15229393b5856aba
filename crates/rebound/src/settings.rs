//! File-backed backoff settings
//!
//! [`BackoffSettings`] is the serializable subset of [`Config`]: the scalar
//! knobs that make sense in a TOML or JSON file. Sinks, sleepers, callbacks
//! and abort handlers stay in code.
//!
//! ```
//! use rebound::settings::BackoffSettings;
//! use rebound::Strategy;
//!
//! let settings = BackoffSettings::from_toml_str(
//!     r#"
//!     max_retries = 4
//!     delay = 250
//!     strategy = "growing"
//!     jitter = "equal"
//!     label = "upload"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(settings.max_retries, 4);
//! assert_eq!(settings.strategy, Strategy::Growing);
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{
    with_delay, with_jitter, with_label, with_retries, with_strategy, with_time_scale, Config,
    Mutator, Strategy,
};
use crate::constants::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_TIME_SCALE};
use crate::error::{SettingsError, SettingsResult};
use crate::jitter::Jitter;

/// Named jitter strategies accepted in settings files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterKind {
    None,
    #[default]
    Full,
    Equal,
}

impl From<JitterKind> for Jitter {
    fn from(kind: JitterKind) -> Self {
        match kind {
            JitterKind::None => Self::None,
            JitterKind::Full => Self::Full,
            JitterKind::Equal => Self::Equal,
        }
    }
}

/// Serializable backoff settings
///
/// Missing keys take the library defaults. `time_scale` is written in
/// whole milliseconds, so a finer value fails validation instead of being
/// truncated on the way out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffSettings {
    pub max_retries: u32,
    pub delay: u64,
    #[serde(with = "duration_millis")]
    pub time_scale: Duration,
    pub strategy: Strategy,
    pub jitter: JitterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_BASE_DELAY,
            time_scale: DEFAULT_TIME_SCALE,
            strategy: Strategy::default(),
            jitter: JitterKind::default(),
            label: None,
        }
    }
}

impl BackoffSettings {
    /// Parse and validate settings from TOML
    ///
    /// # Errors
    /// Returns `SettingsError::Toml` on malformed input and
    /// `SettingsError::Invalid` when a value is out of range.
    pub fn from_toml_str(contents: &str) -> SettingsResult<Self> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse and validate settings from JSON
    ///
    /// # Errors
    /// Returns `SettingsError::Json` on malformed input and
    /// `SettingsError::Invalid` when a value is out of range.
    pub fn from_json_str(contents: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a `.toml` or `.json` file, chosen by extension
    ///
    /// # Errors
    /// Returns `SettingsError::Io` if the file cannot be read,
    /// `SettingsError::UnsupportedFormat` for other extensions, and the
    /// parse or validation errors of the matching format.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        let contents = fs::read_to_string(path)
            .map_err(|source| SettingsError::Io { path: path.to_path_buf(), source })?;

        match extension {
            "toml" => Self::from_toml_str(&contents),
            "json" => Self::from_json_str(&contents),
            other => Err(SettingsError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns `SettingsError::SubMillisecondTimeScale` if `time_scale` cannot
    /// be written without loss, and `SettingsError::TomlSerialize` if
    /// serialization fails.
    pub fn to_toml_string(&self) -> SettingsResult<String> {
        self.validate()?;
        Ok(toml::to_string(self)?)
    }

    /// Check the values a mutator would reject
    ///
    /// # Errors
    /// Returns `SettingsError::Invalid` with the underlying `ConfigError`, or
    /// `SettingsError::SubMillisecondTimeScale` when `time_scale` has a
    /// fractional millisecond.
    pub fn validate(&self) -> SettingsResult<()> {
        Config::<()>::new(self.strategy).set_max_retries(self.max_retries)?;
        if self.time_scale.subsec_nanos() % 1_000_000 != 0 {
            return Err(SettingsError::SubMillisecondTimeScale(self.time_scale));
        }
        Ok(())
    }

    /// Expand into mutators, in field order
    ///
    /// The strategy mutator overrides whatever the entry point chose.
    pub fn into_mutators<T>(self) -> Vec<Mutator<T>> {
        let mut mutators = vec![
            with_retries(self.max_retries),
            with_delay(self.delay),
            with_time_scale(self.time_scale),
            with_strategy(self.strategy),
            with_jitter(self.jitter.into()),
        ];
        if let Some(label) = self.label {
            mutators.push(with_label(label));
        }
        mutators
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
