//! Synchronous retry with constant or growing backoff.
//!
//! `rebound` invokes a fallible operation until it succeeds, runs out of
//! attempts, or fails with an error marked as unrecoverable. A jittered wait
//! precedes every attempt, the first one included.
//!
//! # Layout
//!
//! - [`config`]: the per-run [`Config`] and the mutators that shape it
//! - [`jitter`]: delay randomization
//! - [`classify`]: recoverable vs. unrecoverable attempt failures
//! - [`executor`]: the attempt loop
//! - [`policy`]: report ([`run`]) and abort ([`must_run`]) termination
//! - [`settings`]: file-backed configuration
//! - [`sink`], [`time`], [`abort`]: injectable logging, waiting and
//!   termination
//! - `testing`: doubles for the injectable seams, behind the `test-utils`
//!   feature
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use rebound::config::{with_label, with_retries, with_time_scale};
//! use rebound::{constant, unrecoverable, AttemptError, RetryError};
//!
//! fn read_config(path: &str) -> Result<String, AttemptError<String>> {
//!     if path.is_empty() {
//!         return Err(unrecoverable("empty path".to_string()));
//!     }
//!     Err(format!("{path}: temporarily unavailable").into())
//! }
//!
//! let err = constant(
//!     || read_config("app.toml"),
//!     [with_retries(3), with_label("config"), with_time_scale(Duration::ZERO)],
//! )
//! .unwrap_err();
//! assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
//!
//! let err = constant(|| read_config(""), [with_time_scale(Duration::ZERO)]).unwrap_err();
//! assert_eq!(err.attempts(), 1);
//! assert_eq!(err.into_source().as_deref(), Some("empty path"));
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod abort;
pub mod classify;
pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod jitter;
pub mod policy;
pub mod settings;
pub mod sink;
#[cfg(any(feature = "test-utils", test))]
pub mod testing;
pub mod time;

pub use abort::{AbortHandler, ProcessAbort};
pub use classify::{unrecoverable, AttemptError, FailureKind};
pub use config::{Config, Mutator, Strategy};
pub use error::{ConfigError, ConfigResult, RetryError, RetryResult, SettingsError, SettingsResult};
pub use jitter::{equal_jitter, full_jitter, no_jitter, Jitter};
pub use policy::{constant, growing, must_constant, must_growing, must_run, run, Backoff};
pub use settings::BackoffSettings;
pub use sink::{DiscardSink, LogSink, TracingSink, WriterSink};
pub use time::{Sleeper, ThreadSleeper};
