//! Test doubles for the injectable seams
//!
//! - [`RecordingSink`] captures every log line.
//! - [`RecordingSleeper`] records requested waits without blocking.
//! - [`AbortTrap`] turns an abort into an unwinding panic that
//!   [`catch_abort`] converts back into an [`Aborted`] value.
//!
//! ```
//! use rebound::config::{with_abort_handler, with_retries, with_sleeper};
//! use rebound::testing::{catch_abort, AbortTrap, RecordingSleeper};
//! use rebound::{must_constant, AttemptError};
//!
//! let aborted = catch_abort(|| {
//!     must_constant(
//!         || -> Result<(), AttemptError<&str>> { Err("offline".into()) },
//!         [with_retries(2), with_sleeper(RecordingSleeper::new()), with_abort_handler(AbortTrap)],
//!     )
//! })
//! .unwrap_err();
//! assert_eq!(aborted.message, "backoff: giving up after 2 tries: offline");
//! ```

mod abort;
mod recorders;

pub use abort::{catch_abort, AbortTrap, Aborted};
pub use recorders::{RecordingSink, RecordingSleeper, SinkLevel, SinkRecord};
