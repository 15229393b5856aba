//! The attempt loop
//!
//! [`execute`] drives a single run: wait, invoke, classify, repeat. It returns
//! an [`Outcome`] and leaves the return shape to the termination policies in
//! [`policy`](crate::policy).

use std::fmt::Display;
use std::time::Duration;

use tracing::{debug, debug_span, info};

use crate::classify::AttemptError;
use crate::config::Config;

/// Terminal state of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// An attempt returned a value
    Succeeded(T),
    /// Every attempt failed with a recoverable error; carries the last one
    Exhausted { attempts: u32, error: E },
    /// An attempt failed with an unrecoverable error
    Aborted { attempt: u32, error: E },
}

impl<T, E> Outcome<T, E> {
    /// True when an attempt returned a value
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Number of times the operation was invoked
    pub fn attempts(&self, config: &Config<T>) -> u32 {
        match self {
            Self::Succeeded(_) => config.invocations(),
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Aborted { attempt, .. } => *attempt,
        }
    }
}

/// Run `operation` under `config` until it succeeds, exhausts its retries or
/// fails unrecoverably
///
/// A wait precedes every attempt, the first one included. The callback, if
/// any, fires once with the value of the successful attempt.
pub fn execute<T, E, F>(config: &mut Config<T>, mut operation: F) -> Outcome<T, E>
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    E: Display,
{
    let span = debug_span!(
        "backoff",
        label = %config.label(),
        strategy = ?config.strategy(),
        max_retries = config.max_retries()
    );
    let _entered = span.enter();

    let mut total_delay = Duration::ZERO;
    let mut attempt = 0;

    loop {
        attempt += 1;

        let delay = config.delay_for(attempt);
        total_delay = total_delay.saturating_add(delay);
        debug!(attempt, delay = ?delay, "waiting before attempt");
        config.sleeper().sleep(delay);

        config.record_invocation(attempt);
        debug!(attempt, "invoking operation");

        match operation() {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempts = attempt, total_delay = ?total_delay, "operation succeeded after retries");
                }
                if let Some(callback) = config.take_callback() {
                    callback(&*config, &value);
                }
                return Outcome::Succeeded(value);
            }
            Err(AttemptError::Unrecoverable(error)) => {
                debug!(attempt, error = %error, "unrecoverable failure, stopping");
                return Outcome::Aborted { attempt, error };
            }
            Err(AttemptError::Recoverable(error)) => {
                config.record_failure();
                config.sink().warn(&format!("{} (Attempt #{attempt}): {error}", config.label()));

                if attempt >= config.max_retries() {
                    debug!(attempts = attempt, total_delay = ?total_delay, "retries exhausted");
                    return Outcome::Exhausted { attempts: attempt, error };
                }
            }
        }
    }
}
