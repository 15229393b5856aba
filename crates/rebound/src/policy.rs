//! Termination policies
//!
//! Both policies run the same loop from [`executor`](crate::executor) and
//! differ only in how a failed run ends:
//!
//! - **Report** ([`run`], [`constant`], [`growing`]) returns a [`RetryError`].
//! - **Abort** ([`must_run`], [`must_constant`], [`must_growing`]) writes a
//!   fatal line to the sink and hands the message to the configured
//!   [`AbortHandler`](crate::AbortHandler), which does not return.
//!
//! Every entry point waits before the first attempt as well as between
//! attempts. An operation that succeeds immediately still pays one delay.
//!
//! ```
//! use std::time::Duration;
//!
//! use rebound::config::{with_jitter, with_retries, with_time_scale};
//! use rebound::{growing, AttemptError, Jitter};
//!
//! let mut calls = 0;
//! let value = growing(
//!     || {
//!         calls += 1;
//!         if calls < 3 { Err(AttemptError::recoverable("warming up")) } else { Ok(calls) }
//!     },
//!     [with_retries(5), with_jitter(Jitter::None), with_time_scale(Duration::from_nanos(1))],
//! )
//! .unwrap();
//! assert_eq!(value, 3);
//! ```

use std::fmt::Display;
use std::marker::PhantomData;
use std::time::Duration;

use crate::abort::AbortHandler;
use crate::classify::AttemptError;
use crate::config::{
    with_abort_handler, with_callback, with_delay, with_jitter, with_label, with_logger,
    with_retries, with_sleeper, with_time_scale, Config, Mutator, Strategy,
};
use crate::error::{RetryError, RetryResult};
use crate::executor::{execute, Outcome};
use crate::jitter::Jitter;
use crate::sink::LogSink;
use crate::time::Sleeper;

/// Run `operation` and report failure as a [`RetryError`]
///
/// A rejected mutator yields [`RetryError::InvalidConfiguration`] before the
/// operation is ever invoked. Never terminates the process.
pub fn run<T, E, F, I>(strategy: Strategy, operation: F, mutators: I) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    E: Display,
    I: IntoIterator<Item = Mutator<T>>,
{
    let mut config = Config::build(strategy, mutators)?;
    match execute(&mut config, operation) {
        Outcome::Succeeded(value) => Ok(value),
        Outcome::Exhausted { attempts, error } => Err(RetryError::Exhausted {
            label: config.label().to_string(),
            attempts,
            source: error,
        }),
        Outcome::Aborted { attempt, error } => Err(RetryError::Unrecoverable {
            label: config.label().to_string(),
            attempt,
            source: error,
        }),
    }
}

/// Run `operation` and abort on any failure
///
/// Configuration errors abort too. In that case only the mutators listed
/// before the rejected one are in effect, so put the sink and abort handler
/// first.
pub fn must_run<T, E, F, I>(strategy: Strategy, operation: F, mutators: I) -> T
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    E: Display,
    I: IntoIterator<Item = Mutator<T>>,
{
    let mut config = Config::new(strategy);
    if let Err(err) = config.apply(mutators) {
        let message = format!("{}: invalid backoff configuration: {err}", config.label());
        abort_with(&config, &message);
    }

    match execute(&mut config, operation) {
        Outcome::Succeeded(value) => value,
        Outcome::Exhausted { attempts, error } | Outcome::Aborted { attempt: attempts, error } => {
            let message =
                format!("{}: giving up after {attempts} tries: {error}", config.label());
            abort_with(&config, &message)
        }
    }
}

fn abort_with<T>(config: &Config<T>, message: &str) -> ! {
    config.sink().fatal(message);
    config.abort_handler().abort(message)
}

/// [`run`] with a constant delay
pub fn constant<T, E, F, I>(operation: F, mutators: I) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    E: Display,
    I: IntoIterator<Item = Mutator<T>>,
{
    run(Strategy::Constant, operation, mutators)
}

/// [`run`] with a delay growing linearly with the attempt index
pub fn growing<T, E, F, I>(operation: F, mutators: I) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    E: Display,
    I: IntoIterator<Item = Mutator<T>>,
{
    run(Strategy::Growing, operation, mutators)
}

/// [`must_run`] with a constant delay
pub fn must_constant<T, E, F, I>(operation: F, mutators: I) -> T
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    E: Display,
    I: IntoIterator<Item = Mutator<T>>,
{
    must_run(Strategy::Constant, operation, mutators)
}

/// [`must_run`] with a delay growing linearly with the attempt index
pub fn must_growing<T, E, F, I>(operation: F, mutators: I) -> T
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    E: Display,
    I: IntoIterator<Item = Mutator<T>>,
{
    must_run(Strategy::Growing, operation, mutators)
}

/// Fluent front-end over [`run`] and [`must_run`]
///
/// Collects mutators in call order; nothing is validated until
/// [`run`](Backoff::run) or [`must_run`](Backoff::must_run).
///
/// ```
/// use std::time::Duration;
///
/// use rebound::{AttemptError, Backoff};
///
/// let err = Backoff::constant(|| -> Result<(), AttemptError<&str>> { Err("busy".into()) })
///     .with_retries(2)
///     .with_label("lock")
///     .with_time_scale(Duration::ZERO)
///     .run()
///     .unwrap_err();
/// assert_eq!(err.to_string(), "lock: giving up after 2 attempts: busy");
/// ```
pub struct Backoff<T, E, F> {
    strategy: Strategy,
    operation: F,
    mutators: Vec<Mutator<T>>,
    _error: PhantomData<fn() -> E>,
}

impl<T, E, F> Backoff<T, E, F>
where
    F: FnMut() -> Result<T, AttemptError<E>>,
    E: Display,
{
    /// Start a builder for `operation` under `strategy`
    pub fn new(strategy: Strategy, operation: F) -> Self {
        Self { strategy, operation, mutators: Vec::new(), _error: PhantomData }
    }

    /// Start a builder with a constant delay
    pub fn constant(operation: F) -> Self {
        Self::new(Strategy::Constant, operation)
    }

    /// Start a builder with a delay growing per attempt
    pub fn growing(operation: F) -> Self {
        Self::new(Strategy::Growing, operation)
    }

    /// Append an arbitrary mutator
    pub fn with(mut self, mutator: Mutator<T>) -> Self {
        self.mutators.push(mutator);
        self
    }

    /// Total attempts, validated when the run starts
    pub fn with_retries(self, count: u32) -> Self {
        self.with(with_retries(count))
    }

    /// Prefix for log lines and error messages
    pub fn with_label(self, label: impl Into<String>) -> Self {
        self.with(with_label(label))
    }

    /// Base delay, in `time_scale` units
    pub fn with_delay(self, delay: u64) -> Self {
        self.with(with_delay(delay))
    }

    /// Length of one delay unit
    pub fn with_time_scale(self, unit: Duration) -> Self {
        self.with(with_time_scale(unit))
    }

    /// Delay randomization applied to each wait
    pub fn with_jitter(self, jitter: Jitter) -> Self {
        self.with(with_jitter(jitter))
    }

    /// Destination for per-attempt and fatal lines
    pub fn with_logger<S: LogSink + 'static>(self, sink: S) -> Self {
        self.with(with_logger(sink))
    }

    /// Hook invoked once with the successful value
    pub fn with_callback<C>(self, callback: C) -> Self
    where
        C: FnOnce(&Config<T>, &T) + Send + 'static,
    {
        self.with(with_callback(callback))
    }

    /// Replace the thread sleep used between attempts
    pub fn with_sleeper<S: Sleeper + 'static>(self, sleeper: S) -> Self {
        self.with(with_sleeper(sleeper))
    }

    /// Handler invoked when `must_run` gives up
    pub fn with_abort_handler<H: AbortHandler + 'static>(self, handler: H) -> Self {
        self.with(with_abort_handler(handler))
    }

    /// Run under the report policy
    pub fn run(self) -> RetryResult<T, E> {
        run(self.strategy, self.operation, self.mutators)
    }

    /// Run under the abort policy
    pub fn must_run(self) -> T {
        must_run(self.strategy, self.operation, self.mutators)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the termination policies.
    use super::*;
    use crate::error::ConfigError;
    use crate::testing::{catch_abort, AbortTrap, RecordingSink, RecordingSleeper};

    fn failing() -> impl FnMut() -> Result<u8, AttemptError<String>> {
        let mut calls = 0;
        move || {
            calls += 1;
            Err(format!("failure #{calls}").into())
        }
    }

    /// Validates that exhaustion reports the label, attempt count and last
    /// error.
    #[test]
    fn test_run_reports_exhaustion() {
        let err = run(
            Strategy::Constant,
            failing(),
            [
                with_retries(3),
                with_label("db"),
                with_sleeper(RecordingSleeper::new()),
                with_logger(RecordingSink::new()),
            ],
        )
        .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.to_string(), "db: giving up after 3 attempts: failure #3");
        assert_eq!(err.into_source(), Some("failure #3".to_string()));
    }

    /// Validates that a bad configuration is reported before any attempt.
    #[test]
    fn test_run_invalid_configuration() {
        let mut calls = 0;
        let err = run(
            Strategy::Growing,
            || -> Result<(), AttemptError<&str>> {
                calls += 1;
                Ok(())
            },
            [with_retries(101)],
        )
        .unwrap_err();

        assert_eq!(
            err.config_error(),
            Some(&ConfigError::InvalidRetriesCount { count: 101, min: 1, max: 100 })
        );
        assert_eq!(calls, 0);
    }

    /// Validates the abort path of `must_run` after exhaustion.
    #[test]
    fn test_must_run_aborts_after_exhaustion() {
        let sink = RecordingSink::new();
        let handle = sink.clone();

        let aborted = catch_abort(move || {
            must_run(
                Strategy::Constant,
                failing(),
                [
                    with_logger(handle),
                    with_abort_handler(AbortTrap),
                    with_sleeper(RecordingSleeper::new()),
                    with_retries(2),
                    with_label("sync"),
                ],
            )
        })
        .unwrap_err();

        assert_eq!(aborted.message, "sync: giving up after 2 tries: failure #2");
        assert_eq!(sink.fatals(), vec![aborted.message.clone()]);
        assert_eq!(sink.warnings().len(), 2);
    }

    /// Validates that `must_run` aborts on a configuration error using the
    /// mutators applied before the rejection.
    #[test]
    fn test_must_run_aborts_on_invalid_configuration() {
        let aborted = catch_abort(|| {
            must_run(
                Strategy::Constant,
                || -> Result<(), AttemptError<&str>> { Ok(()) },
                [with_abort_handler(AbortTrap), with_logger(RecordingSink::new()), with_retries(0)],
            )
        })
        .unwrap_err();

        assert_eq!(
            aborted.message,
            "backoff: invalid backoff configuration: invalid number of retries: 0 (must be between 1 and 100)"
        );
    }

    /// Validates that the fluent builder forwards every mutator.
    #[test]
    fn test_backoff_builder() {
        let sleeper = RecordingSleeper::new();
        let sink = RecordingSink::new();
        let mut calls = 0;

        let value = Backoff::growing(|| {
            calls += 1;
            if calls == 1 {
                Err(AttemptError::recoverable("cold"))
            } else {
                Ok("warm")
            }
        })
        .with_retries(4)
        .with_delay(5)
        .with_time_scale(Duration::from_secs(1))
        .with_jitter(Jitter::None)
        .with_label("cache")
        .with_logger(sink.clone())
        .with_sleeper(sleeper.clone())
        .with_callback(|config, _| assert_eq!(config.invocations(), 2))
        .run()
        .unwrap();

        assert_eq!(value, "warm");
        assert_eq!(sleeper.waits(), vec![Duration::from_secs(5), Duration::from_secs(10)]);
        assert_eq!(sink.warnings(), vec!["cache (Attempt #1): cold"]);
    }
}
