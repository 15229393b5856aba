//! Backoff configuration and its mutators
//!
//! A [`Config`] starts from defaults and is shaped by an ordered list of
//! [`Mutator`]s. Each mutator may reject its input; the first rejection stops
//! the build, later mutators never run and no attempt is made.
//!
//! ```
//! use std::time::Duration;
//!
//! use rebound::config::{with_delay, with_label, with_retries, with_time_scale, Config};
//! use rebound::{ConfigError, Strategy};
//!
//! let config = Config::<u32>::build(
//!     Strategy::Growing,
//!     [with_retries(5), with_delay(20), with_time_scale(Duration::from_micros(1)), with_label("sync")],
//! )
//! .unwrap();
//! assert_eq!(config.max_retries(), 5);
//! assert_eq!(config.label(), "sync");
//!
//! let err = Config::<u32>::build(Strategy::Constant, [with_retries(0)]).unwrap_err();
//! assert!(matches!(err, ConfigError::InvalidRetriesCount { count: 0, .. }));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::abort::{AbortHandler, ProcessAbort};
use crate::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_LABEL, DEFAULT_MAX_RETRIES, DEFAULT_TIME_SCALE, MAX_RETRIES,
    MIN_RETRIES,
};
use crate::error::{ConfigError, ConfigResult};
use crate::jitter::Jitter;
use crate::sink::{LogSink, TracingSink};
use crate::time::{scale_delay, Sleeper, ThreadSleeper};

/// Callback run once with the final configuration and the successful value
pub type Callback<T> = Box<dyn FnOnce(&Config<T>, &T) + Send>;

/// Configuration step applied while building a [`Config`]
pub type Mutator<T> = Box<dyn FnOnce(&mut Config<T>) -> ConfigResult<()> + Send>;

/// How the delay evolves across attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Same jittered delay before every attempt
    #[default]
    Constant,
    /// Jittered delay multiplied by the 1-based attempt index
    Growing,
}

impl Strategy {
    /// Delay magnitude for an attempt, given the already jittered base delay
    pub fn magnitude(self, jittered: u64, attempt: u32) -> u64 {
        match self {
            Self::Constant => jittered,
            Self::Growing => jittered.saturating_mul(u64::from(attempt)),
        }
    }
}

/// Settings and counters for a single backoff run
pub struct Config<T> {
    max_retries: u32,
    base_delay: u64,
    time_scale: Duration,
    strategy: Strategy,
    jitter: Jitter,
    label: String,
    callback: Option<Callback<T>>,
    sink: Arc<dyn LogSink>,
    sleeper: Arc<dyn Sleeper>,
    abort: Arc<dyn AbortHandler>,
    invocations: u32,
    failed_invocations: u32,
}

impl<T> Config<T> {
    /// Configuration with default settings for the given strategy
    pub fn new(strategy: Strategy) -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            time_scale: DEFAULT_TIME_SCALE,
            strategy,
            jitter: Jitter::default(),
            label: DEFAULT_LABEL.to_string(),
            callback: None,
            sink: Arc::new(TracingSink),
            sleeper: Arc::new(ThreadSleeper),
            abort: Arc::new(ProcessAbort),
            invocations: 0,
            failed_invocations: 0,
        }
    }

    /// Build a configuration by applying mutators in order
    pub fn build<I>(strategy: Strategy, mutators: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = Mutator<T>>,
    {
        let mut config = Self::new(strategy);
        config.apply(mutators)?;
        Ok(config)
    }

    /// Apply mutators in order, stopping at the first rejection
    pub fn apply<I>(&mut self, mutators: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = Mutator<T>>,
    {
        for mutator in mutators {
            mutator(self)?;
        }
        Ok(())
    }

    /// Set the number of attempts, rejecting values outside `[1, 100]`
    pub fn set_max_retries(&mut self, count: u32) -> ConfigResult<()> {
        if !(MIN_RETRIES..=MAX_RETRIES).contains(&count) {
            return Err(ConfigError::InvalidRetriesCount {
                count,
                min: MIN_RETRIES,
                max: MAX_RETRIES,
            });
        }
        self.max_retries = count;
        Ok(())
    }

    /// Set the base delay magnitude, in units of the time scale
    pub fn set_base_delay(&mut self, delay: u64) {
        self.base_delay = delay;
    }

    /// Set the unit the base delay is expressed in
    pub fn set_time_scale(&mut self, unit: Duration) {
        self.time_scale = unit;
    }

    /// Replace the delay strategy
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    /// Replace the jitter strategy
    pub fn set_jitter(&mut self, jitter: Jitter) {
        self.jitter = jitter;
    }

    /// Set the log prefix
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Set the callback fired once on success
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnOnce(&Config<T>, &T) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    /// Route per-attempt diagnostics to `sink`
    pub fn set_sink(&mut self, sink: Arc<dyn LogSink>) {
        self.sink = sink;
    }

    /// Replace the wait primitive
    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }

    /// Replace what happens when the abort policy gives up
    pub fn set_abort_handler(&mut self, abort: Arc<dyn AbortHandler>) {
        self.abort = abort;
    }

    /// Maximum number of attempts
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Base delay magnitude before jitter
    pub fn base_delay(&self) -> u64 {
        self.base_delay
    }

    /// Unit multiplying the delay magnitude
    pub fn time_scale(&self) -> Duration {
        self.time_scale
    }

    /// Delay strategy in effect
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Jitter strategy in effect
    pub fn jitter(&self) -> &Jitter {
        &self.jitter
    }

    /// Log prefix identifying the operation
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether a callback is still pending
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Attempts made so far in the current run
    pub fn invocations(&self) -> u32 {
        self.invocations
    }

    /// Recoverable failures observed so far in the current run
    pub fn failed_invocations(&self) -> u32 {
        self.failed_invocations
    }

    /// Wait before the given 1-based attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jittered = self.jitter.apply(self.base_delay);
        scale_delay(self.strategy.magnitude(jittered, attempt), self.time_scale)
    }

    pub(crate) fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    pub(crate) fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }

    pub(crate) fn abort_handler(&self) -> &dyn AbortHandler {
        self.abort.as_ref()
    }

    pub(crate) fn record_invocation(&mut self, attempt: u32) {
        self.invocations = attempt;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed_invocations += 1;
    }

    pub(crate) fn take_callback(&mut self) -> Option<Callback<T>> {
        self.callback.take()
    }
}

impl<T> fmt::Debug for Config<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("time_scale", &self.time_scale)
            .field("strategy", &self.strategy)
            .field("jitter", &self.jitter)
            .field("label", &self.label)
            .field("callback", &self.callback.is_some())
            .field("invocations", &self.invocations)
            .field("failed_invocations", &self.failed_invocations)
            .finish_non_exhaustive()
    }
}

/// Set the number of attempts; fails outside `[1, 100]`
pub fn with_retries<T>(count: u32) -> Mutator<T> {
    Box::new(move |config| config.set_max_retries(count))
}

/// Set the label used as the log prefix
pub fn with_label<T>(label: impl Into<String>) -> Mutator<T> {
    let label = label.into();
    Box::new(move |config| {
        config.set_label(label);
        Ok(())
    })
}

/// Set the base delay magnitude, in units of the time scale
pub fn with_delay<T>(delay: u64) -> Mutator<T> {
    Box::new(move |config| {
        config.set_base_delay(delay);
        Ok(())
    })
}

/// Set the unit the base delay is expressed in
pub fn with_time_scale<T>(unit: Duration) -> Mutator<T> {
    Box::new(move |config| {
        config.set_time_scale(unit);
        Ok(())
    })
}

/// Route per-attempt diagnostics to `sink`
pub fn with_logger<T, S>(sink: S) -> Mutator<T>
where
    S: LogSink + 'static,
{
    let sink: Arc<dyn LogSink> = Arc::new(sink);
    Box::new(move |config| {
        config.set_sink(sink);
        Ok(())
    })
}

/// Run `callback` once after a successful attempt
pub fn with_callback<T, F>(callback: F) -> Mutator<T>
where
    F: FnOnce(&Config<T>, &T) + Send + 'static,
{
    Box::new(move |config| {
        config.set_callback(callback);
        Ok(())
    })
}

/// Replace the jitter strategy
pub fn with_jitter<T>(jitter: Jitter) -> Mutator<T> {
    Box::new(move |config| {
        config.set_jitter(jitter);
        Ok(())
    })
}

/// Replace the delay strategy chosen by the entry point
pub fn with_strategy<T>(strategy: Strategy) -> Mutator<T> {
    Box::new(move |config| {
        config.set_strategy(strategy);
        Ok(())
    })
}

/// Replace the wait primitive
pub fn with_sleeper<T, S>(sleeper: S) -> Mutator<T>
where
    S: Sleeper + 'static,
{
    let sleeper: Arc<dyn Sleeper> = Arc::new(sleeper);
    Box::new(move |config| {
        config.set_sleeper(sleeper);
        Ok(())
    })
}

/// Replace what happens when the abort policy gives up
pub fn with_abort_handler<T, H>(handler: H) -> Mutator<T>
where
    H: AbortHandler + 'static,
{
    let handler: Arc<dyn AbortHandler> = Arc::new(handler);
    Box::new(move |config| {
        config.set_abort_handler(handler);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    //! Unit tests for config.
    //!
    //! Tests cover defaults, ordered mutator application, retry-count
    //! validation bounds, and delay computation for both strategies.

    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// Validates the defaults of a fresh configuration.
    #[test]
    fn test_defaults() {
        let config = Config::<()>::new(Strategy::Constant);

        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(config.base_delay(), DEFAULT_BASE_DELAY);
        assert_eq!(config.time_scale(), DEFAULT_TIME_SCALE);
        assert_eq!(config.strategy(), Strategy::Constant);
        assert!(matches!(config.jitter(), Jitter::Full));
        assert_eq!(config.label(), DEFAULT_LABEL);
        assert!(!config.has_callback());
        assert_eq!(config.invocations(), 0);
        assert_eq!(config.failed_invocations(), 0);
    }

    /// Validates that every mutator sets its field.
    #[test]
    fn test_mutators_apply() {
        let config = Config::<u8>::build(
            Strategy::Constant,
            [
                with_retries(7),
                with_delay(42),
                with_time_scale(Duration::from_nanos(1)),
                with_label("upload"),
                with_jitter(Jitter::None),
                with_strategy(Strategy::Growing),
                with_callback(|_, _| {}),
            ],
        )
        .unwrap();

        assert_eq!(config.max_retries(), 7);
        assert_eq!(config.base_delay(), 42);
        assert_eq!(config.time_scale(), Duration::from_nanos(1));
        assert_eq!(config.label(), "upload");
        assert!(matches!(config.jitter(), Jitter::None));
        assert_eq!(config.strategy(), Strategy::Growing);
        assert!(config.has_callback());
    }

    /// Validates that the delay mutator leaves the retry count alone.
    #[test]
    fn test_with_delay_sets_delay_not_retries() {
        let config = Config::<()>::build(Strategy::Constant, [with_delay(3)]).unwrap();

        assert_eq!(config.base_delay(), 3);
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
    }

    /// Validates the accepted retry-count range.
    ///
    /// Assertions:
    /// - Confirms 1 and 100 are accepted.
    /// - Confirms 0 and 101 are rejected with `InvalidRetriesCount`.
    #[test]
    fn test_retries_bounds() {
        for count in [MIN_RETRIES, 50, MAX_RETRIES] {
            let config = Config::<()>::build(Strategy::Constant, [with_retries(count)]).unwrap();
            assert_eq!(config.max_retries(), count);
        }

        for count in [0, MAX_RETRIES + 1, u32::MAX] {
            let err = Config::<()>::build(Strategy::Constant, [with_retries(count)]).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidRetriesCount { count, min: MIN_RETRIES, max: MAX_RETRIES }
            );
        }
    }

    /// Validates that the first failing mutator stops the build.
    #[test]
    fn test_first_failure_stops_build() {
        let later_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&later_ran);
        let marker: Mutator<()> = Box::new(move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        let result = Config::build(Strategy::Constant, [with_label("first"), with_retries(0), marker]);

        assert!(result.is_err());
        assert!(!later_ran.load(Ordering::SeqCst));
    }

    /// Validates that later mutators override earlier ones.
    #[test]
    fn test_mutators_apply_in_order() {
        let config =
            Config::<()>::build(Strategy::Constant, [with_retries(3), with_retries(9)]).unwrap();

        assert_eq!(config.max_retries(), 9);
    }

    /// Validates that a rejected value leaves the previous one in place.
    #[test]
    fn test_set_max_retries_rejection_keeps_value() {
        let mut config = Config::<()>::new(Strategy::Constant);
        config.set_max_retries(4).unwrap();

        assert!(config.set_max_retries(0).is_err());
        assert_eq!(config.max_retries(), 4);
    }

    /// Validates strategy magnitudes.
    #[test]
    fn test_strategy_magnitude() {
        assert_eq!(Strategy::Constant.magnitude(10, 1), 10);
        assert_eq!(Strategy::Constant.magnitude(10, 5), 10);
        assert_eq!(Strategy::Growing.magnitude(10, 1), 10);
        assert_eq!(Strategy::Growing.magnitude(10, 5), 50);
        assert_eq!(Strategy::Growing.magnitude(u64::MAX, 2), u64::MAX);
    }

    /// Validates `delay_for` with deterministic jitter.
    #[test]
    fn test_delay_for_without_jitter() {
        let constant = Config::<()>::build(
            Strategy::Constant,
            [with_delay(100), with_jitter(Jitter::None)],
        )
        .unwrap();
        let growing = Config::<()>::build(
            Strategy::Growing,
            [with_delay(100), with_jitter(Jitter::None), with_time_scale(Duration::from_micros(1))],
        )
        .unwrap();

        assert_eq!(constant.delay_for(1), Duration::from_millis(100));
        assert_eq!(constant.delay_for(4), Duration::from_millis(100));
        assert_eq!(growing.delay_for(1), Duration::from_micros(100));
        assert_eq!(growing.delay_for(3), Duration::from_micros(300));
    }

    /// Validates that `delay_for` under full jitter stays below the scaled cap.
    #[test]
    fn test_delay_for_with_full_jitter() {
        let config = Config::<()>::build(Strategy::Growing, [with_delay(10)]).unwrap();

        for _ in 0..100 {
            assert!(config.delay_for(2) < Duration::from_millis(20));
        }
    }

    /// Validates strategy serde naming.
    #[test]
    fn test_strategy_serde_names() {
        assert_eq!(serde_json::to_string(&Strategy::Growing).unwrap(), "\"growing\"");
        let parsed: Strategy = serde_json::from_str("\"constant\"").unwrap();
        assert_eq!(parsed, Strategy::Constant);
    }

    /// Validates the debug output hides the callback.
    #[test]
    fn test_debug_output() {
        let config =
            Config::<()>::build(Strategy::Constant, [with_label("dbg"), with_callback(|_, _| {})])
                .unwrap();
        let debug = format!("{config:?}");

        assert!(debug.contains("label: \"dbg\""));
        assert!(debug.contains("callback: true"));
    }
}
