//! Jitter strategies for randomizing retry delays
//!
//! Each strategy maps a delay magnitude (unit-less, before the time scale is
//! applied) to the magnitude actually waited. Randomization spreads out the
//! retries of independent callers that failed at the same moment.
//!
//! | Strategy | Result range for cap `n` |
//! |----------|--------------------------|
//! | [`no_jitter`] | exactly `n` |
//! | [`full_jitter`] | `[0, n)`, or `0` when `n <= 1` |
//! | [`equal_jitter`] | `[n/2, n)`, or `n/2` when `n/2 == 0` |

use std::fmt;
use std::sync::Arc;

use rand::Rng;

/// Caller-supplied jitter function
pub type JitterFn = Arc<dyn Fn(u64) -> u64 + Send + Sync>;

/// Returns the magnitude unchanged
pub fn no_jitter(cap: u64) -> u64 {
    cap
}

/// Returns a uniformly random magnitude in `[0, cap)`
///
/// The range is empty for `cap == 0` and only contains `0` for `cap == 1`,
/// so both yield `0`.
pub fn full_jitter(cap: u64) -> u64 {
    random_below(cap)
}

/// Returns `cap / 2` plus a uniformly random magnitude in `[0, cap / 2)`
pub fn equal_jitter(cap: u64) -> u64 {
    let half = cap / 2;
    half + random_below(half)
}

fn random_below(max: u64) -> u64 {
    if max <= 1 {
        return 0;
    }
    rand::thread_rng().gen_range(0..max)
}

/// Jitter strategy applied to the base delay before every attempt
#[derive(Clone, Default)]
pub enum Jitter {
    /// Deterministic delays
    None,
    /// Full jitter: 0 to base delay
    #[default]
    Full,
    /// Equal jitter: base delay / 2 to base delay
    Equal,
    /// Caller-supplied function
    Custom(JitterFn),
}

impl Jitter {
    /// Wrap a custom jitter function
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u64) -> u64 + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Apply the strategy to a delay magnitude
    pub fn apply(&self, cap: u64) -> u64 {
        match self {
            Self::None => no_jitter(cap),
            Self::Full => full_jitter(cap),
            Self::Equal => equal_jitter(cap),
            Self::Custom(f) => f(cap),
        }
    }
}

impl fmt::Debug for Jitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Full => write!(f, "Full"),
            Self::Equal => write!(f, "Equal"),
            Self::Custom(_) => write!(f, "Custom(<function>)"),
        }
    }
}
