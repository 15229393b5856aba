#![allow(clippy::panic)]

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::abort::AbortHandler;

/// Payload carried by an [`AbortTrap`] unwind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aborted {
    pub message: String,
}

impl fmt::Display for Aborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aborted: {}", self.message)
    }
}

/// Abort handler that unwinds with an [`Aborted`] payload instead of exiting
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortTrap;

impl AbortHandler for AbortTrap {
    fn abort(&self, message: &str) -> ! {
        panic::panic_any(Aborted { message: message.to_string() })
    }
}

/// Run `f`, converting an [`AbortTrap`] unwind into `Err(Aborted)`
///
/// Any other panic is resumed unchanged.
pub fn catch_abort<F, R>(f: F) -> Result<R, Aborted>
where
    F: FnOnce() -> R,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<Aborted>() {
            Ok(aborted) => Err(*aborted),
            Err(other) => panic::resume_unwind(other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates that a trapped abort is returned as a value.
    #[test]
    fn test_catch_abort_returns_payload() {
        let result: Result<(), Aborted> = catch_abort(|| AbortTrap.abort("stop here"));

        assert_eq!(result, Err(Aborted { message: "stop here".to_string() }));
    }

    /// Validates that a closure finishing normally passes its value through.
    #[test]
    fn test_catch_abort_passes_value() {
        assert_eq!(catch_abort(|| 7), Ok(7));
    }

    /// Validates that unrelated panics are not swallowed.
    #[test]
    #[should_panic(expected = "unrelated")]
    fn test_catch_abort_resumes_other_panics() {
        let _: Result<(), Aborted> = catch_abort(|| panic!("unrelated"));
    }
}
