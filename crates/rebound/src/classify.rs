//! Attempt error classification
//!
//! An operation reports failure as an [`AttemptError`]. Plain errors convert
//! into [`AttemptError::Recoverable`] through `From`, so `?` inside an
//! operation retries by default. Wrapping an error with [`unrecoverable`]
//! stops the retry loop on the spot.
//!
//! ```
//! use rebound::{unrecoverable, AttemptError};
//!
//! fn fetch(status: u16) -> Result<&'static str, AttemptError<String>> {
//!     match status {
//!         200 => Ok("body"),
//!         401 => Err(unrecoverable("unauthorized".to_string())),
//!         _ => Err(format!("status {status}").into()),
//!     }
//! }
//!
//! assert!(fetch(401).unwrap_err().is_unrecoverable());
//! assert!(!fetch(503).unwrap_err().is_unrecoverable());
//! ```

use std::fmt;

/// Whether a failed attempt may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transient; the loop keeps going
    Recoverable,
    /// Permanent; the loop stops immediately
    Unrecoverable,
}

/// Failure returned by a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError<E> {
    Recoverable(E),
    Unrecoverable(E),
}

/// Mark an error as unrecoverable
pub fn unrecoverable<E>(err: E) -> AttemptError<E> {
    AttemptError::Unrecoverable(err)
}

impl<E> AttemptError<E> {
    /// Wrap an error the loop should retry
    pub fn recoverable(err: E) -> Self {
        Self::Recoverable(err)
    }

    /// How the loop treats this failure
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Recoverable(_) => FailureKind::Recoverable,
            Self::Unrecoverable(_) => FailureKind::Unrecoverable,
        }
    }

    pub fn is_unrecoverable(&self) -> bool {
        self.kind() == FailureKind::Unrecoverable
    }

    /// Borrow the wrapped error
    pub fn inner(&self) -> &E {
        match self {
            Self::Recoverable(err) | Self::Unrecoverable(err) => err,
        }
    }

    /// Unwrap the original error
    pub fn into_inner(self) -> E {
        match self {
            Self::Recoverable(err) | Self::Unrecoverable(err) => err,
        }
    }

    /// Split into kind and original error
    pub fn into_parts(self) -> (FailureKind, E) {
        (self.kind(), self.into_inner())
    }
}

impl<E> From<E> for AttemptError<E> {
    fn from(err: E) -> Self {
        Self::Recoverable(err)
    }
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable(err) => write!(f, "{err}"),
            Self::Unrecoverable(err) => write!(f, "unrecoverable: {err}"),
        }
    }
}

impl<E> std::error::Error for AttemptError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner())
    }
}
