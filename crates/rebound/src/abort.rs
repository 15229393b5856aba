//! Fatal termination for the abort policy
//!
//! [`must_run`](crate::must_run) has no error channel. When it gives up it
//! calls an [`AbortHandler`], which must not return. The default handler
//! exits the process. The `AbortTrap` double in `testing` (feature
//! `test-utils`) unwinds instead so the outcome can be asserted in-process.

use std::sync::Arc;

use tracing::debug;

/// Exit status used by [`ProcessAbort`]
pub const ABORT_EXIT_CODE: i32 = 1;

/// Terminates execution after the abort policy gives up
pub trait AbortHandler: Send + Sync {
    fn abort(&self, message: &str) -> !;
}

impl<T: AbortHandler + ?Sized> AbortHandler for Arc<T> {
    fn abort(&self, message: &str) -> ! {
        (**self).abort(message)
    }
}

/// Exits the process with [`ABORT_EXIT_CODE`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessAbort;

impl AbortHandler for ProcessAbort {
    fn abort(&self, message: &str) -> ! {
        debug!(reason = message, exit_code = ABORT_EXIT_CODE, "aborting process");
        std::process::exit(ABORT_EXIT_CODE)
    }
}
