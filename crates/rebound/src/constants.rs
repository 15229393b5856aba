// Defaults and bounds for backoff configuration
use std::time::Duration;

/// Default number of attempts before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default base delay magnitude, interpreted in units of the time scale
pub const DEFAULT_BASE_DELAY: u64 = 500;

/// Default unit multiplying the base delay
pub const DEFAULT_TIME_SCALE: Duration = Duration::from_millis(1);

/// Label used as the log prefix when none is supplied
pub const DEFAULT_LABEL: &str = "backoff";

/// Minimum allowed max_retries value
pub const MIN_RETRIES: u32 = 1;

/// Maximum allowed max_retries value
pub const MAX_RETRIES: u32 = 100;
