//! Wall-clock access, isolated so tests can reason about elapsed time via
//! `tokio::time::pause`/`advance` instead of real sleeps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as Unix epoch seconds.
pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs_f64()
}
