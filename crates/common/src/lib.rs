#![forbid(unsafe_code)]

mod error;

use std::time::Duration;

pub use error::*;

pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
