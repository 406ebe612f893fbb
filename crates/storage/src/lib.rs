#![forbid(unsafe_code)]

mod config;
mod entry;
mod store;

pub use config::StoreConfig;
pub use store::{ExpiringStore, PurgeStats};
