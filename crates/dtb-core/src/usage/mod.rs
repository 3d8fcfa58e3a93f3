//! Traffic usage: account + hosting ports and the report aggregator.

pub mod aggregator;
pub mod ports;
pub mod types;

pub use aggregator::UsageAggregator;
pub use ports::{AccountApi, HostingApi};
pub use types::*;
