//! Wrappers around the untrusted venues. Both adapters measure results by
//! balance delta and never trust what a venue returns.

pub mod aggregator;
pub mod pool;

pub use aggregator::{AggregatorAdapter, Fill};
pub use pool::{Added, PoolAdapter};
