//! HTTP handlers for retailer and co-op configuration.

pub mod coops;
pub mod retailers;
pub use coops::*;
pub use retailers::*;
