//! Persistent configuration records.

mod coop;
mod retailer;

pub use coop::{CoopCampaignConfig, CoopWithRetailer};
pub use retailer::{RetailerConfig, TableRef};
