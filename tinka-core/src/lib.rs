pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod payout;
pub mod simulation;
pub mod stats;

pub use error::{AnalyticsError, Result};
