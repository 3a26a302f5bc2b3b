//! Report views computed from catalog rows.

pub mod donation_stats;
pub mod donor_summary;

pub use donation_stats::{DAILY_LOOKBACK_DAYS, DailyCount, DonationStats, TypeCount};
pub use donor_summary::{DonorSummary, summarize};
