//! Read-only reports for the blood and organ bank.
//!
//! Everything here is derived from current catalog rows on each call:
//! - [`DonorStatus`] classification of a donor's donation history
//! - Donor summaries with totals and last donation date
//! - Donation statistics over the last week and by type
//! - [`ReportingService`] tying the views to a [`catalog::CatalogStore`]

pub mod donor_status;
pub mod error;
pub mod reports;
pub mod views;

pub use donor_status::DonorStatus;
pub use error::{ProjectionError, Result};
pub use reports::ReportingService;
pub use views::{DailyCount, DonationStats, DonorSummary, TypeCount};
