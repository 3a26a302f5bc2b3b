//! Donor listing with derived status and donation totals.

use std::collections::HashMap;

use catalog::{BloodGroup, Donation, Donor};
use chrono::NaiveDate;
use common::DonorId;
use serde::Serialize;

use crate::donor_status::DonorStatus;

/// One row of the donor listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonorSummary {
    pub id: DonorId,
    pub full_name: String,
    pub blood_group: BloodGroup,
    pub gender: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub donation_status: DonorStatus,
    pub total_donations: u64,
    pub last_donation: Option<NaiveDate>,
}

/// Builds the donor listing, newest donor first.
pub fn summarize(donors: Vec<Donor>, donations: &[Donation]) -> Vec<DonorSummary> {
    let mut by_donor: HashMap<DonorId, Vec<&Donation>> = HashMap::new();
    for donation in donations {
        by_donor.entry(donation.donor_id).or_default().push(donation);
    }

    let mut summaries: Vec<DonorSummary> = donors
        .into_iter()
        .map(|donor| {
            let history = by_donor.remove(&donor.id).unwrap_or_default();
            DonorSummary {
                donation_status: DonorStatus::classify(&donor, history.iter().copied()),
                total_donations: history.len() as u64,
                last_donation: history.iter().map(|d| d.date).max(),
                id: donor.id,
                full_name: donor.full_name,
                blood_group: donor.blood_group,
                gender: donor.gender,
                contact: donor.contact,
                email: donor.email,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.id.cmp(&a.id));
    summaries
}
