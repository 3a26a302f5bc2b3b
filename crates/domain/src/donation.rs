//! Donation recording: appends a donation and credits the matching ledger in
//! one transaction.

use catalog::{
    CatalogStore, CatalogTx, Category, Donation, DonationItem, DonationType, NewDonation,
};
use common::{DonorId, StaffId};

use crate::error::DomainError;
use crate::validation::{blank_to_none, parse_date, parse_organ_type, positive_quantity};

/// Input for recording a donation.
#[derive(Debug, Clone)]
pub struct RecordDonation {
    pub donor_id: DonorId,
    /// `YYYY-MM-DD`; future dates are accepted.
    pub date: String,
    pub donation_type: DonationType,
    /// Required for organ donations, ignored for blood.
    pub organ_type: Option<String>,
    /// Units of blood. Absent means one; organ donations are always one.
    pub quantity: Option<i64>,
    pub verified_by: Option<StaffId>,
}

impl RecordDonation {
    pub fn blood(donor_id: DonorId, date: impl Into<String>, units: i64) -> Self {
        Self {
            donor_id,
            date: date.into(),
            donation_type: DonationType::Blood,
            organ_type: None,
            quantity: Some(units),
            verified_by: None,
        }
    }

    pub fn organ(donor_id: DonorId, date: impl Into<String>, organ: impl Into<String>) -> Self {
        Self {
            donor_id,
            date: date.into(),
            donation_type: DonationType::Organ,
            organ_type: Some(organ.into()),
            quantity: None,
            verified_by: None,
        }
    }

    pub fn verified_by(mut self, staff_id: StaffId) -> Self {
        self.verified_by = Some(staff_id);
        self
    }
}

/// Outcome of a recorded donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDonation {
    pub donation: Donation,
    /// Ledger category that was credited.
    pub category: Category,
    /// Stock of that category after the credit.
    pub stock: u64,
}

pub struct DonationRecorder<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> DonationRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates the input, then appends the donation and credits inventory.
    ///
    /// Both writes commit together or not at all. Blood is credited under the
    /// donor's registered blood group.
    #[tracing::instrument(skip(self), fields(donor_id = %cmd.donor_id))]
    pub async fn record(&self, cmd: RecordDonation) -> Result<RecordedDonation, DomainError> {
        let date = parse_date("donation date", cmd.date.trim())?;
        let organ = match cmd.donation_type {
            DonationType::Blood => None,
            DonationType::Organ => {
                let organ = blank_to_none(cmd.organ_type).ok_or_else(|| {
                    DomainError::Validation("Organ type required for organ donations".to_string())
                })?;
                Some(parse_organ_type(&organ)?)
            }
        };
        let units = match organ {
            Some(_) => 1,
            None => positive_quantity("Blood quantity", cmd.quantity.unwrap_or(1))?,
        };

        let mut tx = self.store.begin().await?;

        let donor = tx
            .get_donor(cmd.donor_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Donor", cmd.donor_id))?;

        if let Some(staff_id) = cmd.verified_by {
            if !tx.staff_exists(staff_id).await? {
                return Err(DomainError::not_found("Staff", staff_id));
            }
        }

        let (item, category) = match organ {
            Some(organ) => (
                DonationItem::Organ {
                    organ: organ.clone(),
                },
                Category::Organ(organ),
            ),
            None => (
                DonationItem::Blood { units },
                Category::Blood(donor.blood_group),
            ),
        };

        let donation = tx
            .insert_donation(NewDonation {
                donor_id: donor.id,
                date,
                item,
                verified_by: cmd.verified_by,
            })
            .await?;
        let stock = tx.credit(&category, units).await?;
        tx.commit().await?;

        metrics::counter!("donations_recorded_total", "type" => category.kind().as_str())
            .increment(1);
        tracing::info!(
            donation_id = %donation.id,
            %category,
            units,
            stock,
            "donation recorded"
        );

        Ok(RecordedDonation {
            donation,
            category,
            stock,
        })
    }
}
