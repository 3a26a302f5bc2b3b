//! Read-only queries over the catalog. Nothing here writes.

use catalog::{CatalogStore, InventoryLevel, Ledger, PendingRequest, StaffProfile};
use chrono::{NaiveDate, Utc};
use common::DonorId;

use crate::donor_status::DonorStatus;
use crate::error::{ProjectionError, Result};
use crate::views::{DonationStats, DonorSummary, summarize};

pub struct ReportingService<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> ReportingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Every donor with derived status and totals, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn donor_summaries(&self) -> Result<Vec<DonorSummary>> {
        let donors = self.store.list_donors().await?;
        let donations = self.store.list_donations().await?;
        Ok(summarize(donors, &donations))
    }

    /// Status of a single donor, recomputed from their donations.
    #[tracing::instrument(skip(self))]
    pub async fn donor_status(&self, donor_id: DonorId) -> Result<DonorStatus> {
        let donor = self
            .store
            .get_donor(donor_id)
            .await?
            .ok_or_else(|| ProjectionError::NotFound {
                entity: "Donor",
                id: donor_id.to_string(),
            })?;
        let donations = self.store.donations_for_donor(donor_id).await?;
        Ok(DonorStatus::classify(&donor, &donations))
    }

    #[tracing::instrument(skip(self))]
    pub async fn pending_requests(&self) -> Result<Vec<PendingRequest>> {
        Ok(self.store.list_pending_requests().await?)
    }

    /// Lists one ledger. `selector` is `Blood_Inventory` or `Organ_Inventory`.
    #[tracing::instrument(skip(self))]
    pub async fn inventory(&self, selector: &str) -> Result<Vec<InventoryLevel>> {
        let ledger: Ledger = selector
            .parse()
            .map_err(|_| ProjectionError::InvalidInventoryType(selector.to_string()))?;
        Ok(self.store.inventory(ledger).await?)
    }

    pub async fn donation_stats(&self) -> Result<DonationStats> {
        self.donation_stats_on(Utc::now().date_naive()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn donation_stats_on(&self, today: NaiveDate) -> Result<DonationStats> {
        let donations = self.store.list_donations().await?;
        Ok(DonationStats::compute(&donations, today))
    }

    /// Staff without credentials, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn staff(&self) -> Result<Vec<StaffProfile>> {
        let staff = self.store.list_staff().await?;
        Ok(staff.iter().map(|s| s.profile()).collect())
    }
}
