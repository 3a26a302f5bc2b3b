use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{DonorId, HospitalId, RecipientId, RequestId, StaffId};

use crate::{
    Category, CatalogError, Donation, Donor, Hospital, InventoryLevel, Ledger, NewDonation,
    NewDonor, NewHospital, NewRecipient, NewRequest, NewStaff, PendingRequest, Recipient, Request,
    Result, Staff,
};

/// A scoped unit of work against the catalog.
///
/// Everything done through a transaction becomes visible to other callers
/// only when [`CatalogTx::commit`] succeeds. Dropping a transaction without
/// committing rolls it back, so early returns via `?` never leave partial
/// writes behind.
#[async_trait]
pub trait CatalogTx: Send {
    /// Loads a donor inside the transaction.
    async fn get_donor(&mut self, id: DonorId) -> Result<Option<Donor>>;

    /// Returns true if a staff row with this ID exists.
    async fn staff_exists(&mut self, id: StaffId) -> Result<bool>;

    /// Loads a request and holds it against concurrent writers until the
    /// transaction ends.
    async fn lock_request(&mut self, id: RequestId) -> Result<Option<Request>>;

    /// Appends a donation row.
    async fn insert_donation(&mut self, donation: NewDonation) -> Result<Donation>;

    /// Increases the stock of `category` by `amount`, creating the category
    /// if absent. Returns the new quantity.
    async fn credit(&mut self, category: &Category, amount: u32) -> Result<u64>;

    /// Decreases the stock of `category` by `amount` if at least that much is
    /// available. Returns the new quantity, or
    /// [`CatalogError::InsufficientStock`] with the ledger unchanged.
    async fn debit(&mut self, category: &Category, amount: u32) -> Result<u64>;

    /// Moves a `Pending` request to `Fulfilled`. Returns `None` when the
    /// request is missing or no longer pending.
    async fn mark_fulfilled(
        &mut self,
        id: RequestId,
        staff_id: StaffId,
        at: DateTime<Utc>,
    ) -> Result<Option<Request>>;

    /// Makes every write of this transaction durable and visible.
    async fn commit(self) -> Result<()>;
}

/// Core trait for catalog store implementations.
///
/// Single-row inserts and reads run in their own implicit transaction.
/// Anything that must change several rows atomically goes through
/// [`CatalogStore::begin`]. All implementations must be thread-safe.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    type Tx: CatalogTx;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;

    async fn insert_donor(&self, donor: NewDonor) -> Result<Donor>;

    async fn insert_recipient(&self, recipient: NewRecipient) -> Result<Recipient>;

    async fn insert_hospital(&self, hospital: NewHospital) -> Result<Hospital>;

    /// Inserts a staff row. Fails with [`CatalogError::Duplicate`] when the
    /// username or email is already taken.
    async fn insert_staff(&self, staff: NewStaff) -> Result<Staff>;

    /// Inserts a request in `Pending` state. Fails with
    /// [`CatalogError::MissingReference`] when the requestor does not exist.
    async fn insert_request(&self, request: NewRequest) -> Result<Request>;

    async fn get_donor(&self, id: DonorId) -> Result<Option<Donor>>;

    async fn get_recipient(&self, id: RecipientId) -> Result<Option<Recipient>>;

    async fn get_hospital(&self, id: HospitalId) -> Result<Option<Hospital>>;

    async fn get_staff(&self, id: StaffId) -> Result<Option<Staff>>;

    async fn get_staff_by_username(&self, username: &str) -> Result<Option<Staff>>;

    async fn get_request(&self, id: RequestId) -> Result<Option<Request>>;

    /// All donors, newest first.
    async fn list_donors(&self) -> Result<Vec<Donor>>;

    /// All staff, newest first.
    async fn list_staff(&self) -> Result<Vec<Staff>>;

    /// All donations in insertion order.
    async fn list_donations(&self) -> Result<Vec<Donation>>;

    /// Donations made by one donor in insertion order.
    async fn donations_for_donor(&self, donor_id: DonorId) -> Result<Vec<Donation>>;

    /// Pending requests ordered by request date, then ID.
    async fn list_pending_requests(&self) -> Result<Vec<PendingRequest>>;

    /// Every row of one inventory ledger, ordered by key.
    async fn inventory(&self, ledger: Ledger) -> Result<Vec<InventoryLevel>>;

    /// Current stock of a category; zero if the category was never credited.
    async fn stock_level(&self, category: &Category) -> Result<u64>;
}

/// Extension trait exposing the ledger operations as standalone atomic calls.
#[async_trait]
pub trait CatalogStoreExt: CatalogStore {
    /// Credits a category in a transaction of its own.
    async fn credit(&self, category: &Category, amount: u32) -> Result<u64> {
        let mut tx = self.begin().await?;
        let quantity = tx.credit(category, amount).await?;
        tx.commit().await?;
        Ok(quantity)
    }

    /// Debits a category in a transaction of its own.
    async fn debit(&self, category: &Category, amount: u32) -> Result<u64> {
        let mut tx = self.begin().await?;
        let quantity = tx.debit(category, amount).await?;
        tx.commit().await?;
        Ok(quantity)
    }
}

// Blanket implementation for all CatalogStore implementations
impl<T: CatalogStore + ?Sized> CatalogStoreExt for T {}

/// Rejects zero amounts before any ledger row is touched.
pub fn validate_amount(amount: u32) -> Result<()> {
    if amount == 0 {
        return Err(CatalogError::InvalidAmount(amount));
    }
    Ok(())
}
