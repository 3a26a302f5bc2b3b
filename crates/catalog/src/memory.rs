use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{DonationId, DonorId, HospitalId, RecipientId, RequestId, StaffId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Category, CatalogError, Donation, Donor, Hospital, InventoryLevel, Ledger, NewDonation,
    NewDonor, NewHospital, NewRecipient, NewRequest, NewStaff, PendingRequest, Recipient, Request,
    RequestStatus, RequestorRef, Result, Staff,
    store::{CatalogStore, CatalogTx, validate_amount},
};

#[derive(Debug, Default)]
struct CatalogState {
    donors: BTreeMap<DonorId, Donor>,
    recipients: BTreeMap<RecipientId, Recipient>,
    hospitals: BTreeMap<HospitalId, Hospital>,
    staff: BTreeMap<StaffId, Staff>,
    donations: BTreeMap<DonationId, Donation>,
    requests: BTreeMap<RequestId, Request>,
    inventory: BTreeMap<Category, (u64, DateTime<Utc>)>,
    last_id: i64,
}

impl CatalogState {
    /// IDs are drawn from one sequence shared by all tables.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn requestor_exists(&self, requestor: RequestorRef) -> bool {
        match requestor {
            RequestorRef::Recipient(id) => self.recipients.contains_key(&id),
            RequestorRef::Hospital(id) => self.hospitals.contains_key(&id),
        }
    }

    fn requestor_name(&self, requestor: RequestorRef) -> Option<String> {
        match requestor {
            RequestorRef::Recipient(id) => self.recipients.get(&id).map(|r| r.full_name.clone()),
            RequestorRef::Hospital(id) => self.hospitals.get(&id).map(|h| h.name.clone()),
        }
    }

    fn stock(&self, category: &Category) -> u64 {
        self.inventory.get(category).map(|(q, _)| *q).unwrap_or(0)
    }
}

/// In-memory catalog store for tests and local runs.
///
/// The whole catalog sits behind one async mutex. A transaction holds that
/// mutex from `begin` until it is committed or dropped, so transactions are
/// fully serialized. Writes go straight to the shared state and are journaled;
/// dropping an uncommitted transaction replays the journal backwards.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl InMemoryCatalog {
    /// Creates a new empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of donations stored.
    pub async fn donation_count(&self) -> usize {
        self.state.lock().await.donations.len()
    }
}

/// Prior value of one key touched by a transaction.
#[derive(Debug)]
enum Undo {
    LastId(i64),
    Donation(DonationId),
    Inventory(Category, Option<(u64, DateTime<Utc>)>),
    Request(Request),
}

/// Transaction over an [`InMemoryCatalog`].
pub struct InMemoryTx {
    guard: OwnedMutexGuard<CatalogState>,
    journal: Vec<Undo>,
}

impl InMemoryTx {
    fn next_id(&mut self) -> i64 {
        self.journal.push(Undo::LastId(self.guard.last_id));
        self.guard.next_id()
    }

    fn touch_inventory(&mut self, category: &Category) {
        let prior = self.guard.inventory.get(category).copied();
        self.journal.push(Undo::Inventory(category.clone(), prior));
    }
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        let state = &mut *self.guard;
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::LastId(id) => state.last_id = id,
                Undo::Donation(id) => {
                    state.donations.remove(&id);
                }
                Undo::Inventory(category, Some(prior)) => {
                    state.inventory.insert(category, prior);
                }
                Undo::Inventory(category, None) => {
                    state.inventory.remove(&category);
                }
                Undo::Request(prior) => {
                    state.requests.insert(prior.id, prior);
                }
            }
        }
    }
}

#[async_trait]
impl CatalogTx for InMemoryTx {
    async fn get_donor(&mut self, id: DonorId) -> Result<Option<Donor>> {
        Ok(self.guard.donors.get(&id).cloned())
    }

    async fn staff_exists(&mut self, id: StaffId) -> Result<bool> {
        Ok(self.guard.staff.contains_key(&id))
    }

    async fn lock_request(&mut self, id: RequestId) -> Result<Option<Request>> {
        // The store-wide mutex is already held for the life of the transaction.
        Ok(self.guard.requests.get(&id).cloned())
    }

    async fn insert_donation(&mut self, donation: NewDonation) -> Result<Donation> {
        if !self.guard.donors.contains_key(&donation.donor_id) {
            return Err(CatalogError::MissingReference(format!(
                "donor {}",
                donation.donor_id
            )));
        }
        if let Some(staff_id) = donation.verified_by {
            if !self.guard.staff.contains_key(&staff_id) {
                return Err(CatalogError::MissingReference(format!("staff {staff_id}")));
            }
        }

        let id = DonationId::new(self.next_id());
        let row = Donation {
            id,
            donor_id: donation.donor_id,
            date: donation.date,
            item: donation.item,
            verified_by: donation.verified_by,
        };
        self.journal.push(Undo::Donation(id));
        self.guard.donations.insert(id, row.clone());
        Ok(row)
    }

    async fn credit(&mut self, category: &Category, amount: u32) -> Result<u64> {
        validate_amount(amount)?;
        self.touch_inventory(category);
        let entry = self
            .guard
            .inventory
            .entry(category.clone())
            .or_insert((0, Utc::now()));
        entry.0 += u64::from(amount);
        entry.1 = Utc::now();
        Ok(entry.0)
    }

    async fn debit(&mut self, category: &Category, amount: u32) -> Result<u64> {
        validate_amount(amount)?;
        let available = self.guard.stock(category);
        let requested = u64::from(amount);
        if available < requested {
            return Err(CatalogError::InsufficientStock {
                category: category.to_string(),
                requested: amount,
                available,
            });
        }

        let remaining = available - requested;
        self.touch_inventory(category);
        self.guard
            .inventory
            .insert(category.clone(), (remaining, Utc::now()));
        Ok(remaining)
    }

    async fn mark_fulfilled(
        &mut self,
        id: RequestId,
        staff_id: StaffId,
        at: DateTime<Utc>,
    ) -> Result<Option<Request>> {
        if !self.guard.staff.contains_key(&staff_id) {
            return Err(CatalogError::MissingReference(format!("staff {staff_id}")));
        }
        let Some(request) = self.guard.requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != RequestStatus::Pending {
            return Ok(None);
        }

        let prior = request.clone();
        request.status = RequestStatus::Fulfilled;
        request.fulfilled_by = Some(staff_id);
        request.fulfilled_at = Some(at);
        let updated = request.clone();
        self.journal.push(Undo::Request(prior));
        Ok(Some(updated))
    }

    async fn commit(mut self) -> Result<()> {
        self.journal.clear();
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        Ok(InMemoryTx {
            guard,
            journal: Vec::new(),
        })
    }

    async fn insert_donor(&self, donor: NewDonor) -> Result<Donor> {
        let mut state = self.state.lock().await;
        let id = DonorId::new(state.next_id());
        let row = donor.into_row(id);
        state.donors.insert(id, row.clone());
        Ok(row)
    }

    async fn insert_recipient(&self, recipient: NewRecipient) -> Result<Recipient> {
        let mut state = self.state.lock().await;
        let id = RecipientId::new(state.next_id());
        let row = recipient.into_row(id);
        state.recipients.insert(id, row.clone());
        Ok(row)
    }

    async fn insert_hospital(&self, hospital: NewHospital) -> Result<Hospital> {
        let mut state = self.state.lock().await;
        let id = HospitalId::new(state.next_id());
        let row = Hospital {
            id,
            name: hospital.name,
            address: hospital.address,
            contact: hospital.contact,
        };
        state.hospitals.insert(id, row.clone());
        Ok(row)
    }

    async fn insert_staff(&self, staff: NewStaff) -> Result<Staff> {
        let mut state = self.state.lock().await;

        // Mirrors the unique constraints of the PostgreSQL schema.
        if state.staff.values().any(|s| s.username == staff.username) {
            return Err(CatalogError::Duplicate("staff_username_key".to_string()));
        }
        if staff.email.is_some() && state.staff.values().any(|s| s.email == staff.email) {
            return Err(CatalogError::Duplicate("staff_email_key".to_string()));
        }

        let id = StaffId::new(state.next_id());
        let row = Staff {
            id,
            full_name: staff.full_name,
            role: staff.role,
            contact: staff.contact,
            email: staff.email,
            username: staff.username,
            password_hash: staff.password_hash,
        };
        state.staff.insert(id, row.clone());
        Ok(row)
    }

    async fn insert_request(&self, request: NewRequest) -> Result<Request> {
        let mut state = self.state.lock().await;
        if !state.requestor_exists(request.requestor) {
            return Err(CatalogError::MissingReference(format!(
                "{} requestor",
                request.requestor.kind()
            )));
        }

        let id = RequestId::new(state.next_id());
        let row = request.into_row(id);
        state.requests.insert(id, row.clone());
        Ok(row)
    }

    async fn get_donor(&self, id: DonorId) -> Result<Option<Donor>> {
        Ok(self.state.lock().await.donors.get(&id).cloned())
    }

    async fn get_recipient(&self, id: RecipientId) -> Result<Option<Recipient>> {
        Ok(self.state.lock().await.recipients.get(&id).cloned())
    }

    async fn get_hospital(&self, id: HospitalId) -> Result<Option<Hospital>> {
        Ok(self.state.lock().await.hospitals.get(&id).cloned())
    }

    async fn get_staff(&self, id: StaffId) -> Result<Option<Staff>> {
        Ok(self.state.lock().await.staff.get(&id).cloned())
    }

    async fn get_staff_by_username(&self, username: &str) -> Result<Option<Staff>> {
        let state = self.state.lock().await;
        Ok(state
            .staff
            .values()
            .find(|s| s.username == username)
            .cloned())
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<Request>> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn list_donors(&self) -> Result<Vec<Donor>> {
        let state = self.state.lock().await;
        Ok(state.donors.values().rev().cloned().collect())
    }

    async fn list_staff(&self) -> Result<Vec<Staff>> {
        let state = self.state.lock().await;
        Ok(state.staff.values().rev().cloned().collect())
    }

    async fn list_donations(&self) -> Result<Vec<Donation>> {
        let state = self.state.lock().await;
        Ok(state.donations.values().cloned().collect())
    }

    async fn donations_for_donor(&self, donor_id: DonorId) -> Result<Vec<Donation>> {
        let state = self.state.lock().await;
        Ok(state
            .donations
            .values()
            .filter(|d| d.donor_id == donor_id)
            .cloned()
            .collect())
    }

    async fn list_pending_requests(&self) -> Result<Vec<PendingRequest>> {
        let state = self.state.lock().await;
        let mut pending: Vec<_> = state
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .map(|r| PendingRequest {
                request: r.clone(),
                requestor_name: state.requestor_name(r.requestor),
            })
            .collect();
        pending.sort_by(|a, b| {
            a.request
                .requested_on
                .cmp(&b.request.requested_on)
                .then(a.request.id.cmp(&b.request.id))
        });
        Ok(pending)
    }

    async fn inventory(&self, ledger: Ledger) -> Result<Vec<InventoryLevel>> {
        let state = self.state.lock().await;
        Ok(state
            .inventory
            .iter()
            .filter(|(category, _)| category.ledger() == ledger)
            .map(|(category, (quantity, last_updated))| InventoryLevel {
                category: category.clone(),
                quantity: *quantity,
                last_updated: *last_updated,
            })
            .collect())
    }

    async fn stock_level(&self, category: &Category) -> Result<u64> {
        Ok(self.state.lock().await.stock(category))
    }
}
