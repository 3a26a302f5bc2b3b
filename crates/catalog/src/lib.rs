//! Catalog store for the blood bank system.
//!
//! Holds donors, recipients, hospitals, staff, donations, requests and the
//! two inventory ledgers (blood by group, organs by type). Multi-row changes
//! run inside a [`CatalogTx`] obtained from [`CatalogStore::begin`].

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::{CatalogError, Result};
pub use memory::{InMemoryCatalog, InMemoryTx};
pub use model::{
    BloodGroup, Category, Donation, DonationItem, DonationType, Donor, Hospital, InvalidValue,
    InventoryLevel, Ledger, NewDonation, NewDonor, NewHospital, NewRecipient, NewRequest,
    NewStaff, OrganType, PendingRequest, Recipient, Request, RequestStatus, RequestorRef, Staff,
    StaffProfile,
};
pub use postgres::{PostgresCatalog, PostgresTx};
pub use store::{CatalogStore, CatalogStoreExt, CatalogTx};
