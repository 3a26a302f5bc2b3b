//! Domain layer for the blood and organ bank.
//!
//! This crate provides the write-side services:
//! - Registration of donors, recipients, hospitals and staff, plus staff login
//! - Donation recording, which credits inventory atomically
//! - Request intake
//! - The fulfillment engine, which debits inventory and closes requests
//!
//! All services are generic over a [`catalog::CatalogStore`].

pub mod credentials;
pub mod donation;
pub mod error;
pub mod fulfillment;
pub mod intake;
pub mod registration;
pub mod validation;

pub use credentials::{Argon2PasswordService, PasswordService};
pub use donation::{DonationRecorder, RecordDonation, RecordedDonation};
pub use error::DomainError;
pub use fulfillment::FulfillmentEngine;
pub use intake::{RequestIntake, SubmitRequest, resolve_requestor};
pub use registration::{
    RegisterDonor, RegisterHospital, RegisterRecipient, RegisterStaff, RegistrationService,
};
