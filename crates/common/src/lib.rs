pub mod types;

pub use types::{DonationId, DonorId, HospitalId, IdParseError, RecipientId, RequestId, StaffId};
