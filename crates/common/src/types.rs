use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a valid numeric row identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must be numeric, got {value:?}")]
pub struct IdParseError {
    pub kind: &'static str,
    pub value: String,
}

/// Defines a typed wrapper around a database-assigned row identifier.
///
/// Each table gets its own type so a donor ID can never be passed where a
/// staff ID is expected.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Human-readable name of the identified entity.
            pub const KIND: &'static str = $label;

            /// Wraps a raw row identifier.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw row identifier.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_numeric(s)
                    .map(Self)
                    .ok_or_else(|| IdParseError {
                        kind: $label,
                        value: s.to_string(),
                    })
            }
        }
    };
}

/// Accepts only a non-empty run of ASCII digits (no sign, no whitespace).
fn parse_numeric(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

row_id!(
    /// Identifier of a registered donor.
    DonorId,
    "Donor"
);
row_id!(
    /// Identifier of a registered recipient.
    RecipientId,
    "Recipient"
);
row_id!(
    /// Identifier of a staff member.
    StaffId,
    "Staff"
);
row_id!(
    /// Identifier of a hospital that can file requests.
    HospitalId,
    "Hospital"
);
row_id!(
    /// Identifier of a recorded donation.
    DonationId,
    "Donation"
);
row_id!(
    /// Identifier of a blood or organ request.
    RequestId,
    "Request"
);
