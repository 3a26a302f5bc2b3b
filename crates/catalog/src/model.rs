//! Rows held by the catalog and the value types they are built from.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use common::{DonationId, DonorId, HospitalId, RecipientId, RequestId, StaffId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string that does not name any variant of a catalog enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}: {value:?}")]
pub struct InvalidValue {
    pub field: &'static str,
    pub value: String,
}

impl InvalidValue {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// ABO/Rh blood group, the key of the blood inventory ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BloodGroup {
    APos,
    ANeg,
    BPos,
    BNeg,
    AbPos,
    AbNeg,
    OPos,
    ONeg,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APos,
        BloodGroup::ANeg,
        BloodGroup::BPos,
        BloodGroup::BNeg,
        BloodGroup::AbPos,
        BloodGroup::AbNeg,
        BloodGroup::OPos,
        BloodGroup::ONeg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APos => "A+",
            BloodGroup::ANeg => "A-",
            BloodGroup::BPos => "B+",
            BloodGroup::BNeg => "B-",
            BloodGroup::AbPos => "AB+",
            BloodGroup::AbNeg => "AB-",
            BloodGroup::OPos => "O+",
            BloodGroup::ONeg => "O-",
        }
    }
}

impl std::fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        BloodGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == normalized)
            .ok_or_else(|| InvalidValue::new("blood group", s))
    }
}

impl TryFrom<String> for BloodGroup {
    type Error = InvalidValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodGroup> for String {
    fn from(group: BloodGroup) -> Self {
        group.as_str().to_string()
    }
}

/// Organ type, the key of the organ inventory ledger (`Kidney`, `Liver`, ...).
///
/// Always non-empty and title-cased word by word, so `kidney`, ` KIDNEY ` and
/// `Kidney` share one ledger row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrganType(String);

impl OrganType {
    pub fn new(name: impl AsRef<str>) -> Result<Self, InvalidValue> {
        let words: Vec<String> = name
            .as_ref()
            .split_whitespace()
            .map(title_case)
            .collect();
        if words.is_empty() {
            return Err(InvalidValue::new("organ type", name.as_ref()));
        }
        Ok(Self(words.join(" ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

impl std::fmt::Display for OrganType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrganType {
    type Error = InvalidValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OrganType::new(value)
    }
}

impl From<OrganType> for String {
    fn from(organ: OrganType) -> Self {
        organ.0
    }
}

/// Which of the two inventory ledgers a category lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ledger {
    Blood,
    Organ,
}

impl Ledger {
    /// The selector string accepted by the inventory listing.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ledger::Blood => "Blood_Inventory",
            Ledger::Organ => "Organ_Inventory",
        }
    }
}

impl FromStr for Ledger {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Blood_Inventory" => Ok(Ledger::Blood),
            "Organ_Inventory" => Ok(Ledger::Organ),
            _ => Err(InvalidValue::new("inventory type", s)),
        }
    }
}

/// A key into one of the inventory ledgers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "key")]
pub enum Category {
    Blood(BloodGroup),
    Organ(OrganType),
}

impl Category {
    pub fn ledger(&self) -> Ledger {
        match self {
            Category::Blood(_) => Ledger::Blood,
            Category::Organ(_) => Ledger::Organ,
        }
    }

    /// The ledger key as stored.
    pub fn key(&self) -> &str {
        match self {
            Category::Blood(group) => group.as_str(),
            Category::Organ(organ) => organ.as_str(),
        }
    }

    pub fn kind(&self) -> DonationType {
        match self {
            Category::Blood(_) => DonationType::Blood,
            Category::Organ(_) => DonationType::Organ,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Whether a donation or request concerns blood or an organ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DonationType {
    Blood,
    Organ,
}

impl DonationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationType::Blood => "Blood",
            DonationType::Organ => "Organ",
        }
    }
}

impl std::fmt::Display for DonationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationType {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Blood" => Ok(DonationType::Blood),
            "Organ" => Ok(DonationType::Organ),
            _ => Err(InvalidValue::new("donation type", s)),
        }
    }
}

/// Lifecycle state of a request.
///
/// ```text
/// Pending ──► Fulfilled
///    │
///    ├──────► Cancelled
///    └──────► Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RequestStatus {
    #[default]
    Pending,
    Fulfilled,
    Cancelled,
    Rejected,
}

impl RequestStatus {
    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Fulfilled => "Fulfilled",
            RequestStatus::Cancelled => "Cancelled",
            RequestStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Fulfilled" => Ok(RequestStatus::Fulfilled),
            "Cancelled" => Ok(RequestStatus::Cancelled),
            "Rejected" => Ok(RequestStatus::Rejected),
            _ => Err(InvalidValue::new("request status", s)),
        }
    }
}

/// Who filed a request: a registered recipient or a hospital, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum RequestorRef {
    Recipient(RecipientId),
    Hospital(HospitalId),
}

impl RequestorRef {
    pub fn kind(&self) -> &'static str {
        match self {
            RequestorRef::Recipient(_) => "Recipient",
            RequestorRef::Hospital(_) => "Hospital",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Donor {
    pub id: DonorId,
    pub full_name: String,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    pub organ_eligible: bool,
    pub blood_group: BloodGroup,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonor {
    pub full_name: String,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    pub organ_eligible: bool,
    pub blood_group: BloodGroup,
    pub address: Option<String>,
}

impl NewDonor {
    pub(crate) fn into_row(self, id: DonorId) -> Donor {
        Donor {
            id,
            full_name: self.full_name,
            gender: self.gender,
            dob: self.dob,
            contact: self.contact,
            email: self.email,
            medical_history: self.medical_history,
            organ_eligible: self.organ_eligible,
            blood_group: self.blood_group,
            address: self.address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub full_name: String,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub medical_condition: Option<String>,
    pub required_organ: Option<OrganType>,
    pub required_blood_group: Option<BloodGroup>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipient {
    pub full_name: String,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub medical_condition: Option<String>,
    pub required_organ: Option<OrganType>,
    pub required_blood_group: Option<BloodGroup>,
    pub address: Option<String>,
}

impl NewRecipient {
    pub(crate) fn into_row(self, id: RecipientId) -> Recipient {
        Recipient {
            id,
            full_name: self.full_name,
            gender: self.gender,
            dob: self.dob,
            contact: self.contact,
            email: self.email,
            medical_condition: self.medical_condition,
            required_organ: self.required_organ,
            required_blood_group: self.required_blood_group,
            address: self.address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub address: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHospital {
    pub name: String,
    pub address: Option<String>,
    pub contact: Option<String>,
}

/// A staff row, including the stored password hash.
///
/// Deliberately not `Serialize`: use [`Staff::profile`] for anything that
/// leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staff {
    pub id: StaffId,
    pub full_name: String,
    pub role: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub username: String,
    pub password_hash: String,
}

impl Staff {
    pub fn profile(&self) -> StaffProfile {
        StaffProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            role: self.role.clone(),
            contact: self.contact.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }
}

/// Staff row without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffProfile {
    pub id: StaffId,
    pub full_name: String,
    pub role: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStaff {
    pub full_name: String,
    pub role: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub username: String,
    pub password_hash: String,
}

/// What was donated. Organ donations are always a single organ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum DonationItem {
    Blood { units: u32 },
    Organ { organ: OrganType },
}

impl DonationItem {
    pub fn donation_type(&self) -> DonationType {
        match self {
            DonationItem::Blood { .. } => DonationType::Blood,
            DonationItem::Organ { .. } => DonationType::Organ,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            DonationItem::Blood { units } => *units,
            DonationItem::Organ { .. } => 1,
        }
    }

    pub fn organ_type(&self) -> Option<&OrganType> {
        match self {
            DonationItem::Blood { .. } => None,
            DonationItem::Organ { organ } => Some(organ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Donation {
    pub id: DonationId,
    pub donor_id: DonorId,
    pub date: NaiveDate,
    pub item: DonationItem,
    pub verified_by: Option<StaffId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonation {
    pub donor_id: DonorId,
    pub date: NaiveDate,
    pub item: DonationItem,
    pub verified_by: Option<StaffId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub id: RequestId,
    pub requestor: RequestorRef,
    pub need: Category,
    pub quantity: u32,
    pub requested_on: NaiveDate,
    pub status: RequestStatus,
    pub fulfilled_by: Option<StaffId>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub requestor: RequestorRef,
    pub need: Category,
    pub quantity: u32,
    pub requested_on: NaiveDate,
}

impl NewRequest {
    pub(crate) fn into_row(self, id: RequestId) -> Request {
        Request {
            id,
            requestor: self.requestor,
            need: self.need,
            quantity: self.quantity,
            requested_on: self.requested_on,
            status: RequestStatus::Pending,
            fulfilled_by: None,
            fulfilled_at: None,
        }
    }
}

/// A pending request joined with the display name of whoever filed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRequest {
    #[serde(flatten)]
    pub request: Request,
    pub requestor_name: Option<String>,
}

/// Current stock of one ledger category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryLevel {
    pub category: Category,
    pub quantity: u64,
    pub last_updated: DateTime<Utc>,
}
