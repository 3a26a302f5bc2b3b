//! Derived donation status of a donor.

use catalog::{Donation, DonationType, Donor};
use serde::Serialize;

/// What a donor is known to give, derived from their donation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DonorStatus {
    Blood,
    Organs,
    #[serde(rename = "Blood & Organs")]
    BloodAndOrgans,
}

impl DonorStatus {
    /// Classifies a donor from the donations recorded against them.
    ///
    /// Organ eligibility only matters for donors with no donations at all: a
    /// donor who has given blood but no organ stays `Blood` even when
    /// eligible.
    pub fn classify<'a>(
        donor: &Donor,
        donations: impl IntoIterator<Item = &'a Donation>,
    ) -> DonorStatus {
        let (mut blood, mut organ) = (false, false);
        for donation in donations {
            match donation.item.donation_type() {
                DonationType::Blood => blood = true,
                DonationType::Organ => organ = true,
            }
        }

        match (blood, organ) {
            (true, true) => DonorStatus::BloodAndOrgans,
            (false, true) => DonorStatus::Organs,
            (true, false) => DonorStatus::Blood,
            (false, false) if donor.organ_eligible => DonorStatus::Organs,
            (false, false) => DonorStatus::Blood,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DonorStatus::Blood => "Blood",
            DonorStatus::Organs => "Organs",
            DonorStatus::BloodAndOrgans => "Blood & Organs",
        }
    }
}

impl std::fmt::Display for DonorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{BloodGroup, DonationItem, OrganType};
    use chrono::NaiveDate;
    use common::{DonationId, DonorId};

    fn donor(organ_eligible: bool) -> Donor {
        Donor {
            id: DonorId::new(1),
            full_name: "Dee".into(),
            gender: None,
            dob: None,
            contact: None,
            email: None,
            medical_history: None,
            organ_eligible,
            blood_group: BloodGroup::OPos,
            address: None,
        }
    }

    fn donation(id: i64, item: DonationItem) -> Donation {
        Donation {
            id: DonationId::new(id),
            donor_id: DonorId::new(1),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            item,
            verified_by: None,
        }
    }

    fn blood() -> DonationItem {
        DonationItem::Blood { units: 1 }
    }

    fn kidney() -> DonationItem {
        DonationItem::Organ {
            organ: OrganType::new("Kidney").unwrap(),
        }
    }

    #[test]
    fn blood_and_organ_donor() {
        let history = [donation(1, blood()), donation(2, kidney())];
        assert_eq!(
            DonorStatus::classify(&donor(false), &history),
            DonorStatus::BloodAndOrgans
        );
    }

    #[test]
    fn eligible_donor_without_donations_is_organs() {
        let none: &[Donation] = &[];
        assert_eq!(DonorStatus::classify(&donor(true), none), DonorStatus::Organs);
    }

    #[test]
    fn default_is_blood() {
        let none: &[Donation] = &[];
        assert_eq!(DonorStatus::classify(&donor(false), none), DonorStatus::Blood);
    }

    #[test]
    fn organ_only_donor() {
        let history = [donation(1, kidney())];
        assert_eq!(
            DonorStatus::classify(&donor(false), &history),
            DonorStatus::Organs
        );
    }

    #[test]
    fn blood_history_outranks_eligibility() {
        let history = [donation(1, blood())];
        assert_eq!(
            DonorStatus::classify(&donor(true), &history),
            DonorStatus::Blood
        );
    }

    #[test]
    fn serializes_display_label() {
        let json = serde_json::to_value(DonorStatus::BloodAndOrgans).unwrap();
        assert_eq!(json, "Blood & Organs");
    }
}
