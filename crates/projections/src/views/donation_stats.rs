//! Donation statistics: recent daily counts and a breakdown by what was given.

use std::collections::BTreeMap;

use catalog::{Donation, DonationItem};
use chrono::{Days, NaiveDate};
use serde::Serialize;

/// How far back the daily counts reach. The window starts this many days
/// before today and has no upper bound, so future-dated donations count.
pub const DAILY_LOOKBACK_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    /// `Blood`, or the organ type for organ donations.
    #[serde(rename = "type")]
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationStats {
    /// Days on or after `today - 7` with at least one donation, oldest first.
    pub daily_counts: Vec<DailyCount>,
    /// Counts over the whole history, ordered by label.
    pub type_distribution: Vec<TypeCount>,
}

impl DonationStats {
    pub fn compute(donations: &[Donation], today: NaiveDate) -> Self {
        let window_start = today
            .checked_sub_days(Days::new(DAILY_LOOKBACK_DAYS))
            .unwrap_or(NaiveDate::MIN);

        let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        let mut by_type: BTreeMap<String, u64> = BTreeMap::new();

        for donation in donations {
            if donation.date >= window_start {
                *daily.entry(donation.date).or_default() += 1;
            }
            let label = match &donation.item {
                DonationItem::Blood { .. } => "Blood".to_string(),
                DonationItem::Organ { organ } => organ.to_string(),
            };
            *by_type.entry(label).or_default() += 1;
        }

        Self {
            daily_counts: daily
                .into_iter()
                .map(|(date, count)| DailyCount { date, count })
                .collect(),
            type_distribution: by_type
                .into_iter()
                .map(|(label, count)| TypeCount { label, count })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::OrganType;
    use common::{DonationId, DonorId};

    fn on(day: u32, item: DonationItem) -> Donation {
        Donation {
            id: DonationId::new(day as i64),
            donor_id: DonorId::new(1),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            item,
            verified_by: None,
        }
    }

    fn organ(name: &str) -> DonationItem {
        DonationItem::Organ {
            organ: OrganType::new(name).unwrap(),
        }
    }

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn window_starts_seven_days_back_and_has_no_upper_bound() {
        let today = day(20);
        let donations = vec![
            on(12, DonationItem::Blood { units: 1 }),
            on(13, DonationItem::Blood { units: 1 }),
            on(14, DonationItem::Blood { units: 1 }),
            on(14, organ("Liver")),
            on(20, DonationItem::Blood { units: 3 }),
            on(25, DonationItem::Blood { units: 1 }),
        ];

        let stats = DonationStats::compute(&donations, today);

        assert_eq!(
            stats.daily_counts,
            vec![
                DailyCount {
                    date: day(13),
                    count: 1
                },
                DailyCount {
                    date: day(14),
                    count: 2
                },
                DailyCount {
                    date: today,
                    count: 1
                },
                DailyCount {
                    date: day(25),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn distribution_groups_organs_by_type() {
        let today = day(20);
        let donations = vec![
            on(1, DonationItem::Blood { units: 2 }),
            on(2, organ("Kidney")),
            on(3, organ("Kidney")),
            on(4, DonationItem::Blood { units: 1 }),
            on(5, organ("Cornea")),
        ];

        let stats = DonationStats::compute(&donations, today);
        let pairs: Vec<(&str, u64)> = stats
            .type_distribution
            .iter()
            .map(|t| (t.label.as_str(), t.count))
            .collect();

        assert_eq!(pairs, vec![("Blood", 2), ("Cornea", 1), ("Kidney", 2)]);
        assert!(stats.daily_counts.is_empty());
    }

    #[test]
    fn type_label_serializes_as_type() {
        let json = serde_json::to_value(TypeCount {
            label: "Blood".into(),
            count: 1,
        })
        .unwrap();
        assert_eq!(json["type"], "Blood");
    }
}
