//! Field validation shared by the registration and recording commands.

use catalog::{BloodGroup, OrganType};
use chrono::NaiveDate;
use garde::{Report, Validate};

use crate::error::DomainError;

/// Runs the garde rules of a command and folds the report into one message.
pub fn validate_struct<T>(value: &T) -> Result<(), DomainError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| DomainError::Validation(format_validation_errors(&report)))
}

fn format_validation_errors(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            if path.to_string().is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trims optional text and treats blank input as absent.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a `YYYY-MM-DD` calendar date. `label` names the field in errors.
pub fn parse_date(label: &str, value: &str) -> Result<NaiveDate, DomainError> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });

    if !well_formed {
        return Err(DomainError::Validation(format!(
            "Invalid {label} (expected YYYY-MM-DD)"
        )));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| DomainError::Validation(format!("Invalid {label} (not a calendar date)")))
}

pub fn parse_blood_group(value: &str) -> Result<BloodGroup, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::Validation(format!("Unknown blood group: {value}")))
}

pub fn parse_organ_type(value: &str) -> Result<OrganType, DomainError> {
    OrganType::new(value).map_err(|_| DomainError::Validation("Organ type required".to_string()))
}

/// Converts a client-supplied quantity into a ledger amount.
pub fn positive_quantity(label: &str, value: i64) -> Result<u32, DomainError> {
    u32::try_from(value)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| DomainError::Validation(format!("{label} must be >= 1")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Contact {
        #[garde(length(min = 1))]
        name: String,
        #[garde(email)]
        email: Option<String>,
    }

    #[test]
    fn validate_struct_reports_field() {
        let contact = Contact {
            name: String::new(),
            email: None,
        };
        let err = validate_struct(&contact).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("name")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_struct_skips_absent_optionals() {
        let contact = Contact {
            name: "Ann".to_string(),
            email: None,
        };
        assert!(validate_struct(&contact).is_ok());
    }

    #[test]
    fn dates_must_be_padded_and_real() {
        assert_eq!(
            parse_date("date", "2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("date", "2023-02-29").is_err());
        assert!(parse_date("date", "2024-2-9").is_err());
        assert!(parse_date("date", "29/02/2024").is_err());
        assert!(parse_date("date", "").is_err());
    }

    #[test]
    fn future_dates_are_accepted() {
        assert!(parse_date("date", "2999-12-31").is_ok());
    }

    #[test]
    fn blanks_become_none() {
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some(" x ".into())), Some("x".into()));
        assert_eq!(blank_to_none(None), None);
    }

    #[test]
    fn quantities_must_be_positive() {
        assert_eq!(positive_quantity("qty", 3).unwrap(), 3);
        assert!(positive_quantity("qty", 0).is_err());
        assert!(positive_quantity("qty", -2).is_err());
        assert!(positive_quantity("qty", i64::MAX).is_err());
    }
}
