//! HTTP handlers, grouped by resource.

pub mod donations;
pub mod donors;
pub mod health;
pub mod hospitals;
pub mod inventory;
pub mod metrics;
pub mod recipients;
pub mod requests;
pub mod staff;

use std::str::FromStr;
use std::sync::Arc;

use catalog::CatalogStore;
use common::IdParseError;
use domain::{DonationRecorder, FulfillmentEngine, RegistrationService, RequestIntake};
use projections::ReportingService;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CatalogStore> {
    pub registration: RegistrationService<S>,
    pub donations: DonationRecorder<S>,
    pub intake: RequestIntake<S>,
    pub fulfillment: FulfillmentEngine<S>,
    pub reports: ReportingService<S>,
}

impl<S: CatalogStore + Clone> AppState<S> {
    /// Wires every service to the same store.
    pub fn new(store: S) -> Arc<Self> {
        Arc::new(Self {
            registration: RegistrationService::new(store.clone()),
            donations: DonationRecorder::new(store.clone()),
            intake: RequestIntake::new(store.clone()),
            fulfillment: FulfillmentEngine::new(store.clone()),
            reports: ReportingService::new(store),
        })
    }
}

// -- Shared response types --

/// Body returned by creation endpoints.
#[derive(Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: i64,
}

/// Body returned by list endpoints.
#[derive(Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

// -- Loose JSON field parsing --

/// Reads a row ID sent either as a JSON number or as a string of digits.
pub(crate) fn parse_id<T>(value: &Value) -> Result<T, IdParseError>
where
    T: FromStr<Err = IdParseError>,
{
    match value {
        Value::Number(n) => n.to_string().parse(),
        Value::String(s) => s.trim().parse(),
        other => other.to_string().parse(),
    }
}

/// Like [`parse_id`], but `null`, a missing field or a blank string mean absent.
pub(crate) fn parse_optional_id<T>(value: &Value) -> Result<Option<T>, IdParseError>
where
    T: FromStr<Err = IdParseError>,
{
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        other => parse_id(other).map(Some),
    }
}

/// Reads an integer quantity sent as a JSON number or numeric string.
pub(crate) fn parse_quantity(value: &Value, message: &str) -> Result<Option<i64>, ApiError> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}
