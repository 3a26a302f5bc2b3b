//! Donation recording and statistics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use catalog::{CatalogStore, Category, DonationType};
use common::{DonorId, StaffId};
use domain::RecordDonation;
use projections::DonationStats;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AppState, DataResponse, parse_id, parse_optional_id, parse_quantity};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RecordDonationBody {
    #[serde(default)]
    pub donor_id: Value,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "type", default)]
    pub donation_type: String,
    #[serde(default)]
    pub organ_type: Option<String>,
    #[serde(alias = "qty", default)]
    pub quantity: Value,
    #[serde(alias = "verified", default)]
    pub verified_by: Value,
}

impl RecordDonationBody {
    fn into_command(self) -> Result<RecordDonation, ApiError> {
        let donor_id: DonorId = parse_id(&self.donor_id)
            .map_err(|_| ApiError::BadRequest("Donor ID must be numeric".to_string()))?;
        // A missing or blank type records blood.
        let donation_type = match self.donation_type.trim() {
            "" => DonationType::Blood,
            other => other
                .parse()
                .map_err(|_| ApiError::BadRequest("Type must be Blood or Organ".to_string()))?,
        };
        let quantity = parse_quantity(&self.quantity, "Quantity must be a whole number")?;
        let verified_by: Option<StaffId> = parse_optional_id(&self.verified_by)
            .map_err(|_| ApiError::BadRequest("Staff ID must be numeric".to_string()))?;

        Ok(RecordDonation {
            donor_id,
            date: self.date,
            donation_type,
            organ_type: self.organ_type,
            quantity,
            verified_by,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DonationCreated {
    pub message: String,
    pub id: i64,
    pub category: Category,
    pub stock: u64,
}

/// POST /api/donations
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RecordDonationBody>, JsonRejection>,
) -> Result<(StatusCode, Json<DonationCreated>), ApiError> {
    let Json(body) = payload?;
    let recorded = state.donations.record(body.into_command()?).await?;

    Ok((
        StatusCode::CREATED,
        Json(DonationCreated {
            message: "Donation recorded".to_string(),
            id: recorded.donation.id.as_i64(),
            category: recorded.category,
            stock: recorded.stock,
        }),
    ))
}

/// GET /api/donations/stats
#[tracing::instrument(skip(state))]
pub async fn stats<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DataResponse<DonationStats>>, ApiError> {
    let data = state.reports.donation_stats().await?;
    Ok(Json(DataResponse { data }))
}
