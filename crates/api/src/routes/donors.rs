//! Donor registration and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use catalog::CatalogStore;
use domain::RegisterDonor;
use projections::DonorSummary;

use super::{AppState, CreatedResponse, DataResponse};
use crate::error::ApiError;

/// POST /api/donors
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RegisterDonor>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(cmd) = payload?;
    let donor = state.registration.register_donor(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Donor added".to_string(),
            id: donor.id.as_i64(),
        }),
    ))
}

/// GET /api/donors: every donor with derived status, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DataResponse<Vec<DonorSummary>>>, ApiError> {
    let data = state.reports.donor_summaries().await?;
    Ok(Json(DataResponse { data }))
}
