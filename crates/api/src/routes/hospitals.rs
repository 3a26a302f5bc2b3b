//! Hospital registration endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use catalog::CatalogStore;
use domain::RegisterHospital;

use super::{AppState, CreatedResponse};
use crate::error::ApiError;

/// POST /api/hospitals
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RegisterHospital>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(cmd) = payload?;
    let hospital = state.registration.register_hospital(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Hospital added".to_string(),
            id: hospital.id.as_i64(),
        }),
    ))
}
