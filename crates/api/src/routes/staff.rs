//! Staff registration, listing and login endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use catalog::{CatalogStore, StaffProfile};
use domain::RegisterStaff;
use serde::{Deserialize, Serialize};

use super::{AppState, CreatedResponse, DataResponse};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: StaffProfile,
}

/// POST /api/staff
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RegisterStaff>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(cmd) = payload?;
    let staff = state.registration.register_staff(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Staff registered".to_string(),
            id: staff.id.as_i64(),
        }),
    ))
}

/// GET /api/staff
#[tracing::instrument(skip(state))]
pub async fn list<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DataResponse<Vec<StaffProfile>>>, ApiError> {
    let data = state.reports.staff().await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/login
#[tracing::instrument(skip(state, payload))]
pub async fn login<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(body) = payload?;
    let user = state
        .registration
        .login(&body.username, &body.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user,
    }))
}
