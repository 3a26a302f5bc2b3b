//! Recipient registration endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use catalog::CatalogStore;
use domain::RegisterRecipient;

use super::{AppState, CreatedResponse};
use crate::error::ApiError;

/// POST /api/recipients
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RegisterRecipient>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(cmd) = payload?;
    let recipient = state.registration.register_recipient(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Recipient added".to_string(),
            id: recipient.id.as_i64(),
        }),
    ))
}
