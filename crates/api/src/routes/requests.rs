//! Request intake, pending listing and fulfillment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use catalog::{CatalogStore, DonationType, PendingRequest, Request};
use common::{HospitalId, RecipientId, RequestId, StaffId};
use domain::{SubmitRequest, resolve_requestor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AppState, CreatedResponse, DataResponse, parse_id, parse_optional_id, parse_quantity};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SubmitRequestBody {
    #[serde(default)]
    pub recipient_id: Value,
    #[serde(default)]
    pub hospital_id: Value,
    #[serde(alias = "type", default)]
    pub request_type: String,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub organ_type: Option<String>,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub request_date: Option<String>,
}

impl SubmitRequestBody {
    fn into_command(self) -> Result<SubmitRequest, ApiError> {
        let recipient_id: Option<RecipientId> = parse_optional_id(&self.recipient_id)
            .map_err(|_| ApiError::BadRequest("Recipient ID must be numeric".to_string()))?;
        let hospital_id: Option<HospitalId> = parse_optional_id(&self.hospital_id)
            .map_err(|_| ApiError::BadRequest("Hospital ID must be numeric".to_string()))?;
        let requestor = resolve_requestor(recipient_id, hospital_id)?;
        let request_type: DonationType = self
            .request_type
            .trim()
            .parse()
            .map_err(|_| ApiError::BadRequest("Request type must be Blood or Organ".to_string()))?;
        let quantity = parse_quantity(&self.quantity, "Quantity must be a whole number")?;

        Ok(SubmitRequest {
            requestor,
            request_type,
            blood_group: self.blood_group,
            organ_type: self.organ_type,
            quantity,
            request_date: self.request_date,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct FulfillBody {
    #[serde(default)]
    pub request_id: Value,
    #[serde(default)]
    pub staff_id: Value,
}

#[derive(Debug, Serialize)]
pub struct FulfillResponse {
    pub message: String,
    pub request: Request,
}

/// POST /api/requests
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<SubmitRequestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(body) = payload?;
    let request = state.intake.submit(body.into_command()?).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Request submitted".to_string(),
            id: request.id.as_i64(),
        }),
    ))
}

/// GET /api/requests/pending
#[tracing::instrument(skip(state))]
pub async fn pending<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DataResponse<Vec<PendingRequest>>>, ApiError> {
    let data = state.reports.pending_requests().await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/requests/fulfill
#[tracing::instrument(skip(state, payload))]
pub async fn fulfill<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<FulfillBody>, JsonRejection>,
) -> Result<Json<FulfillResponse>, ApiError> {
    let Json(body) = payload?;
    let (request_id, staff_id) = match (
        parse_id::<RequestId>(&body.request_id),
        parse_id::<StaffId>(&body.staff_id),
    ) {
        (Ok(request_id), Ok(staff_id)) => (request_id, staff_id),
        _ => {
            return Err(ApiError::BadRequest(
                "Enter numeric Request ID and Staff ID".to_string(),
            ));
        }
    };

    let request = state.fulfillment.fulfill(request_id, staff_id).await?;

    Ok(Json(FulfillResponse {
        message: format!("Request {request_id} fulfilled"),
        request,
    }))
}
