//! Inventory listing endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use catalog::{CatalogStore, InventoryLevel, Ledger};
use serde::Deserialize;

use super::{AppState, DataResponse};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    #[serde(rename = "type")]
    pub ledger: Option<String>,
}

/// GET /api/inventory?type=Blood_Inventory|Organ_Inventory
#[tracing::instrument(skip(state, query))]
pub async fn list<S: CatalogStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<InventoryQuery>, QueryRejection>,
) -> Result<Json<DataResponse<Vec<InventoryLevel>>>, ApiError> {
    let Query(query) = query?;
    let selector = query
        .ledger
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(Ledger::Blood.as_str());

    let data = state.reports.inventory(selector).await?;
    Ok(Json(DataResponse { data }))
}
