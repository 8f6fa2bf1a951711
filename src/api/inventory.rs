//! Inventory handlers: stock levels, ledger queries, restock and adjustment.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{actor_id, ApiResult, AppState};
use crate::domain::{ChangeContext, ChangeReason, InventoryLogEntry, Product};
use crate::inventory::InventorySummary;
use crate::store::{LedgerFilter, Page, PageRequest};

pub async fn stock_levels(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.inventory.stock_levels().await?))
}

pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<InventorySummary>> {
    Ok(Json(state.inventory.summary().await?))
}

#[derive(Debug, Deserialize)]
pub struct LogParams {
    pub reason: Option<String>,
    pub product_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn logs(
    State(state): State<AppState>,
    Query(params): Query<LogParams>,
) -> ApiResult<Json<Page<InventoryLogEntry>>> {
    let filter = LedgerFilter {
        reason: params
            .reason
            .as_deref()
            .map(ChangeReason::parse)
            .transpose()?,
        product_id: params.product_id,
    };
    let page = PageRequest::clamped(params.page, params.per_page);
    Ok(Json(state.inventory.logs(&filter, page).await?))
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub product_id: Uuid,
    pub quantity: i64,
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

pub async fn restock(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RestockRequest>,
) -> ApiResult<Json<InventoryLogEntry>> {
    let note = req
        .notes
        .or_else(|| req.supplier.map(|s| format!("Restock from {s}")));
    let entry = state
        .inventory
        .restock(
            req.product_id,
            req.quantity,
            ChangeContext {
                order_code: None,
                actor_id: actor_id(&headers),
                note,
            },
        )
        .await?;
    Ok(Json(entry))
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub product_id: Uuid,
    pub new_quantity: i64,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

pub async fn adjust(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AdjustRequest>,
) -> ApiResult<Json<InventoryLogEntry>> {
    let reason = req
        .reason
        .as_deref()
        .map(ChangeReason::parse)
        .transpose()?;
    let entry = state
        .inventory
        .adjust(
            req.product_id,
            req.new_quantity,
            reason,
            ChangeContext {
                order_code: None,
                actor_id: actor_id(&headers),
                note: req.notes,
            },
        )
        .await?;
    Ok(Json(entry))
}
