//! Order handlers: guest checkout, tracking, admin management.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::{actor_id, ApiResult, AppState};
use crate::domain::Order;
use crate::orders::CreateOrderRequest;
use crate::payment::ConfirmationTrigger;
use crate::store::{Page, PageRequest};

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.orders.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.get_by_code(&code).await?))
}

pub async fn track(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.track_by_phone(&phone).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Order>>> {
    let page = PageRequest::clamped(params.page, params.per_page);
    Ok(Json(
        state.orders.list(params.status.as_deref(), page).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(
        state.orders.set_status(&code, &req.status, req.notes).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub reference: Option<String>,
    pub notes: Option<String>,
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ConfirmPaymentRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .payments
        .confirm_payment(
            &code,
            ConfirmationTrigger::Explicit {
                actor_id: actor_id(&headers),
                reference: req.reference,
                notes: req.notes,
            },
        )
        .await?;
    Ok(Json(order))
}
