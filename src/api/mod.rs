//! HTTP surface.
//!
//! Thin axum handlers over the core services; no business rules live here.

mod admin;
mod inventory;
mod orders;
mod products;
mod whatsapp;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::inventory::InventoryService;
use crate::notify::NotificationSink;
use crate::orders::OrderService;
use crate::payment::PaymentService;
use crate::store::CatalogStore;
use crate::CommerceError;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<OrderService>,
    pub inventory: Arc<InventoryService>,
    pub payments: Arc<PaymentService>,
    pub notifier: Arc<dyn NotificationSink>,
    pub currency: String,
    pub whatsapp_verify_token: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-orders"})) }),
        )
        .route("/api/v1/products", get(products::list).post(products::create))
        .route(
            "/api/v1/products/:id",
            get(products::get).put(products::update).delete(products::deactivate),
        )
        .route("/api/v1/orders", post(orders::create))
        .route("/api/v1/orders/:code", get(orders::get))
        .route("/api/v1/orders/track/:phone", get(orders::track))
        .route("/api/v1/admin/orders", get(orders::list))
        .route("/api/v1/admin/orders/:code/status", put(orders::set_status))
        .route(
            "/api/v1/admin/orders/:code/confirm-payment",
            post(orders::confirm_payment),
        )
        .route("/api/v1/admin/dashboard", get(admin::dashboard))
        .route("/api/v1/inventory/stock-levels", get(inventory::stock_levels))
        .route("/api/v1/inventory/summary", get(inventory::summary))
        .route("/api/v1/inventory/logs", get(inventory::logs))
        .route("/api/v1/inventory/restock", post(inventory::restock))
        .route("/api/v1/inventory/adjust", post(inventory::adjust))
        .route(
            "/api/v1/whatsapp/webhook",
            get(whatsapp::verify).post(whatsapp::receive),
        )
        .route(
            "/api/v1/whatsapp/orders/:code/send",
            post(whatsapp::send_order_message),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ApiError(pub CommerceError);

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CommerceError::Validation(_)
            | CommerceError::OutOfStock { .. }
            | CommerceError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            CommerceError::ProductNotFound(_) | CommerceError::OrderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CommerceError::InvalidTransition { .. } | CommerceError::AlreadyConfirmed => {
                StatusCode::CONFLICT
            }
            CommerceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Optional admin attribution supplied by the auth layer in front of us.
fn actor_id(headers: &axum::http::HeaderMap) -> Option<uuid::Uuid> {
    headers
        .get("x-admin-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
