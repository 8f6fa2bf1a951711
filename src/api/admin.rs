//! Admin dashboard.

use axum::extract::State;
use axum::Json;

use super::{ApiResult, AppState};

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let stats = state.orders.dashboard_stats().await?;
    let active_products = state.catalog.active_products().await?.len();
    Ok(Json(serde_json::json!({
        "orders": {
            "total": stats.total_orders,
            "paid": stats.paid_orders,
            "pending": stats.pending_orders,
        },
        "products": active_products,
        "revenue": stats.revenue,
    })))
}
