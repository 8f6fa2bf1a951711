//! Product catalog handlers.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{actor_id, ApiError, ApiResult, AppState};
use crate::domain::{Product, ProductCategory, ProductVariant};
use crate::notify::currency_symbol;
use crate::store::{Page, PageRequest, ProductFilter};
use crate::CommerceError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Product>>> {
    let filter = ProductFilter {
        category: params
            .category
            .as_deref()
            .map(ProductCategory::parse)
            .transpose()?,
        search: params.search,
    };
    let page = PageRequest::clamped(params.page, params.per_page);
    Ok(Json(state.catalog.list_products(&filter, page).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    state
        .catalog
        .find_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError(CommerceError::ProductNotFound(id)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    pub price: Decimal,
    pub price_display: Option<String>,
    #[validate(length(min = 1))]
    pub image: String,
    pub category: Option<ProductCategory>,
    pub variants: Option<Vec<ProductVariant>>,
    /// Initial stock. Later changes go through the inventory endpoints so
    /// they land in the ledger.
    pub stock: Option<i64>,
    pub low_stock_threshold: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    req.validate()
        .map_err(|e| CommerceError::Validation(e.to_string()))?;
    if req.price.is_sign_negative() {
        return Err(CommerceError::Validation("price cannot be negative".to_string()).into());
    }
    if req.stock.is_some_and(|s| s < 0) {
        return Err(CommerceError::Validation("stock cannot be negative".to_string()).into());
    }

    let now = Utc::now();
    let product = Product {
        id: Uuid::now_v7(),
        price_display: req.price_display.unwrap_or_else(|| {
            format!("{} {:.2}", currency_symbol(&state.currency), req.price)
        }),
        title: req.title,
        description: req.description,
        price: req.price,
        image: req.image,
        category: req.category.unwrap_or_default(),
        variants: req.variants.unwrap_or_default(),
        stock: req.stock.unwrap_or(0),
        low_stock_threshold: req.low_stock_threshold.unwrap_or(10),
        rating: 0.0,
        active: true,
        created_by: actor_id(&headers),
        created_at: now,
        updated_at: now,
    };
    state.catalog.insert_product(&product).await?;
    tracing::info!(product = %product.title, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub price_display: Option<String>,
    pub image: Option<String>,
    pub category: Option<ProductCategory>,
    pub variants: Option<Vec<ProductVariant>>,
    pub low_stock_threshold: Option<i64>,
    pub active: Option<bool>,
}

/// Catalog edits. Stock is deliberately absent: use the inventory endpoints.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    req.validate()
        .map_err(|e| CommerceError::Validation(e.to_string()))?;
    if req.price.is_some_and(|p| p.is_sign_negative()) {
        return Err(CommerceError::Validation("price cannot be negative".to_string()).into());
    }

    let mut product = state
        .catalog
        .find_product(id)
        .await?
        .ok_or(CommerceError::ProductNotFound(id))?;
    if let Some(title) = req.title {
        product.title = title;
    }
    if let Some(description) = req.description {
        product.description = description;
    }
    if let Some(price) = req.price {
        product.price = price;
    }
    if let Some(price_display) = req.price_display {
        product.price_display = price_display;
    }
    if let Some(image) = req.image {
        product.image = image;
    }
    if let Some(category) = req.category {
        product.category = category;
    }
    if let Some(variants) = req.variants {
        product.variants = variants;
    }
    if let Some(threshold) = req.low_stock_threshold {
        product.low_stock_threshold = threshold;
    }
    if let Some(active) = req.active {
        product.active = active;
    }
    product.updated_at = Utc::now();
    state.catalog.save_product(&product).await?;
    Ok(Json(product))
}

/// Soft delete: orders keep their snapshots, the ledger keeps its history.
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut product = state
        .catalog
        .find_product(id)
        .await?
        .ok_or(CommerceError::ProductNotFound(id))?;
    product.active = false;
    product.updated_at = Utc::now();
    state.catalog.save_product(&product).await?;
    Ok(StatusCode::NO_CONTENT)
}
