//! Persistence collaborators.
//!
//! The core services talk to these traits only. [`postgres::PgStore`] backs
//! the running service; [`memory::MemoryStore`] backs tests and local
//! development without a database.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    ChangeReason, InventoryLogEntry, Order, OrderStatus, Product, ProductCategory,
};
use crate::Result;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn clamped(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub search: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LedgerFilter {
    pub reason: Option<ChangeReason>,
    pub product_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub paid_orders: i64,
    pub pending_orders: i64,
    pub revenue: Decimal,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
    async fn list_products(&self, filter: &ProductFilter, page: PageRequest)
        -> Result<Page<Product>>;
    async fn active_products(&self) -> Result<Vec<Product>>;
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn save_product(&self, product: &Product) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<()>;
    async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>>;
    /// All orders for a phone number, newest first. Phone comparison is
    /// digits-only on both sides.
    async fn orders_by_phone(&self, phone: &str) -> Result<Vec<Order>>;
    async fn latest_order_for_phone(&self, phone: &str) -> Result<Option<Order>>;
    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>>;
    async fn update_order(&self, order: &Order) -> Result<()>;
    /// Atomically advances the per-month order sequence and returns the new
    /// value. Never reuses or skips numbers within a month.
    async fn next_order_sequence(&self, year: i32, month: u32) -> Result<u32>;
    /// Compare-and-swap `payment_status` from unpaid to paid. Returns true
    /// for the single caller that wins the swap.
    async fn claim_payment(&self, order_id: Uuid) -> Result<bool>;
    async fn dashboard_stats(&self) -> Result<DashboardStats>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append_entry(&self, entry: &InventoryLogEntry) -> Result<()>;
    async fn query_entries(
        &self,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryLogEntry>>;
}
