//! Inventory ledger service.
//!
//! Stock is only ever mutated here: every change reads the current quantity,
//! appends an immutable ledger entry and writes the new quantity back, all
//! under a per-product lock so concurrent changes to the same product are
//! linearized. Deductions floor at zero; the ledger keeps the requested delta
//! (see [`InventoryLogEntry::change`]).

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{ChangeContext, ChangeReason, InventoryLogEntry, Product};
use crate::store::{CatalogStore, LedgerFilter, LedgerStore, Page, PageRequest};
use crate::{CommerceError, Result};

pub struct InventoryService {
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn LedgerStore>,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StockAlert {
    pub id: Uuid,
    pub title: String,
    pub stock: i64,
    pub threshold: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct InventorySummary {
    pub total_products: usize,
    pub total_inventory_value: Decimal,
    pub low_stock_items: Vec<StockAlert>,
    pub out_of_stock_items: Vec<StockAlert>,
}

impl InventoryService {
    pub fn new(catalog: Arc<dyn CatalogStore>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            catalog,
            ledger,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, product_id: Uuid) -> Arc<Mutex<()>> {
        self.locks.entry(product_id).or_default().value().clone()
    }

    async fn load(&self, product_id: Uuid) -> Result<Product> {
        self.catalog
            .find_product(product_id)
            .await?
            .ok_or(CommerceError::ProductNotFound(product_id))
    }

    /// Applies a signed stock change and returns the appended ledger entry.
    pub async fn apply_change(
        &self,
        product_id: Uuid,
        delta: i64,
        reason: ChangeReason,
        ctx: ChangeContext,
    ) -> Result<InventoryLogEntry> {
        let lock = self.lock_for(product_id);
        let _guard = lock.lock().await;
        let product = self.load(product_id).await?;
        self.commit(product, delta, reason, ctx).await
    }

    /// Adds stock. `quantity` must be positive.
    pub async fn restock(
        &self,
        product_id: Uuid,
        quantity: i64,
        ctx: ChangeContext,
    ) -> Result<InventoryLogEntry> {
        if quantity <= 0 {
            return Err(CommerceError::Validation(
                "restock quantity must be positive".to_string(),
            ));
        }
        self.apply_change(product_id, quantity, ChangeReason::Restock, ctx)
            .await
    }

    /// Sets stock to an absolute value; the ledger entry records the
    /// difference against the current quantity.
    pub async fn adjust(
        &self,
        product_id: Uuid,
        new_quantity: i64,
        reason: Option<ChangeReason>,
        ctx: ChangeContext,
    ) -> Result<InventoryLogEntry> {
        if new_quantity < 0 {
            return Err(CommerceError::Validation(
                "stock quantity cannot be negative".to_string(),
            ));
        }
        let lock = self.lock_for(product_id);
        let _guard = lock.lock().await;
        let product = self.load(product_id).await?;
        let delta = new_quantity - product.stock;
        self.commit(
            product,
            delta,
            reason.unwrap_or(ChangeReason::ManualAdjustment),
            ctx,
        )
        .await
    }

    // Caller holds the product lock.
    async fn commit(
        &self,
        mut product: Product,
        delta: i64,
        reason: ChangeReason,
        ctx: ChangeContext,
    ) -> Result<InventoryLogEntry> {
        let now = Utc::now();
        let entry = InventoryLogEntry::record(&product, delta, reason, ctx, now);
        self.ledger.append_entry(&entry).await?;
        product.stock = entry.quantity_after;
        product.updated_at = now;
        self.catalog.save_product(&product).await?;
        tracing::info!(
            product = %product.title,
            reason = reason.as_str(),
            change = delta,
            stock = product.stock,
            "inventory updated"
        );
        Ok(entry)
    }

    pub async fn summary(&self) -> Result<InventorySummary> {
        let products = self.catalog.active_products().await?;
        let mut summary = InventorySummary {
            total_products: products.len(),
            total_inventory_value: Decimal::ZERO,
            low_stock_items: vec![],
            out_of_stock_items: vec![],
        };
        for product in &products {
            summary.total_inventory_value += product.price * Decimal::from(product.stock);
            let alert = StockAlert {
                id: product.id,
                title: product.title.clone(),
                stock: product.stock,
                threshold: product.low_stock_threshold,
            };
            if product.is_out_of_stock() {
                summary.out_of_stock_items.push(alert);
            } else if product.is_low_stock() {
                summary.low_stock_items.push(alert);
            }
        }
        Ok(summary)
    }

    /// Active products ordered by ascending stock, lowest first.
    pub async fn stock_levels(&self) -> Result<Vec<Product>> {
        let mut products = self.catalog.active_products().await?;
        products.sort_by_key(|p| p.stock);
        Ok(products)
    }

    pub async fn logs(
        &self,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryLogEntry>> {
        self.ledger.query_entries(filter, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProductCategory, ProductVariant};
    use crate::store::memory::MemoryStore;

    fn product(title: &str, price: Decimal, stock: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            price,
            price_display: format!("GH₵ {price}"),
            image: String::new(),
            category: ProductCategory::default(),
            variants: Vec::<ProductVariant>::new(),
            stock,
            low_stock_threshold: 10,
            rating: 0.0,
            active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn service_with(products: Vec<Product>) -> (Arc<MemoryStore>, InventoryService) {
        let store = Arc::new(MemoryStore::new());
        for p in &products {
            store.insert_product(p).await.unwrap();
        }
        let service = InventoryService::new(store.clone(), store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn deduction_floors_at_zero() {
        let p = product("Chin Chin", Decimal::new(5, 0), 5);
        let id = p.id;
        let (store, service) = service_with(vec![p]).await;

        let entry = service
            .apply_change(id, -1000, ChangeReason::OrderPaid, ChangeContext::default())
            .await
            .unwrap();

        assert_eq!(entry.quantity_after, 0);
        assert_eq!(entry.change, -1000);
        assert_eq!(store.find_product(id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn restock_rejects_non_positive_quantity() {
        let p = product("Rock Buns", Decimal::new(8, 0), 2);
        let id = p.id;
        let (_store, service) = service_with(vec![p]).await;

        assert!(matches!(
            service.restock(id, 0, ChangeContext::default()).await,
            Err(CommerceError::Validation(_))
        ));
        assert!(service
            .restock(id, -3, ChangeContext::default())
            .await
            .is_err());

        let entry = service.restock(id, 12, ChangeContext::default()).await.unwrap();
        assert_eq!(entry.reason, ChangeReason::Restock);
        assert_eq!(entry.quantity_after, 14);
    }

    #[tokio::test]
    async fn adjust_records_difference_from_current() {
        let p = product("Doughnut", Decimal::new(4, 0), 10);
        let id = p.id;
        let (store, service) = service_with(vec![p]).await;

        let entry = service
            .adjust(id, 4, None, ChangeContext::default())
            .await
            .unwrap();
        assert_eq!(entry.change, -6);
        assert_eq!(entry.reason, ChangeReason::ManualAdjustment);
        assert_eq!(store.find_product(id).await.unwrap().unwrap().stock, 4);

        assert!(service
            .adjust(id, -1, None, ChangeContext::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn missing_product_is_reported() {
        let (_store, service) = service_with(vec![]).await;
        let missing = Uuid::new_v4();
        assert!(matches!(
            service
                .apply_change(missing, -1, ChangeReason::OrderPaid, ChangeContext::default())
                .await,
            Err(CommerceError::ProductNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn summary_classifies_stock_levels() {
        let (_store, service) = service_with(vec![
            product("Plenty", Decimal::new(10, 0), 50),
            product("Low", Decimal::new(20, 0), 3),
            product("Gone", Decimal::new(30, 0), 0),
        ])
        .await;

        let summary = service.summary().await.unwrap();
        assert_eq!(summary.total_products, 3);
        // 10*50 + 20*3 + 30*0
        assert_eq!(summary.total_inventory_value, Decimal::new(560, 0));
        assert_eq!(summary.low_stock_items.len(), 1);
        assert_eq!(summary.low_stock_items[0].title, "Low");
        assert_eq!(summary.out_of_stock_items.len(), 1);
        assert_eq!(summary.out_of_stock_items[0].title, "Gone");
    }

    #[tokio::test]
    async fn concurrent_deductions_are_serialized() {
        let n: i64 = 8;
        let p = product("Hot Cakes", Decimal::new(5, 0), n);
        let id = p.id;
        let (store, service) = service_with(vec![p]).await;
        let service = Arc::new(service);

        let mut handles = vec![];
        for _ in 0..n {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .apply_change(id, -1, ChangeReason::OrderPaid, ChangeContext::default())
                    .await
            }));
        }
        let mut entries = vec![];
        for handle in handles {
            entries.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(store.find_product(id).await.unwrap().unwrap().stock, 0);
        assert_eq!(entries.len(), n as usize);

        // The before/after values must chain: no two deductions observed the
        // same starting quantity.
        entries.sort_by_key(|e| std::cmp::Reverse(e.quantity_before));
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.quantity_before, n - i as i64);
            assert_eq!(entry.quantity_after, entry.quantity_before - 1);
        }
    }

    #[tokio::test]
    async fn concurrent_restock_and_sale_lose_no_updates() {
        let p = product("Bofrot", Decimal::new(2, 0), 10);
        let id = p.id;
        let (store, service) = service_with(vec![p]).await;
        let service = Arc::new(service);

        let mut handles = vec![];
        for i in 0..20 {
            let service = service.clone();
            let (delta, reason) = if i % 2 == 0 {
                (-1, ChangeReason::OrderPaid)
            } else {
                (1, ChangeReason::Restock)
            };
            handles.push(tokio::spawn(async move {
                service
                    .apply_change(id, delta, reason, ChangeContext::default())
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // 10 sales and 10 restocks from stock 10: stock never hits the floor
        // mid-way below zero, so the net effect must be exactly zero.
        assert_eq!(store.find_product(id).await.unwrap().unwrap().stock, 10);
        let logs = service
            .logs(&LedgerFilter::default(), PageRequest::clamped(None, Some(100)))
            .await
            .unwrap();
        assert_eq!(logs.total, 20);
        for entry in &logs.data {
            assert_eq!(entry.quantity_after, entry.quantity_before + entry.change);
        }
    }
}
