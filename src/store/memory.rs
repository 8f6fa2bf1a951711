//! In-memory store used by tests and database-less local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{
    CatalogStore, DashboardStats, LedgerFilter, LedgerStore, OrderStore, Page, PageRequest,
    ProductFilter,
};
use crate::domain::{
    normalize_phone, InventoryLogEntry, Order, OrderStatus, PaymentStatus, Product,
};
use crate::Result;

#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<HashMap<Uuid, Product>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    ledger: RwLock<Vec<InventoryLogEntry>>,
    counters: Mutex<HashMap<(i32, u32), u32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(mut matched: Vec<T>, page: PageRequest) -> Page<T> {
    let total = matched.len() as i64;
    let start = (page.offset() as usize).min(matched.len());
    let data: Vec<T> = matched.drain(start..).take(page.per_page as usize).collect();
    Page {
        data,
        total,
        page: page.page,
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let products = self.products.read().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut matched: Vec<Product> = products
            .values()
            .filter(|p| p.active)
            .filter(|p| filter.category.map_or(true, |c| p.category == c))
            .filter(|p| {
                needle.as_deref().map_or(true, |q| {
                    p.title.to_lowercase().contains(q) || p.description.to_lowercase().contains(q)
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(matched, page))
    }

    async fn active_products(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.active).cloned().collect())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.values().find(|o| o.code == code).cloned())
    }

    async fn orders_by_phone(&self, phone: &str) -> Result<Vec<Order>> {
        let wanted = normalize_phone(phone);
        let orders = self.orders.read().await;
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|o| normalize_phone(&o.customer.phone) == wanted)
            .cloned()
            .collect();
        matched.sort_by(|a, b| (b.created_at, &b.code).cmp(&(a.created_at, &a.code)));
        Ok(matched)
    }

    async fn latest_order_for_phone(&self, phone: &str) -> Result<Option<Order>> {
        Ok(self.orders_by_phone(phone).await?.into_iter().next())
    }

    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let orders = self.orders.read().await;
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| (b.created_at, &b.code).cmp(&(a.created_at, &a.code)));
        Ok(paginate(matched, page))
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn next_order_sequence(&self, year: i32, month: u32) -> Result<u32> {
        let mut counters = self.counters.lock().await;
        let seq = counters.entry((year, month)).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn claim_payment(&self, order_id: Uuid) -> Result<bool> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order_id) {
            Some(order) if order.payment_status == PaymentStatus::Unpaid => {
                order.payment_status = PaymentStatus::Paid;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let orders = self.orders.read().await;
        let mut stats = DashboardStats {
            total_orders: 0,
            paid_orders: 0,
            pending_orders: 0,
            revenue: Decimal::ZERO,
        };
        for order in orders.values() {
            stats.total_orders += 1;
            if order.payment_status == PaymentStatus::Paid {
                stats.paid_orders += 1;
                stats.revenue += order.total;
            }
            if order.status == OrderStatus::Pending {
                stats.pending_orders += 1;
            }
        }
        Ok(stats)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn append_entry(&self, entry: &InventoryLogEntry) -> Result<()> {
        self.ledger.write().await.push(entry.clone());
        Ok(())
    }

    async fn query_entries(
        &self,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryLogEntry>> {
        let ledger = self.ledger.read().await;
        let mut matched: Vec<InventoryLogEntry> = ledger
            .iter()
            .filter(|e| filter.reason.map_or(true, |r| e.reason == r))
            .filter(|e| filter.product_id.map_or(true, |id| e.product_id == id))
            .cloned()
            .collect();
        matched.reverse();
        Ok(paginate(matched, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GuestInfo, LineItem, PaymentMethod};
    use crate::pricing::Totals;
    use chrono::Utc;

    fn order(phone: &str) -> Order {
        Order::create(
            format!("ORD-TEST-{}", Uuid::new_v4().simple()),
            GuestInfo {
                name: "Kofi".to_string(),
                phone: phone.to_string(),
                email: None,
                address: None,
                city: None,
                region: None,
            },
            vec![LineItem {
                product_id: Uuid::new_v4(),
                title: "Meat Pie".to_string(),
                variant: None,
                quantity: 1,
                price: Decimal::new(10, 0),
                subtotal: Decimal::new(10, 0),
            }],
            Totals {
                subtotal: Decimal::new(10, 0),
                vat: Decimal::ZERO,
                vat_percentage: Decimal::ZERO,
                shipping: Decimal::ZERO,
                total: Decimal::new(10, 0),
            },
            "GHS".to_string(),
            PaymentMethod::Whatsapp,
            None,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn claim_payment_is_single_winner() {
        let store = MemoryStore::new();
        let o = order("+233200000001");
        store.insert_order(&o).await.unwrap();

        assert!(store.claim_payment(o.id).await.unwrap());
        assert!(!store.claim_payment(o.id).await.unwrap());
        assert!(!store.claim_payment(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn phone_lookup_is_format_insensitive() {
        let store = MemoryStore::new();
        store.insert_order(&order("+233 20-000 0001")).await.unwrap();

        let found = store.orders_by_phone("233200000001").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(store
            .latest_order_for_phone("0300000000")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn sequence_is_per_month() {
        let store = MemoryStore::new();
        assert_eq!(store.next_order_sequence(2026, 8).await.unwrap(), 1);
        assert_eq!(store.next_order_sequence(2026, 8).await.unwrap(), 2);
        assert_eq!(store.next_order_sequence(2026, 9).await.unwrap(), 1);
    }
}
