//! Postgres-backed store.
//!
//! Customer snapshots, line items and variants live in JSONB columns; an
//! order's items and totals are written once at insert and never touched by
//! [`OrderStore::update_order`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    CatalogStore, DashboardStats, LedgerFilter, LedgerStore, OrderStore, Page, PageRequest,
    ProductFilter,
};
use crate::domain::{
    normalize_phone, ChangeReason, GuestInfo, InventoryLogEntry, LineItem, Order, OrderStatus,
    PaymentMethod, PaymentStatus, Product, ProductCategory, ProductVariant,
};
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    title: String,
    description: String,
    price: Decimal,
    price_display: String,
    image: String,
    category: String,
    variants: Json<Vec<ProductVariant>>,
    stock: i64,
    low_stock_threshold: i64,
    rating: f32,
    active: bool,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = CommerceError;

    fn try_from(row: ProductRow) -> Result<Self> {
        Ok(Product {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            price_display: row.price_display,
            image: row.image,
            category: ProductCategory::parse(&row.category)?,
            variants: row.variants.0,
            stock: row.stock,
            low_stock_threshold: row.low_stock_threshold,
            rating: row.rating,
            active: row.active,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    code: String,
    customer: Json<GuestInfo>,
    user_id: Option<Uuid>,
    items: Json<Vec<LineItem>>,
    subtotal: Decimal,
    vat: Decimal,
    vat_percentage: Decimal,
    shipping: Decimal,
    total: Decimal,
    currency: String,
    status: String,
    payment_status: String,
    payment_method: String,
    payment_reference: Option<String>,
    payment_proof: Option<String>,
    confirmed_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    processed_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    internal_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = CommerceError;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Order {
            id: row.id,
            code: row.code,
            customer: row.customer.0,
            user_id: row.user_id,
            items: row.items.0,
            subtotal: row.subtotal,
            vat: row.vat,
            vat_percentage: row.vat_percentage,
            shipping: row.shipping,
            total: row.total,
            currency: row.currency,
            status: OrderStatus::parse(&row.status)?,
            payment_status: PaymentStatus::parse(&row.payment_status)?,
            payment_method: PaymentMethod::parse(&row.payment_method)?,
            payment_reference: row.payment_reference,
            payment_proof: row.payment_proof,
            confirmed_at: row.confirmed_at,
            paid_at: row.paid_at,
            processed_at: row.processed_at,
            shipped_at: row.shipped_at,
            delivered_at: row.delivered_at,
            notes: row.notes,
            internal_notes: row.internal_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    product_id: Uuid,
    product_title: String,
    quantity_before: i64,
    quantity_after: i64,
    change: i64,
    reason: String,
    order_code: Option<String>,
    actor_id: Option<Uuid>,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for InventoryLogEntry {
    type Error = CommerceError;

    fn try_from(row: LedgerRow) -> Result<Self> {
        Ok(InventoryLogEntry {
            id: row.id,
            product_id: row.product_id,
            product_title: row.product_title,
            quantity_before: row.quantity_before,
            quantity_after: row.quantity_after,
            change: row.change,
            reason: ChangeReason::parse(&row.reason)?,
            order_code: row.order_code,
            actor_id: row.actor_id,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let category = filter.category.map(|c| c.as_str());
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE active \
             AND ($1::text IS NULL OR category = $1) \
             AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%' OR description ILIKE '%' || $2 || '%') \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(category)
        .bind(filter.search.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE active \
             AND ($1::text IS NULL OR category = $1) \
             AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%' OR description ILIKE '%' || $2 || '%')",
        )
        .bind(category)
        .bind(filter.search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Page {
            data: rows
                .into_iter()
                .map(Product::try_from)
                .collect::<Result<_>>()?,
            total,
            page: page.page,
        })
    }

    async fn active_products(&self) -> Result<Vec<Product>> {
        let rows =
            sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE active ORDER BY stock")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn insert_product(&self, p: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, title, description, price, price_display, image, category, \
             variants, stock, low_stock_threshold, rating, active, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(p.id)
        .bind(&p.title)
        .bind(&p.description)
        .bind(p.price)
        .bind(&p.price_display)
        .bind(&p.image)
        .bind(p.category.as_str())
        .bind(Json(&p.variants))
        .bind(p.stock)
        .bind(p.low_stock_threshold)
        .bind(p.rating)
        .bind(p.active)
        .bind(p.created_by)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_product(&self, p: &Product) -> Result<()> {
        sqlx::query(
            "UPDATE products SET title = $2, description = $3, price = $4, price_display = $5, \
             image = $6, category = $7, variants = $8, stock = $9, low_stock_threshold = $10, \
             rating = $11, active = $12, updated_at = $13 WHERE id = $1",
        )
        .bind(p.id)
        .bind(&p.title)
        .bind(&p.description)
        .bind(p.price)
        .bind(&p.price_display)
        .bind(&p.image)
        .bind(p.category.as_str())
        .bind(Json(&p.variants))
        .bind(p.stock)
        .bind(p.low_stock_threshold)
        .bind(p.rating)
        .bind(p.active)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, o: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders (id, code, customer, user_id, items, subtotal, vat, vat_percentage, \
             shipping, total, currency, status, payment_status, payment_method, payment_reference, \
             payment_proof, confirmed_at, paid_at, processed_at, shipped_at, delivered_at, notes, \
             internal_notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23, $24, $25)",
        )
        .bind(o.id)
        .bind(&o.code)
        .bind(Json(&o.customer))
        .bind(o.user_id)
        .bind(Json(&o.items))
        .bind(o.subtotal)
        .bind(o.vat)
        .bind(o.vat_percentage)
        .bind(o.shipping)
        .bind(o.total)
        .bind(&o.currency)
        .bind(o.status.as_str())
        .bind(o.payment_status.as_str())
        .bind(o.payment_method.as_str())
        .bind(&o.payment_reference)
        .bind(&o.payment_proof)
        .bind(o.confirmed_at)
        .bind(o.paid_at)
        .bind(o.processed_at)
        .bind(o.shipped_at)
        .bind(o.delivered_at)
        .bind(&o.notes)
        .bind(&o.internal_notes)
        .bind(o.created_at)
        .bind(o.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn orders_by_phone(&self, phone: &str) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders \
             WHERE regexp_replace(customer->>'phone', '[^0-9]', '', 'g') = $1 \
             ORDER BY created_at DESC, code DESC",
        )
        .bind(normalize_phone(phone))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn latest_order_for_phone(&self, phone: &str) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders \
             WHERE regexp_replace(customer->>'phone', '[^0-9]', '', 'g') = $1 \
             ORDER BY created_at DESC, code DESC LIMIT 1",
        )
        .bind(normalize_phone(phone))
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC, code DESC LIMIT $2 OFFSET $3",
        )
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(Page {
            data: rows
                .into_iter()
                .map(Order::try_from)
                .collect::<Result<_>>()?,
            total,
            page: page.page,
        })
    }

    async fn update_order(&self, o: &Order) -> Result<()> {
        sqlx::query(
            "UPDATE orders SET status = $2, payment_status = $3, payment_reference = $4, \
             payment_proof = $5, confirmed_at = $6, paid_at = $7, processed_at = $8, \
             shipped_at = $9, delivered_at = $10, notes = $11, internal_notes = $12, \
             updated_at = $13 WHERE id = $1",
        )
        .bind(o.id)
        .bind(o.status.as_str())
        .bind(o.payment_status.as_str())
        .bind(&o.payment_reference)
        .bind(&o.payment_proof)
        .bind(o.confirmed_at)
        .bind(o.paid_at)
        .bind(o.processed_at)
        .bind(o.shipped_at)
        .bind(o.delivered_at)
        .bind(&o.notes)
        .bind(&o.internal_notes)
        .bind(o.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn next_order_sequence(&self, year: i32, month: u32) -> Result<u32> {
        let seq: i32 = sqlx::query_scalar(
            "INSERT INTO order_counters (year, month, seq) VALUES ($1, $2, 1) \
             ON CONFLICT (year, month) DO UPDATE SET seq = order_counters.seq + 1 \
             RETURNING seq",
        )
        .bind(year)
        .bind(month as i32)
        .fetch_one(&self.pool)
        .await?;
        Ok(seq as u32)
    }

    async fn claim_payment(&self, order_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders SET payment_status = 'paid', updated_at = now() \
             WHERE id = $1 AND payment_status = 'unpaid'",
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats> {
        #[derive(sqlx::FromRow)]
        struct StatsRow {
            total_orders: i64,
            paid_orders: i64,
            pending_orders: i64,
            revenue: Decimal,
        }

        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT COUNT(*) AS total_orders, \
             COUNT(*) FILTER (WHERE payment_status = 'paid') AS paid_orders, \
             COUNT(*) FILTER (WHERE status = 'pending') AS pending_orders, \
             COALESCE(SUM(total) FILTER (WHERE payment_status = 'paid'), 0) AS revenue \
             FROM orders",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_orders: row.total_orders,
            paid_orders: row.paid_orders,
            pending_orders: row.pending_orders,
            revenue: row.revenue,
        })
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn append_entry(&self, e: &InventoryLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO inventory_logs (id, product_id, product_title, quantity_before, \
             quantity_after, change, reason, order_code, actor_id, note, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(e.id)
        .bind(e.product_id)
        .bind(&e.product_title)
        .bind(e.quantity_before)
        .bind(e.quantity_after)
        .bind(e.change)
        .bind(e.reason.as_str())
        .bind(&e.order_code)
        .bind(e.actor_id)
        .bind(&e.note)
        .bind(e.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_entries(
        &self,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryLogEntry>> {
        let reason = filter.reason.map(|r| r.as_str());
        let rows = sqlx::query_as::<_, LedgerRow>(
            "SELECT * FROM inventory_logs \
             WHERE ($1::text IS NULL OR reason = $1) \
             AND ($2::uuid IS NULL OR product_id = $2) \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
        )
        .bind(reason)
        .bind(filter.product_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_logs \
             WHERE ($1::text IS NULL OR reason = $1) \
             AND ($2::uuid IS NULL OR product_id = $2)",
        )
        .bind(reason)
        .bind(filter.product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page {
            data: rows
                .into_iter()
                .map(InventoryLogEntry::try_from)
                .collect::<Result<_>>()?,
            total,
            page: page.page,
        })
    }
}
