//! Order lifecycle: guest checkout, status transitions, lookups.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::order::order_code_for;
use crate::domain::{GuestInfo, LineItem, Order, OrderStatus, PaymentMethod};
use crate::notify::{EventPublisher, NotificationSink};
use crate::pricing::{compute_totals, PricedItem, PricingPolicy};
use crate::store::{CatalogStore, DashboardStats, OrderStore, Page, PageRequest};
use crate::{CommerceError, Result};

pub struct OrderService {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    policy: PricingPolicy,
    notifier: Arc<dyn NotificationSink>,
    events: EventPublisher,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate]
    pub guest_info: GuestInfo,
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub variant: Option<String>,
    pub quantity: u32,
}

impl OrderService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        policy: PricingPolicy,
        notifier: Arc<dyn NotificationSink>,
        events: EventPublisher,
    ) -> Self {
        Self {
            catalog,
            orders,
            policy,
            notifier,
            events,
        }
    }

    /// Guest checkout. Prices and titles are snapshotted from the catalog,
    /// never taken from the request. The stock check is advisory: nothing is
    /// reserved until payment confirmation deducts for real.
    pub async fn create_order(&self, req: CreateOrderRequest) -> Result<Order> {
        req.validate()
            .map_err(|e| CommerceError::Validation(e.to_string()))?;

        let mut line_items = Vec::with_capacity(req.items.len());
        for item in &req.items {
            let product = self
                .catalog
                .find_product(item.product_id)
                .await?
                .ok_or(CommerceError::ProductNotFound(item.product_id))?;
            if product.stock < i64::from(item.quantity) {
                return Err(CommerceError::OutOfStock {
                    title: product.title,
                });
            }
            let price = product.unit_price(item.variant.as_deref());
            line_items.push(LineItem {
                product_id: product.id,
                title: product.title,
                variant: item.variant.clone(),
                quantity: item.quantity,
                price,
                subtotal: price * rust_decimal::Decimal::from(item.quantity),
            });
        }

        let priced: Vec<PricedItem> = line_items
            .iter()
            .map(|i| PricedItem {
                price: i.price,
                quantity: i.quantity,
            })
            .collect();
        let totals = compute_totals(&priced, &self.policy)?;

        let now = Utc::now();
        let sequence = self
            .orders
            .next_order_sequence(now.year(), now.month())
            .await?;
        let order = Order::create(
            order_code_for(now, sequence),
            req.guest_info,
            line_items,
            totals,
            self.policy.currency.clone(),
            req.payment_method.unwrap_or_default(),
            req.notes,
            now,
        );
        self.orders.insert_order(&order).await?;
        tracing::info!(order = %order.code, total = %order.total, "order created");

        if let Err(err) = self.notifier.notify_order_created(&order).await {
            tracing::warn!(order = %order.code, error = %err, "order confirmation send failed");
        }
        self.events
            .publish(&crate::domain::OrderEvent::Created {
                order_code: order.code.clone(),
                total: order.total,
                currency: order.currency.clone(),
            })
            .await;

        Ok(order)
    }

    /// Admin status update. Transitioning to `paid` flips the payment flag
    /// as bookkeeping but deducts nothing; inventory deduction belongs to
    /// [`crate::payment::PaymentService::confirm_payment`] alone.
    pub async fn set_status(
        &self,
        code: &str,
        status_token: &str,
        notes: Option<String>,
    ) -> Result<Order> {
        let next = OrderStatus::parse(status_token)?;
        let mut order = self
            .orders
            .find_order_by_code(code)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(code.to_string()))?;
        let previous = order.status;
        order.transition(next, Utc::now())?;
        if notes.is_some() {
            order.internal_notes = notes;
        }
        self.orders.update_order(&order).await?;
        tracing::info!(order = %order.code, from = %previous, to = %next, "order status updated");
        Ok(order)
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Order> {
        self.orders
            .find_order_by_code(code)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(code.to_string()))
    }

    /// Order history for a phone number, newest first.
    pub async fn track_by_phone(&self, phone: &str) -> Result<Vec<Order>> {
        self.orders.orders_by_phone(phone).await
    }

    pub async fn list(
        &self,
        status_token: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let status = status_token.map(OrderStatus::parse).transpose()?;
        self.orders.list_orders(status, page).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.orders.dashboard_stats().await
    }
}
