//! Outbound notifications.
//!
//! Everything here is best-effort: a failed WhatsApp send or NATS publish is
//! logged and never rolls back or blocks the order mutation that triggered it.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use crate::config::WhatsAppConfig;
use crate::domain::{normalize_phone, Order, OrderEvent};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("whatsapp request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_order_created(&self, order: &Order) -> Result<(), NotifyError>;
    async fn notify_payment_confirmed(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Sends order messages to the customer over the WhatsApp Cloud API.
pub struct WhatsAppSender {
    http: reqwest::Client,
    cfg: WhatsAppConfig,
}

impl WhatsAppSender {
    pub fn new(cfg: WhatsAppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            cfg,
        }
    }

    async fn send(&self, phone: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{}/{}/messages",
            self.cfg.api_url.trim_end_matches('/'),
            self.cfg.phone_number_id
        );
        self.http
            .post(&url)
            .bearer_auth(&self.cfg.access_token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": normalize_phone(phone),
                "type": "text",
                "text": { "body": body },
            }))
            .send()
            .await?
            .error_for_status()?;
        tracing::info!(to = %normalize_phone(phone), "whatsapp message sent");
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for WhatsAppSender {
    async fn notify_order_created(&self, order: &Order) -> Result<(), NotifyError> {
        self.send(&order.customer.phone, &order_created_message(order))
            .await
    }

    async fn notify_payment_confirmed(&self, order: &Order) -> Result<(), NotifyError> {
        self.send(&order.customer.phone, &payment_confirmed_message(order))
            .await
    }
}

/// Sink used when WhatsApp credentials are not configured.
pub struct NoopNotifier;

#[async_trait]
impl NotificationSink for NoopNotifier {
    async fn notify_order_created(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::debug!(order = %order.code, "notifications disabled, skipping order message");
        Ok(())
    }

    async fn notify_payment_confirmed(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::debug!(order = %order.code, "notifications disabled, skipping payment message");
        Ok(())
    }
}

pub fn currency_symbol(code: &str) -> &str {
    match code {
        "GHS" => "GH₵",
        "NGN" => "₦",
        other => other,
    }
}

pub fn order_created_message(order: &Order) -> String {
    let sym = currency_symbol(&order.currency);
    let items: Vec<String> = order
        .items
        .iter()
        .map(|i| format!("• {} x{} = {} {:.2}", i.title, i.quantity, sym, i.subtotal))
        .collect();
    let shipping = if order.shipping.is_zero() {
        "FREE 🎁".to_string()
    } else {
        format!("{sym} {:.2}", order.shipping)
    };
    format!(
        "Hello {}! 👋\n\nOrder #{}\n\n*Items Ordered:*\n{}\n\n*Order Summary:*\nSubtotal: {sym} {:.2}\nVAT ({}%): {sym} {:.2}\nShipping: {}\n\n*TOTAL: {sym} {:.2}*\n\nPlease reply to confirm your order details.\nWe'll send payment instructions shortly.\n\nThank you for your order! ❤️",
        order.customer.name,
        order.code,
        items.join("\n"),
        order.subtotal,
        order.vat_percentage,
        order.vat,
        shipping,
        order.total,
    )
}

pub fn payment_confirmed_message(order: &Order) -> String {
    let sym = currency_symbol(&order.currency);
    format!(
        "✅ Payment Confirmed!\n\nOrder #{}\nTotal: {sym} {:.2}\n\nWe're preparing your order now and will send tracking details soon.\n\nThank you! 🙏",
        order.code, order.total,
    )
}

/// Publishes domain events to NATS when a client is configured.
#[derive(Clone)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(client: Option<async_nats::Client>) -> Self {
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub async fn publish(&self, event: &OrderEvent) {
        let Some(client) = &self.client else {
            return;
        };
        match serde_json::to_vec(event) {
            Ok(payload) => {
                if let Err(err) = client
                    .publish(event.subject().to_string(), payload.into())
                    .await
                {
                    tracing::warn!(subject = event.subject(), error = %err, "event publish failed");
                }
            }
            Err(err) => tracing::warn!(error = %err, "event serialization failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GuestInfo, LineItem, PaymentMethod};
    use crate::pricing::Totals;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn order(shipping: Decimal) -> Order {
        let subtotal = Decimal::new(13000, 2);
        let vat = Decimal::new(780, 2);
        Order::create(
            "ORD-202608-0042".to_string(),
            GuestInfo {
                name: "Ama".to_string(),
                phone: "+233201234567".to_string(),
                email: None,
                address: None,
                city: None,
                region: None,
            },
            vec![LineItem {
                product_id: Uuid::new_v4(),
                title: "Banana Bread".to_string(),
                variant: None,
                quantity: 2,
                price: Decimal::new(6500, 2),
                subtotal,
            }],
            Totals {
                subtotal,
                vat,
                vat_percentage: Decimal::new(6, 0),
                shipping,
                total: subtotal + vat + shipping,
            },
            "GHS".to_string(),
            PaymentMethod::Whatsapp,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn order_message_includes_code_items_and_totals() {
        let msg = order_created_message(&order(Decimal::new(10, 0)));
        assert!(msg.contains("ORD-202608-0042"));
        assert!(msg.contains("Banana Bread x2"));
        assert!(msg.contains("Subtotal: GH₵ 130.00"));
        assert!(msg.contains("VAT (6%): GH₵ 7.80"));
        assert!(msg.contains("Shipping: GH₵ 10.00"));
        assert!(msg.contains("TOTAL: GH₵ 147.80"));
    }

    #[test]
    fn free_shipping_is_labeled() {
        let msg = order_created_message(&order(Decimal::ZERO));
        assert!(msg.contains("Shipping: FREE"));
    }

    #[test]
    fn payment_message_includes_total() {
        let msg = payment_confirmed_message(&order(Decimal::new(10, 0)));
        assert!(msg.contains("ORD-202608-0042"));
        assert!(msg.contains("GH₵ 147.80"));
    }
}
