//! Payment confirmation.
//!
//! Two triggers converge here: an explicit admin action and a keyword match
//! on an inbound WhatsApp message. Both go through [`PaymentService::confirm_payment`],
//! which wins or loses a compare-and-swap on the order's payment status, so
//! racing triggers produce exactly one confirmation and one inventory
//! deduction pass.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{ChangeContext, ChangeReason, Order, OrderEvent, OrderStatus, PaymentStatus};
use crate::inventory::InventoryService;
use crate::notify::{EventPublisher, NotificationSink};
use crate::store::OrderStore;
use crate::{CommerceError, Result};

/// Keywords that mark an inbound message as a likely payment notice.
/// Substring matching makes this a low-confidence signal; it is kept off the
/// admin path and only drives the heuristic trigger.
pub const PAYMENT_KEYWORDS: [&str; 6] = ["paid", "sent", "transfer", "confirmed", "done", "payment"];

pub fn looks_like_payment_message(text: &str) -> bool {
    let lower = text.to_lowercase();
    PAYMENT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[derive(Clone, Debug)]
pub enum ConfirmationTrigger {
    /// Admin confirmed the payment, optionally with a transaction reference.
    Explicit {
        actor_id: Option<Uuid>,
        reference: Option<String>,
        notes: Option<String>,
    },
    /// Keyword match on an inbound customer message.
    Heuristic { message: String },
}

impl ConfirmationTrigger {
    fn label(&self) -> &'static str {
        match self {
            Self::Explicit { .. } => "explicit",
            Self::Heuristic { .. } => "heuristic",
        }
    }
}

pub struct PaymentService {
    orders: Arc<dyn OrderStore>,
    inventory: Arc<InventoryService>,
    notifier: Arc<dyn NotificationSink>,
    events: EventPublisher,
}

impl PaymentService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        inventory: Arc<InventoryService>,
        notifier: Arc<dyn NotificationSink>,
        events: EventPublisher,
    ) -> Self {
        Self {
            orders,
            inventory,
            notifier,
            events,
        }
    }

    /// Marks the order paid and runs the single inventory deduction pass.
    ///
    /// The payment flag moves unpaid -> paid through a store-level
    /// compare-and-swap; a caller that loses the swap gets
    /// [`CommerceError::AlreadyConfirmed`] and deducts nothing. Per-item
    /// deduction failures are logged and skipped; the confirmation itself
    /// stands once the swap is won.
    pub async fn confirm_payment(&self, code: &str, trigger: ConfirmationTrigger) -> Result<Order> {
        let mut order = self
            .orders
            .find_order_by_code(code)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(code.to_string()))?;

        if !self.orders.claim_payment(order.id).await? {
            return Err(CommerceError::AlreadyConfirmed);
        }

        let now = Utc::now();
        let trigger_label = trigger.label();
        let actor_id = match &trigger {
            ConfirmationTrigger::Explicit { actor_id, .. } => *actor_id,
            ConfirmationTrigger::Heuristic { .. } => None,
        };

        order.payment_status = PaymentStatus::Paid;
        match trigger {
            ConfirmationTrigger::Explicit {
                reference, notes, ..
            } => {
                order.status = OrderStatus::Paid;
                order.paid_at = Some(now);
                order.payment_reference =
                    Some(reference.unwrap_or_else(|| "Manual confirmation".to_string()));
                if notes.is_some() {
                    order.internal_notes = notes;
                }
            }
            ConfirmationTrigger::Heuristic { message } => {
                order.status = OrderStatus::Confirmed;
                order.confirmed_at = Some(now);
                order.internal_notes = Some(format!("WhatsApp message: {message}"));
            }
        }
        order.updated_at = now;
        self.orders.update_order(&order).await?;

        for item in &order.items {
            let ctx = ChangeContext {
                order_code: Some(order.code.clone()),
                actor_id,
                note: None,
            };
            if let Err(err) = self
                .inventory
                .apply_change(
                    item.product_id,
                    -i64::from(item.quantity),
                    ChangeReason::OrderPaid,
                    ctx,
                )
                .await
            {
                tracing::error!(
                    order = %order.code,
                    product = %item.title,
                    error = %err,
                    "inventory deduction failed, continuing with remaining items"
                );
            }
        }

        if let Err(err) = self.notifier.notify_payment_confirmed(&order).await {
            tracing::warn!(order = %order.code, error = %err, "payment confirmation send failed");
        }
        self.events
            .publish(&OrderEvent::PaymentConfirmed {
                order_code: order.code.clone(),
                total: order.total,
                currency: order.currency.clone(),
                trigger: trigger_label,
            })
            .await;
        tracing::info!(order = %order.code, trigger = trigger_label, "payment confirmed");

        Ok(order)
    }

    /// Inbound customer message: when it looks like a payment notice, confirm
    /// the most recent order for that phone number. Returns `None` when the
    /// message doesn't match, no order exists, or the order is already paid.
    pub async fn confirm_from_inbound(&self, phone: &str, message: &str) -> Result<Option<Order>> {
        if !looks_like_payment_message(message) {
            tracing::debug!(phone = %phone, "inbound message has no payment keywords");
            return Ok(None);
        }
        let Some(order) = self.orders.latest_order_for_phone(phone).await? else {
            tracing::debug!(phone = %phone, "payment-looking message but no order on file");
            return Ok(None);
        };
        match self
            .confirm_payment(
                &order.code,
                ConfirmationTrigger::Heuristic {
                    message: message.to_string(),
                },
            )
            .await
        {
            Ok(confirmed) => Ok(Some(confirmed)),
            Err(CommerceError::AlreadyConfirmed) => {
                tracing::debug!(order = %order.code, "inbound message for already-paid order");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
