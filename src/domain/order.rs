//! Order aggregate and its status state machine.
//!
//! An order is created once with frozen totals and snapshotted line items;
//! afterwards only its status, payment fields and notes move. Orders are never
//! hard-deleted.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::contact::GuestInfo;
use crate::pricing::Totals;
use crate::{CommerceError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "paid" => Ok(Self::Paid),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CommerceError::InvalidStatus(other.to_string())),
        }
    }

    /// Delivered and cancelled orders accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    /// Domain vocabulary only; nothing transitions into it yet.
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            other => Err(CommerceError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Whatsapp,
    BankTransfer,
    MobileMoney,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::BankTransfer => "bank_transfer",
            Self::MobileMoney => "mobile_money",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "whatsapp" => Ok(Self::Whatsapp),
            "bank_transfer" => Ok(Self::BankTransfer),
            "mobile_money" => Ok(Self::MobileMoney),
            other => Err(CommerceError::Validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// Snapshot of one product at order-creation time. Later catalog edits do not
/// change what the customer agreed to pay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub title: String,
    pub variant: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Human-readable sequential code, `ORD-YYYYMM-NNNN`. Assigned once.
    pub code: String,
    pub customer: GuestInfo,
    pub user_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub vat: Decimal,
    pub vat_percentage: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub payment_proof: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn create(
        code: String,
        customer: GuestInfo,
        items: Vec<LineItem>,
        totals: Totals,
        currency: String,
        payment_method: PaymentMethod,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            code,
            customer,
            user_id: None,
            items,
            subtotal: totals.subtotal,
            vat: totals.vat,
            vat_percentage: totals.vat_percentage,
            shipping: totals.shipping,
            total: totals.total,
            currency,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method,
            payment_reference: None,
            payment_proof: None,
            confirmed_at: None,
            paid_at: None,
            processed_at: None,
            shipped_at: None,
            delivered_at: None,
            notes,
            internal_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the order to `next`, stamping the matching milestone timestamp.
    ///
    /// Transitioning to `paid` also flips the payment flag, but inventory
    /// deduction is owned exclusively by the payment confirmation path.
    pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(CommerceError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        match next {
            OrderStatus::Confirmed => self.confirmed_at = Some(now),
            OrderStatus::Paid => {
                self.paid_at = Some(now);
                self.payment_status = PaymentStatus::Paid;
            }
            OrderStatus::Processing => self.processed_at = Some(now),
            OrderStatus::Shipped => self.shipped_at = Some(now),
            OrderStatus::Delivered => self.delivered_at = Some(now),
            OrderStatus::Pending | OrderStatus::Cancelled => {}
        }
        self.updated_at = now;
        Ok(())
    }
}

/// `ORD-{year}{month}-{sequence}`, sequence zero-padded to four digits and
/// monotonic within a calendar month.
pub fn format_order_code(year: i32, month: u32, sequence: u32) -> String {
    format!("ORD-{year:04}{month:02}-{sequence:04}")
}

pub fn order_code_for(now: DateTime<Utc>, sequence: u32) -> String {
    format_order_code(now.year(), now.month(), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_order() -> Order {
        Order::create(
            "ORD-202608-0001".to_string(),
            GuestInfo {
                name: "Ama Mensah".to_string(),
                phone: "+233201234567".to_string(),
                email: None,
                address: None,
                city: None,
                region: None,
            },
            vec![LineItem {
                product_id: Uuid::new_v4(),
                title: "Butter Croissant".to_string(),
                variant: None,
                quantity: 2,
                price: Decimal::new(1500, 2),
                subtotal: Decimal::new(3000, 2),
            }],
            Totals {
                subtotal: Decimal::new(3000, 2),
                vat: Decimal::new(180, 2),
                vat_percentage: Decimal::new(6, 0),
                shipping: Decimal::new(1000, 2),
                total: Decimal::new(4180, 2),
            },
            "GHS".to_string(),
            PaymentMethod::Whatsapp,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn totals_frozen_at_creation() {
        let order = sample_order();
        assert_eq!(order.total, order.subtotal + order.vat + order.shipping);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn paid_transition_flips_payment_flag() {
        let mut order = sample_order();
        let now = Utc::now();
        order.transition(OrderStatus::Paid, now).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.paid_at, Some(now));
    }

    #[test]
    fn terminal_states_reject_transitions() {
        let mut order = sample_order();
        order.transition(OrderStatus::Delivered, Utc::now()).unwrap();
        let err = order
            .transition(OrderStatus::Processing, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CommerceError::InvalidTransition { .. }));

        let mut cancelled = sample_order();
        cancelled
            .transition(OrderStatus::Cancelled, Utc::now())
            .unwrap();
        assert!(cancelled
            .transition(OrderStatus::Pending, Utc::now())
            .is_err());
    }

    #[test]
    fn cancel_reachable_from_any_non_terminal_state() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Paid,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            let mut order = sample_order();
            order.transition(status, Utc::now()).unwrap();
            assert!(order.transition(OrderStatus::Cancelled, Utc::now()).is_ok());
        }
    }

    #[test]
    fn milestone_timestamps_stamped_once_per_state() {
        let mut order = sample_order();
        let now = Utc::now();
        order.transition(OrderStatus::Confirmed, now).unwrap();
        assert_eq!(order.confirmed_at, Some(now));
        order.transition(OrderStatus::Shipped, now).unwrap();
        assert_eq!(order.shipped_at, Some(now));
        assert_eq!(order.delivered_at, None);
    }

    #[test]
    fn status_parse_rejects_unknown_tokens() {
        assert!(OrderStatus::parse("paid").is_ok());
        assert!(matches!(
            OrderStatus::parse("refunded"),
            Err(CommerceError::InvalidStatus(_))
        ));
    }

    #[test]
    fn order_code_format() {
        assert_eq!(format_order_code(2026, 8, 7), "ORD-202608-0007");
        assert_eq!(format_order_code(2026, 12, 1234), "ORD-202612-1234");
        let jan = Utc.with_ymd_and_hms(2027, 1, 3, 12, 0, 0).unwrap();
        assert_eq!(order_code_for(jan, 1), "ORD-202701-0001");
    }
}
