//! Domain events published to NATS for downstream consumers.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created {
        order_code: String,
        total: Decimal,
        currency: String,
    },
    PaymentConfirmed {
        order_code: String,
        total: Decimal,
        currency: String,
        trigger: &'static str,
    },
}

impl OrderEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Created { .. } => "orders.created",
            Self::PaymentConfirmed { .. } => "orders.payment_confirmed",
        }
    }
}
