//! Inventory ledger entries.
//!
//! Every stock movement appends one immutable entry with before/after
//! quantities and a reason code. Entries are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::Product;
use crate::{CommerceError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    OrderPaid,
    Restock,
    ManualAdjustment,
    Damage,
    Return,
}

impl ChangeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderPaid => "order_paid",
            Self::Restock => "restock",
            Self::ManualAdjustment => "manual_adjustment",
            Self::Damage => "damage",
            Self::Return => "return",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "order_paid" => Ok(Self::OrderPaid),
            "restock" => Ok(Self::Restock),
            "manual_adjustment" => Ok(Self::ManualAdjustment),
            "damage" => Ok(Self::Damage),
            "return" => Ok(Self::Return),
            other => Err(CommerceError::Validation(format!(
                "unknown inventory reason: {other}"
            ))),
        }
    }
}

/// References attached to a stock change for audit attribution.
#[derive(Clone, Debug, Default)]
pub struct ChangeContext {
    pub order_code: Option<String>,
    pub actor_id: Option<Uuid>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryLogEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    pub quantity_before: i64,
    pub quantity_after: i64,
    /// The requested delta. When a deduction would push stock negative the
    /// floor clips `quantity_after` to zero, so `change` can exceed the
    /// effective movement; `quantity_after` is authoritative for stock.
    pub change: i64,
    pub reason: ChangeReason,
    pub order_code: Option<String>,
    pub actor_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryLogEntry {
    pub fn record(
        product: &Product,
        delta: i64,
        reason: ChangeReason,
        ctx: ChangeContext,
        now: DateTime<Utc>,
    ) -> Self {
        let quantity_before = product.stock;
        let quantity_after = (quantity_before + delta).max(0);
        Self {
            id: Uuid::now_v7(),
            product_id: product.id,
            product_title: product.title.clone(),
            quantity_before,
            quantity_after,
            change: delta,
            reason,
            order_code: ctx.order_code,
            actor_id: ctx.actor_id,
            note: ctx.note,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductCategory;
    use rust_decimal::Decimal;

    fn product(stock: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: "Sourdough Loaf".to_string(),
            description: String::new(),
            price: Decimal::new(2500, 2),
            price_display: "GH₵ 25.00".to_string(),
            image: String::new(),
            category: ProductCategory::default(),
            variants: vec![],
            stock,
            low_stock_threshold: 10,
            rating: 0.0,
            active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn entry_floors_quantity_after_but_keeps_requested_delta() {
        let entry = InventoryLogEntry::record(
            &product(5),
            -1000,
            ChangeReason::OrderPaid,
            ChangeContext::default(),
            Utc::now(),
        );
        assert_eq!(entry.quantity_before, 5);
        assert_eq!(entry.quantity_after, 0);
        assert_eq!(entry.change, -1000);
    }

    #[test]
    fn entry_chains_before_plus_change_when_unclipped() {
        let entry = InventoryLogEntry::record(
            &product(5),
            7,
            ChangeReason::Restock,
            ChangeContext::default(),
            Utc::now(),
        );
        assert_eq!(entry.quantity_after, entry.quantity_before + entry.change);
    }

    #[test]
    fn reason_round_trip() {
        for reason in [
            ChangeReason::OrderPaid,
            ChangeReason::Restock,
            ChangeReason::ManualAdjustment,
            ChangeReason::Damage,
            ChangeReason::Return,
        ] {
            assert_eq!(ChangeReason::parse(reason.as_str()).unwrap(), reason);
        }
        assert!(ChangeReason::parse("theft").is_err());
    }
}
