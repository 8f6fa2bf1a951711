//! Order totals computation.
//!
//! Pure: called exactly once when an order is created, after which the totals
//! are frozen on the order record and never recomputed, even if catalog
//! prices change later.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{CommerceError, Result};

/// Policy parameters, sourced from [`crate::Config`] at startup.
#[derive(Clone, Debug)]
pub struct PricingPolicy {
    pub vat_percent: Decimal,
    pub shipping_cost: Decimal,
    /// Orders at or above this subtotal ship free.
    pub free_shipping_above: Decimal,
    pub currency: String,
}

#[derive(Clone, Copy, Debug)]
pub struct PricedItem {
    pub price: Decimal,
    pub quantity: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub vat: Decimal,
    pub vat_percentage: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

pub fn compute_totals(items: &[PricedItem], policy: &PricingPolicy) -> Result<Totals> {
    if items.is_empty() {
        return Err(CommerceError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }

    let mut subtotal = Decimal::ZERO;
    for item in items {
        if item.quantity == 0 {
            return Err(CommerceError::Validation(
                "item quantity must be at least 1".to_string(),
            ));
        }
        if item.price.is_sign_negative() {
            return Err(CommerceError::Validation(
                "item price cannot be negative".to_string(),
            ));
        }
        subtotal += item.price * Decimal::from(item.quantity);
    }

    let vat = (subtotal * policy.vat_percent / Decimal::ONE_HUNDRED).round_dp(2);
    let shipping = if subtotal >= policy.free_shipping_above {
        Decimal::ZERO
    } else {
        policy.shipping_cost
    };

    Ok(Totals {
        subtotal,
        vat,
        vat_percentage: policy.vat_percent,
        shipping,
        total: subtotal + vat + shipping,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PricingPolicy {
        PricingPolicy {
            vat_percent: Decimal::new(6, 0),
            shipping_cost: Decimal::new(10, 0),
            free_shipping_above: Decimal::new(200, 0),
            currency: "GHS".to_string(),
        }
    }

    #[test]
    fn worked_example() {
        let items = [
            PricedItem {
                price: Decimal::new(50, 0),
                quantity: 2,
            },
            PricedItem {
                price: Decimal::new(30, 0),
                quantity: 1,
            },
        ];
        let totals = compute_totals(&items, &policy()).unwrap();
        assert_eq!(totals.subtotal, Decimal::new(130, 0));
        assert_eq!(totals.vat, Decimal::new(780, 2));
        assert_eq!(totals.shipping, Decimal::new(10, 0));
        assert_eq!(totals.total, Decimal::new(14780, 2));
        assert_eq!(totals.total, totals.subtotal + totals.vat + totals.shipping);
    }

    #[test]
    fn free_shipping_at_threshold() {
        let items = [PricedItem {
            price: Decimal::new(200, 0),
            quantity: 1,
        }];
        let totals = compute_totals(&items, &policy()).unwrap();
        assert_eq!(totals.shipping, Decimal::ZERO);

        let below = [PricedItem {
            price: Decimal::new(19999, 2),
            quantity: 1,
        }];
        let totals = compute_totals(&below, &policy()).unwrap();
        assert_eq!(totals.shipping, Decimal::new(10, 0));
    }

    #[test]
    fn vat_rounds_to_money_precision() {
        let items = [PricedItem {
            price: Decimal::new(999, 2),
            quantity: 1,
        }];
        // 9.99 * 6% = 0.5994 -> 0.60
        let totals = compute_totals(&items, &policy()).unwrap();
        assert_eq!(totals.vat, Decimal::new(60, 2));
    }

    #[test]
    fn rejects_zero_quantity_and_negative_price() {
        let zero_qty = [PricedItem {
            price: Decimal::ONE,
            quantity: 0,
        }];
        assert!(matches!(
            compute_totals(&zero_qty, &policy()),
            Err(CommerceError::Validation(_))
        ));

        let negative = [PricedItem {
            price: Decimal::new(-5, 0),
            quantity: 1,
        }];
        assert!(matches!(
            compute_totals(&negative, &policy()),
            Err(CommerceError::Validation(_))
        ));

        assert!(compute_totals(&[], &policy()).is_err());
    }
}
