//! Product catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CommerceError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Unit price. Stock changes never touch this; orders snapshot it.
    pub price: Decimal,
    pub price_display: String,
    pub image: String,
    pub category: ProductCategory,
    pub variants: Vec<ProductVariant>,
    pub stock: i64,
    pub low_stock_threshold: i64,
    pub rating: f32,
    pub active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    #[default]
    Treaties,
    Memoria,
    Convention,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductVariant {
    pub name: String,
    pub price: Decimal,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Treaties => "treaties",
            Self::Memoria => "memoria",
            Self::Convention => "convention",
        }
    }

    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "treaties" => Ok(Self::Treaties),
            "memoria" => Ok(Self::Memoria),
            "convention" => Ok(Self::Convention),
            other => Err(CommerceError::Validation(format!(
                "unknown product category: {other}"
            ))),
        }
    }
}

impl Product {
    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock <= self.low_stock_threshold
    }

    /// Price for the given variant name, falling back to the base price when
    /// the variant is unknown or not specified.
    pub fn unit_price(&self, variant: Option<&str>) -> Decimal {
        variant
            .and_then(|name| self.variants.iter().find(|v| v.name == name))
            .map(|v| v.price)
            .unwrap_or(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, threshold: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: "Butter Croissant".to_string(),
            description: "Flaky, fresh every morning".to_string(),
            price: Decimal::new(1500, 2),
            price_display: "GH₵ 15.00".to_string(),
            image: "https://cdn.example.com/croissant.jpg".to_string(),
            category: ProductCategory::default(),
            variants: vec![ProductVariant {
                name: "box of 6".to_string(),
                price: Decimal::new(8000, 2),
            }],
            stock,
            low_stock_threshold: threshold,
            rating: 0.0,
            active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_excludes_zero() {
        assert!(product(3, 10).is_low_stock());
        assert!(!product(0, 10).is_low_stock());
        assert!(product(0, 10).is_out_of_stock());
        assert!(!product(11, 10).is_low_stock());
    }

    #[test]
    fn variant_price_lookup() {
        let p = product(5, 10);
        assert_eq!(p.unit_price(None), Decimal::new(1500, 2));
        assert_eq!(p.unit_price(Some("box of 6")), Decimal::new(8000, 2));
        assert_eq!(p.unit_price(Some("missing")), Decimal::new(1500, 2));
    }

    #[test]
    fn category_round_trip() {
        assert_eq!(
            ProductCategory::parse("memoria").unwrap(),
            ProductCategory::Memoria
        );
        assert!(ProductCategory::parse("bogus").is_err());
    }
}
