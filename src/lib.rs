//! OpenSASE Orders
//!
//! Self-hosted order management backend: product catalog, guest checkout,
//! payment confirmation (manual and WhatsApp-triggered), inventory tracking
//! with an append-only audit ledger, and admin reporting.
//!
//! ## Features
//! - Product catalog management
//! - Guest checkout with snapshotted line items and frozen totals
//! - Order status / payment state machine
//! - Inventory ledger with per-product serialization
//! - WhatsApp order notifications and inbound payment detection

use thiserror::Error;
use uuid::Uuid;

pub mod api;
pub mod config;
pub mod domain;
pub mod inventory;
pub mod notify;
pub mod orders;
pub mod payment;
pub mod pricing;
pub mod store;

pub use config::Config;

use domain::order::OrderStatus;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CommerceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("{title} is out of stock")]
    OutOfStock { title: String },

    #[error("invalid order status: {0}")]
    InvalidStatus(String),

    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("payment already confirmed")]
    AlreadyConfirmed,

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for CommerceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CommerceError>;
