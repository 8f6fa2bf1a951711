//! Domain model: products, orders, ledger entries and the events they raise.

pub mod contact;
pub mod events;
pub mod ledger;
pub mod order;
pub mod product;

pub use contact::{normalize_phone, GuestInfo};
pub use events::OrderEvent;
pub use ledger::{ChangeContext, ChangeReason, InventoryLogEntry};
pub use order::{LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus};
pub use product::{Product, ProductCategory, ProductVariant};
