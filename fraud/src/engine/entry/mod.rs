pub mod purchase;

pub use purchase::{OrderId, PurchaseBatch, PurchaseRecord};
