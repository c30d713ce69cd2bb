//! Storefront ports
//!
//! The agent treats the rest of the storefront as an external collaborator
//! behind these traits. Implementations may talk to a database, an HTTP
//! backend, or (for tests and demos) plain in-memory maps.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::action::SearchFilters;
use crate::checkout::{Order, ShippingAddress};
use crate::coupon::Coupon;
use crate::product::Product;

/// Errors surfaced by storefront capabilities.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation needs a signed-in customer.
    #[error("authentication required")]
    AuthRequired,

    #[error("storefront unavailable: {0}")]
    Unavailable(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn is_auth_required(&self) -> bool {
        matches!(self, StoreError::AuthRequired)
    }
}

/// Read access to the product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// List products, optionally filtered and sorted.
    async fn list_products(&self, filters: &SearchFilters) -> Result<Vec<Product>, StoreError>;

    /// Relevance-ranked search (the catalog owns the ranking algorithm).
    async fn search_products(&self, query: &str, limit: usize)
        -> Result<Vec<Product>, StoreError>;

    /// Product counts per category name.
    async fn category_counts(&self) -> Result<HashMap<String, usize>, StoreError>;
}

/// Cart mutations for the current session.
#[async_trait]
pub trait Cart: Send + Sync {
    async fn add_item(
        &self,
        session_id: &str,
        product_id: &str,
        size: &str,
        quantity: u32,
    ) -> Result<(), StoreError>;
}

/// Order creation.
#[async_trait]
pub trait Orders: Send + Sync {
    async fn create_order(
        &self,
        session_id: &str,
        shipping: &ShippingAddress,
        coupon_code: Option<&str>,
    ) -> Result<Order, StoreError>;
}

/// Coupon persistence. The haggle engine synthesizes the coupon; this port
/// registers it so the code is redeemable.
#[async_trait]
pub trait Coupons: Send + Sync {
    async fn issue_coupon(&self, coupon: &Coupon) -> Result<(), StoreError>;
}

/// Session-scoped key/value storage (e.g. the applied coupon code).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, session_id: &str, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Bundle of all storefront capabilities the agent consumes.
#[derive(Clone)]
pub struct StorefrontPorts {
    pub catalog: Arc<dyn Catalog>,
    pub cart: Arc<dyn Cart>,
    pub orders: Arc<dyn Orders>,
    pub coupons: Arc<dyn Coupons>,
    pub session: Arc<dyn SessionStore>,
}
