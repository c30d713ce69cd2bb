//! Core types for the shop clerk
//!
//! This crate provides foundational types used across all other crates:
//! - Catalog domain types (products, categories, coupons)
//! - Conversation types (turns, replies, storefront actions)
//! - Storefront port traits for pluggable backends
//! - Error types

pub mod action;
pub mod checkout;
pub mod conversation;
pub mod coupon;
pub mod product;
pub mod storefront;

pub use action::{ClerkAction, SearchFilters, SortBy, SortOrder};
pub use checkout::{Order, ShippingAddress};
pub use conversation::{last_shown_products, ClerkReply, ConversationTurn, TurnRole};
pub use coupon::{Coupon, DiscountType};
pub use product::{Category, InventorySnapshot, Product};
pub use storefront::{
    Cart, Catalog, Coupons, Orders, SessionStore, StoreError, StorefrontPorts,
};

/// Session-scoped key under which an applied coupon code is persisted.
pub const APPLIED_COUPON_KEY: &str = "applied_coupon_code";
