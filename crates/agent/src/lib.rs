//! Conversational Shopping Agent
//!
//! Turns one free-text utterance into zero-or-more store actions:
//! - Tool-calling orchestration against an external generative model
//! - Multi-turn checkout state machine
//! - Rule-first discount ("haggle") engine with adversarial-input handling
//! - Heuristic product/size reference resolution over the conversation window
//! - TTL read-through inventory cache
//!
//! All mutable session state lives inside one `ShopClerk` instance for the
//! lifetime of the client session; nothing is persisted server-side.

pub mod checkout;
pub mod clerk;
pub mod fallback;
pub mod haggle;
pub mod inventory;
pub mod resolver;
pub mod search;
pub mod storefront;
pub mod tools;

pub use checkout::{CheckoutFsm, CheckoutStep};
pub use clerk::{ClerkConfig, PendingSizeClarification, ShopClerk};
pub use haggle::{DiscountAnalysis, DiscountEngine, Sentiment};
pub use inventory::InventoryCache;
pub use storefront::{demo_catalog, InMemoryStorefront};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Conversation error: {0}")]
    Conversation(String),

    #[error("Checkout error: {0}")]
    Checkout(String),

    #[error("Haggle error: {0}")]
    Haggle(String),

    #[error("Store error: {0}")]
    Store(#[from] clerk_core::StoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] clerk_llm::LlmError),
}
