//! Prompt building
//!
//! Constructs the message list for the shopping clerk: system prompt with
//! the current inventory rendered as a compact listing, conversation
//! history, and the current utterance.

use serde::{Deserialize, Serialize};
use std::fmt;

use clerk_core::Product;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Prompt builder for the shop clerk
pub struct PromptBuilder {
    messages: Vec<Message>,
    store_name: String,
}

impl PromptBuilder {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            store_name: store_name.into(),
        }
    }

    /// System prompt with the current inventory rendered as context.
    pub fn system_prompt(mut self, inventory: &[Product], limit: usize) -> Self {
        let listing = render_inventory(inventory, limit);

        let system = format!(
            r#"You are the shopping assistant for {store}, an online fashion boutique.

## Your Role
- Help shoppers find products, compare options, and build their cart
- Use the provided tools for every store action; never invent product data
- Negotiate discounts only through the generate_discount tool
- Keep replies short, warm, and conversational (1-3 sentences)

## Current Inventory
{listing}

## Rules
- Recommend only products from the inventory above
- When a shopper asks to see or filter products, call search_products or apply_filter
- When a shopper wants an item, call add_to_cart with the exact product id and a declared size
- Never promise a discount percentage yourself; the store decides"#,
            store = self.store_name,
            listing = listing,
        );

        self.messages.push(Message::system(system));
        self
    }

    /// Add prior conversation turns.
    pub fn with_history(mut self, history: &[Message]) -> Self {
        self.messages.extend(history.iter().cloned());
        self
    }

    /// Add the current user utterance.
    pub fn user_message(mut self, message: &str) -> Self {
        self.messages.push(Message::user(message));
        self
    }

    pub fn build(self) -> Vec<Message> {
        self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Render products into a compact one-line-per-product listing.
pub fn render_inventory(products: &[Product], limit: usize) -> String {
    if products.is_empty() {
        return "(inventory temporarily unavailable)".to_string();
    }

    products
        .iter()
        .take(limit)
        .map(|p| {
            format!(
                "- [{}] {} | {} | ${:.2} | sizes: {} | stock: {}",
                p.id,
                p.name,
                p.category,
                p.price,
                p.sizes.join("/"),
                p.stock
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
