//! Conversation types
//!
//! The visible history of one shopping session: alternating user and
//! assistant turns. Only assistant turns with a non-empty product list feed
//! reference resolution ("the second one" points into the most recent such
//! list).

use serde::{Deserialize, Serialize};

use crate::action::ClerkAction;
use crate::product::Product;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One turn in the session's visible history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    /// Products shown with this turn, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products_shown: Vec<Product>,
    /// Action emitted with this turn, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ClerkAction>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            products_shown: Vec::new(),
            action: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            products_shown: Vec::new(),
            action: None,
        }
    }
}

/// The clerk's answer to one utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClerkReply {
    /// User-facing message, never empty
    pub message: String,
    /// Products to render with the message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<Product>,
    /// At most one storefront action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ClerkAction>,
}

impl ClerkReply {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            products: Vec::new(),
            action: None,
        }
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_action(mut self, action: ClerkAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Most recent non-empty product list shown to the user.
pub fn last_shown_products(history: &[ConversationTurn]) -> &[Product] {
    history
        .iter()
        .rev()
        .find(|t| t.role == TurnRole::Assistant && !t.products_shown.is_empty())
        .map(|t| t.products_shown.as_slice())
        .unwrap_or(&[])
}
