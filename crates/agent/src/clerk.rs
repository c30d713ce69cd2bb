//! Conversation orchestrator
//!
//! One `ShopClerk` per client session. Each turn runs through a fixed
//! priority ladder: active checkout, pending size clarification,
//! deterministic discount routing, direct add-to-cart, then the model
//! with tools, then the model-free fallback. Deterministic stages win so
//! guardrails (abuse scan, size validation) cannot be talked around.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use clerk_config::Settings;
use clerk_core::{
    last_shown_products, ClerkReply, ConversationTurn, Product, StorefrontPorts, TurnRole,
};
use clerk_llm::{ChatBackend, Message, PromptBuilder};

use crate::checkout::{wants_checkout, CheckoutFsm};
use crate::fallback::{is_product_request, static_reply};
use crate::haggle::DiscountEngine;
use crate::inventory::InventoryCache;
use crate::resolver::{extract_size, resolve_product};
use crate::search::{rank_inventory, search_term};
use crate::tools::clerk_tools;
use crate::AgentError;

/// Turns of history replayed to the model.
const HISTORY_WINDOW: usize = 12;
/// Turns of history retained per session.
const HISTORY_CAP: usize = 60;

/// Per-clerk tuning, derived from [`Settings`].
#[derive(Debug, Clone)]
pub struct ClerkConfig {
    pub store_name: String,
    pub inventory_ttl: Duration,
    /// Max products rendered into the system prompt.
    pub prompt_limit: usize,
    pub haggle: clerk_config::HaggleSettings,
}

impl ClerkConfig {
    pub fn from_settings(store_name: impl Into<String>, settings: &Settings) -> Self {
        Self {
            store_name: store_name.into(),
            inventory_ttl: Duration::from_secs(settings.inventory.ttl_secs),
            prompt_limit: settings.inventory.prompt_limit,
            haggle: settings.haggle.clone(),
        }
    }
}

impl Default for ClerkConfig {
    fn default() -> Self {
        Self {
            store_name: "Aster & Vine".to_string(),
            inventory_ttl: Duration::from_secs(300),
            prompt_limit: 40,
            haggle: clerk_config::HaggleSettings::default(),
        }
    }
}

/// A product awaiting a size answer before it goes in the cart.
#[derive(Debug, Clone)]
pub struct PendingSizeClarification {
    pub product: Product,
    pub quantity: u32,
}

/// Mutable per-session state, all behind one lock.
pub(crate) struct SessionState {
    pub history: Vec<ConversationTurn>,
    pub pending_size: Option<PendingSizeClarification>,
    pub checkout: CheckoutFsm,
}

/// The conversational shopping agent for one session.
pub struct ShopClerk {
    pub(crate) session_id: String,
    pub(crate) config: ClerkConfig,
    pub(crate) inventory: InventoryCache,
    pub(crate) ports: StorefrontPorts,
    pub(crate) llm: Option<Arc<dyn ChatBackend>>,
    pub(crate) haggle: DiscountEngine,
    state: Mutex<SessionState>,
}

const ADD_PHRASES: &[&str] = &[
    "add to cart",
    "add it",
    "add the",
    "add that",
    "add this",
    "to my cart",
    "i'll take",
    "ill take",
    "i will take",
    "put the",
];

fn wants_add(utterance: &str) -> bool {
    let lower = utterance.to_lowercase();
    ADD_PHRASES.iter().any(|p| lower.contains(p))
}

const DISCOUNT_PHRASES: &[&str] = &[
    "discount",
    "coupon",
    "promo code",
    "% off",
    "percent off",
    "cheaper",
    "price match",
    "haggle",
];

fn wants_discount(utterance: &str) -> bool {
    let lower = utterance.to_lowercase();
    DISCOUNT_PHRASES.iter().any(|p| lower.contains(p))
}

fn is_cancelling(utterance: &str) -> bool {
    let lower = utterance.to_lowercase();
    ["cancel", "never mind", "nevermind", "forget it", "no thanks"]
        .iter()
        .any(|w| lower.contains(w))
}

impl ShopClerk {
    pub fn new(
        session_id: impl Into<String>,
        config: ClerkConfig,
        ports: StorefrontPorts,
        llm: Option<Arc<dyn ChatBackend>>,
    ) -> Self {
        let session_id = session_id.into();
        let inventory = InventoryCache::new(ports.catalog.clone(), config.inventory_ttl);
        let haggle = DiscountEngine::new(
            llm.clone(),
            ports.coupons.clone(),
            ports.session.clone(),
            config.haggle.clone(),
        );
        let checkout = CheckoutFsm::new(ports.orders.clone(), ports.session.clone());

        Self {
            session_id,
            config,
            inventory,
            ports,
            llm,
            haggle,
            state: Mutex::new(SessionState {
                history: Vec::new(),
                pending_size: None,
                checkout,
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Handle one shopper utterance and produce the clerk's reply.
    pub async fn handle_turn(&self, utterance: &str) -> Result<ClerkReply, AgentError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Ok(ClerkReply::text(
                "I didn't catch that — what can I help you find today?",
            ));
        }

        let mut state = self.state.lock().await;

        let reply = if state.checkout.is_active() || wants_checkout(utterance) {
            // A fresh checkout supersedes any open size clarification.
            if !state.checkout.is_active() {
                state.pending_size = None;
            }
            state.checkout.handle(&self.session_id, utterance).await
        } else if state.pending_size.is_some() {
            self.resume_size_clarification(&mut state, utterance).await
        } else if wants_discount(utterance) {
            let (message, action) = self.haggle.negotiate(utterance, &self.session_id).await;
            let mut reply = ClerkReply::text(message);
            if let Some(action) = action {
                reply = reply.with_action(action);
            }
            reply
        } else if wants_add(utterance) {
            self.direct_add(&mut state, utterance).await
        } else {
            self.converse(&mut state, utterance).await
        };

        state.history.push(ConversationTurn::user(utterance));
        let mut turn = ConversationTurn::assistant(reply.message.as_str());
        turn.products_shown = reply.products.clone();
        turn.action = reply.action.clone();
        state.history.push(turn);
        if state.history.len() > HISTORY_CAP {
            let excess = state.history.len() - HISTORY_CAP;
            state.history.drain(..excess);
        }

        Ok(reply)
    }

    /// The shopper was asked for a size on the previous turn.
    async fn resume_size_clarification(
        &self,
        state: &mut SessionState,
        utterance: &str,
    ) -> ClerkReply {
        let pending = match state.pending_size.clone() {
            Some(p) => p,
            None => return static_reply(utterance, &self.inventory.get().await),
        };

        if is_cancelling(utterance) {
            state.pending_size = None;
            return ClerkReply::text("No problem! Anything else I can help you find?");
        }

        match extract_size(utterance, &pending.product.sizes) {
            Some(size) => {
                let outcome = self
                    .add_to_cart(state, &pending.product, &size, pending.quantity)
                    .await;
                ClerkReply::text(outcome.message.unwrap_or_else(|| "Done!".to_string()))
            }
            None => ClerkReply::text(format!(
                "I don't have that size in the {}. Available sizes are {} — which would you like?",
                pending.product.name,
                pending.product.sizes_display()
            )),
        }
    }

    /// Add-to-cart recognized without the model: resolve the referenced
    /// product from the conversation window, then settle the size.
    async fn direct_add(&self, state: &mut SessionState, utterance: &str) -> ClerkReply {
        let inventory = self.inventory.get().await;
        let resolved =
            resolve_product(utterance, last_shown_products(&state.history), &inventory).cloned();

        let Some(product) = resolved else {
            return ClerkReply::text(
                "Which item would you like to add? You can name it or say something like \"the second one\".",
            );
        };

        let size = extract_size(utterance, &product.sizes).or_else(|| {
            // A single declared size needs no clarification.
            (product.sizes.len() == 1).then(|| product.sizes[0].clone())
        });

        match size {
            Some(size) => {
                let outcome = self.add_to_cart(state, &product, &size, 1).await;
                ClerkReply::text(outcome.message.unwrap_or_else(|| "Done!".to_string()))
            }
            None => {
                let message = format!(
                    "Which size would you like for the {}? We have it in {}.",
                    product.name,
                    product.sizes_display()
                );
                state.pending_size = Some(PendingSizeClarification {
                    product,
                    quantity: 1,
                });
                ClerkReply::text(message)
            }
        }
    }

    /// Everything else goes through the model when one is configured,
    /// otherwise through the static fallback heuristics.
    async fn converse(&self, state: &mut SessionState, utterance: &str) -> ClerkReply {
        let inventory = self.inventory.get().await;

        let Some(ref llm) = self.llm else {
            return static_reply(utterance, &inventory);
        };

        let history: Vec<Message> = state
            .history
            .iter()
            .rev()
            .take(HISTORY_WINDOW)
            .rev()
            .map(|turn| match turn.role {
                TurnRole::User => Message::user(turn.text.as_str()),
                TurnRole::Assistant => Message::assistant(turn.text.as_str()),
            })
            .collect();

        let messages = PromptBuilder::new(self.config.store_name.as_str())
            .system_prompt(&inventory, self.config.prompt_limit)
            .with_history(&history)
            .user_message(utterance)
            .build();

        let response = match llm.chat(&messages, &clerk_tools()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Model call failed, using fallback: {}", e);
                return static_reply(utterance, &inventory);
            }
        };

        let mut parts: Vec<String> = Vec::new();
        let text = response.text.trim();
        if !text.is_empty() {
            parts.push(text.to_string());
        }

        let mut products: Vec<Product> = Vec::new();
        let mut action = None;

        for call in &response.tool_calls {
            let outcome = self.execute_tool(state, call).await;
            if let Some(message) = outcome.message {
                parts.push(message);
            }
            for p in outcome.products {
                if !products.iter().any(|q| q.id == p.id) {
                    products.push(p);
                }
            }
            // Last action wins when a turn produced several.
            if outcome.action.is_some() {
                action = outcome.action;
            }
        }

        // A plain-text answer to a product question still shows products.
        if response.tool_calls.is_empty() && is_product_request(utterance, &inventory) {
            let ranked = rank_inventory(utterance, &inventory);
            if !ranked.is_empty() {
                products = ranked.into_iter().take(6).collect();
                action = Some(clerk_core::ClerkAction::search(search_term(
                    utterance, &inventory,
                )));
            }
        }

        let message = if parts.is_empty() {
            if !products.is_empty() {
                "Here are some options you might like:".to_string()
            } else {
                "Got it! Anything else I can help you with?".to_string()
            }
        } else {
            parts.join("\n\n")
        };

        let mut reply = ClerkReply::text(message).with_products(products);
        if let Some(action) = action {
            reply = reply.with_action(action);
        }
        reply
    }
}
