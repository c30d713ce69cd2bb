//! Checkout state machine
//!
//! One field per turn, in a fixed order, with per-field validation.
//! A rejected answer re-asks the same prompt; "cancel" or a refusal at
//! any step abandons the flow and resets to Idle.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use clerk_core::{
    ClerkAction, ClerkReply, Order, Orders, SessionStore, ShippingAddress, StoreError,
    APPLIED_COUPON_KEY,
};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Idle,
    Email,
    FirstName,
    LastName,
    Address,
    City,
    State,
    Zip,
    Confirm,
}

#[derive(Debug, Clone, Default)]
struct DraftAddress {
    email: String,
    first_name: String,
    last_name: String,
    address: String,
    city: String,
    state: String,
    zip: String,
}

impl DraftAddress {
    fn into_shipping(self) -> ShippingAddress {
        ShippingAddress {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            address: self.address,
            city: self.city,
            state: self.state,
            zip: self.zip,
        }
    }
}

/// Guided checkout conversation. Owns the step cursor and the partially
/// collected address; order placement goes through the [`Orders`] port.
pub struct CheckoutFsm {
    step: CheckoutStep,
    draft: DraftAddress,
    orders: Arc<dyn Orders>,
    session_store: Arc<dyn SessionStore>,
}

/// Utterances that signal the shopper wants to start checking out.
const CHECKOUT_PHRASES: &[&str] = &[
    "check out",
    "checkout",
    "place my order",
    "place the order",
    "place an order",
    "buy now",
    "complete my purchase",
    "complete the purchase",
    "finish my order",
    "pay now",
];

const CANCEL_WORDS: &[&str] = &["cancel", "stop", "never mind", "nevermind", "forget it"];

pub fn wants_checkout(utterance: &str) -> bool {
    let lower = utterance.to_lowercase();
    CHECKOUT_PHRASES.iter().any(|p| lower.contains(p))
}

fn is_cancel(utterance: &str) -> bool {
    let lower = utterance.to_lowercase();
    CANCEL_WORDS.iter().any(|w| lower.contains(w))
}

fn is_affirmative(utterance: &str) -> bool {
    let lower = utterance.trim().to_lowercase();
    matches!(
        lower.as_str(),
        "yes" | "y" | "yes please" | "yep" | "yeah" | "sure" | "confirm" | "confirmed"
            | "correct" | "that's right" | "place it" | "place the order" | "go ahead" | "ok"
            | "okay"
    )
}

fn is_negative(utterance: &str) -> bool {
    let lower = utterance.trim().to_lowercase();
    matches!(lower.as_str(), "no" | "n" | "nope" | "no thanks" | "not yet")
}

impl CheckoutFsm {
    pub fn new(orders: Arc<dyn Orders>, session_store: Arc<dyn SessionStore>) -> Self {
        Self {
            step: CheckoutStep::Idle,
            draft: DraftAddress::default(),
            orders,
            session_store,
        }
    }

    pub fn is_active(&self) -> bool {
        self.step != CheckoutStep::Idle
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    fn reset(&mut self) {
        self.step = CheckoutStep::Idle;
        self.draft = DraftAddress::default();
    }

    fn prompt_for(step: CheckoutStep) -> &'static str {
        match step {
            CheckoutStep::Email => "Great, let's get your order placed! What's your email address?",
            CheckoutStep::FirstName => "What's your first name?",
            CheckoutStep::LastName => "And your last name?",
            CheckoutStep::Address => "What's your street address?",
            CheckoutStep::City => "Which city?",
            CheckoutStep::State => "Which state or province?",
            CheckoutStep::Zip => "And your zip or postal code?",
            CheckoutStep::Idle | CheckoutStep::Confirm => "",
        }
    }

    /// Advance the machine by one shopper utterance.
    pub async fn handle(&mut self, session_id: &str, utterance: &str) -> ClerkReply {
        // A refusal at Confirm gets its own wording below; everywhere
        // else "no" abandons the flow just like "cancel".
        let abandoning = is_cancel(utterance)
            || (self.step != CheckoutStep::Confirm && is_negative(utterance));
        if self.step != CheckoutStep::Idle && abandoning {
            self.reset();
            return ClerkReply::text(
                "No problem, I've cancelled checkout. Your cart is still saved whenever you're ready.",
            );
        }

        let input = utterance.trim();

        match self.step {
            CheckoutStep::Idle => {
                self.step = CheckoutStep::Email;
                ClerkReply::text(Self::prompt_for(CheckoutStep::Email))
            }
            CheckoutStep::Email => {
                if !EMAIL_RE.is_match(input) {
                    return ClerkReply::text(
                        "That doesn't look like a valid email address. What's your email address?",
                    );
                }
                self.draft.email = input.to_string();
                self.step = CheckoutStep::FirstName;
                ClerkReply::text(Self::prompt_for(CheckoutStep::FirstName))
            }
            CheckoutStep::FirstName => {
                if input.is_empty() {
                    return ClerkReply::text("I didn't catch that. What's your first name?");
                }
                self.draft.first_name = input.to_string();
                self.step = CheckoutStep::LastName;
                ClerkReply::text(Self::prompt_for(CheckoutStep::LastName))
            }
            CheckoutStep::LastName => {
                if input.is_empty() {
                    return ClerkReply::text("I didn't catch that. And your last name?");
                }
                self.draft.last_name = input.to_string();
                self.step = CheckoutStep::Address;
                ClerkReply::text(Self::prompt_for(CheckoutStep::Address))
            }
            CheckoutStep::Address => {
                if input.len() < 3 {
                    return ClerkReply::text(
                        "That address looks too short. What's your street address?",
                    );
                }
                self.draft.address = input.to_string();
                self.step = CheckoutStep::City;
                ClerkReply::text(Self::prompt_for(CheckoutStep::City))
            }
            CheckoutStep::City => {
                if input.len() < 2 {
                    return ClerkReply::text("I didn't catch that. Which city?");
                }
                self.draft.city = input.to_string();
                self.step = CheckoutStep::State;
                ClerkReply::text(Self::prompt_for(CheckoutStep::State))
            }
            CheckoutStep::State => {
                if input.len() < 2 {
                    return ClerkReply::text("I didn't catch that. Which state or province?");
                }
                self.draft.state = input.to_string();
                self.step = CheckoutStep::Zip;
                ClerkReply::text(Self::prompt_for(CheckoutStep::Zip))
            }
            CheckoutStep::Zip => {
                if input.len() < 3 {
                    return ClerkReply::text(
                        "That doesn't look like a valid code. And your zip or postal code?",
                    );
                }
                self.draft.zip = input.to_string();
                self.step = CheckoutStep::Confirm;
                self.confirmation_summary(session_id).await
            }
            CheckoutStep::Confirm => {
                if is_affirmative(input) {
                    self.place_order(session_id).await
                } else if is_negative(input) {
                    self.reset();
                    ClerkReply::text(
                        "Okay, I won't place the order. Let me know if you'd like to start over or keep shopping.",
                    )
                } else {
                    ClerkReply::text(
                        "Just to confirm — should I place the order? (yes/no)",
                    )
                }
            }
        }
    }

    async fn applied_coupon(&self, session_id: &str) -> Option<String> {
        match self.session_store.get(session_id, APPLIED_COUPON_KEY).await {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!("Could not read applied coupon: {}", e);
                None
            }
        }
    }

    async fn confirmation_summary(&self, session_id: &str) -> ClerkReply {
        let shipping = self.draft.clone().into_shipping();
        let mut message = format!(
            "Here's what I have:\n{}\n",
            shipping.summary()
        );
        if let Some(code) = self.applied_coupon(session_id).await {
            message.push_str(&format!("Coupon applied: {}\n", code));
        }
        message.push_str("Shall I place the order? (yes/no)");
        ClerkReply::text(message)
    }

    async fn place_order(&mut self, session_id: &str) -> ClerkReply {
        let coupon_code = self.applied_coupon(session_id).await;
        let shipping = self.draft.clone().into_shipping();

        let result = self
            .orders
            .create_order(session_id, &shipping, coupon_code.as_deref())
            .await;

        match result {
            Ok(Order { id, coupon_code }) => {
                self.reset();
                let mut message = format!(
                    "Your order is placed! Order number {}. A confirmation is on its way to your email.",
                    id
                );
                if let Some(code) = coupon_code {
                    message.push_str(&format!(" Discount code {} was applied.", code));
                }
                ClerkReply::text(message)
            }
            Err(StoreError::AuthRequired) => {
                self.reset();
                ClerkReply::text(
                    "It looks like you need to sign in to complete your order. I'll take you to the sign-in page.",
                )
                .with_action(ClerkAction::Navigate {
                    path: "/sign-in".to_string(),
                })
            }
            Err(e) => {
                tracing::warn!("Order placement failed: {}", e);
                self.reset();
                ClerkReply::text(
                    "I'm sorry, something went wrong placing your order. Let me take you to the checkout page so you can finish there.",
                )
                .with_action(ClerkAction::Navigate {
                    path: "/checkout".to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::InMemoryStorefront;

    fn fsm(store: &Arc<InMemoryStorefront>) -> CheckoutFsm {
        CheckoutFsm::new(store.clone(), store.clone())
    }

    #[test]
    fn test_wants_checkout() {
        assert!(wants_checkout("I'd like to check out now"));
        assert!(wants_checkout("let's place my order"));
        assert!(!wants_checkout("show me some boots"));
    }

    #[tokio::test]
    async fn test_full_flow_places_one_order() {
        let store = Arc::new(InMemoryStorefront::new(Vec::new()));
        let mut fsm = fsm(&store);

        let script = [
            "check out",
            "jo@example.com",
            "Jo",
            "Reyes",
            "14 Mulberry Lane",
            "Portland",
            "OR",
            "97201",
        ];
        for line in script {
            fsm.handle("s1", line).await;
        }
        assert_eq!(fsm.step(), CheckoutStep::Confirm);

        let reply = fsm.handle("s1", "yes").await;
        assert!(reply.message.contains("placed"));
        assert_eq!(store.created_orders().len(), 1);
        assert_eq!(fsm.step(), CheckoutStep::Idle);
    }

    #[tokio::test]
    async fn test_invalid_email_reasks() {
        let store = Arc::new(InMemoryStorefront::new(Vec::new()));
        let mut fsm = fsm(&store);
        fsm.handle("s1", "checkout").await;

        let reply = fsm.handle("s1", "not-an-email").await;
        assert!(reply.message.contains("email"));
        assert_eq!(fsm.step(), CheckoutStep::Email);

        fsm.handle("s1", "a@b.co").await;
        assert_eq!(fsm.step(), CheckoutStep::FirstName);
    }

    #[tokio::test]
    async fn test_cancel_mid_flow_resets() {
        let store = Arc::new(InMemoryStorefront::new(Vec::new()));
        let mut fsm = fsm(&store);
        fsm.handle("s1", "checkout").await;
        fsm.handle("s1", "a@b.co").await;

        let reply = fsm.handle("s1", "cancel").await;
        assert!(reply.message.contains("cancelled"));
        assert!(!fsm.is_active());
        assert!(store.created_orders().is_empty());
    }

    #[tokio::test]
    async fn test_refusal_mid_flow_resets() {
        let store = Arc::new(InMemoryStorefront::new(Vec::new()));
        let mut fsm = fsm(&store);
        fsm.handle("s1", "checkout").await;
        fsm.handle("s1", "a@b.co").await;

        // "no" at the first-name step must not be stored as a name.
        let reply = fsm.handle("s1", "no").await;
        assert!(reply.message.contains("cancelled"));
        assert_eq!(fsm.step(), CheckoutStep::Idle);
        assert!(store.created_orders().is_empty());
    }

    #[tokio::test]
    async fn test_decline_at_confirm_resets_without_order() {
        let store = Arc::new(InMemoryStorefront::new(Vec::new()));
        let mut fsm = fsm(&store);
        for line in [
            "check out",
            "jo@example.com",
            "Jo",
            "Reyes",
            "14 Mulberry Lane",
            "Portland",
            "OR",
            "97201",
        ] {
            fsm.handle("s1", line).await;
        }

        fsm.handle("s1", "no").await;
        assert!(!fsm.is_active());
        assert!(store.created_orders().is_empty());
    }

    #[tokio::test]
    async fn test_confirmation_mentions_coupon() {
        let store = Arc::new(InMemoryStorefront::new(Vec::new()));
        store
            .set("s1", APPLIED_COUPON_KEY, "BDAY-15ABCD")
            .await
            .unwrap();
        let mut fsm = fsm(&store);
        for line in [
            "check out",
            "jo@example.com",
            "Jo",
            "Reyes",
            "14 Mulberry Lane",
            "Portland",
            "OR",
        ] {
            fsm.handle("s1", line).await;
        }
        let reply = fsm.handle("s1", "97201").await;
        assert!(reply.message.contains("BDAY-15ABCD"));
    }

    #[tokio::test]
    async fn test_auth_required_navigates_to_sign_in() {
        let store = Arc::new(InMemoryStorefront::new(Vec::new()));
        store.require_auth(true);
        let mut fsm = fsm(&store);
        for line in [
            "check out",
            "jo@example.com",
            "Jo",
            "Reyes",
            "14 Mulberry Lane",
            "Portland",
            "OR",
            "97201",
        ] {
            fsm.handle("s1", line).await;
        }
        let reply = fsm.handle("s1", "yes").await;
        assert!(matches!(
            reply.action,
            Some(ClerkAction::Navigate { ref path }) if path == "/sign-in"
        ));
        assert!(!fsm.is_active());
    }
}
