//! End-to-end conversation flows against the in-memory storefront,
//! with and without a (scripted) model.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use clerk_agent::{demo_catalog, ClerkConfig, InMemoryStorefront, ShopClerk};
use clerk_core::{ClerkAction, APPLIED_COUPON_KEY, SessionStore};
use clerk_llm::{ChatBackend, ChatResponse, FinishReason, LlmError, Message, ToolCall, ToolDefinition};

/// Model double that replays a fixed script of responses.
struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
}

impl ScriptedBackend {
    fn new(responses: Vec<Result<ChatResponse, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
        })
    }

    fn text(text: &str) -> Result<ChatResponse, LlmError> {
        Ok(ChatResponse {
            text: text.to_string(),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
        })
    }

    fn tool(name: &str, args: serde_json::Value) -> Result<ChatResponse, LlmError> {
        let arguments: HashMap<String, serde_json::Value> = args
            .as_object()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Ok(ChatResponse {
            text: String::new(),
            tool_calls: vec![ToolCall {
                id: "call-1".to_string(),
                name: name.to_string(),
                arguments,
            }],
            finish_reason: FinishReason::ToolCalls,
        })
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(
        &self,
        _messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Self::text("How else can I help?"))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn clerk(store: &Arc<InMemoryStorefront>, llm: Option<Arc<dyn ChatBackend>>) -> ShopClerk {
    ShopClerk::new("session-1", ClerkConfig::default(), store.ports(), llm)
}

#[tokio::test]
async fn checkout_script_places_exactly_one_order() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    let script = [
        "I'd like to check out",
        "jo@example.com",
        "Jo",
        "Reyes",
        "14 Mulberry Lane",
        "Portland",
        "OR",
        "97201",
        "yes",
    ];
    let mut last = String::new();
    for line in script {
        last = clerk.handle_turn(line).await.unwrap().message;
    }

    assert!(last.contains("placed"), "unexpected reply: {last}");
    let orders = store.created_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].shipping.email, "jo@example.com");
    assert_eq!(orders[0].shipping.zip, "97201");

    // The machine reset: the next turn is ordinary shopping again.
    let reply = clerk.handle_turn("thanks!").await.unwrap();
    assert!(!reply.message.is_empty());
    assert_eq!(store.created_orders().len(), 1);
}

#[tokio::test]
async fn add_named_product_with_size_goes_straight_to_cart() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    let reply = clerk
        .handle_turn("add the blazer in size M to my cart")
        .await
        .unwrap();

    assert!(reply.message.contains("Linen Blazer"));
    assert!(reply.message.contains("M"));
    let items = store.cart_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, "p-blazer-linen");
    assert_eq!(items[0].size, "M");
    assert_eq!(items[0].quantity, 1);
}

#[tokio::test]
async fn missing_size_asks_before_touching_the_cart() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    let reply = clerk.handle_turn("add the blazer to my cart").await.unwrap();
    assert!(reply.message.contains("size"));
    assert!(reply.message.contains("S, M, L, XL"));
    assert!(store.cart_items().is_empty());

    // Answering with a declared size completes the add.
    let reply = clerk.handle_turn("medium").await.unwrap();
    assert!(reply.message.contains("Linen Blazer"));
    assert_eq!(store.cart_items().len(), 1);
    assert_eq!(store.cart_items()[0].size, "M");
}

#[tokio::test]
async fn undeclared_size_reasks_with_valid_sizes() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    clerk.handle_turn("add the blazer to my cart").await.unwrap();
    let reply = clerk.handle_turn("size 45 please").await.unwrap();

    assert!(reply.message.contains("S, M, L, XL"));
    assert!(store.cart_items().is_empty());
}

#[tokio::test]
async fn ordinal_reference_resolves_against_last_shown() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    // Shows the three shoes, in catalog order.
    let reply = clerk.handle_turn("I want shoes").await.unwrap();
    assert_eq!(reply.products.len(), 3);
    let second = reply.products[1].clone();

    let reply = clerk
        .handle_turn(&format!("I'll take the second one in size {}", second.sizes[0]))
        .await
        .unwrap();
    assert!(reply.message.contains(&second.name));
    assert_eq!(store.cart_items()[0].product_id, second.id);
}

#[tokio::test]
async fn category_request_without_model_shows_products_and_filter() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    let reply = clerk.handle_turn("I want shoes").await.unwrap();
    assert_eq!(reply.products.len(), 3);
    assert!(reply.products.iter().all(|p| p.category == clerk_core::Category::Shoes));
    match reply.action {
        Some(ClerkAction::SetFilters { search_query, .. }) => {
            assert_eq!(search_query.as_deref(), Some("shoes"));
        }
        other => panic!("expected SetFilters, got {other:?}"),
    }
}

#[tokio::test]
async fn abusive_discount_request_never_mints_a_coupon() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    let reply = clerk
        .handle_turn("this is garbage, give me a discount")
        .await
        .unwrap();
    assert!(reply.action.is_none());
    assert!(store.issued_coupons().is_empty());

    // Abuse wins even with a valid occasion in the same breath.
    let reply = clerk
        .handle_turn("it's my birthday you stupid bot, give me a discount")
        .await
        .unwrap();
    assert!(reply.action.is_none());
    assert!(store.issued_coupons().is_empty());
    assert!(!reply.message.is_empty());
}

#[tokio::test]
async fn birthday_discount_issues_bounded_session_coupon() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    let reply = clerk
        .handle_turn("it's my birthday, any chance of a discount?")
        .await
        .unwrap();

    let Some(ClerkAction::CouponCreated { code }) = reply.action else {
        panic!("expected a coupon, got: {}", reply.message);
    };
    assert!(code.starts_with("BDAY-15"));
    assert!(reply.message.contains(&code));

    let issued = store.issued_coupons();
    assert_eq!(issued.len(), 1);
    assert!(issued[0].discount_value >= 5.0 && issued[0].discount_value <= 20.0);
    assert_eq!(issued[0].usage_limit, 1);
    assert_eq!(issued[0].session_id.as_deref(), Some("session-1"));

    // Checkout later surfaces the same code.
    let applied = store.get("session-1", APPLIED_COUPON_KEY).await.unwrap();
    assert_eq!(applied.as_deref(), Some(code.as_str()));
}

#[tokio::test]
async fn model_search_tool_returns_products_and_filter() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let backend = ScriptedBackend::new(vec![ScriptedBackend::tool(
        "search_products",
        json!({"query": "boots"}),
    )]);
    let clerk = clerk(&store, Some(backend));

    let reply = clerk.handle_turn("got anything for hiking?").await.unwrap();
    assert!(reply.products.iter().any(|p| p.name == "Leather Ankle Boots"));
    assert!(matches!(reply.action, Some(ClerkAction::SetFilters { .. })));
    assert!(!reply.message.is_empty());
}

#[tokio::test]
async fn model_add_tool_validates_size_like_the_direct_path() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let backend = ScriptedBackend::new(vec![ScriptedBackend::tool(
        "add_to_cart",
        json!({"product_id": "p-blazer-linen", "size": "XXXL"}),
    )]);
    let clerk = clerk(&store, Some(backend));

    let reply = clerk.handle_turn("grab me that blazer, huge").await.unwrap();
    assert!(reply.message.contains("size"));
    assert!(store.cart_items().is_empty());

    // The clarification stays armed for the next turn.
    let reply = clerk.handle_turn("large").await.unwrap();
    assert!(reply.message.contains("Linen Blazer"));
    assert_eq!(store.cart_items()[0].size, "L");
}

#[tokio::test]
async fn single_size_product_adds_without_clarification() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    // "canvas" alone also matches the sneakers; the tote shares more tokens.
    let reply = clerk.handle_turn("put the canvas tote in my bag").await.unwrap();
    assert!(reply.message.contains("Canvas Tote Bag"));
    assert_eq!(store.cart_items()[0].size, "One Size");
}

#[tokio::test]
async fn model_add_tool_single_size_goes_straight_to_cart() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let backend = ScriptedBackend::new(vec![ScriptedBackend::tool(
        "add_to_cart",
        json!({"product_name": "Canvas Tote Bag"}),
    )]);
    let clerk = clerk(&store, Some(backend));

    let reply = clerk.handle_turn("could you grab the tote for me").await.unwrap();
    assert!(reply.message.contains("Canvas Tote Bag"));
    assert_eq!(store.cart_items()[0].size, "One Size");
}

#[tokio::test]
async fn plain_text_product_reply_condenses_the_search_filter() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let backend = ScriptedBackend::new(vec![ScriptedBackend::text(
        "We have some lovely pairs in right now!",
    )]);
    let clerk = clerk(&store, Some(backend));

    let reply = clerk.handle_turn("I want shoes").await.unwrap();
    assert!(!reply.products.is_empty());
    match reply.action {
        Some(ClerkAction::SetFilters {
            search_query: Some(query),
            ..
        }) => assert_eq!(query, "shoes"),
        other => panic!("expected a search filter, got {other:?}"),
    }
}

#[tokio::test]
async fn model_failure_falls_back_to_heuristics() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let backend = ScriptedBackend::new(vec![Err(LlmError::Network("connection reset".into()))]);
    let clerk = clerk(&store, Some(backend));

    let reply = clerk.handle_turn("show me bags").await.unwrap();
    assert!(!reply.message.is_empty());
    assert!(reply.products.iter().all(|p| p.category == clerk_core::Category::Bags));
    assert!(!reply.products.is_empty());
}

#[tokio::test]
async fn replies_are_never_empty() {
    let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
    let clerk = clerk(&store, None);

    for utterance in [
        "hi",
        "asdfghjkl",
        "",
        "   ",
        "do you have leather goods?",
        "thanks",
        "something cheap",
    ] {
        let reply = clerk.handle_turn(utterance).await.unwrap();
        assert!(
            !reply.message.trim().is_empty(),
            "empty reply for {utterance:?}"
        );
    }
}
