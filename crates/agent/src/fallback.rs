//! Local fallback heuristics
//!
//! Two jobs, both independent of the external model:
//! - classify an utterance as a product request, so results are never
//!   silently withheld when the model replies with plain text (or fails)
//! - answer common asks with static keyword rules when the model layer is
//!   entirely unavailable

use unicode_segmentation::UnicodeSegmentation;

use clerk_core::{ClerkAction, ClerkReply, Product, SortBy, SortOrder};

use crate::search;

/// Phrases that signal "show me products" regardless of inventory wording.
const INTENT_PHRASES: &[&str] = &[
    "show me",
    "find",
    "looking for",
    "do you have",
    "search",
    "browse",
    "i want",
    "i need",
];

/// Whether an utterance is clearly asking for products: an intent phrase,
/// or a token matching a live category, tag, or product-name token.
pub fn is_product_request(utterance: &str, inventory: &[Product]) -> bool {
    let lower = utterance.to_lowercase();

    if INTENT_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }

    let tokens: Vec<&str> = lower.unicode_words().filter(|t| t.len() >= 3).collect();
    tokens.iter().any(|token| {
        if search::category_for_token(token).is_some() {
            return true;
        }
        inventory.iter().any(|p| {
            p.tags.iter().any(|t| t.eq_ignore_ascii_case(token))
                || p.name
                    .to_lowercase()
                    .unicode_words()
                    .any(|w| w.len() >= 4 && w == *token)
        })
    })
}

fn sorted_by_price(inventory: &[Product], order: SortOrder) -> Vec<Product> {
    let mut products = inventory.to_vec();
    products.sort_by(|a, b| {
        let cmp = a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal);
        match order {
            SortOrder::Asc => cmp,
            SortOrder::Desc => cmp.reverse(),
        }
    });
    products.truncate(6);
    products
}

fn price_filter_action(order: SortOrder) -> ClerkAction {
    ClerkAction::SetFilters {
        category: None,
        search_query: None,
        sort_by: Some(SortBy::Price),
        sort_order: Some(order),
        min_price: None,
        max_price: None,
    }
}

/// Static keyword reply, used when the model layer is unavailable.
/// Always produces something; the default is a popular-items pitch.
pub fn static_reply(utterance: &str, inventory: &[Product]) -> ClerkReply {
    let lower = utterance.to_lowercase();

    // Greetings and thanks before product matching, so "hi, thanks" does
    // not turn into a search. "hi show me shoes" is still a search.
    let words: Vec<&str> = lower.unicode_words().collect();
    let leads_with_greeting = words
        .first()
        .map_or(false, |w| matches!(*w, "hi" | "hello" | "hey"));
    if leads_with_greeting && words.len() <= 4 && !is_product_request(utterance, inventory) {
        return ClerkReply::text(
            "Hi! I can help you browse the collection, pick sizes, and check out. What are you looking for today?",
        );
    }
    if lower.contains("thank") {
        return ClerkReply::text("You're very welcome! Anything else I can find for you?");
    }

    if lower.contains("cheap") || lower.contains("affordable") || lower.contains("budget") {
        let products = sorted_by_price(inventory, SortOrder::Asc);
        return ClerkReply::text("Here are our most affordable pieces right now:")
            .with_products(products)
            .with_action(price_filter_action(SortOrder::Asc));
    }
    if lower.contains("expensive") || lower.contains("luxury") || lower.contains("premium") {
        let products = sorted_by_price(inventory, SortOrder::Desc);
        return ClerkReply::text("These are our premium pieces:")
            .with_products(products)
            .with_action(price_filter_action(SortOrder::Desc));
    }

    // Category asks ("shoes", "sneakers", "bags", ...)
    for token in lower.unicode_words() {
        if let Some(category) = search::category_for_token(token) {
            let products: Vec<Product> = inventory
                .iter()
                .filter(|p| p.category == category)
                .cloned()
                .collect();
            if !products.is_empty() {
                return ClerkReply::text(format!("Here's our {} selection:", category))
                    .with_products(products)
                    .with_action(ClerkAction::search(category.as_str()));
            }
        }
    }

    // Recognized product request with no category hit: keyword search
    if is_product_request(utterance, inventory) {
        let hits = search::rank_inventory(utterance, inventory);
        if !hits.is_empty() {
            return ClerkReply::text("Here's what I found:")
                .with_products(hits)
                .with_action(ClerkAction::search(search::search_term(
                    utterance, inventory,
                )));
        }
    }

    // Generic popular-items default
    let mut popular = inventory.to_vec();
    popular.sort_by(|a, b| b.stock.cmp(&a.stock));
    popular.truncate(4);
    ClerkReply::text(
        "I can help you find pieces, sizes, and deals. Here are a few popular items to start with:",
    )
    .with_products(popular)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clerk_core::Category;

    fn inventory() -> Vec<Product> {
        vec![
            Product {
                id: "p1".into(),
                name: "Leather Ankle Boots".into(),
                category: Category::Shoes,
                price: 189.0,
                sizes: vec!["38".into()],
                stock: 4,
                tags: vec!["leather".into()],
                description: String::new(),
            },
            Product {
                id: "p2".into(),
                name: "Canvas Tote Bag".into(),
                category: Category::Bags,
                price: 45.0,
                sizes: vec!["One Size".into()],
                stock: 20,
                tags: vec!["canvas".into()],
                description: String::new(),
            },
        ]
    }

    #[test]
    fn test_intent_phrase_is_product_request() {
        assert!(is_product_request("show me something nice", &inventory()));
        assert!(is_product_request("I'm looking for boots", &inventory()));
    }

    #[test]
    fn test_category_token_is_product_request() {
        assert!(is_product_request("got any sneakers?", &inventory()));
        assert!(is_product_request("leather goods?", &inventory()));
    }

    #[test]
    fn test_smalltalk_is_not_product_request() {
        assert!(!is_product_request("how are you today", &inventory()));
    }

    #[test]
    fn test_static_greeting() {
        let reply = static_reply("hello", &inventory());
        assert!(reply.products.is_empty());
        assert!(reply.message.to_lowercase().contains("hi"));
    }

    #[test]
    fn test_greeting_with_product_ask_is_a_search() {
        let reply = static_reply("hi show me shoes", &inventory());
        assert!(!reply.products.is_empty());
        assert_eq!(reply.products[0].id, "p1");
    }

    #[test]
    fn test_static_cheap_sorts_ascending() {
        let reply = static_reply("something cheap please", &inventory());
        assert_eq!(reply.products[0].id, "p2");
        assert!(matches!(
            reply.action,
            Some(ClerkAction::SetFilters {
                sort_by: Some(SortBy::Price),
                sort_order: Some(SortOrder::Asc),
                ..
            })
        ));
    }

    #[test]
    fn test_static_category() {
        let reply = static_reply("shoes", &inventory());
        assert_eq!(reply.products.len(), 1);
        assert_eq!(reply.products[0].id, "p1");
    }

    #[test]
    fn test_static_default_never_empty() {
        let reply = static_reply("what's the meaning of life", &inventory());
        assert!(!reply.message.is_empty());
        assert!(!reply.products.is_empty());
    }
}
