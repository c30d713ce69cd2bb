//! Keyword product search
//!
//! Ranks the in-memory inventory by token overlap between the query and a
//! product's name, category, and tags, with a small synonym table so
//! "sneakers" finds shoes and "purse" finds bags. The catalog's own
//! relevance ranking is a separate capability; this is the agent-side
//! ranking used for tool dispatch and fallback replies.

use unicode_segmentation::UnicodeSegmentation;

use clerk_core::{Category, Product};

/// Shopping-vocabulary synonyms mapped onto catalog vocabulary.
const SYNONYMS: &[(&str, &str)] = &[
    ("sneaker", "shoes"),
    ("sneakers", "shoes"),
    ("trainers", "shoes"),
    ("boots", "shoes"),
    ("heels", "shoes"),
    ("loafers", "shoes"),
    ("footwear", "shoes"),
    ("purse", "bags"),
    ("handbag", "bags"),
    ("handbags", "bags"),
    ("tote", "bags"),
    ("backpack", "bags"),
    ("coat", "outerwear"),
    ("coats", "outerwear"),
    ("jacket", "outerwear"),
    ("jackets", "outerwear"),
    ("apparel", "clothing"),
    ("clothes", "clothing"),
    ("outfit", "clothing"),
    ("scarf", "accessories"),
    ("belt", "accessories"),
    ("jewelry", "accessories"),
];

fn expand_token(token: &str) -> Vec<String> {
    let mut expanded = vec![token.to_string()];
    for (from, to) in SYNONYMS {
        if *from == token {
            expanded.push((*to).to_string());
        }
    }
    // Singular/plural tolerance
    if let Some(stripped) = token.strip_suffix('s') {
        if stripped.len() >= 3 {
            expanded.push(stripped.to_string());
        }
    }
    expanded
}

fn score_product(query_tokens: &[Vec<String>], product: &Product) -> usize {
    let name_lower = product.name.to_lowercase();
    let name_tokens: Vec<&str> = name_lower.unicode_words().collect();
    let category = product.category.as_str();
    let tags_lower: Vec<String> = product.tags.iter().map(|t| t.to_lowercase()).collect();

    let mut score = 0;
    for variants in query_tokens {
        for variant in variants {
            if name_tokens.iter().any(|t| *t == variant || t.starts_with(variant.as_str())) {
                score += 3;
                break;
            }
            if category == variant {
                score += 2;
                break;
            }
            if tags_lower.iter().any(|t| t == variant) {
                score += 2;
                break;
            }
        }
    }
    score
}

/// Rank inventory products against a free-text query. Returns only
/// products with a positive score, best first; ties keep inventory order.
pub fn rank_inventory(query: &str, inventory: &[Product]) -> Vec<Product> {
    let lower = query.to_lowercase();
    let query_tokens: Vec<Vec<String>> = lower
        .unicode_words()
        .filter(|t| t.len() >= 3)
        .map(expand_token)
        .collect();

    if query_tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, &Product)> = inventory
        .iter()
        .map(|p| (score_product(&query_tokens, p), p))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, p)| p.clone()).collect()
}

/// Naive substring filter, the last resort when ranking and the catalog's
/// own search both come back empty.
pub fn substring_filter(query: &str, inventory: &[Product]) -> Vec<Product> {
    let lower = query.to_lowercase();
    inventory
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&lower)
                || p.description.to_lowercase().contains(&lower)
        })
        .cloned()
        .collect()
}

/// Map a query token onto a live category, through the synonym table.
pub fn category_for_token(token: &str) -> Option<Category> {
    let lower = token.to_lowercase();
    if let Some(cat) = Category::parse(&lower) {
        return Some(cat);
    }
    SYNONYMS
        .iter()
        .find(|(from, _)| *from == lower)
        .and_then(|(_, to)| Category::parse(to))
}

/// Condense a shopper utterance into a storefront search query: the first
/// category-bearing token, else the first token that scores against the
/// inventory, else the utterance itself.
pub fn search_term(utterance: &str, inventory: &[Product]) -> String {
    let lower = utterance.to_lowercase();
    for token in lower.unicode_words() {
        if let Some(category) = category_for_token(token) {
            return category.as_str().to_string();
        }
    }
    for token in lower.unicode_words() {
        if token.len() >= 3 {
            let expanded = [expand_token(token)];
            if inventory.iter().any(|p| score_product(&expanded, p) > 0) {
                return token.to_string();
            }
        }
    }
    utterance.trim().to_string()
}
