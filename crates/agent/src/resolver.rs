//! Product reference resolution
//!
//! Pure functions mapping ordinal ("the second one"), deictic ("that one"),
//! and fuzzy name references in an utterance onto concrete products from
//! the most recently shown list, falling back to the live inventory.
//! Kept out of the orchestration control flow so each rule is testable.

use unicode_segmentation::UnicodeSegmentation;

use clerk_core::Product;

/// Resolve a product reference. Resolution order, first match wins:
/// 1. Ordinal words/digits against the last-shown list
/// 2. Deictic phrases ("that", "this", "the one") -> last-shown[0]
/// 3. Token overlap (shared words of length >= 4, most shared wins) with
///    a shown product name
/// 4. Substring containment of any inventory product name in the utterance
/// 5. Token overlap with an inventory product name ("the blazer" finds
///    "Linen Blazer" even when it was never shown)
pub fn resolve_product<'a>(
    utterance: &str,
    last_shown: &'a [Product],
    inventory: &'a [Product],
) -> Option<&'a Product> {
    let lower = utterance.to_lowercase();

    if let Some(index) = ordinal_index(&lower) {
        if let Some(product) = last_shown.get(index) {
            return Some(product);
        }
    }

    if !last_shown.is_empty() && is_deictic(&lower) {
        return last_shown.first();
    }

    let utterance_tokens: Vec<&str> = lower.unicode_words().collect();

    if let Some(product) = best_overlap(last_shown, &utterance_tokens) {
        return Some(product);
    }

    inventory
        .iter()
        .find(|p| lower.contains(&p.name.to_lowercase()))
        .or_else(|| best_overlap(inventory, &utterance_tokens))
}

/// Product whose name shares the most tokens (length >= 4) with the
/// utterance. "the canvas tote" prefers "Canvas Tote Bag" over another
/// product that merely shares "canvas". Ties keep catalog order.
fn best_overlap<'a>(products: &'a [Product], utterance_tokens: &[&str]) -> Option<&'a Product> {
    let mut best: Option<(usize, &Product)> = None;
    for product in products {
        let name = product.name.to_lowercase();
        let shared = name
            .unicode_words()
            .filter(|w| w.len() >= 4 && utterance_tokens.contains(w))
            .count();
        if shared > 0 && best.map_or(true, |(n, _)| shared > n) {
            best = Some((shared, product));
        }
    }
    best.map(|(_, product)| product)
}

/// Ordinal reference to a position in the last-shown list.
fn ordinal_index(lower: &str) -> Option<usize> {
    // Explicit ordinals before bare number words, so "the second one"
    // matches "second" rather than "one".
    const ORDINALS: &[(&str, usize)] = &[
        ("first", 0),
        ("1st", 0),
        ("second", 1),
        ("2nd", 1),
        ("third", 2),
        ("3rd", 2),
        ("one", 0),
        ("two", 1),
        ("three", 2),
    ];

    let words: Vec<&str> = lower.unicode_words().collect();
    ORDINALS
        .iter()
        .find(|(word, _)| words.contains(word))
        .map(|(_, index)| *index)
}

fn is_deictic(lower: &str) -> bool {
    let words: Vec<&str> = lower.unicode_words().collect();
    words.contains(&"that") || words.contains(&"this") || lower.contains("the one")
}

/// Normalize a size token: case-fold, strip whitespace, map long forms.
/// "2XL" and "XXL" are treated as the same size.
pub fn normalize_size(raw: &str) -> String {
    let folded = raw.trim().to_uppercase().replace(char::is_whitespace, "");
    match folded.as_str() {
        "EXTRASMALL" => "XS".to_string(),
        "EXTRALARGE" => "XL".to_string(),
        "SMALL" => "S".to_string(),
        "MEDIUM" => "M".to_string(),
        "LARGE" => "L".to_string(),
        "2XL" => "XXL".to_string(),
        _ => folded,
    }
}

/// Extract the first declared size whose normalized form appears in the
/// utterance. Long forms in the utterance ("extra large") match their short
/// declared equivalents.
pub fn extract_size(utterance: &str, declared_sizes: &[String]) -> Option<String> {
    let lower = utterance.to_lowercase();
    let singles: Vec<String> = lower.unicode_words().map(normalize_size).collect();
    let mut tokens = singles.clone();

    // Multi-word declared sizes ("One Size") arrive as separate tokens;
    // normalization strips their whitespace, so joined pairs match.
    for pair in singles.windows(2) {
        tokens.push(format!("{}{}", pair[0], pair[1]));
    }

    // Two-word long forms span token boundaries
    if lower.contains("extra small") {
        tokens.push("XS".to_string());
    }
    if lower.contains("extra large") {
        tokens.push("XL".to_string());
    }

    declared_sizes
        .iter()
        .find(|size| tokens.contains(&normalize_size(size)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clerk_core::Category;

    fn product(id: &str, name: &str, sizes: &[&str]) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            category: Category::Clothing,
            price: 80.0,
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
            stock: 5,
            tags: vec![],
            description: String::new(),
        }
    }

    fn shown() -> Vec<Product> {
        vec![
            product("p1", "Linen Blazer", &["S", "M", "L", "XL"]),
            product("p2", "Silk Midi Dress", &["XS", "S", "M"]),
            product("p3", "Wool Overcoat", &["M", "L"]),
        ]
    }

    #[test]
    fn test_ordinal_resolution() {
        let shown = shown();
        let hit = resolve_product("I'll take the second one", &shown, &[]).unwrap();
        assert_eq!(hit.id, "p2");

        let hit = resolve_product("the 3rd please", &shown, &[]).unwrap();
        assert_eq!(hit.id, "p3");
    }

    #[test]
    fn test_deictic_resolution() {
        let shown = shown();
        let hit = resolve_product("add that to my cart", &shown, &[]).unwrap();
        assert_eq!(hit.id, "p1");
    }

    #[test]
    fn test_name_token_overlap() {
        let shown = shown();
        let hit = resolve_product("do you have the blazer in medium", &shown, &[]).unwrap();
        assert_eq!(hit.id, "p1");
    }

    #[test]
    fn test_short_tokens_do_not_match() {
        // "the" appears in utterances constantly; only tokens >= 4 chars count
        let shown = vec![product("p9", "The Tee", &["M"])];
        assert!(resolve_product("what about the price", &shown, &[]).is_none());
    }

    #[test]
    fn test_inventory_substring_fallback() {
        let inventory = shown();
        let hit = resolve_product("is the wool overcoat still available", &[], &inventory).unwrap();
        assert_eq!(hit.id, "p3");
    }

    #[test]
    fn test_ordinal_wins_over_overlap() {
        let shown = shown();
        // "first" and "dress" both present; ordinal rule fires first
        let hit = resolve_product("the first one, not the dress", &shown, &[]).unwrap();
        assert_eq!(hit.id, "p1");
    }

    #[test]
    fn test_most_shared_tokens_wins() {
        // Both names share "canvas"; only the tote also shares "tote".
        let inventory = vec![
            product("p1", "White Canvas Sneakers", &["6", "7"]),
            product("p2", "Canvas Tote Bag", &["One Size"]),
        ];
        let hit = resolve_product("put the canvas tote in my bag", &[], &inventory).unwrap();
        assert_eq!(hit.id, "p2");
    }

    #[test]
    fn test_no_match() {
        assert!(resolve_product("what are your opening hours", &shown(), &[]).is_none());
    }

    #[test]
    fn test_normalize_size() {
        assert_eq!(normalize_size(" xl "), "XL");
        assert_eq!(normalize_size("extra small"), "XS");
        assert_eq!(normalize_size("2XL"), "XXL");
        assert_eq!(normalize_size("xxl"), "XXL");
        assert_eq!(normalize_size("38"), "38");
    }

    #[test]
    fn test_extract_size_basic() {
        let sizes = vec!["S".into(), "M".into(), "L".into(), "XL".into()];
        assert_eq!(extract_size("in size m please", &sizes), Some("M".into()));
        assert_eq!(extract_size("the xl one", &sizes), Some("XL".into()));
        assert_eq!(extract_size("size 44", &sizes), None);
    }

    #[test]
    fn test_extract_size_long_forms() {
        let sizes = vec!["XS".into(), "M".into(), "XL".into()];
        assert_eq!(
            extract_size("extra large if you have it", &sizes),
            Some("XL".into())
        );
        assert_eq!(extract_size("extra small works", &sizes), Some("XS".into()));
    }

    #[test]
    fn test_extract_size_xxl_equivalence() {
        let sizes = vec!["XXL".into()];
        assert_eq!(extract_size("do you have 2xl", &sizes), Some("XXL".into()));

        let sizes = vec!["2XL".into()];
        assert_eq!(extract_size("xxl please", &sizes), Some("2XL".into()));
    }

    #[test]
    fn test_extract_size_multi_word_declared() {
        let sizes = vec!["One Size".into()];
        assert_eq!(extract_size("one size", &sizes), Some("One Size".into()));
        assert_eq!(
            extract_size("One Size is fine", &sizes),
            Some("One Size".into())
        );
        assert_eq!(extract_size("a medium please", &sizes), None);
    }
}
