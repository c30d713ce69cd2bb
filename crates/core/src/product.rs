//! Catalog product types
//!
//! Products are owned by the catalog and immutable from the agent's
//! perspective; the agent only ever reads snapshots of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Product category (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Shoes,
    Clothing,
    Bags,
    Accessories,
    Outerwear,
}

impl Category {
    /// All categories, in display order.
    pub fn all() -> [Category; 5] {
        [
            Category::Shoes,
            Category::Clothing,
            Category::Bags,
            Category::Accessories,
            Category::Outerwear,
        ]
    }

    /// Stable lowercase name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Shoes => "shoes",
            Category::Clothing => "clothing",
            Category::Bags => "bags",
            Category::Accessories => "accessories",
            Category::Outerwear => "outerwear",
        }
    }

    /// Parse a category from free text (singular/plural tolerated).
    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().trim_end_matches('s') {
            "shoe" => Some(Category::Shoes),
            "clothing" | "apparel" => Some(Category::Clothing),
            "bag" => Some(Category::Bags),
            "accessorie" | "accessory" => Some(Category::Accessories),
            "outerwear" => Some(Category::Outerwear),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Opaque stable identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: Category,
    /// Price in the store currency, non-negative
    pub price: f64,
    /// Declared sizes, ordered, non-empty
    pub sizes: Vec<String>,
    /// Units in stock
    pub stock: u32,
    /// Free-form tags used for search
    pub tags: Vec<String>,
    /// Short description
    pub description: String,
}

impl Product {
    /// Check whether a (already normalized) size token is declared for
    /// this product.
    pub fn has_size(&self, normalized: &str) -> bool {
        self.sizes
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(normalized))
    }

    /// Human-readable size list, e.g. "S, M, L, XL".
    pub fn sizes_display(&self) -> String {
        self.sizes.join(", ")
    }
}

/// A wholesale snapshot of the catalog, owned by the inventory cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub products: Vec<Product>,
    pub fetched_at: DateTime<Utc>,
}

impl InventorySnapshot {
    pub fn empty() -> Self {
        Self {
            products: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boots() -> Product {
        Product {
            id: "p1".into(),
            name: "Leather Ankle Boots".into(),
            category: Category::Shoes,
            price: 189.0,
            sizes: vec!["36".into(), "37".into(), "38".into()],
            stock: 12,
            tags: vec!["leather".into(), "boots".into()],
            description: "Classic ankle boots".into(),
        }
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("Shoes"), Some(Category::Shoes));
        assert_eq!(Category::parse("bag"), Some(Category::Bags));
        assert_eq!(Category::parse("accessories"), Some(Category::Accessories));
        assert_eq!(Category::parse("furniture"), None);
    }

    #[test]
    fn test_category_roundtrip() {
        for cat in Category::all() {
            assert_eq!(Category::parse(cat.as_str()), Some(cat));
        }
    }

    #[test]
    fn test_has_size() {
        let p = boots();
        assert!(p.has_size("37"));
        assert!(!p.has_size("44"));
    }

    #[test]
    fn test_sizes_display() {
        assert_eq!(boots().sizes_display(), "36, 37, 38");
    }
}
