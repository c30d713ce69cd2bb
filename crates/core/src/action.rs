//! Storefront actions
//!
//! A reply carries at most one action that the storefront UI applies:
//! filter changes, cart adds, navigation, or a freshly minted coupon.
//! The union is closed and exhaustively matched where actions are applied.

use serde::{Deserialize, Serialize};

use crate::product::Category;

/// Sort key for catalog listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Price,
    Name,
    Newest,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// An action the clerk asks the storefront to perform alongside a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClerkAction {
    /// Update the visible catalog filters
    SetFilters {
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<Category>,
        #[serde(skip_serializing_if = "Option::is_none")]
        search_query: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort_by: Option<SortBy>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort_order: Option<SortOrder>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_price: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_price: Option<f64>,
    },
    /// A line item was added to the cart
    AddToCart {
        product_id: String,
        size: String,
        quantity: u32,
    },
    /// Send the shopper to another surface
    Navigate { path: String },
    /// A discount coupon was created for this session
    CouponCreated { code: String },
}

impl ClerkAction {
    /// Filter action carrying only a search query.
    pub fn search(query: impl Into<String>) -> Self {
        ClerkAction::SetFilters {
            category: None,
            search_query: Some(query.into()),
            sort_by: None,
            sort_order: None,
            min_price: None,
            max_price: None,
        }
    }
}

/// Filters accepted by `Catalog::list_products`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub category: Option<Category>,
    pub query: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serialization_tag() {
        let action = ClerkAction::Navigate {
            path: "/sign-in".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "navigate");
        assert_eq!(json["path"], "/sign-in");
    }

    #[test]
    fn test_search_action_omits_empty_fields() {
        let json = serde_json::to_value(ClerkAction::search("shoes")).unwrap();
        assert_eq!(json["search_query"], "shoes");
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_add_to_cart_roundtrip() {
        let action = ClerkAction::AddToCart {
            product_id: "p1".into(),
            size: "M".into(),
            quantity: 2,
        };
        let json = serde_json::to_string(&action).unwrap();
        let back: ClerkAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
