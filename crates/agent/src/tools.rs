//! Tool definitions and dispatch
//!
//! The model interacts with the store exclusively through these tools.
//! Each handler produces a [`ToolOutcome`]; the orchestrator merges the
//! outcomes of a multi-tool turn into a single reply.

use serde_json::json;

use clerk_core::{Category, ClerkAction, Product, SortBy, SortOrder};
use clerk_llm::{ToolCall, ToolDefinition};

use crate::clerk::{PendingSizeClarification, SessionState, ShopClerk};
use crate::resolver::normalize_size;
use crate::search::{rank_inventory, substring_filter};

/// Result of one tool execution.
#[derive(Debug, Default)]
pub(crate) struct ToolOutcome {
    pub message: Option<String>,
    pub products: Vec<Product>,
    pub action: Option<ClerkAction>,
}

impl ToolOutcome {
    fn text(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// The tool surface exposed to the model.
pub fn clerk_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "search_products".to_string(),
            description: "Search the store catalog by free-text query. Returns matching products."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What the shopper is looking for, e.g. 'brown leather boots'"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "add_to_cart".to_string(),
            description: "Add a product to the shopper's cart. Size must be one of the product's declared sizes.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "product_id": {
                        "type": "string",
                        "description": "Catalog id of the product"
                    },
                    "product_name": {
                        "type": "string",
                        "description": "Product name, used when the id is not known"
                    },
                    "size": {
                        "type": "string",
                        "description": "Requested size, e.g. 'M' or '10'"
                    },
                    "quantity": {
                        "type": "integer",
                        "description": "How many to add, default 1"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "apply_filter".to_string(),
            description: "Filter or sort the product listing the shopper is viewing.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "enum": ["shoes", "clothing", "bags", "accessories", "outerwear"]
                    },
                    "min_price": { "type": "number" },
                    "max_price": { "type": "number" },
                    "sort_by": {
                        "type": "string",
                        "enum": ["price", "name", "newest"]
                    },
                    "sort_order": {
                        "type": "string",
                        "enum": ["asc", "desc"]
                    }
                }
            }),
        },
        ToolDefinition {
            name: "generate_discount".to_string(),
            description: "Evaluate a shopper's discount request and, when they qualify, issue a coupon code.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "request": {
                        "type": "string",
                        "description": "The shopper's discount request in their own words"
                    }
                },
                "required": ["request"]
            }),
        },
        ToolDefinition {
            name: "check_inventory".to_string(),
            description: "Check stock and available sizes for a specific product.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "product_name": { "type": "string" }
                },
                "required": ["product_name"]
            }),
        },
    ]
}

fn find_product<'a>(
    inventory: &'a [Product],
    id: Option<&str>,
    name: Option<&str>,
) -> Option<&'a Product> {
    if let Some(id) = id {
        if let Some(p) = inventory.iter().find(|p| p.id == id) {
            return Some(p);
        }
    }
    let name = name?.to_lowercase();
    inventory
        .iter()
        .find(|p| p.name.to_lowercase() == name)
        .or_else(|| inventory.iter().find(|p| p.name.to_lowercase().contains(&name)))
}

impl ShopClerk {
    pub(crate) async fn execute_tool(
        &self,
        state: &mut SessionState,
        call: &ToolCall,
    ) -> ToolOutcome {
        tracing::debug!(tool = %call.name, "Executing tool");
        match call.name.as_str() {
            "search_products" => self.tool_search(call).await,
            "add_to_cart" => self.tool_add_to_cart(state, call).await,
            "apply_filter" => self.tool_apply_filter(call).await,
            "generate_discount" => self.tool_generate_discount(call).await,
            "check_inventory" => self.tool_check_inventory(call).await,
            other => {
                tracing::warn!("Model requested unknown tool: {}", other);
                ToolOutcome::default()
            }
        }
    }

    async fn tool_search(&self, call: &ToolCall) -> ToolOutcome {
        let Some(query) = call.get_str("query") else {
            return ToolOutcome::text("What should I search for?");
        };

        let inventory = self.inventory.get().await;
        let mut matches = rank_inventory(query, &inventory);

        if matches.is_empty() {
            // Local ranking found nothing; let the store search directly.
            match self.ports.catalog.search_products(query, 8).await {
                Ok(found) => matches = found,
                Err(e) => tracing::warn!("Store search failed: {}", e),
            }
        }
        if matches.is_empty() {
            matches = substring_filter(query, &inventory);
        }

        if matches.is_empty() {
            let sections = match self.ports.catalog.category_counts().await {
                Ok(counts) if !counts.is_empty() => {
                    let mut names: Vec<String> = counts
                        .into_iter()
                        .filter(|(_, n)| *n > 0)
                        .map(|(name, _)| name)
                        .collect();
                    names.sort();
                    format!(" We carry {}.", names.join(", "))
                }
                _ => String::new(),
            };
            return ToolOutcome::text(format!(
                "I couldn't find anything matching \"{}\".{} What else can I look for?",
                query, sections
            ));
        }

        matches.truncate(8);
        ToolOutcome {
            message: None,
            products: matches,
            action: Some(ClerkAction::search(query)),
        }
    }

    async fn tool_add_to_cart(
        &self,
        state: &mut SessionState,
        call: &ToolCall,
    ) -> ToolOutcome {
        let inventory = self.inventory.get().await;
        let id = call.get_str("product_id");
        let name = call.get_str("product_name");
        let Some(product) = find_product(&inventory, id, name).cloned() else {
            return ToolOutcome::text(
                "I couldn't find that product in our catalog. Could you tell me which item you meant?",
            );
        };

        let quantity = call.get_u64("quantity").unwrap_or(1).max(1) as u32;

        let size = call
            .get_str("size")
            .map(normalize_size)
            .filter(|s| product.has_size(s))
            .or_else(|| {
                // A single declared size needs no clarification.
                (product.sizes.len() == 1).then(|| product.sizes[0].clone())
            });

        let Some(size) = size else {
            let message = format!(
                "Which size would you like for the {}? We have it in {}.",
                product.name,
                product.sizes_display()
            );
            state.pending_size = Some(PendingSizeClarification { product, quantity });
            return ToolOutcome::text(message);
        };

        self.add_to_cart(state, &product, &size, quantity).await
    }

    /// Shared cart-add path for the tool handler and the direct
    /// (model-free) add flow. A failed store call is logged but the
    /// confirmation still goes out; order placement is where failures
    /// become user-facing.
    pub(crate) async fn add_to_cart(
        &self,
        state: &mut SessionState,
        product: &Product,
        size: &str,
        quantity: u32,
    ) -> ToolOutcome {
        if let Err(e) = self
            .ports
            .cart
            .add_item(&self.session_id, &product.id, size, quantity)
            .await
        {
            tracing::warn!(product = %product.id, "Cart add failed: {}", e);
        }
        state.pending_size = None;

        let message = if quantity > 1 {
            format!(
                "Added {} × {} in size {} to your cart.",
                quantity, product.name, size
            )
        } else {
            format!("Added the {} in size {} to your cart.", product.name, size)
        };
        ToolOutcome::text(message)
    }

    async fn tool_apply_filter(&self, call: &ToolCall) -> ToolOutcome {
        let category = call
            .get_str("category")
            .and_then(|c| Category::parse(&c));
        let min_price = call.get_f64("min_price");
        let max_price = call.get_f64("max_price");
        let sort_by = call.get_str("sort_by").and_then(|s| match s {
            "price" => Some(SortBy::Price),
            "name" => Some(SortBy::Name),
            "newest" => Some(SortBy::Newest),
            _ => None,
        });
        let sort_order = call.get_str("sort_order").and_then(|s| match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        });

        let inventory = self.inventory.get().await;
        let mut products: Vec<Product> = inventory
            .into_iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .filter(|p| min_price.map_or(true, |min| p.price >= min))
            .filter(|p| max_price.map_or(true, |max| p.price <= max))
            .collect();

        if let Some(sort_by) = sort_by {
            match sort_by {
                SortBy::Price => products.sort_by(|a, b| {
                    a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal)
                }),
                SortBy::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
                SortBy::Newest => {}
            }
            if sort_order == Some(SortOrder::Desc) {
                products.reverse();
            }
        }
        products.truncate(8);

        ToolOutcome {
            message: None,
            products,
            action: Some(ClerkAction::SetFilters {
                category,
                search_query: None,
                sort_by,
                sort_order,
                min_price,
                max_price,
            }),
        }
    }

    async fn tool_generate_discount(&self, call: &ToolCall) -> ToolOutcome {
        let request = call.get_str("request").unwrap_or_default();
        let (message, action) = self.haggle.negotiate(&request, &self.session_id).await;
        ToolOutcome {
            message: Some(message),
            products: Vec::new(),
            action,
        }
    }

    async fn tool_check_inventory(&self, call: &ToolCall) -> ToolOutcome {
        let Some(name) = call.get_str("product_name") else {
            return ToolOutcome::text("Which product should I check?");
        };
        let inventory = self.inventory.get().await;
        let Some(product) = find_product(&inventory, None, Some(name)) else {
            return ToolOutcome::text(format!(
                "I don't see \"{}\" in our catalog right now.",
                name
            ));
        };

        let message = if product.stock == 0 {
            format!("The {} is out of stock at the moment, sorry!", product.name)
        } else {
            format!(
                "The {} is in stock ({} left) in sizes {}.",
                product.name,
                product.stock,
                product.sizes_display()
            )
        };
        ToolOutcome {
            message: Some(message),
            products: vec![product.clone()],
            action: None,
        }
    }
}
