//! In-memory storefront
//!
//! Implements every storefront port over plain maps, with switchable
//! failure injection. Backs the demo server and the test suites; a real
//! deployment swaps in adapters for the store's backend instead.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use clerk_core::{
    Cart, Catalog, Coupon, Coupons, Order, Orders, Product, SearchFilters, SessionStore,
    ShippingAddress, SortBy, SortOrder, StoreError, StorefrontPorts,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCartItem {
    pub session_id: String,
    pub product_id: String,
    pub size: String,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub struct RecordedOrder {
    pub session_id: String,
    pub shipping: ShippingAddress,
    pub coupon_code: Option<String>,
}

/// All five storefront ports over in-memory state.
pub struct InMemoryStorefront {
    products: RwLock<Vec<Product>>,
    cart_items: RwLock<Vec<RecordedCartItem>>,
    orders: RwLock<Vec<RecordedOrder>>,
    coupons: RwLock<Vec<Coupon>>,
    session_kv: RwLock<HashMap<(String, String), String>>,
    fail_catalog: AtomicBool,
    fail_coupons: AtomicBool,
    auth_required: AtomicBool,
}

impl InMemoryStorefront {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
            cart_items: RwLock::new(Vec::new()),
            orders: RwLock::new(Vec::new()),
            coupons: RwLock::new(Vec::new()),
            session_kv: RwLock::new(HashMap::new()),
            fail_catalog: AtomicBool::new(false),
            fail_coupons: AtomicBool::new(false),
            auth_required: AtomicBool::new(false),
        }
    }

    /// Bundle this storefront behind every port.
    pub fn ports(self: &Arc<Self>) -> StorefrontPorts {
        StorefrontPorts {
            catalog: self.clone(),
            cart: self.clone(),
            orders: self.clone(),
            coupons: self.clone(),
            session: self.clone(),
        }
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.fail_catalog.store(fail, Ordering::SeqCst);
    }

    pub fn fail_coupons(&self, fail: bool) {
        self.fail_coupons.store(fail, Ordering::SeqCst);
    }

    pub fn require_auth(&self, required: bool) {
        self.auth_required.store(required, Ordering::SeqCst);
    }

    pub fn cart_items(&self) -> Vec<RecordedCartItem> {
        self.cart_items.read().clone()
    }

    pub fn created_orders(&self) -> Vec<RecordedOrder> {
        self.orders.read().clone()
    }

    pub fn issued_coupons(&self) -> Vec<Coupon> {
        self.coupons.read().clone()
    }
}

#[async_trait]
impl Catalog for InMemoryStorefront {
    async fn list_products(&self, filters: &SearchFilters) -> Result<Vec<Product>, StoreError> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("catalog offline".to_string()));
        }

        let mut products: Vec<Product> = self
            .products
            .read()
            .iter()
            .filter(|p| filters.category.map_or(true, |c| p.category == c))
            .filter(|p| filters.min_price.map_or(true, |min| p.price >= min))
            .filter(|p| filters.max_price.map_or(true, |max| p.price <= max))
            .filter(|p| {
                filters.query.as_deref().map_or(true, |q| {
                    p.name.to_lowercase().contains(&q.to_lowercase())
                })
            })
            .cloned()
            .collect();

        match filters.sort_by {
            Some(SortBy::Price) => products.sort_by(|a, b| {
                a.price
                    .partial_cmp(&b.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            Some(SortBy::Name) => products.sort_by(|a, b| a.name.cmp(&b.name)),
            Some(SortBy::Newest) | None => {}
        }
        if filters.sort_order == Some(SortOrder::Desc) {
            products.reverse();
        }

        Ok(products)
    }

    async fn search_products(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("catalog offline".to_string()));
        }
        let query = query.to_lowercase();
        let mut found: Vec<Product> = self
            .products
            .read()
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&query)
                    || p.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .cloned()
            .collect();
        found.truncate(limit);
        Ok(found)
    }

    async fn category_counts(&self) -> Result<HashMap<String, usize>, StoreError> {
        let mut counts = HashMap::new();
        for product in self.products.read().iter() {
            *counts
                .entry(product.category.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl Cart for InMemoryStorefront {
    async fn add_item(
        &self,
        session_id: &str,
        product_id: &str,
        size: &str,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let exists = self
            .products
            .read()
            .iter()
            .any(|p| p.id == product_id);
        if !exists {
            return Err(StoreError::NotFound(product_id.to_string()));
        }
        self.cart_items.write().push(RecordedCartItem {
            session_id: session_id.to_string(),
            product_id: product_id.to_string(),
            size: size.to_string(),
            quantity,
        });
        Ok(())
    }
}

#[async_trait]
impl Orders for InMemoryStorefront {
    async fn create_order(
        &self,
        session_id: &str,
        shipping: &ShippingAddress,
        coupon_code: Option<&str>,
    ) -> Result<Order, StoreError> {
        if self.auth_required.load(Ordering::SeqCst) {
            return Err(StoreError::AuthRequired);
        }
        self.orders.write().push(RecordedOrder {
            session_id: session_id.to_string(),
            shipping: shipping.clone(),
            coupon_code: coupon_code.map(String::from),
        });
        Ok(Order {
            id: Uuid::new_v4().to_string(),
            coupon_code: coupon_code.map(String::from),
        })
    }
}

#[async_trait]
impl Coupons for InMemoryStorefront {
    async fn issue_coupon(&self, coupon: &Coupon) -> Result<(), StoreError> {
        if self.fail_coupons.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("coupon service offline".to_string()));
        }
        self.coupons.write().push(coupon.clone());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryStorefront {
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .session_kv
            .read()
            .get(&(session_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, session_id: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.session_kv
            .write()
            .insert((session_id.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}

fn product(
    id: &str,
    name: &str,
    category: clerk_core::Category,
    price: f64,
    sizes: &[&str],
    stock: u32,
    tags: &[&str],
    description: &str,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category,
        price,
        sizes: sizes.iter().map(|s| s.to_string()).collect(),
        stock,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        description: description.to_string(),
    }
}

/// Seed catalog for the demo server and the test suites.
pub fn demo_catalog() -> Vec<Product> {
    use clerk_core::Category::*;

    vec![
        product(
            "p-blazer-linen",
            "Linen Blazer",
            Clothing,
            148.0,
            &["S", "M", "L", "XL"],
            12,
            &["linen", "blazer", "summer", "tailored"],
            "Breathable linen blazer with a relaxed single-breasted cut.",
        ),
        product(
            "p-boots-ankle",
            "Leather Ankle Boots",
            Shoes,
            189.0,
            &["6", "7", "8", "9", "10"],
            8,
            &["leather", "boots", "brown"],
            "Hand-finished leather ankle boots with a stacked heel.",
        ),
        product(
            "p-sneakers-canvas",
            "White Canvas Sneakers",
            Shoes,
            65.0,
            &["6", "7", "8", "9", "10", "11"],
            30,
            &["canvas", "sneakers", "casual", "white"],
            "Everyday low-top sneakers in crisp white canvas.",
        ),
        product(
            "p-loafers-suede",
            "Suede Loafers",
            Shoes,
            120.0,
            &["7", "8", "9", "10"],
            10,
            &["suede", "loafers", "slip-on"],
            "Soft suede loafers with a hand-stitched apron toe.",
        ),
        product(
            "p-dress-silk",
            "Silk Midi Dress",
            Clothing,
            210.0,
            &["XS", "S", "M", "L"],
            6,
            &["silk", "dress", "evening"],
            "Bias-cut silk midi dress that drapes beautifully.",
        ),
        product(
            "p-tee-organic",
            "Organic Cotton Tee",
            Clothing,
            32.0,
            &["XS", "S", "M", "L", "XL", "XXL"],
            50,
            &["cotton", "tee", "basics"],
            "Garment-dyed organic cotton tee with a boxy fit.",
        ),
        product(
            "p-tote-canvas",
            "Canvas Tote Bag",
            Bags,
            45.0,
            &["One Size"],
            25,
            &["canvas", "tote", "everyday"],
            "Heavyweight canvas tote with interior zip pocket.",
        ),
        product(
            "p-crossbody-leather",
            "Leather Crossbody Bag",
            Bags,
            135.0,
            &["One Size"],
            9,
            &["leather", "crossbody", "compact"],
            "Compact pebbled-leather crossbody with adjustable strap.",
        ),
        product(
            "p-overcoat-wool",
            "Wool Overcoat",
            Outerwear,
            320.0,
            &["S", "M", "L", "XL"],
            5,
            &["wool", "coat", "winter", "tailored"],
            "Double-faced wool overcoat with horn buttons.",
        ),
        product(
            "p-jacket-denim",
            "Denim Trucker Jacket",
            Outerwear,
            98.0,
            &["S", "M", "L", "XL", "XXL"],
            18,
            &["denim", "jacket", "casual"],
            "Classic trucker jacket in rigid indigo denim.",
        ),
        product(
            "p-scarf-cashmere",
            "Cashmere Scarf",
            Accessories,
            85.0,
            &["One Size"],
            15,
            &["cashmere", "scarf", "winter", "gift"],
            "Featherweight two-ply cashmere scarf.",
        ),
        product(
            "p-belt-leather",
            "Classic Leather Belt",
            Accessories,
            55.0,
            &["S", "M", "L"],
            22,
            &["leather", "belt"],
            "Full-grain leather belt with brushed brass buckle.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_products_filters_and_sorts() {
        let store = InMemoryStorefront::new(demo_catalog());
        let filters = SearchFilters {
            category: Some(clerk_core::Category::Shoes),
            sort_by: Some(SortBy::Price),
            ..Default::default()
        };
        let shoes = store.list_products(&filters).await.unwrap();
        assert_eq!(shoes.len(), 3);
        assert!(shoes.windows(2).all(|w| w[0].price <= w[1].price));
    }

    #[tokio::test]
    async fn test_catalog_failure_injection() {
        let store = InMemoryStorefront::new(demo_catalog());
        store.fail_catalog(true);
        let result = store.list_products(&SearchFilters::default()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_cart_rejects_unknown_product() {
        let store = InMemoryStorefront::new(demo_catalog());
        let result = store.add_item("s1", "no-such-id", "M", 1).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(store.cart_items().is_empty());
    }

    #[tokio::test]
    async fn test_order_records_coupon() {
        let store = InMemoryStorefront::new(demo_catalog());
        let shipping = ShippingAddress {
            email: "jo@example.com".into(),
            first_name: "Jo".into(),
            last_name: "Reyes".into(),
            address: "14 Mulberry Lane".into(),
            city: "Portland".into(),
            state: "OR".into(),
            zip: "97201".into(),
        };
        let order = store
            .create_order("s1", &shipping, Some("BDAY-15ABCD"))
            .await
            .unwrap();
        assert_eq!(order.coupon_code.as_deref(), Some("BDAY-15ABCD"));
        assert_eq!(store.created_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_session_kv_is_scoped_by_session() {
        let store = InMemoryStorefront::new(Vec::new());
        store.set("s1", "k", "v1").await.unwrap();
        store.set("s2", "k", "v2").await.unwrap();
        assert_eq!(store.get("s1", "k").await.unwrap().as_deref(), Some("v1"));
        assert_eq!(store.get("s2", "k").await.unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_demo_catalog_covers_every_category() {
        let catalog = demo_catalog();
        for category in clerk_core::Category::all() {
            assert!(
                catalog.iter().any(|p| p.category == category),
                "missing category {:?}",
                category
            );
        }
    }
}
