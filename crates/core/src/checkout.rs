//! Checkout types shared between the agent and the orders port

use serde::{Deserialize, Serialize};

/// A complete shipping address, collected one field per checkout turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl ShippingAddress {
    /// One-line summary echoed back at the confirm step.
    pub fn summary(&self) -> String {
        format!(
            "{} {}, {}, {}, {} {} ({})",
            self.first_name,
            self.last_name,
            self.address,
            self.city,
            self.state,
            self.zip,
            self.email
        )
    }
}

/// A placed order, as returned by the orders port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}
