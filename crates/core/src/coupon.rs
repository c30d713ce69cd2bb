//! Coupon types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discount kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// A discount coupon minted by the haggle engine and persisted by the
/// catalog's coupon store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    /// Coupon code, e.g. "BDAY-15X7QZ"
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    /// Why the coupon was granted
    pub reason: String,
    /// Session the coupon is bound to; unredeemable elsewhere when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: u32,
    pub used_count: u32,
}

impl Coupon {
    /// A single-use percentage coupon bound to a session.
    pub fn percentage(
        code: impl Into<String>,
        percent: u8,
        reason: impl Into<String>,
        session_id: impl Into<String>,
        valid_until: DateTime<Utc>,
    ) -> Self {
        Self {
            code: code.into(),
            discount_type: DiscountType::Percentage,
            discount_value: f64::from(percent),
            reason: reason.into(),
            session_id: Some(session_id.into()),
            valid_until,
            usage_limit: 1,
            used_count: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }

    pub fn is_exhausted(&self) -> bool {
        self.used_count >= self.usage_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_percentage_coupon_defaults() {
        let coupon = Coupon::percentage(
            "BDAY-15AB12",
            15,
            "birthday",
            "session-1",
            Utc::now() + Duration::days(30),
        );
        assert_eq!(coupon.usage_limit, 1);
        assert_eq!(coupon.used_count, 0);
        assert_eq!(coupon.discount_value, 15.0);
        assert_eq!(coupon.session_id.as_deref(), Some("session-1"));
        assert!(!coupon.is_expired(Utc::now()));
        assert!(!coupon.is_exhausted());
    }

    #[test]
    fn test_expiry() {
        let coupon = Coupon::percentage(
            "WED-20ZZZZ",
            20,
            "wedding",
            "s",
            Utc::now() - Duration::days(1),
        );
        assert!(coupon.is_expired(Utc::now()));
    }
}
