//! Discount eligibility engine ("haggle")
//!
//! Classifies a free-text discount request into an eligibility decision.
//! Deterministic rules run before any model call and always win:
//! the abuse scan first (rude requests are never rewarded, even when a
//! valid reason keyword is present in the same message — explicit policy),
//! then the reason-keyword table. Only unmatched requests are classified by
//! the model, with the proposed percentage clamped to the configured range.

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;

use clerk_config::HaggleSettings;
use clerk_core::{ClerkAction, Coupon, Coupons, SessionStore, APPLIED_COUPON_KEY};
use clerk_llm::{ChatBackend, Message};

/// Assessed tone of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Outcome of analyzing a discount request
#[derive(Debug, Clone)]
pub struct DiscountAnalysis {
    pub eligible: bool,
    pub percentage: u8,
    pub reason: String,
    pub sentiment: Sentiment,
}

impl DiscountAnalysis {
    fn denied(reason: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            eligible: false,
            percentage: 0,
            reason: reason.into(),
            sentiment,
        }
    }
}

/// Tokens that mark a request as abusive. Any hit forces ineligibility.
const ABUSE_TOKENS: &[&str] = &[
    "stupid", "idiot", "garbage", "trash", "dumb", "pathetic", "sucks", "terrible", "awful",
    "worst", "scam", "ripoff", "rip-off", "hate", "shut up", "damn", "crap", "useless",
];

/// Deterministic reason rules: (keyword, percentage, code prefix, reason).
const REASON_RULES: &[(&str, u8, &str, &str)] = &[
    ("birthday", 15, "BDAY", "birthday"),
    ("wedding", 20, "WED", "wedding"),
    ("student", 10, "STU", "student"),
    ("first time", 10, "FIRST", "first-time customer"),
    ("first-time", 10, "FIRST", "first-time customer"),
    ("first order", 10, "FIRST", "first-time customer"),
    ("new customer", 10, "FIRST", "first-time customer"),
    ("bulk", 12, "BULK", "bulk order"),
    ("valentine", 10, "VAL", "valentine's"),
    ("loyal", 10, "LOYAL", "loyal customer"),
    ("regular customer", 10, "LOYAL", "loyal customer"),
];

/// Discount eligibility engine.
pub struct DiscountEngine {
    llm: Option<Arc<dyn ChatBackend>>,
    coupons: Arc<dyn Coupons>,
    session_store: Arc<dyn SessionStore>,
    settings: HaggleSettings,
}

impl DiscountEngine {
    pub fn new(
        llm: Option<Arc<dyn ChatBackend>>,
        coupons: Arc<dyn Coupons>,
        session_store: Arc<dyn SessionStore>,
        settings: HaggleSettings,
    ) -> Self {
        Self {
            llm,
            coupons,
            session_store,
            settings,
        }
    }

    /// Classify a discount request. Abuse first, keyword rules second,
    /// model last; the model never overrides a deterministic result.
    pub async fn analyze(&self, text: &str) -> DiscountAnalysis {
        let lower = text.to_lowercase();

        if ABUSE_TOKENS.iter().any(|t| lower.contains(t)) {
            tracing::info!("Discount request denied: abusive language");
            return DiscountAnalysis::denied("abusive request", Sentiment::Negative);
        }

        for (keyword, percentage, _, reason) in REASON_RULES {
            if lower.contains(keyword) {
                return DiscountAnalysis {
                    eligible: true,
                    percentage: *percentage,
                    reason: (*reason).to_string(),
                    sentiment: Sentiment::Positive,
                };
            }
        }

        self.classify_with_model(text).await
    }

    async fn classify_with_model(&self, text: &str) -> DiscountAnalysis {
        let Some(ref llm) = self.llm else {
            return DiscountAnalysis::denied("no qualifying reason", Sentiment::Neutral);
        };

        let system = format!(
            r#"You judge discount requests for a fashion store. Respond with ONLY a JSON object:
{{"eligible": bool, "percentage": int, "reason": string, "sentiment": "positive"|"neutral"|"negative"}}
Percentage must be between {} and {}. Polite requests with a genuine occasion or hardship may qualify; demands and insults never do."#,
            self.settings.min_percent, self.settings.max_percent
        );

        let messages = [Message::system(system), Message::user(text)];

        match llm.chat(&messages, &[]).await {
            Ok(response) => self.parse_classification(&response.text),
            Err(e) => {
                tracing::warn!("Discount classification failed, denying gracefully: {}", e);
                DiscountAnalysis::denied("classification unavailable", Sentiment::Neutral)
            }
        }
    }

    fn parse_classification(&self, raw: &str) -> DiscountAnalysis {
        #[derive(Deserialize)]
        struct Classification {
            eligible: bool,
            #[serde(default)]
            percentage: i64,
            #[serde(default)]
            reason: String,
            #[serde(default)]
            sentiment: String,
        }

        // Models wrap JSON in code fences often enough to strip them.
        let trimmed = raw
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        let Ok(parsed) = serde_json::from_str::<Classification>(trimmed) else {
            tracing::warn!("Unparseable discount classification: {}", raw);
            return DiscountAnalysis::denied("classification unavailable", Sentiment::Neutral);
        };

        let sentiment = match parsed.sentiment.as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        };

        // Negative model-assessed sentiment is automatic ineligibility.
        if sentiment == Sentiment::Negative {
            return DiscountAnalysis::denied(parsed.reason, Sentiment::Negative);
        }

        let percentage = parsed
            .percentage
            .clamp(i64::from(self.settings.min_percent), i64::from(self.settings.max_percent))
            as u8;

        DiscountAnalysis {
            eligible: parsed.eligible,
            percentage: if parsed.eligible { percentage } else { 0 },
            reason: if parsed.reason.is_empty() {
                "special request".to_string()
            } else {
                parsed.reason
            },
            sentiment,
        }
    }

    /// Synthesize a coupon code: `{PREFIX}-{percentage}{4 random chars}`.
    fn synthesize_code(reason: &str, percentage: u8) -> String {
        let prefix = REASON_RULES
            .iter()
            .find(|(_, _, _, r)| *r == reason)
            .map(|(_, _, prefix, _)| *prefix)
            .unwrap_or("DEAL");

        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(4)
            .map(|c| (c as char).to_ascii_uppercase())
            .collect();

        format!("{}-{}{}", prefix, percentage, suffix)
    }

    /// Run the full negotiation: analyze, mint, persist, reply. A coupon
    /// code is only ever shown after the store has registered it.
    pub async fn negotiate(
        &self,
        text: &str,
        session_id: &str,
    ) -> (String, Option<ClerkAction>) {
        let analysis = self.analyze(text).await;

        if !analysis.eligible {
            let message = match analysis.sentiment {
                Sentiment::Negative => {
                    "I'm sorry, but I can't offer a discount on that request. I'm happy to help you find something you'll love at our regular prices.".to_string()
                }
                _ => "I wasn't able to qualify you for a discount this time, but keep an eye out — we run seasonal promotions often!".to_string(),
            };
            return (message, None);
        }

        let code = Self::synthesize_code(&analysis.reason, analysis.percentage);
        let coupon = Coupon::percentage(
            code.clone(),
            analysis.percentage,
            analysis.reason.clone(),
            session_id,
            Utc::now() + Duration::days(self.settings.validity_days),
        );

        if let Err(e) = self.coupons.issue_coupon(&coupon).await {
            tracing::warn!("Coupon persistence failed: {}", e);
            return (
                "I'd love to give you a discount, but our coupon system is acting up right now. Please try again in a little while!".to_string(),
                None,
            );
        }

        // Best-effort: remember the code so checkout can surface it.
        if let Err(e) = self
            .session_store
            .set(session_id, APPLIED_COUPON_KEY, &code)
            .await
        {
            tracing::warn!("Could not record applied coupon for session: {}", e);
        }

        tracing::info!(code = %code, percent = analysis.percentage, reason = %analysis.reason, "Issued coupon");

        let message = format!(
            "Happy to help — since it's a {} I can offer you {}% off! Use code {} at checkout. It's valid for {} days on this session.",
            analysis.reason, analysis.percentage, code, self.settings.validity_days
        );
        (message, Some(ClerkAction::CouponCreated { code }))
    }
}
