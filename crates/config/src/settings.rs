//! Typed settings
//!
//! One `Settings` tree per process, layered file < environment. Every field
//! has a sensible default so the server boots with no config at all.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty means localhost only
    pub cors_origins: Vec<String>,
    pub cors_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
            cors_enabled: true,
        }
    }
}

/// External generative model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Disable to run on fallback heuristics only
    pub enabled: bool,
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,
    pub model: String,
    /// API key; empty means read from the environment at client build time
    pub api_key: String,
    pub max_tokens: usize,
    pub temperature: f32,
    /// Per-request timeout; timeouts route to the fallback path
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            max_tokens: 512,
            temperature: 0.6,
            timeout_secs: 20,
            max_retries: 2,
        }
    }
}

/// Inventory cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventorySettings {
    /// Snapshot time-to-live in seconds
    pub ttl_secs: u64,
    /// Max products rendered into the model prompt
    pub prompt_limit: usize,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            prompt_limit: 40,
        }
    }
}

/// Discount negotiation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HaggleSettings {
    /// Lower clamp for model-proposed percentages
    pub min_percent: u8,
    /// Upper clamp for model-proposed percentages
    pub max_percent: u8,
    /// Coupon validity window in days
    pub validity_days: i64,
}

impl Default for HaggleSettings {
    fn default() -> Self {
        Self {
            min_percent: 5,
            max_percent: 20,
            validity_days: 30,
        }
    }
}

/// Root settings tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub inventory: InventorySettings,
    pub haggle: HaggleSettings,
}

/// Load settings from an optional TOML file plus `CLERK_` environment
/// overrides (e.g. `CLERK_SERVER__PORT=9090`).
pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path).required(true));
    } else {
        builder = builder.add_source(config::File::with_name("clerk").required(false));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CLERK")
            .separator("__")
            .try_parsing(true),
    );

    let settings: Settings = builder.build()?.try_deserialize()?;

    if settings.haggle.min_percent > settings.haggle.max_percent {
        return Err(ConfigError::InvalidValue {
            field: "haggle.min_percent".to_string(),
            message: "min_percent must not exceed max_percent".to_string(),
        });
    }

    tracing::debug!(
        port = settings.server.port,
        llm_enabled = settings.llm.enabled,
        inventory_ttl = settings.inventory.ttl_secs,
        "Loaded settings"
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.inventory.ttl_secs, 300);
        assert_eq!(settings.haggle.min_percent, 5);
        assert_eq!(settings.haggle.max_percent, 20);
        assert_eq!(settings.haggle.validity_days, 30);
        assert!(settings.llm.enabled);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[server]\nport = 9999\n[llm]\nenabled = false\nmodel = \"test-model\""
        )
        .unwrap();

        let settings = load_settings(file.path().to_str()).unwrap();
        assert_eq!(settings.server.port, 9999);
        assert!(!settings.llm.enabled);
        assert_eq!(settings.llm.model, "test-model");
        // Untouched sections keep defaults
        assert_eq!(settings.inventory.ttl_secs, 300);
    }

    #[test]
    fn test_invalid_haggle_bounds_rejected() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[haggle]\nmin_percent = 30\nmax_percent = 20").unwrap();

        let err = load_settings(file.path().to_str()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
