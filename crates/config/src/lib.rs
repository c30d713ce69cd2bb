//! Configuration management for the shop clerk
//!
//! Supports loading configuration from:
//! - TOML files (`clerk.toml` by default)
//! - Environment variables (`CLERK_` prefix)
//! - Compiled-in defaults

pub mod settings;

pub use settings::{
    HaggleSettings, InventorySettings, LlmSettings, ServerSettings, Settings, load_settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
