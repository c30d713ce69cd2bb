//! Shop Clerk Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use clerk_agent::{demo_catalog, ClerkConfig, InMemoryStorefront};
use clerk_config::{load_settings, Settings};
use clerk_llm::{ChatBackend, LlmConfig, OpenAiBackend};
use clerk_server::{create_router, AppState, SessionManager};

const STORE_NAME: &str = "Aster & Vine";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars (CLERK__*) > config file > defaults
    let config_path = std::env::var("CLERK_CONFIG").ok();
    let settings = match load_settings(config_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing();

    tracing::info!("Starting Shop Clerk Server v{}", env!("CARGO_PKG_VERSION"));

    // Demo storefront behind every port. A production build replaces this
    // with adapters for the store's real backend.
    let storefront = Arc::new(InMemoryStorefront::new(demo_catalog()));
    tracing::info!("Seeded in-memory storefront with demo catalog");

    let llm: Option<Arc<dyn ChatBackend>> = if settings.llm.enabled {
        let llm_config = LlmConfig {
            model: settings.llm.model.clone(),
            endpoint: settings.llm.endpoint.clone(),
            api_key: (!settings.llm.api_key.is_empty()).then(|| settings.llm.api_key.clone()),
            max_tokens: settings.llm.max_tokens,
            temperature: settings.llm.temperature,
            timeout: std::time::Duration::from_secs(settings.llm.timeout_secs),
            max_retries: settings.llm.max_retries,
            ..LlmConfig::default()
        };
        match OpenAiBackend::new(llm_config) {
            Ok(backend) => {
                tracing::info!(model = %settings.llm.model, "Chat backend initialized");
                Some(Arc::new(backend))
            }
            Err(e) => {
                tracing::warn!("Chat backend unavailable, running heuristics-only: {}", e);
                None
            }
        }
    } else {
        tracing::info!("Chat backend disabled, running heuristics-only");
        None
    };

    let clerk_config = ClerkConfig::from_settings(STORE_NAME, &settings);
    let sessions = Arc::new(SessionManager::new(
        clerk_config,
        storefront.ports(),
        llm,
    ));
    let _cleanup = sessions.start_cleanup_task();

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let app = create_router(AppState {
        settings: Arc::new(settings),
        sessions,
    });

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,clerk_agent=debug"));

    fmt().with_env_filter(filter).with_target(true).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
