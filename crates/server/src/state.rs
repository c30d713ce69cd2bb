//! Shared application state

use std::sync::Arc;

use clerk_config::Settings;

use crate::session::SessionManager;

/// State handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(settings: Settings, sessions: SessionManager) -> Self {
        Self {
            settings: Arc::new(settings),
            sessions: Arc::new(sessions),
        }
    }
}
