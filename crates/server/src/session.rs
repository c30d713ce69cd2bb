//! Session registry
//!
//! One `ShopClerk` per session id, created lazily on first contact.
//! Sessions idle past the timeout are removed by a background sweep task.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use clerk_agent::{ClerkConfig, ShopClerk};
use clerk_core::StorefrontPorts;
use clerk_llm::ChatBackend;

use crate::ServerError;

/// A live session and its last-activity stamp.
pub struct Session {
    pub clerk: Arc<ShopClerk>,
    last_activity: Mutex<Instant>,
}

impl Session {
    fn new(clerk: Arc<ShopClerk>) -> Self {
        Self {
            clerk,
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }
}

/// Registry of live sessions.
pub struct SessionManager {
    sessions: DashMap<String, Arc<Session>>,
    config: ClerkConfig,
    ports: StorefrontPorts,
    llm: Option<Arc<dyn ChatBackend>>,
    max_sessions: usize,
    session_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        config: ClerkConfig,
        ports: StorefrontPorts,
        llm: Option<Arc<dyn ChatBackend>>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            ports,
            llm,
            max_sessions: 10_000,
            session_timeout: Duration::from_secs(3600),
        }
    }

    /// Fetch the clerk for a session, creating it on first contact.
    pub fn get_or_create(&self, session_id: &str) -> Result<Arc<Session>, ServerError> {
        if let Some(session) = self.sessions.get(session_id) {
            session.touch();
            return Ok(session.clone());
        }

        if self.sessions.len() >= self.max_sessions {
            tracing::warn!("Session capacity reached ({})", self.max_sessions);
            return Err(ServerError::Capacity);
        }

        let clerk = Arc::new(ShopClerk::new(
            session_id,
            self.config.clone(),
            self.ports.clone(),
            self.llm.clone(),
        ));
        let session = Arc::new(Session::new(clerk));
        self.sessions
            .insert(session_id.to_string(), session.clone());
        tracing::info!(session_id, "Created session");
        Ok(session)
    }

    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    fn cleanup_expired(&self) {
        self.sessions
            .retain(|_, session| session.idle_for() < self.session_timeout);
    }

    /// Background sweep for idle sessions. Returns a shutdown sender.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let before = manager.count();
                        manager.cleanup_expired();
                        let after = manager.count();
                        if before != after {
                            tracing::info!(
                                "Session cleanup: removed {} idle sessions ({} remaining)",
                                before - after,
                                after
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clerk_agent::{demo_catalog, InMemoryStorefront};

    fn manager() -> SessionManager {
        let store = Arc::new(InMemoryStorefront::new(demo_catalog()));
        SessionManager::new(ClerkConfig::default(), store.ports(), None)
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let manager = manager();
        let a = manager.get_or_create("s1").unwrap();
        let b = manager.get_or_create("s1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.count(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let manager = manager();
        manager.get_or_create("s1").unwrap();
        assert!(manager.remove("s1"));
        assert!(!manager.remove("s1"));
        assert_eq!(manager.count(), 0);
    }
}
