use std::sync::Arc;

use shared_config::AppConfig;

use crate::session::{FileSessionStore, InMemorySessionStore, SessionStore};

/// Shared router state: configuration plus the session boundary.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let sessions: Arc<dyn SessionStore> = match &config.session_file {
            Some(path) => Arc::new(FileSessionStore::new(path.clone())),
            None => Arc::new(InMemorySessionStore::new()),
        };

        Self {
            config: Arc::new(config),
            sessions,
        }
    }

    pub fn with_sessions(config: AppConfig, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
        }
    }
}
