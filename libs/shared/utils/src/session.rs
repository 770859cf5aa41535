use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use shared_models::auth::Session;

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Load/save boundary for sessions. Handlers never touch the backing storage
/// directly; they receive a `Session` from the middleware.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, token: &str) -> Result<Option<Session>, SessionStoreError>;

    async fn save(&self, session: Session) -> Result<(), SessionStoreError>;

    /// Returns whether a session was removed.
    async fn remove(&self, token: &str) -> Result<bool, SessionStoreError>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, token: &str) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn save(&self, session: Session) -> Result<(), SessionStoreError> {
        debug!("Saving in-memory session for user {}", session.user.id);
        self.sessions.write().await.insert(session.token.clone(), session);
        Ok(())
    }

    async fn remove(&self, token: &str) -> Result<bool, SessionStoreError> {
        Ok(self.sessions.write().await.remove(token).is_some())
    }
}

/// Sessions persisted as a JSON object keyed by token. The whole file is
/// rewritten on every change.
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Using file session store at {}", path.display());
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, Session>, SessionStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, sessions: &HashMap<String, Session>) -> Result<(), SessionStoreError> {
        let bytes = serde_json::to_vec_pretty(sessions)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, token: &str) -> Result<Option<Session>, SessionStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(token))
    }

    async fn save(&self, session: Session) -> Result<(), SessionStoreError> {
        let _guard = self.lock.lock().await;
        let mut sessions = self.read_all().await?;
        debug!("Saving file session for user {}", session.user.id);
        sessions.insert(session.token.clone(), session);
        self.write_all(&sessions).await
    }

    async fn remove(&self, token: &str) -> Result<bool, SessionStoreError> {
        let _guard = self.lock.lock().await;
        let mut sessions = self.read_all().await?;
        let removed = sessions.remove(token).is_some();
        if removed {
            self.write_all(&sessions).await?;
        }
        Ok(removed)
    }
}
