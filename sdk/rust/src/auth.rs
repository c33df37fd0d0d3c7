//! Read-only access to the externally owned auth state.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token and user identity, as persisted by the login flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    pub token: String,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Source of the current auth state. The client only ever reads it.
pub trait AuthStore: Send + Sync {
    fn current(&self) -> Option<AuthState>;

    /// Token to inject, ignoring empty tokens.
    fn token(&self) -> Option<String> {
        self.current()
            .map(|state| state.token)
            .filter(|token| !token.is_empty())
    }
}

/// In-process store written by whoever owns the session.
#[derive(Debug, Default)]
pub struct MemoryAuthStore {
    state: RwLock<Option<AuthState>>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(Some(AuthState {
            token: token.into(),
            user: None,
        }));
        store
    }

    pub fn set(&self, state: Option<AuthState>) {
        match self.state.write() {
            Ok(mut guard) => *guard = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }
}

impl AuthStore for MemoryAuthStore {
    fn current(&self) -> Option<AuthState> {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Durable store: a JSON file holding an `AuthState`.
///
/// A missing, unreadable or corrupt file means "not logged in".
#[derive(Debug, Clone)]
pub struct FileAuthStore {
    path: PathBuf,
}

impl FileAuthStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AuthStore for FileAuthStore {
    fn current(&self) -> Option<AuthState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Failed to read auth data");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Error parsing auth data");
                None
            }
        }
    }
}
