use super::scope::TenantScope;
use crate::fleet::domain::UserId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Persistence for the last scope each user selected. Last write wins.
pub trait ScopeStore: Send + Sync {
    fn load(&self, user_id: &UserId) -> Result<Option<TenantScope>, ScopeStoreError>;
    fn save(&self, user_id: &UserId, scope: &TenantScope) -> Result<(), ScopeStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScopeStoreError {
    #[error("scope store io failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("stored scope at {} is unreadable: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("scope store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryScopeStore {
    entries: Arc<Mutex<HashMap<UserId, TenantScope>>>,
}

impl ScopeStore for InMemoryScopeStore {
    fn load(&self, user_id: &UserId) -> Result<Option<TenantScope>, ScopeStoreError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| ScopeStoreError::Unavailable("scope mutex poisoned".to_string()))?;
        Ok(guard.get(user_id).cloned())
    }

    fn save(&self, user_id: &UserId, scope: &TenantScope) -> Result<(), ScopeStoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| ScopeStoreError::Unavailable("scope mutex poisoned".to_string()))?;
        guard.insert(user_id.clone(), scope.clone());
        Ok(())
    }
}

/// One JSON document per user under a directory, surviving process restarts.
#[derive(Debug, Clone)]
pub struct JsonFileScopeStore {
    root: PathBuf,
}

impl JsonFileScopeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, user_id: &UserId) -> PathBuf {
        let file_name: String = user_id
            .as_str()
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.scope.json"))
    }
}

impl ScopeStore for JsonFileScopeStore {
    fn load(&self, user_id: &UserId) -> Result<Option<TenantScope>, ScopeStoreError> {
        let path = self.path_for(user_id);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ScopeStoreError::Io { path, source }),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| ScopeStoreError::Corrupt { path, source })
    }

    fn save(&self, user_id: &UserId, scope: &TenantScope) -> Result<(), ScopeStoreError> {
        std::fs::create_dir_all(&self.root).map_err(|source| ScopeStoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let path = self.path_for(user_id);
        let body = serde_json::to_vec_pretty(scope).map_err(|source| ScopeStoreError::Corrupt {
            path: path.clone(),
            source,
        })?;

        // Stage then rename; readers only ever see a complete document.
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, body).map_err(|source| ScopeStoreError::Io {
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, &path).map_err(|source| ScopeStoreError::Io { path, source })
    }
}
