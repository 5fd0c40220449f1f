//! Local preference storage and session credentials.
//!
//! # Design
//! A `PreferenceStore` is a process-wide key/value map of scalars. Each key
//! is owned by exactly one setting, so writers to different keys never
//! conflict. `set` is synchronous and durable before it returns.
//!
//! The `CredentialStore` is read-only as far as synchronizers are concerned;
//! only login/logout flows write to it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;

/// Account key under which the session token is kept.
pub const SESSION_ACCOUNT: &str = "userSession";

/// A persisted scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl PrefValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PrefValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<PrefValue>;

    fn set(&self, key: &str, value: PrefValue) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Drop every key. Used on logout.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Non-durable store for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, PrefValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: PrefValue) -> Result<(), StoreError> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.values.write().clear();
        Ok(())
    }
}

/// JSON-file-backed store. The whole map is rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, PrefValue>>,
}

impl FileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        info!(path = ?path, keys = values.len(), "preference store opened");
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, PrefValue>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = ?self.path, "preferences written");
        Ok(())
    }

    /// Apply `change` to a copy and commit it only if the write succeeds.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, PrefValue>),
    ) -> Result<(), StoreError> {
        let mut values = self.values.write();
        let mut next = values.clone();
        change(&mut next);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: PrefValue) -> Result<(), StoreError> {
        self.update(|values| {
            values.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|values| {
            values.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(BTreeMap::clear)
    }
}

/// Secure credential storage, keyed by account.
pub trait CredentialStore: Send + Sync {
    fn token(&self, account: &str) -> Option<String>;

    fn delete(&self, account: &str);

    /// The signed-in user's session token; `None` means local-only mode.
    fn session_token(&self) -> Option<String> {
        self.token(SESSION_ACCOUNT).filter(|t| !t.is_empty())
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    tokens: RwLock<BTreeMap<String, String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credentials already holding a session token.
    pub fn signed_in(token: &str) -> Self {
        let creds = Self::new();
        creds.store(SESSION_ACCOUNT, token);
        creds
    }

    pub fn store(&self, account: &str, token: &str) {
        self.tokens
            .write()
            .insert(account.to_string(), token.to_string());
    }
}

impl CredentialStore for MemoryCredentials {
    fn token(&self, account: &str) -> Option<String> {
        self.tokens.read().get(account).cloned()
    }

    fn delete(&self, account: &str) {
        self.tokens.write().remove(account);
    }
}

/// Sign out: forget every local preference, then the session token.
///
/// If the preferences cannot be cleared the token is kept, so a failed
/// logout leaves the user signed in with their settings intact.
pub fn clear_session(
    prefs: &dyn PreferenceStore,
    credentials: &dyn CredentialStore,
) -> Result<(), StoreError> {
    prefs.clear()?;
    credentials.delete(SESSION_ACCOUNT);
    info!("session cleared");
    Ok(())
}
