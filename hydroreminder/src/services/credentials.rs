/// Credential Manager Service
/// Secure storage for session tokens using the OS credential store,
/// and the token cache handed to the identity provider
use crate::config::CREDENTIAL_SERVICE_NAME;
use crate::error::{AppError, Result};
use keyring::Entry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Key/value secret storage
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// Credential store backed by the OS keychain / credential manager
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(CREDENTIAL_SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key)
            .map_err(|e| AppError::Credential(format!("Failed to create keyring entry: {}", e)))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::Credential(format!("Failed to retrieve token: {}", e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| AppError::Credential(format!("Failed to store token: {}", e)))?;
        tracing::info!("Token '{}' stored in credential manager", key);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::Credential(format!("Failed to delete token: {}", e))),
        }
    }
}

/// Process-local credential store, for tests and platforms without a keychain
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Session token cache.
///
/// Store failures never reach the caller: a failed read is a cache miss and
/// a failed write leaves the cache as it was.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn CredentialStore>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn get_token(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Token cache read failed, treating as miss: {}", e);
                None
            }
        }
    }

    pub fn save_token(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Token cache write failed: {}", e);
        }
    }

    pub fn clear_token(&self, key: &str) {
        if let Err(e) = self.store.delete(key) {
            tracing::warn!("Token cache delete failed: {}", e);
        }
    }
}
