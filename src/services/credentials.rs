//! Per-model credential lookup.
//!
//! The engine only ever reads. Empty strings count as absent.

use crate::services::llm::client::Provider;
use std::collections::HashMap;
use std::sync::RwLock;

pub trait CredentialStore: Send + Sync {
    fn get(&self, model_id: &str) -> Option<String>;

    fn set(&self, model_id: &str, credential: String);

    fn has(&self, model_id: &str) -> bool {
        self.get(model_id).is_some()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    keys: RwLock<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(model_id: &str, credential: &str) -> Self {
        let store = Self::new();
        store.set(model_id, credential.to_string());
        store
    }

    pub fn remove(&self, model_id: &str) -> Option<String> {
        self.keys.write().ok()?.remove(model_id)
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self, model_id: &str) -> Option<String> {
        let keys = self.keys.read().ok()?;
        keys.get(model_id).filter(|k| !k.trim().is_empty()).cloned()
    }

    fn set(&self, model_id: &str, credential: String) {
        if let Ok(mut keys) = self.keys.write() {
            keys.insert(model_id.to_string(), credential);
        }
    }
}

/// Explicitly set keys first, then the provider's conventional environment
/// variable (`OPENAI_API_KEY` for `gpt-*`, ...).
#[derive(Debug, Default)]
pub struct EnvCredentialStore {
    overrides: InMemoryCredentialStore,
}

impl EnvCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for EnvCredentialStore {
    fn get(&self, model_id: &str) -> Option<String> {
        self.overrides.get(model_id).or_else(|| {
            let provider = Provider::from_model(model_id)?;
            std::env::var(provider.env_var())
                .ok()
                .filter(|k| !k.trim().is_empty())
        })
    }

    fn set(&self, model_id: &str, credential: String) {
        self.overrides.set(model_id, credential);
    }
}
