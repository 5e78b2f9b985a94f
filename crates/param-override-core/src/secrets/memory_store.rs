//! In-memory parameter store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::ssm_store::SSM_PREFIX;
use super::traits::{ParameterStore, SecretStoreError, SecretStoreResult};

/// In-memory parameter store for testing and local development
///
/// Uses the SSM marker prefix unless told otherwise, so configuration written
/// for SSM can be exercised without AWS. Every requested key is recorded,
/// which lets tests count remote round trips.
///
/// # Thread Safety
///
/// State sits behind `parking_lot` locks; the store can be shared across
/// threads.
#[derive(Debug)]
pub struct MemoryParameterStore {
    prefix: String,
    parameters: RwLock<HashMap<String, String>>,
    calls: RwLock<Vec<String>>,
    unavailable: RwLock<bool>,
}

impl Default for MemoryParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryParameterStore {
    /// Create an empty store using the SSM prefix
    pub fn new() -> Self {
        Self::with_prefix(SSM_PREFIX)
    }

    /// Create an empty store answering to a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            parameters: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
            unavailable: RwLock::new(false),
        }
    }

    /// Create a store with initial parameters
    pub fn with_parameters<I, K, V>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut guard = store.parameters.write();
            for (k, v) in parameters {
                guard.insert(k.into(), v.into());
            }
        }
        store
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.parameters.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.parameters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every lookup fail with `RemoteUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write() = unavailable;
    }

    /// Keys requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().len()
    }
}

impl ParameterStore for MemoryParameterStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn resolve(&self, key: &str) -> SecretStoreResult<String> {
        self.calls.write().push(key.to_string());

        if *self.unavailable.read() {
            return Err(SecretStoreError::RemoteUnavailable("memory store marked unavailable".to_string()));
        }

        self.parameters
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| SecretStoreError::NotFound(key.to_string()))
    }
}
