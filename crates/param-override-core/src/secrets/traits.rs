//! Core trait and errors for parameter lookups

use thiserror::Error;

/// Errors that can occur while resolving a parameter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretStoreError {
    /// The store could not be reached, or its client could not be built
    #[error("Parameter store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The store was reached but holds no value for the key
    #[error("Parameter not found: {0}")]
    NotFound(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// A remote store that resolves marker-prefixed configuration values
///
/// Configuration authors write `<prefix><key>`; the override pass strips the
/// prefix and calls [`resolve`](ParameterStore::resolve) with the key.
/// Lookups are not cached: every call reaches the store.
///
/// # Example
///
/// ```
/// use param_override_core::secrets::{MemoryParameterStore, ParameterStore};
///
/// let store = MemoryParameterStore::new();
/// store.insert("/db/user", "admin");
///
/// assert_eq!(store.prefix(), "{ssmParameter}");
/// assert_eq!(store.resolve("/db/user").unwrap(), "admin");
/// ```
pub trait ParameterStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Marker that identifies values destined for this store
    fn prefix(&self) -> &str;

    /// Fetch the plaintext value for `key`, which has the prefix removed
    fn resolve(&self, key: &str) -> SecretStoreResult<String>;
}
