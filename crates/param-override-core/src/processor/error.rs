//! Errors raised by the override pass

use thiserror::Error;

use crate::env::{PlaceholderError, SourceError};
use crate::secrets::SecretStoreError;

/// Errors that abort an override pass
///
/// Nothing is recovered locally: a misconfigured or unreachable store must
/// stop startup rather than leave marker values in place.
#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("Failed to resolve '{property}' from property source '{source_name}': {source}")]
    Secret {
        property: String,
        source_name: String,
        #[source]
        source: SecretStoreError,
    },

    #[error("Failed to resolve placeholders in '{property}' from property source '{source_name}': {source}")]
    Placeholder {
        property: String,
        source_name: String,
        #[source]
        source: PlaceholderError,
    },

    #[error("Property '{property}' in property source '{source_name}' has no parameter key after the marker")]
    MalformedValue {
        property: String,
        source_name: String,
    },

    #[error(
        "Property source '{override_name}' exists but does not override '{property}' from '{source_name}'"
    )]
    NameConflict {
        override_name: String,
        property: String,
        source_name: String,
    },

    #[error("Invalid parameter store settings: {0}")]
    Settings(#[source] PlaceholderError),

    #[error("Property source error: {0}")]
    Source(#[from] SourceError),
}

pub type OverrideResult<T> = Result<T, OverrideError>;
