//! Parameter store abstractions and implementations
//!
//! - `ParameterStore` trait: the marker prefix a store answers to and a
//!   blocking single-key lookup
//! - `SsmParameterStore`: AWS Systems Manager Parameter Store, client built
//!   lazily on first lookup
//! - `MemoryParameterStore`: in-process store for tests and local runs

mod traits;
mod memory_store;
mod ssm_store;

pub use traits::{ParameterStore, SecretStoreError, SecretStoreResult};
pub use memory_store::MemoryParameterStore;
pub use ssm_store::{
    SsmParameterStore, SsmSettings, ParameterClient, ClientFactory, SdkParameterClient,
    SSM_PREFIX, REGION_PROPERTY, ENDPOINT_PROPERTY, REGION_ENV, ENDPOINT_ENV,
};
