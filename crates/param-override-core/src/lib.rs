//! Parameter Override Core
//!
//! Startup-time configuration shim: property values written as
//! `{ssmParameter}<key>` are looked up in AWS Systems Manager Parameter Store
//! and the resolved values shadow the originals.
//!
//! For every property source that holds at least one marker value, a new
//! source named `override-<name>` is inserted directly in front of it. The
//! original source is left untouched, so removing the override source
//! restores the raw configuration.
//!
//! ```rust,no_run
//! use param_override_core::env::{load_file, StandardEnvironment};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut env = StandardEnvironment::with_system_sources(std::env::args().skip(1))?;
//! env.sources_mut().add_last(load_file("config/app.properties")?);
//!
//! // db.password={ssmParameter}/db/${profile}/password
//! param_override_core::bootstrap(&mut env)?;
//!
//! let password = env.get_string("db.password")?;
//! # Ok(())
//! # }
//! ```
//!
//! Any failure aborts startup: a missing parameter or an unreachable store is
//! reported as an [`OverrideError`] naming the property and source.

pub mod logging;
pub mod env;
pub mod secrets;
pub mod processor;

pub use env::{
    PropertySource, PropertySources, PropertyValue, MapPropertySource,
    PlaceholderHelper, PlaceholderResolver, StandardEnvironment,
};

pub use secrets::{
    ParameterStore, SecretStoreError, SecretStoreResult,
    SsmParameterStore, SsmSettings, MemoryParameterStore,
};

pub use logging::{Logger, NoOpLogger, ConsoleLogger, MemoryLogger};

pub use processor::{
    OverrideProcessor, OverrideReport, InsertedOverride, OverrideError, OverrideResult,
    override_source_name,
};

use std::sync::Arc;

/// Run the override pass with an SSM-backed store
///
/// Region and endpoint are read from the environment itself
/// (`param-override.ssm.region`, `param-override.ssm.endpoint-url`) with the
/// process variables as fallback; placeholders in those properties are
/// resolved. No client is created unless a marker value is found.
/// Diagnostics go to stderr through [`ConsoleLogger`].
pub fn bootstrap(env: &mut StandardEnvironment) -> OverrideResult<OverrideReport> {
    let settings = SsmSettings::from_environment(env).map_err(OverrideError::Settings)?;
    let store = Arc::new(SsmParameterStore::new(settings));

    OverrideProcessor::new(store)
        .with_logger(Arc::new(ConsoleLogger::new()))
        .process(env)
}
