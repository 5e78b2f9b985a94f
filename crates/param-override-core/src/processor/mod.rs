//! The override pass
//!
//! Scans enumerable property sources for marker-prefixed string values,
//! resolves them through a `ParameterStore` and shadows each affected source
//! with an `override-<name>` source holding the resolved values.

mod error;
mod report;
mod override_processor;

pub use error::{OverrideError, OverrideResult};
pub use report::{OverrideReport, InsertedOverride};
pub use override_processor::{OverrideProcessor, override_source_name, OVERRIDE_SOURCE_PREFIX};
