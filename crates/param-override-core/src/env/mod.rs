//! Host configuration model
//!
//! A small, framework-free model of layered application configuration:
//! - `PropertySource` trait with map, process environment, command line,
//!   file and closure-backed implementations
//! - `PropertySources`: the ordered search list, first match wins
//! - `PlaceholderHelper`: `${name}` / `${name:default}` substitution
//! - `StandardEnvironment`: sources plus placeholder resolution

mod value;
mod error;
mod source;
mod system;
mod file;
mod sources;
mod placeholder;
mod environment;

pub use value::PropertyValue;
pub use error::{SourceError, SourceResult, PlaceholderError};
pub use source::{PropertySource, MapPropertySource, FnPropertySource};
pub use system::{
    SystemEnvironmentPropertySource, CommandLinePropertySource,
    SYSTEM_ENVIRONMENT_SOURCE_NAME, COMMAND_LINE_SOURCE_NAME, NON_OPTION_ARGS_PROPERTY,
};
pub use file::{load_file, load_file_named, parse_properties, flatten_yaml, flatten_json};
pub use sources::PropertySources;
pub use placeholder::{PlaceholderHelper, PlaceholderResolver};
pub use environment::StandardEnvironment;
