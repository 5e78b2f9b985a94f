//! Property sources backed by the process: environment variables and
//! command line arguments

use indexmap::IndexMap;

use super::error::{SourceError, SourceResult};
use super::source::PropertySource;
use super::value::PropertyValue;

/// Conventional name of the environment variable source
pub const SYSTEM_ENVIRONMENT_SOURCE_NAME: &str = "systemEnvironment";

/// Conventional name of the command line source
pub const COMMAND_LINE_SOURCE_NAME: &str = "commandLineArgs";

/// Property under which non-option command line arguments are exposed
pub const NON_OPTION_ARGS_PROPERTY: &str = "nonOptionArgs";

/// Process environment variables as a property source
///
/// Lookups accept relaxed names: `db.user`, `db-user` and `DB_USER` all find
/// the variable `DB_USER`. Variables whose name or value is not valid UTF-8
/// are ignored.
#[derive(Debug, Clone)]
pub struct SystemEnvironmentPropertySource {
    name: String,
    // `None` reads the live process environment on every lookup
    snapshot: Option<IndexMap<String, String>>,
}

impl Default for SystemEnvironmentPropertySource {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEnvironmentPropertySource {
    /// Source reading the live process environment
    pub fn new() -> Self {
        Self {
            name: SYSTEM_ENVIRONMENT_SOURCE_NAME.to_string(),
            snapshot: None,
        }
    }

    /// Source over a fixed set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: SYSTEM_ENVIRONMENT_SOURCE_NAME.to_string(),
            snapshot: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    fn raw(&self, key: &str) -> Option<String> {
        match &self.snapshot {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }

    /// Candidate variable names for a property name, most specific first
    fn candidates(name: &str) -> Vec<String> {
        let mut names = vec![
            name.to_string(),
            name.replace('.', "_"),
            name.replace('-', "_"),
            name.replace(['.', '-'], "_"),
        ];
        let upper: Vec<String> = names.iter().map(|n| n.to_uppercase()).collect();
        names.extend(upper);
        names.dedup();
        names
    }
}

impl PropertySource for SystemEnvironmentPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        Self::candidates(name)
            .iter()
            .find_map(|candidate| self.raw(candidate))
            .map(PropertyValue::String)
    }

    fn property_names(&self) -> Option<Vec<String>> {
        let names = match &self.snapshot {
            Some(vars) => vars.keys().cloned().collect(),
            None => std::env::vars_os()
                .filter_map(|(k, v)| {
                    v.into_string().ok()?;
                    k.into_string().ok()
                })
                .collect(),
        };
        Some(names)
    }
}

/// `--name=value` command line options as a property source
///
/// A bare `--flag` is stored with an empty value; repeated options are joined
/// with commas. Arguments that are not options are available, comma-joined,
/// under `nonOptionArgs`.
#[derive(Debug, Clone)]
pub struct CommandLinePropertySource {
    name: String,
    options: IndexMap<String, Vec<String>>,
    non_option_args: Vec<String>,
}

impl CommandLinePropertySource {
    /// Parse arguments, excluding the program name
    pub fn parse<I, S>(args: I) -> SourceResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut non_option_args = Vec::new();

        for arg in args {
            let arg = arg.as_ref();
            let Some(option) = arg.strip_prefix("--") else {
                non_option_args.push(arg.to_string());
                continue;
            };
            let (name, value) = match option.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (option, None),
            };
            if name.is_empty() {
                return Err(SourceError::InvalidArgument(arg.to_string()));
            }
            let values = options.entry(name.to_string()).or_default();
            if let Some(value) = value {
                values.push(value.to_string());
            }
        }

        Ok(Self {
            name: COMMAND_LINE_SOURCE_NAME.to_string(),
            options,
            non_option_args,
        })
    }

    pub fn non_option_args(&self) -> &[String] {
        &self.non_option_args
    }
}

impl PropertySource for CommandLinePropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        if name == NON_OPTION_ARGS_PROPERTY {
            if self.non_option_args.is_empty() {
                return None;
            }
            return Some(PropertyValue::String(self.non_option_args.join(",")));
        }
        self.options
            .get(name)
            .map(|values| PropertyValue::String(values.join(",")))
    }

    fn property_names(&self) -> Option<Vec<String>> {
        Some(self.options.keys().cloned().collect())
    }
}
