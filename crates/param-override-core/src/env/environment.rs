//! Standard environment: ordered sources plus placeholder resolution

use super::error::{PlaceholderError, SourceResult};
use super::placeholder::{PlaceholderHelper, PlaceholderResolver};
use super::sources::PropertySources;
use super::system::{CommandLinePropertySource, SystemEnvironmentPropertySource};
use super::value::PropertyValue;

/// Application configuration environment
///
/// Holds the live [`PropertySources`] list and resolves `${...}` placeholders
/// against it. This is what the host hands to the override pass at startup.
///
/// # Example
///
/// ```
/// use param_override_core::env::{MapPropertySource, StandardEnvironment};
///
/// let mut env = StandardEnvironment::new();
/// env.sources_mut().add_last(
///     MapPropertySource::new("app")
///         .with_property("profile", "prod")
///         .with_property("db.path", "/db/${profile}"),
/// );
///
/// assert_eq!(env.get_string("db.path").unwrap().as_deref(), Some("/db/prod"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StandardEnvironment {
    sources: PropertySources,
    placeholders: PlaceholderHelper,
}

impl StandardEnvironment {
    /// Environment with no sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment seeded with the command line (highest precedence) and the
    /// process environment variables
    ///
    /// `args` excludes the program name.
    pub fn with_system_sources<I, S>(args: I) -> SourceResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut env = Self::new();
        env.sources.add_last(CommandLinePropertySource::parse(args)?);
        env.sources.add_last(SystemEnvironmentPropertySource::new());
        Ok(env)
    }

    /// Use a different placeholder syntax
    pub fn with_placeholder_helper(mut self, helper: PlaceholderHelper) -> Self {
        self.placeholders = helper;
        self
    }

    pub fn sources(&self) -> &PropertySources {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut PropertySources {
        &mut self.sources
    }

    pub fn placeholder_helper(&self) -> &PlaceholderHelper {
        &self.placeholders
    }

    /// Split borrow used by the override pass: the sources to mutate and the
    /// helper to resolve with
    pub(crate) fn parts_mut(&mut self) -> (&mut PropertySources, &PlaceholderHelper) {
        (&mut self.sources, &self.placeholders)
    }

    /// Raw value of the first source holding `name`
    pub fn get_property(&self, name: &str) -> Option<PropertyValue> {
        self.sources.get_property(name)
    }

    pub fn contains_property(&self, name: &str) -> bool {
        self.sources.contains_property(name)
    }

    /// Value of `name` rendered as a string with placeholders resolved
    pub fn get_string(&self, name: &str) -> Result<Option<String>, PlaceholderError> {
        match self.get_property(name) {
            Some(PropertyValue::String(s)) => self.resolve_placeholders(&s).map(Some),
            Some(other) => Ok(Some(other.to_string())),
            None => Ok(None),
        }
    }

    /// Resolve `${...}` placeholders in `text`, leaving unresolvable ones
    /// untouched
    pub fn resolve_placeholders(&self, text: &str) -> Result<String, PlaceholderError> {
        self.placeholders.resolve_placeholders(&self.sources, text)
    }
}
