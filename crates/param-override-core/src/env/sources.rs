//! Ordered list of property sources

use std::sync::Arc;

use super::error::{SourceError, SourceResult};
use super::source::PropertySource;
use super::value::PropertyValue;

/// Ordered, mutable list of property sources
///
/// Lookups walk the list front to back and return the first match, so a
/// source placed earlier shadows the same property in later sources. Names
/// are unique: adding a source whose name is already present first removes
/// the existing entry.
///
/// # Example
///
/// ```
/// use param_override_core::env::{MapPropertySource, PropertySources};
///
/// let mut sources = PropertySources::new();
/// sources.add_last(MapPropertySource::new("defaults").with_property("port", "80"));
/// sources.add_first(MapPropertySource::new("overrides").with_property("port", "8080"));
///
/// assert_eq!(sources.get_property("port").unwrap().as_str(), Some("8080"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertySources {
    sources: Vec<Arc<dyn PropertySource>>,
}

impl PropertySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source with the highest precedence
    pub fn add_first(&mut self, source: impl PropertySource + 'static) {
        self.add_first_shared(Arc::new(source));
    }

    pub fn add_first_shared(&mut self, source: Arc<dyn PropertySource>) {
        self.remove_if_present(source.name());
        self.sources.insert(0, source);
    }

    /// Add a source with the lowest precedence
    pub fn add_last(&mut self, source: impl PropertySource + 'static) {
        self.add_last_shared(Arc::new(source));
    }

    pub fn add_last_shared(&mut self, source: Arc<dyn PropertySource>) {
        self.remove_if_present(source.name());
        self.sources.push(source);
    }

    /// Add a source immediately ahead of `relative`, so it takes precedence
    /// over it
    pub fn add_before(&mut self, relative: &str, source: impl PropertySource + 'static) -> SourceResult<()> {
        self.add_before_shared(relative, Arc::new(source))
    }

    pub fn add_before_shared(&mut self, relative: &str, source: Arc<dyn PropertySource>) -> SourceResult<()> {
        self.assert_legal_relative(relative, source.name())?;
        self.remove_if_present(source.name());
        let idx = self.require_index(relative)?;
        self.sources.insert(idx, source);
        Ok(())
    }

    /// Add a source immediately after `relative`
    pub fn add_after(&mut self, relative: &str, source: impl PropertySource + 'static) -> SourceResult<()> {
        self.add_after_shared(relative, Arc::new(source))
    }

    pub fn add_after_shared(&mut self, relative: &str, source: Arc<dyn PropertySource>) -> SourceResult<()> {
        self.assert_legal_relative(relative, source.name())?;
        self.remove_if_present(source.name());
        let idx = self.require_index(relative)?;
        self.sources.insert(idx + 1, source);
        Ok(())
    }

    /// Replace the source called `name`, keeping its position
    pub fn replace(&mut self, name: &str, source: impl PropertySource + 'static) -> SourceResult<()> {
        let idx = self.require_index(name)?;
        self.sources[idx] = Arc::new(source);
        Ok(())
    }

    /// Remove and return the source called `name`
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn PropertySource>> {
        let idx = self.precedence_of(name)?;
        Some(self.sources.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn PropertySource>> {
        self.sources.iter().find(|s| s.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.precedence_of(name).is_some()
    }

    /// Position of a source, 0 being the highest precedence
    pub fn precedence_of(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn PropertySource>> {
        self.sources.iter()
    }

    /// Source names in precedence order
    pub fn names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// First value for `name` across all sources
    pub fn get_property(&self, name: &str) -> Option<PropertyValue> {
        self.sources.iter().find_map(|s| s.get_property(name))
    }

    pub fn contains_property(&self, name: &str) -> bool {
        self.sources.iter().any(|s| s.contains_property(name))
    }

    fn assert_legal_relative(&self, relative: &str, name: &str) -> SourceResult<()> {
        if relative == name {
            return Err(SourceError::SelfRelative(name.to_string()));
        }
        Ok(())
    }

    fn require_index(&self, name: &str) -> SourceResult<usize> {
        self.precedence_of(name)
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    fn remove_if_present(&mut self, name: &str) {
        self.sources.retain(|s| s.name() != name);
    }
}
