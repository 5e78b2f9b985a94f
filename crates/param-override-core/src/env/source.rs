//! Property source trait and the basic in-memory implementations

use std::fmt;

use indexmap::IndexMap;

use super::value::PropertyValue;

/// A named collection of configuration properties
///
/// Sources are consulted in order by `PropertySources`. A source is
/// *enumerable* when it can list its property names; only enumerable sources
/// can be scanned for parameter references.
pub trait PropertySource: Send + Sync + fmt::Debug {
    /// Unique name of this source within a `PropertySources` list
    fn name(&self) -> &str;

    /// Look up a raw property value
    fn get_property(&self, name: &str) -> Option<PropertyValue>;

    /// Check whether the source holds a property
    fn contains_property(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }

    /// All property names, or `None` if this source cannot enumerate them
    fn property_names(&self) -> Option<Vec<String>> {
        None
    }
}

/// Insertion-ordered map of properties
///
/// # Example
///
/// ```
/// use param_override_core::env::{MapPropertySource, PropertySource};
///
/// let source = MapPropertySource::new("app.properties")
///     .with_property("db.port", "5432");
/// assert_eq!(source.get_property("db.port").unwrap().as_str(), Some("5432"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapPropertySource {
    name: String,
    properties: IndexMap<String, PropertyValue>,
}

impl MapPropertySource {
    /// Create an empty map source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: IndexMap::new(),
        }
    }

    /// Create a map source from existing properties
    pub fn with_properties(name: impl Into<String>, properties: IndexMap<String, PropertyValue>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Builder-style insert
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyValue> {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        self.properties.get(name).cloned()
    }

    fn contains_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    fn property_names(&self) -> Option<Vec<String>> {
        Some(self.properties.keys().cloned().collect())
    }
}

type Lookup = Box<dyn Fn(&str) -> Option<PropertyValue> + Send + Sync>;

/// Closure-backed, non-enumerable property source
///
/// Useful for sources that can answer lookups but cannot list their keys,
/// such as remote key-value services queried on demand.
pub struct FnPropertySource {
    name: String,
    lookup: Lookup,
}

impl FnPropertySource {
    pub fn new<F>(name: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<PropertyValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            lookup: Box::new(lookup),
        }
    }
}

impl fmt::Debug for FnPropertySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPropertySource")
            .field("name", &self.name)
            .finish()
    }
}

impl PropertySource for FnPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        (self.lookup)(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source_preserves_insertion_order() {
        let source = MapPropertySource::new("m")
            .with_property("b", "2")
            .with_property("a", "1")
            .with_property("c", 3i64);

        assert_eq!(source.name(), "m");
        assert_eq!(source.len(), 3);
        assert_eq!(
            source.property_names(),
            Some(vec!["b".to_string(), "a".to_string(), "c".to_string()])
        );
        assert_eq!(source.get_property("c"), Some(PropertyValue::Integer(3)));
        assert!(source.contains_property("a"));
        assert!(!source.contains_property("z"));
    }

    #[test]
    fn test_fn_source_is_not_enumerable() {
        let source = FnPropertySource::new("lookup", |key| {
            (key == "answer").then(|| PropertyValue::from(42i64))
        });

        assert_eq!(source.get_property("answer"), Some(PropertyValue::Integer(42)));
        assert_eq!(source.get_property("other"), None);
        assert!(source.property_names().is_none());
    }
}
