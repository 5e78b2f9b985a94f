//! Override processor

use std::sync::Arc;

use indexmap::IndexMap;

use crate::env::{
    MapPropertySource, PlaceholderResolver, PropertySource, PropertySources, PropertyValue,
    StandardEnvironment,
};
use crate::logging::{NoOpLogger, SharedLogger};
use crate::secrets::{ParameterStore, SsmParameterStore};
use crate::{log_debug, log_info, log_warn};

use super::error::{OverrideError, OverrideResult};
use super::report::{InsertedOverride, OverrideReport};

/// Name prefix of synthetic override sources
pub const OVERRIDE_SOURCE_PREFIX: &str = "override-";

/// Name of the override source shadowing `origin`
pub fn override_source_name(origin: &str) -> String {
    format!("{}{}", OVERRIDE_SOURCE_PREFIX, origin)
}

/// Replaces marker-prefixed configuration values with parameter store values
///
/// For every enumerable source, string values starting with the store's
/// prefix (ASCII case-insensitive) are placeholder-resolved, stripped of the
/// prefix and looked up. The results are inserted as a new source directly in
/// front of the original, which stays in place but is shadowed.
///
/// Run once at startup. Running again is harmless: a source is skipped when
/// its `override-<name>` source already shadows every marker value in it. An
/// existing source of that name which leaves a marker value exposed is a
/// [`OverrideError::NameConflict`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use param_override_core::env::{MapPropertySource, StandardEnvironment};
/// use param_override_core::secrets::MemoryParameterStore;
/// use param_override_core::processor::OverrideProcessor;
///
/// let store = Arc::new(MemoryParameterStore::with_parameters([("/db/user", "admin")]));
/// let mut env = StandardEnvironment::new();
/// env.sources_mut().add_last(
///     MapPropertySource::new("app.properties").with_property("db.user", "{ssmParameter}/db/user"),
/// );
///
/// OverrideProcessor::new(store).process(&mut env).unwrap();
///
/// assert_eq!(env.sources().names(), vec!["override-app.properties", "app.properties"]);
/// assert_eq!(env.get_string("db.user").unwrap().as_deref(), Some("admin"));
/// ```
pub struct OverrideProcessor {
    store: Arc<dyn ParameterStore>,
    logger: SharedLogger,
}

impl Default for OverrideProcessor {
    /// Processor backed by AWS SSM, configured from process variables
    fn default() -> Self {
        Self::new(Arc::new(SsmParameterStore::from_env()))
    }
}

impl OverrideProcessor {
    pub fn new(store: Arc<dyn ParameterStore>) -> Self {
        Self {
            store,
            logger: Arc::new(NoOpLogger::new()),
        }
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn store(&self) -> &Arc<dyn ParameterStore> {
        &self.store
    }

    /// Run the pass against an environment, resolving placeholders with the
    /// environment's own helper
    pub fn process(&self, env: &mut StandardEnvironment) -> OverrideResult<OverrideReport> {
        let (sources, placeholders) = env.parts_mut();
        self.apply(sources, placeholders)
    }

    /// Run the pass against a source list with an explicit placeholder resolver
    ///
    /// On error, sources processed before the failing one keep their
    /// overrides; the failing source and the ones after it are untouched.
    pub fn apply<R>(&self, sources: &mut PropertySources, placeholders: &R) -> OverrideResult<OverrideReport>
    where
        R: PlaceholderResolver + ?Sized,
    {
        let mut report = OverrideReport::default();
        // Sources inserted during the pass are not scanned
        let snapshot: Vec<Arc<dyn PropertySource>> = sources.iter().cloned().collect();

        for source in snapshot {
            let Some(names) = source.property_names() else {
                log_debug!(self.logger, "Skipping non-enumerable property source '{}'", source.name());
                continue;
            };

            let override_name = override_source_name(source.name());
            if let Some(existing) = sources.get(&override_name).cloned() {
                let eligible = self.eligible_names(source.as_ref(), &names);
                if eligible.is_empty() {
                    continue;
                }
                if let Some(exposed) = eligible.iter().find(|name| !existing.contains_property(name)) {
                    return Err(OverrideError::NameConflict {
                        override_name,
                        property: exposed.to_string(),
                        source_name: source.name().to_string(),
                    });
                }
                log_debug!(
                    self.logger,
                    "Property source '{}' already shadowed by '{}', skipping",
                    source.name(),
                    override_name
                );
                report.skipped.push(source.name().to_string());
                continue;
            }

            let overrides = self.resolve_source(source.as_ref(), &names, sources, placeholders, &mut report)?;
            if overrides.is_empty() {
                continue;
            }

            let properties: Vec<String> = overrides.keys().cloned().collect();
            sources.add_before(
                source.name(),
                MapPropertySource::with_properties(override_name.clone(), overrides),
            )?;
            log_info!(
                self.logger,
                "Inserted '{}' ahead of '{}' with {} propert{}",
                override_name,
                source.name(),
                properties.len(),
                if properties.len() == 1 { "y" } else { "ies" }
            );

            report.inserted.push(InsertedOverride {
                origin: source.name().to_string(),
                name: override_name,
                properties,
            });
        }

        Ok(report)
    }

    /// Whether `value` carries this processor's marker
    pub fn is_eligible(&self, value: &str) -> bool {
        starts_with_ignore_case(value, self.store.prefix())
    }

    /// Names of the marker-prefixed string properties in `source`
    fn eligible_names<'a>(&self, source: &dyn PropertySource, names: &'a [String]) -> Vec<&'a str> {
        names
            .iter()
            .filter(|name| {
                matches!(source.get_property(name), Some(PropertyValue::String(raw)) if self.is_eligible(&raw))
            })
            .map(String::as_str)
            .collect()
    }

    fn resolve_source<R>(
        &self,
        source: &dyn PropertySource,
        names: &[String],
        sources: &PropertySources,
        placeholders: &R,
        report: &mut OverrideReport,
    ) -> OverrideResult<IndexMap<String, PropertyValue>>
    where
        R: PlaceholderResolver + ?Sized,
    {
        let mut overrides = IndexMap::new();

        for name in names {
            let Some(PropertyValue::String(raw)) = source.get_property(name) else {
                continue;
            };
            if !self.is_eligible(&raw) {
                continue;
            }

            let value = placeholders
                .resolve_placeholders(sources, &raw)
                .map_err(|e| OverrideError::Placeholder {
                    property: name.clone(),
                    source_name: source.name().to_string(),
                    source: e,
                })?;

            let key = lookup_key(&value, self.store.prefix()).ok_or_else(|| {
                log_warn!(
                    self.logger,
                    "Property '{}' in '{}' has no parameter key after the marker",
                    name,
                    source.name()
                );
                OverrideError::MalformedValue {
                    property: name.clone(),
                    source_name: source.name().to_string(),
                }
            })?;

            log_debug!(
                self.logger,
                "Resolving '{}' from '{}' via {} key '{}'",
                name,
                source.name(),
                self.store.name(),
                key
            );
            report.lookups += 1;
            let resolved = self.store.resolve(key).map_err(|e| OverrideError::Secret {
                property: name.clone(),
                source_name: source.name().to_string(),
                source: e,
            })?;

            overrides.insert(name.clone(), PropertyValue::String(resolved));
        }

        Ok(overrides)
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// The part after the marker, or `None` if it is missing or empty
fn lookup_key<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    if !starts_with_ignore_case(value, prefix) {
        return None;
    }
    value.get(prefix.len()..).filter(|key| !key.is_empty())
}
