//! Outcome of an override pass

/// One synthetic source inserted by a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedOverride {
    /// Source whose values were overridden
    pub origin: String,
    /// Name of the inserted source, `override-<origin>`
    pub name: String,
    /// Overridden property names, in the order they appear in the origin
    pub properties: Vec<String>,
}

/// What an override pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideReport {
    /// Inserted sources, in source-list order
    pub inserted: Vec<InsertedOverride>,
    /// Sources left alone because their override source already existed
    pub skipped: Vec<String>,
    /// Number of parameter store lookups performed
    pub lookups: usize,
}

impl OverrideReport {
    /// True if the pass inserted nothing
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
    }

    /// All overridden property names across sources
    pub fn overridden_properties(&self) -> impl Iterator<Item = &str> {
        self.inserted
            .iter()
            .flat_map(|o| o.properties.iter().map(String::as_str))
    }
}
