//! `${...}` placeholder substitution

use std::collections::HashSet;

use super::error::PlaceholderError;
use super::sources::PropertySources;

/// Resolves placeholders embedded in a configuration value
///
/// The override pass hands every marker-prefixed value to a resolver before
/// the lookup key is computed. `PlaceholderHelper` resolves against the
/// current property sources; plain closures `Fn(&str) -> String` can be used
/// where the host has its own substitution.
pub trait PlaceholderResolver {
    fn resolve_placeholders(&self, sources: &PropertySources, text: &str) -> Result<String, PlaceholderError>;
}

impl<F> PlaceholderResolver for F
where
    F: Fn(&str) -> String,
{
    fn resolve_placeholders(&self, _sources: &PropertySources, text: &str) -> Result<String, PlaceholderError> {
        Ok(self(text))
    }
}

/// Placeholder syntax with optional defaults: `${name}` and `${name:default}`
///
/// - Placeholders nest, both inside keys (`${db.${env}.url}`) and inside
///   resolved values.
/// - Unresolvable placeholders without a default are left as written.
/// - A placeholder that refers back to itself fails with
///   [`PlaceholderError::Circular`].
#[derive(Debug, Clone)]
pub struct PlaceholderHelper {
    prefix: String,
    suffix: String,
    simple_prefix: String,
    value_separator: Option<String>,
}

impl Default for PlaceholderHelper {
    fn default() -> Self {
        Self::new("${", "}", Some(":"))
    }
}

impl PlaceholderHelper {
    pub fn new(prefix: &str, suffix: &str, value_separator: Option<&str>) -> Self {
        // Braces inside a `${...}` body open a nesting level with just `{`
        let simple_prefix = if suffix == "}" && prefix.ends_with('{') {
            "{".to_string()
        } else {
            prefix.to_string()
        };
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            simple_prefix,
            value_separator: value_separator.map(str::to_string),
        }
    }

    /// Replace placeholders in `text` using `lookup` for property values
    pub fn replace_placeholders<F>(&self, text: &str, lookup: F) -> Result<String, PlaceholderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut visited = HashSet::new();
        self.parse(text, &lookup, &mut visited)
    }

    fn parse<F>(&self, value: &str, lookup: &F, visited: &mut HashSet<String>) -> Result<String, PlaceholderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut result = value.to_string();
        let mut start = result.find(&self.prefix);

        while let Some(start_idx) = start {
            let Some(end_idx) = self.find_placeholder_end(&result, start_idx) else {
                break;
            };

            let original = result[start_idx + self.prefix.len()..end_idx].to_string();
            if !visited.insert(original.clone()) {
                return Err(PlaceholderError::Circular(original));
            }

            // Keys may themselves contain placeholders
            let key = self.parse(&original, lookup, visited)?;

            let mut resolved = lookup(&key);
            if resolved.is_none() {
                if let Some(separator) = &self.value_separator {
                    if let Some((actual_key, default)) = key.split_once(separator.as_str()) {
                        resolved = lookup(actual_key).or_else(|| Some(default.to_string()));
                    }
                }
            }

            let next_from = match resolved {
                Some(found) => {
                    let found = self.parse(&found, lookup, visited)?;
                    result.replace_range(start_idx..end_idx + self.suffix.len(), &found);
                    start_idx + found.len()
                }
                None => end_idx + self.suffix.len(),
            };

            visited.remove(&original);
            start = result
                .get(next_from..)
                .and_then(|rest| rest.find(&self.prefix))
                .map(|idx| idx + next_from);
        }

        Ok(result)
    }

    fn find_placeholder_end(&self, buf: &str, start_idx: usize) -> Option<usize> {
        let mut idx = start_idx + self.prefix.len();
        let mut nested = 0usize;

        while idx < buf.len() {
            let rest = &buf[idx..];
            if rest.starts_with(&self.suffix) {
                if nested > 0 {
                    nested -= 1;
                    idx += self.suffix.len();
                } else {
                    return Some(idx);
                }
            } else if rest.starts_with(&self.simple_prefix) {
                nested += 1;
                idx += self.simple_prefix.len();
            } else {
                idx += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
        None
    }
}

impl PlaceholderResolver for PlaceholderHelper {
    fn resolve_placeholders(&self, sources: &PropertySources, text: &str) -> Result<String, PlaceholderError> {
        self.replace_placeholders(text, |key| sources.get_property(key).map(|v| v.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_simple_substitution() {
        let helper = PlaceholderHelper::default();
        let result = helper
            .replace_placeholders("{ssmParameter}/db/${profile}/user", lookup(&[("profile", "prod")]))
            .unwrap();
        assert_eq!(result, "{ssmParameter}/db/prod/user");
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let helper = PlaceholderHelper::default();
        let result = helper.replace_placeholders("{ssmParameter}/db/user", lookup(&[])).unwrap();
        assert_eq!(result, "{ssmParameter}/db/user");
    }

    #[test]
    fn test_multiple_and_nested_values() {
        let helper = PlaceholderHelper::default();
        let result = helper
            .replace_placeholders(
                "/${region}/${service}",
                lookup(&[("region", "eu"), ("service", "${name}-svc"), ("name", "billing")]),
            )
            .unwrap();
        assert_eq!(result, "/eu/billing-svc");
    }

    #[test]
    fn test_placeholder_in_key() {
        let helper = PlaceholderHelper::default();
        let result = helper
            .replace_placeholders("${db.${env}.url}", lookup(&[("env", "prod"), ("db.prod.url", "pg://prod")]))
            .unwrap();
        assert_eq!(result, "pg://prod");
    }

    #[test]
    fn test_default_value() {
        let helper = PlaceholderHelper::default();
        let vars = lookup(&[("set", "yes")]);
        assert_eq!(helper.replace_placeholders("${unset:fallback}", &vars).unwrap(), "fallback");
        assert_eq!(helper.replace_placeholders("${set:fallback}", &vars).unwrap(), "yes");
        assert_eq!(helper.replace_placeholders("${unset:}", &vars).unwrap(), "");
    }

    #[test]
    fn test_unresolvable_is_left_as_is() {
        let helper = PlaceholderHelper::default();
        let result = helper
            .replace_placeholders("a/${missing}/${present}", lookup(&[("present", "b")]))
            .unwrap();
        assert_eq!(result, "a/${missing}/b");
    }

    #[test]
    fn test_unterminated_placeholder() {
        let helper = PlaceholderHelper::default();
        let result = helper.replace_placeholders("a/${open", lookup(&[("open", "x")])).unwrap();
        assert_eq!(result, "a/${open");
    }

    #[test]
    fn test_circular_reference() {
        let helper = PlaceholderHelper::default();
        let err = helper
            .replace_placeholders("${a}", lookup(&[("a", "${b}"), ("b", "${a}")]))
            .unwrap_err();
        assert!(matches!(err, PlaceholderError::Circular(_)));
    }

    #[test]
    fn test_same_placeholder_twice_is_not_circular() {
        let helper = PlaceholderHelper::default();
        let result = helper
            .replace_placeholders("${x}-${x}", lookup(&[("x", "1")]))
            .unwrap();
        assert_eq!(result, "1-1");
    }

    #[test]
    fn test_custom_syntax() {
        let helper = PlaceholderHelper::new("#[", "]", None);
        let result = helper
            .replace_placeholders("#[a]:#[b]", lookup(&[("a", "1"), ("b", "2")]))
            .unwrap();
        assert_eq!(result, "1:2");
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |text: &str| text.replace("${profile}", "prod");
        let sources = PropertySources::new();
        assert_eq!(
            resolver.resolve_placeholders(&sources, "/db/${profile}/user").unwrap(),
            "/db/prod/user"
        );
    }
}
