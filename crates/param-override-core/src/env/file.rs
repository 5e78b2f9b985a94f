//! File-backed property sources
//!
//! Supported formats, chosen by extension:
//! - `.properties`: `key=value` or `key: value` lines, `#`/`!` comments
//! - `.yaml` / `.yml`: nested maps flattened to dotted keys
//! - `.json`: same flattening as YAML
//!
//! Sequences flatten to `key[0]`, `key[1]`, ... and null values are dropped.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use super::error::{SourceError, SourceResult};
use super::source::MapPropertySource;
use super::value::PropertyValue;

/// Load a configuration file into a source named after its file name
///
/// # Example
///
/// ```no_run
/// use param_override_core::env::{load_file, PropertySource};
///
/// let source = load_file("config/app.properties").unwrap();
/// assert_eq!(source.name(), "app.properties");
/// ```
pub fn load_file(path: impl AsRef<Path>) -> SourceResult<MapPropertySource> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    load_file_named(name, path)
}

/// Load a configuration file into a source with an explicit name
pub fn load_file_named(name: impl Into<String>, path: impl AsRef<Path>) -> SourceResult<MapPropertySource> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let properties = match extension.as_str() {
        "properties" => parse_properties(&fs::read_to_string(path)?),
        "yaml" | "yml" => {
            let value: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(path)?)?;
            flatten_yaml(&value).map_err(|message| SourceError::Parse {
                path: path.to_path_buf(),
                message,
            })?
        }
        "json" => {
            let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
            flatten_json(&value)
        }
        _ => return Err(SourceError::UnsupportedFormat(path.to_path_buf())),
    };

    Ok(MapPropertySource::with_properties(name, properties))
}

/// Parse `.properties` content
///
/// Later duplicates win. Keys and values are trimmed; line continuations and
/// escapes are not interpreted.
pub fn parse_properties(content: &str) -> IndexMap<String, PropertyValue> {
    let mut properties = IndexMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let split_at = line.find(['=', ':']);
        let (key, value) = match split_at {
            Some(idx) => (&line[..idx], &line[idx + 1..]),
            None => (line, ""),
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        properties.insert(key.to_string(), PropertyValue::String(value.trim().to_string()));
    }

    properties
}

/// Flatten a YAML document into dotted property names
///
/// Fails if a mapping key is not a scalar.
pub fn flatten_yaml(value: &serde_yaml::Value) -> Result<IndexMap<String, PropertyValue>, String> {
    let mut out = IndexMap::new();
    flatten_yaml_into(&mut out, "", value)?;
    Ok(out)
}

fn flatten_yaml_into(
    out: &mut IndexMap<String, PropertyValue>,
    prefix: &str,
    value: &serde_yaml::Value,
) -> Result<(), String> {
    use serde_yaml::Value;

    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix.to_string(), PropertyValue::Bool(*b));
        }
        Value::Number(n) => {
            let value = match n.as_i64() {
                Some(i) => PropertyValue::Integer(i),
                None => PropertyValue::Float(n.as_f64().unwrap_or_default()),
            };
            out.insert(prefix.to_string(), value);
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), PropertyValue::String(s.clone()));
        }
        Value::Sequence(items) => {
            for (idx, item) in items.iter().enumerate() {
                flatten_yaml_into(out, &format!("{}[{}]", prefix, idx), item)?;
            }
        }
        Value::Mapping(map) => {
            for (key, item) in map {
                let key = match key {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    other => return Err(format!("unsupported mapping key: {:?}", other)),
                };
                flatten_yaml_into(out, &join_key(prefix, &key), item)?;
            }
        }
        Value::Tagged(tagged) => flatten_yaml_into(out, prefix, &tagged.value)?,
    }
    Ok(())
}

/// Flatten a JSON document into dotted property names
pub fn flatten_json(value: &serde_json::Value) -> IndexMap<String, PropertyValue> {
    let mut out = IndexMap::new();
    flatten_json_into(&mut out, "", value);
    out
}

fn flatten_json_into(out: &mut IndexMap<String, PropertyValue>, prefix: &str, value: &serde_json::Value) {
    use serde_json::Value;

    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix.to_string(), PropertyValue::Bool(*b));
        }
        Value::Number(n) => {
            let value = match n.as_i64() {
                Some(i) => PropertyValue::Integer(i),
                None => PropertyValue::Float(n.as_f64().unwrap_or_default()),
            };
            out.insert(prefix.to_string(), value);
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), PropertyValue::String(s.clone()));
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                flatten_json_into(out, &format!("{}[{}]", prefix, idx), item);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_json_into(out, &join_key(prefix, key), item);
            }
        }
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::PropertySource;
    use tempfile::tempdir;

    #[test]
    fn test_parse_properties() {
        let props = parse_properties(
            "# comment\n\
             ! also a comment\n\
             db.user = {ssmParameter}/db/user\n\
             db.port: 5432\n\
             \n\
             flag\n\
             url=jdbc:postgres://host/db\n",
        );

        assert_eq!(props.len(), 4);
        assert_eq!(props["db.user"], PropertyValue::from("{ssmParameter}/db/user"));
        assert_eq!(props["db.port"], PropertyValue::from("5432"));
        assert_eq!(props["flag"], PropertyValue::from(""));
        assert_eq!(props["url"], PropertyValue::from("jdbc:postgres://host/db"));
    }

    #[test]
    fn test_flatten_yaml() {
        let value: serde_yaml::Value = serde_yaml::from_str(
            "db:\n  user: admin\n  port: 5432\n  ssl: true\n  ratio: 0.5\n\
             hosts:\n  - a\n  - b\nempty: ~\n",
        )
        .unwrap();
        let props = flatten_yaml(&value).unwrap();

        assert_eq!(props["db.user"], PropertyValue::from("admin"));
        assert_eq!(props["db.port"], PropertyValue::Integer(5432));
        assert_eq!(props["db.ssl"], PropertyValue::Bool(true));
        assert_eq!(props["db.ratio"], PropertyValue::Float(0.5));
        assert_eq!(props["hosts[0]"], PropertyValue::from("a"));
        assert_eq!(props["hosts[1]"], PropertyValue::from("b"));
        assert!(!props.contains_key("empty"));
    }

    #[test]
    fn test_flatten_json() {
        let value = serde_json::json!({
            "db": { "user": "{ssmParameter}/db/user", "port": 5432 },
            "tags": ["x", "y"],
            "unset": null
        });
        let props = flatten_json(&value);

        assert_eq!(props["db.user"], PropertyValue::from("{ssmParameter}/db/user"));
        assert_eq!(props["db.port"], PropertyValue::Integer(5432));
        assert_eq!(props["tags[1]"], PropertyValue::from("y"));
        assert!(!props.contains_key("unset"));
    }

    #[test]
    fn test_load_file_by_extension() {
        let dir = tempdir().unwrap();

        let props_path = dir.path().join("app.properties");
        fs::write(&props_path, "db.port=5432\n").unwrap();
        let source = load_file(&props_path).unwrap();
        assert_eq!(source.name(), "app.properties");
        assert_eq!(source.get_property("db.port"), Some(PropertyValue::from("5432")));

        let yaml_path = dir.path().join("application.yml");
        fs::write(&yaml_path, "server:\n  port: 8080\n").unwrap();
        let source = load_file_named("yaml", &yaml_path).unwrap();
        assert_eq!(source.name(), "yaml");
        assert_eq!(source.get_property("server.port"), Some(PropertyValue::Integer(8080)));

        let json_path = dir.path().join("settings.json");
        fs::write(&json_path, r#"{"feature": {"enabled": false}}"#).unwrap();
        let source = load_file(&json_path).unwrap();
        assert_eq!(source.get_property("feature.enabled"), Some(PropertyValue::Bool(false)));
    }

    #[test]
    fn test_load_file_errors() {
        let dir = tempdir().unwrap();

        let toml_path = dir.path().join("config.toml");
        fs::write(&toml_path, "a = 1").unwrap();
        assert!(matches!(load_file(&toml_path), Err(SourceError::UnsupportedFormat(_))));

        let missing = dir.path().join("missing.properties");
        assert!(matches!(load_file(&missing), Err(SourceError::Io(_))));

        let bad_json = dir.path().join("bad.json");
        fs::write(&bad_json, "{not json").unwrap();
        assert!(matches!(load_file(&bad_json), Err(SourceError::Json(_))));
    }
}
