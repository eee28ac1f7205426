//! # Specification Documents
//!
//! Loads OpenAPI specification files and shared model files into
//! `serde_json::Value` trees. YAML sources are parsed with `serde_yaml`
//! and converted node-by-node, so every later stage (reference resolution,
//! indexing, validation) works on one tree representation.
//!
//! ## Failure Policy
//!
//! [`read_document`] reports failures as [`DocumentError`]. The engine uses
//! [`load_document`], which logs the failure and yields `None`: a broken
//! file contributes nothing but never aborts loading of other files.

use std::path::Path;

use serde_json::Value;

use crate::error::DocumentError;

/// On-disk format of a specification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.yaml` / `.yml`, and the fallback for unknown extensions.
    Yaml,
    /// `.json`.
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension. YAML is a JSON superset, so
    /// anything that is not `.json` is parsed as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Whether `path` looks like a specification or model file.
pub fn is_spec_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

/// Read and parse a document, requiring a mapping at the root.
///
/// # Errors
///
/// Returns [`DocumentError`] if the file cannot be read, does not parse,
/// contains YAML with no JSON equivalent, or has a non-mapping root.
pub fn read_document(path: &Path) -> Result<Value, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = parse_document(&content, DocumentFormat::from_path(path), path)?;
    if !value.is_object() {
        return Err(DocumentError::NotAMapping {
            path: path.to_path_buf(),
        });
    }
    Ok(value)
}

/// Load a document, logging and swallowing any failure.
pub fn load_document(path: &Path) -> Option<Value> {
    match read_document(path) {
        Ok(value) => {
            tracing::trace!(path = %path.display(), "loaded document");
            Some(value)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to load document");
            None
        }
    }
}

/// Parse document text in the given format. `path` is only used for
/// error context.
///
/// # Errors
///
/// Returns [`DocumentError::Yaml`], [`DocumentError::Json`] or
/// [`DocumentError::Conversion`].
pub fn parse_document(
    content: &str,
    format: DocumentFormat,
    path: &Path,
) -> Result<Value, DocumentError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| DocumentError::Json {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| DocumentError::Yaml {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            yaml_to_json_value(&yaml).map_err(|reason| DocumentError::Conversion {
                path: path.to_path_buf(),
                reason,
            })
        }
    }
}

/// Convert a parsed YAML tree into the JSON tree the engine works on.
///
/// Unquoted status codes (`200:`) arrive as numeric mapping keys and are
/// stringified, as are boolean keys. Tags are dropped.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => yaml_number(n)?,
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(items) => items
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<_, _>>()
            .map(Value::Array)?,
        Yaml::Mapping(entries) => entries
            .iter()
            .map(|(k, v)| -> Result<(String, Value), String> {
                Ok((mapping_key(k)?, yaml_to_json_value(v)?))
            })
            .collect::<Result<_, _>>()
            .map(Value::Object)?,
        Yaml::Tagged(tagged) => yaml_to_json_value(&tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Value, String> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Value::from(u));
    }
    n.as_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("number {n} has no JSON representation"))
}

fn mapping_key(key: &serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("mapping key {other:?} is not a scalar")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn yaml_status_code_keys_become_strings() {
        let yaml_str = r#"
paths:
  /users/register:
    post:
      responses:
        201:
          description: created
        "400":
          description: bad request
"#;
        let yaml: serde_yaml::Value = serde_yaml::from_str(yaml_str).unwrap();
        let value = yaml_to_json_value(&yaml).unwrap();
        let responses = &value["paths"]["/users/register"]["post"]["responses"];
        assert_eq!(responses["201"]["description"], "created");
        assert_eq!(responses["400"]["description"], "bad request");
    }

    #[test]
    fn yaml_scalars_convert() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("count: 42\nratio: 0.5\nenabled: true\nnothing: ~\nitems: [a, b]")
                .unwrap();
        let value = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(
            value,
            json!({
                "count": 42,
                "ratio": 0.5,
                "enabled": true,
                "nothing": null,
                "items": ["a", "b"]
            })
        );
    }

    #[test]
    fn yaml_non_finite_float_is_rejected() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("limit: .inf").unwrap();
        let err = yaml_to_json_value(&yaml).unwrap_err();
        assert!(err.contains("no JSON representation"), "got: {err}");
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a")), DocumentFormat::Yaml);
    }

    #[test]
    fn spec_file_filter() {
        assert!(is_spec_file(Path::new("models/user.yaml")));
        assert!(is_spec_file(Path::new("models/user.yml")));
        assert!(is_spec_file(Path::new("models/user.json")));
        assert!(!is_spec_file(Path::new("models/README.md")));
        assert!(!is_spec_file(Path::new("models/.keep")));
    }

    #[test]
    fn read_yaml_and_json_documents() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write(dir.path(), "user.yaml", "paths: {}\ncomponents: {}\n");
        let json = write(dir.path(), "user.json", r#"{"paths": {}}"#);
        assert_eq!(read_document(&yaml).unwrap(), json!({"paths": {}, "components": {}}));
        assert_eq!(read_document(&json).unwrap(), json!({"paths": {}}));
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }), "got: {err}");
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn read_broken_yaml_is_yaml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "broken.yaml", "paths: [unclosed\n");
        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, DocumentError::Yaml { .. }), "got: {err}");
    }

    #[test]
    fn empty_and_scalar_documents_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write(dir.path(), "empty.yaml", "");
        let scalar = write(dir.path(), "scalar.yaml", "just a string\n");
        assert!(read_document(&empty).is_err());
        assert!(matches!(
            read_document(&scalar).unwrap_err(),
            DocumentError::NotAMapping { .. }
        ));
    }

    #[test]
    fn load_document_swallows_errors() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write(dir.path(), "broken.json", "{ not json");
        assert!(load_document(&broken).is_none());
        assert!(load_document(&dir.path().join("absent.yaml")).is_none());
    }
}
