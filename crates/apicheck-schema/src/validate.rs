//! # Structural Validation
//!
//! Checks a JSON value against a resolved schema with draft-07 semantics
//! (types, `required`, `enum`, `format`, `pattern`, nested objects and
//! arrays) via the `jsonschema` crate, collecting every violation rather
//! than stopping at the first.
//!
//! ## Field Paths
//!
//! Violations are reported against a readable field path instead of a raw
//! JSON Pointer: members are joined with `.`, array positions rendered as
//! `[i]`, and the document itself is `root`. `/submissions/0/status`
//! becomes `submissions[0].status`.
//!
//! ## Unresolved References
//!
//! Schemas are expected to be fully inlined. Any `$ref` node still present
//! (a dangling pointer or a recursive schema) is compiled as the permissive
//! schema `{}`, and the local retriever answers every remote lookup with
//! `{}` as well, so validation never reaches for the network.

use std::borrow::Cow;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use jsonschema::{Retrieve, Uri, Validator};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::resolve::reference_of;

/// Retriever that never leaves the process.
struct LocalSchemaRetriever;

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(uri = %uri.as_str(), "remote schema reference treated as permissive");
        Ok(serde_json::json!({}))
    }
}

/// Error from checking a value against a schema.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The value did not conform to the schema.
    #[error("validation failed:\n{violations}")]
    ValidationFailed {
        /// Every violation found.
        violations: ValidationViolations,
    },

    /// The schema itself could not be compiled.
    #[error("invalid schema: {reason}")]
    ValidatorBuild {
        /// Compiler message.
        reason: String,
    },

    /// The validator panicked.
    #[error("validator aborted: {reason}")]
    Aborted {
        /// Panic payload, if it was a string.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Readable path of the violating field (`user.id`, `items[2]`, `root`).
    pub field_path: String,
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  - {}: {}", self.field_path, self.message)
    }
}

/// Every violation from one check, in the order the validator reported them.
///
/// Derefs to a slice; displays one `  - field: message` line per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations(Vec<Violation>);

impl ValidationViolations {
    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

impl std::ops::Deref for ValidationViolations {
    type Target = [Violation];

    fn deref(&self) -> &[Violation] {
        &self.0
    }
}

impl From<Vec<Violation>> for ValidationViolations {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = self.0.iter();
        if let Some(first) = lines.next() {
            write!(f, "{first}")?;
        }
        lines.try_for_each(|v| write!(f, "\n{v}"))
    }
}

/// Compile a draft-07 validator for `schema`.
///
/// # Errors
///
/// Returns [`SchemaValidationError::ValidatorBuild`] if the schema is
/// malformed (e.g. `"type": 12`, `"required": "id"`).
pub fn build_validator(schema: &Value) -> Result<Validator, SchemaValidationError> {
    let schema = without_dangling_refs(schema);

    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft7);
    opts.should_validate_formats(true);
    opts.with_retriever(LocalSchemaRetriever);

    opts.build(&schema)
        .map_err(|e| SchemaValidationError::ValidatorBuild {
            reason: e.to_string(),
        })
}

/// Check `instance` against `schema`, collecting every violation.
///
/// # Errors
///
/// Returns [`SchemaValidationError::ValidationFailed`] with all violations
/// if the instance does not conform, or
/// [`SchemaValidationError::ValidatorBuild`] if the schema is malformed.
pub fn check(schema: &Value, instance: &Value) -> Result<(), SchemaValidationError> {
    let validator = build_validator(schema)?;

    let violations: Vec<Violation> = validator
        .iter_errors(instance)
        .map(|e| {
            let instance_path = e.instance_path.to_string();
            Violation {
                field_path: field_path(&instance_path, instance),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
                instance_path,
            }
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaValidationError::ValidationFailed {
            violations: violations.into(),
        })
    }
}

/// [`check`], with a panic inside the validator reported as
/// [`SchemaValidationError::Aborted`] instead of unwinding into the caller.
pub fn check_guarded(schema: &Value, instance: &Value) -> Result<(), SchemaValidationError> {
    catch_unwind(AssertUnwindSafe(|| check(schema, instance))).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(SchemaValidationError::Aborted { reason })
    })
}

/// Render a JSON Pointer into `instance` as a readable field path.
pub fn field_path(pointer: &str, instance: &Value) -> String {
    let Some(rest) = pointer.strip_prefix('/') else {
        return "root".to_string();
    };

    let mut path = String::new();
    let mut node = Some(instance);
    for raw in rest.split('/') {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        match node {
            Some(Value::Array(items)) if segment.parse::<usize>().is_ok() => {
                path.push('[');
                path.push_str(&segment);
                path.push(']');
                node = segment.parse::<usize>().ok().and_then(|i| items.get(i));
            }
            _ => {
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(&segment);
                node = node.and_then(|n| n.get(segment.as_str()));
            }
        }
    }
    path
}

/// `schema` with every remaining reference node replaced by `{}`.
fn without_dangling_refs(schema: &Value) -> Cow<'_, Value> {
    if contains_reference(schema) {
        Cow::Owned(strip_references(schema))
    } else {
        Cow::Borrowed(schema)
    }
}

fn contains_reference(node: &Value) -> bool {
    if reference_of(node).is_some() {
        return true;
    }
    match node {
        Value::Object(map) => map.values().any(contains_reference),
        Value::Array(items) => items.iter().any(contains_reference),
        _ => false,
    }
}

fn strip_references(node: &Value) -> Value {
    if reference_of(node).is_some() {
        return Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), strip_references(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_references).collect()),
        scalar => scalar.clone(),
    }
}
