//! # apicheck-schema: OpenAPI Schema Engine
//!
//! Turns a directory of OpenAPI 3 specification files into per-module
//! schema indices and validates HTTP bodies against them.
//!
//! ## Pipeline
//!
//! 1. [`cache`] loads each document once per build (spec file plus every
//!    file under the module's `models/` directory).
//! 2. [`resolve`] inlines `$ref` nodes across files, switching the
//!    resolution context to the referenced file so relative and local
//!    references inside it resolve against the right document. Reference
//!    cycles are detected and left in place.
//! 3. [`extract`] walks `paths`, keeping the JSON request-body and response
//!    schemas of every operation under `"<METHOD> <PATH> <STATUS>"` and
//!    `"<operationId>_request"` keys.
//! 4. [`validate`] compiles a stored schema (draft 7, formats on) and
//!    collects every violation with a readable field path.
//!
//! [`SchemaRegistry`] ties these together and is the handle tests use:
//!
//! ```no_run
//! use apicheck_core::ValidatorConfig;
//! use apicheck_schema::SchemaRegistry;
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::load(ValidatorConfig::default());
//! let body = json!({"user": {"id": 1, "username": "alice"}});
//! let (ok, message) = registry
//!     .validate_response("user", "POST", "/api/v1/users/register", 201, &body)
//!     .into_pair();
//! assert!(ok, "{}", message.unwrap_or_default());
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `apicheck-core` internally.
//! - Validation never returns an error: missing schemas are skips, broken
//!   schemas and non-conforming bodies are failures with a message.
//! - The engine never panics on malformed specifications.

pub mod cache;
pub mod extract;
pub mod outcome;
pub mod registry;
pub mod resolve;
pub mod summary;
pub mod validate;

pub use cache::DocumentCache;
pub use extract::{build_index, index_document, ModuleIndex, ResponseRoute};
pub use outcome::ValidationOutcome;
pub use registry::SchemaRegistry;
pub use resolve::{
    pointer_get, reference_of, Reference, Resolved, Resolver, RECURSIVE_MARKER,
};
pub use summary::{SummaryEntry, ValidationSummary};
pub use validate::{
    build_validator, check, check_guarded, field_path, SchemaValidationError,
    ValidationViolations, Violation,
};
