//! # apicheck-core: Foundational Types for apicheck
//!
//! Leaf crate of the workspace. Holds everything the schema engine and the
//! CLI share but that carries no validation logic of its own:
//!
//! - [`document`]: loading YAML/JSON specification files into
//!   `serde_json::Value` trees.
//! - [`route`]: HTTP methods, response/request schema keys, endpoint
//!   normalization and path-template matching.
//! - [`config`]: [`ValidatorConfig`]: spec directory, module table, API
//!   prefix.
//! - [`error`]: the `thiserror` error hierarchy.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `apicheck-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod document;
pub mod error;
pub mod route;

pub use config::{ModuleSpec, ValidatorConfig};
pub use document::{is_spec_file, load_document, read_document, DocumentFormat};
pub use error::{ConfigError, DocumentError};
pub use route::{
    normalize_endpoint, request_key, status_candidates, HttpMethod, PathTemplate, ResponseKey,
    UnsupportedMethod,
};
