//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types shared by the apicheck crates. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Document errors always carry the offending file path.
//! - Configuration errors name the source (file or environment variable)
//!   that produced the bad value.
//! - Nothing in the validation engine surfaces these to test callers:
//!   they are logged and converted into "skip" or "failed" outcomes.

use std::path::PathBuf;

use thiserror::Error;

/// Error while reading or parsing a specification document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Path of the file that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML.
    #[error("invalid YAML in '{path}': {reason}")]
    Yaml {
        /// Path of the document.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The file is not valid JSON.
    #[error("invalid JSON in '{path}': {reason}")]
    Json {
        /// Path of the document.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The YAML tree contains something with no JSON equivalent.
    #[error("YAML-to-JSON conversion failed for '{path}': {reason}")]
    Conversion {
        /// Path of the document.
        path: PathBuf,
        /// What could not be converted.
        reason: String,
    },

    /// The document root is not a mapping (this includes empty files).
    #[error("document root of '{path}' is not a mapping")]
    NotAMapping {
        /// Path of the document.
        path: PathBuf,
    },
}

/// Error while assembling a [`ValidatorConfig`](crate::ValidatorConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be loaded.
    #[error("cannot load config file: {0}")]
    File(#[from] DocumentError),

    /// The configuration file parsed but does not describe a config.
    #[error("invalid config in '{path}': {reason}")]
    Invalid {
        /// Path of the configuration file.
        path: PathBuf,
        /// Deserialization message.
        reason: String,
    },

    /// A `name=file` module entry was malformed.
    #[error("malformed module entry '{entry}' in {source_name}: expected NAME=FILE")]
    ModuleEntry {
        /// The offending entry.
        entry: String,
        /// Where the entry came from (variable or flag name).
        source_name: String,
    },
}
