//! # apicheck-cli: Command-Line Front End
//!
//! Provides the `apicheck` binary over [`apicheck_schema::SchemaRegistry`].
//!
//! ## Subcommands
//!
//! - `apicheck schemas [MODULE]`: list indexed schema keys per module.
//! - `apicheck show MODULE KEY`: dump one resolved schema as JSON.
//! - `apicheck check-response` / `check-request`: validate a captured body.
//! - `apicheck replay TRANSCRIPT`: validate a recorded run and print the
//!   summary.
//!
//! ```bash
//! apicheck --spec-dir docs/openapi schemas user
//! curl -s localhost:8080/api/v1/problems/1 \
//!   | apicheck check-response problem GET /api/v1/problems/1 200
//! apicheck replay target/api-transcript.json
//! ```
//!
//! Exit status is 0 when nothing failed (skips included) and 1 otherwise.

pub mod check;
pub mod inspect;
pub mod replay;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use apicheck_core::ValidatorConfig;
use apicheck_schema::ValidationOutcome;
use serde_json::Value;

/// Build the effective configuration.
///
/// Precedence, lowest first: built-in defaults, the config file, the
/// `APICHECK_*` environment variables, then explicit command-line flags.
pub fn resolve_config(
    config_file: Option<&Path>,
    spec_dir: Option<&Path>,
    api_prefix: Option<&str>,
) -> Result<ValidatorConfig> {
    resolve_config_with_env(config_file, spec_dir, api_prefix, |name| {
        std::env::var(name).ok()
    })
}

/// [`resolve_config`] with environment variables read through `env`.
pub fn resolve_config_with_env<F>(
    config_file: Option<&Path>,
    spec_dir: Option<&Path>,
    api_prefix: Option<&str>,
    env: F,
) -> Result<ValidatorConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match config_file {
        Some(path) => ValidatorConfig::from_file(path)
            .with_context(|| format!("failed to load config file: {}", path.display()))?,
        None => ValidatorConfig::default(),
    };
    config
        .apply_env_from(env)
        .context("invalid APICHECK_* environment override")?;

    if let Some(dir) = spec_dir {
        config.spec_dir = dir.to_path_buf();
    }
    if let Some(prefix) = api_prefix {
        config.api_prefix = prefix.to_string();
    }
    Ok(config)
}

/// Read a JSON body from `source`, or from stdin when `source` is `None`
/// or `-`.
pub fn read_body(source: Option<&Path>) -> Result<Value> {
    match source.filter(|p| *p != Path::new("-")) {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read body file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("body file is not valid JSON: {}", path.display()))
        }
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("failed to read body from stdin")?;
            serde_json::from_str(&content).context("stdin is not valid JSON")
        }
    }
}

/// Print one outcome and map it to an exit code.
pub fn report_outcome(label: &str, outcome: &ValidationOutcome) -> u8 {
    match outcome {
        ValidationOutcome::Passed => {
            println!("ok: {label}");
            0
        }
        ValidationOutcome::Skipped { message } => {
            println!("skipped: {label}\n  {message}");
            0
        }
        ValidationOutcome::Failed { message, .. } => {
            println!("FAILED: {label}\n{message}");
            1
        }
    }
}
