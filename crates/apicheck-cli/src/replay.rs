//! # Replay Subcommand
//!
//! Validates a recorded API test run in one go. The transcript is a JSON
//! array of calls:
//!
//! ```json
//! [
//!   {"module": "user", "method": "POST", "path": "/api/v1/users/register",
//!    "status": 201, "body": {"user": {"id": 1, "username": "alice"}}}
//! ]
//! ```
//!
//! Every call is validated; failures do not stop the run. The summary is
//! printed at the end and the exit status is 1 if anything failed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use apicheck_schema::{SchemaRegistry, ValidationSummary};

/// Arguments for the `replay` subcommand.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON transcript of recorded calls.
    pub transcript: PathBuf,

    /// Print every outcome, not just the summary.
    #[arg(long)]
    pub each: bool,
}

/// One recorded call.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedCall {
    pub module: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    #[serde(default)]
    pub body: Value,
}

impl RecordedCall {
    fn label(&self) -> String {
        format!(
            "{}: {} {} {}",
            self.module,
            self.method.to_uppercase(),
            self.path,
            self.status
        )
    }
}

/// Execute the `replay` subcommand.
pub fn run_replay(args: &ReplayArgs, registry: &SchemaRegistry) -> Result<u8> {
    let calls = load_transcript(&args.transcript)?;
    tracing::info!(calls = calls.len(), transcript = %args.transcript.display(), "replaying");

    let summary = replay(registry, &calls, args.each);
    print!("{summary}");
    Ok(if summary.is_clean() { 0 } else { 1 })
}

/// Parse a transcript file.
pub fn load_transcript(path: &Path) -> Result<Vec<RecordedCall>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transcript: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("malformed transcript: {}", path.display()))
}

/// Validate every call and collect the outcomes.
pub fn replay(
    registry: &SchemaRegistry,
    calls: &[RecordedCall],
    print_each: bool,
) -> ValidationSummary {
    let mut summary = ValidationSummary::new();
    for call in calls {
        let outcome = registry.validate_response(
            &call.module,
            &call.method,
            &call.path,
            call.status,
            &call.body,
        );
        let label = call.label();
        if print_each {
            println!("{label}: {outcome}");
        }
        summary.record(label, &outcome);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicheck_core::ValidatorConfig;
    use apicheck_schema::index_document;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let spec = json!({
            "paths": {
                "/forum/posts": {
                    "get": {"responses": {"200": {"content": {"application/json": {"schema": {
                        "type": "object",
                        "required": ["posts"],
                        "properties": {"posts": {"type": "array"}}
                    }}}}}}
                }
            }
        });
        let index = index_document("forum", Path::new("/in-memory/forum.yaml"), spec, "models");
        SchemaRegistry::from_indices(ValidatorConfig::default(), [index])
    }

    fn write_transcript(dir: &Path, calls: Value) -> PathBuf {
        let path = dir.join("transcript.json");
        std::fs::write(&path, calls.to_string()).unwrap();
        path
    }

    #[test]
    fn replay_counts_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_transcript(
            dir.path(),
            json!([
                {"module": "forum", "method": "get", "path": "/api/v1/forum/posts",
                 "status": 200, "body": {"posts": []}},
                {"module": "forum", "method": "GET", "path": "/api/v1/forum/posts?page=2",
                 "status": 200, "body": {"posts": 3}},
                {"module": "news", "method": "GET", "path": "/api/v1/news", "status": 200}
            ]),
        );

        let calls = load_transcript(&path).unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].body, Value::Null);

        let summary = replay(&registry(), &calls, false);
        assert_eq!((summary.passed(), summary.failed(), summary.skipped()), (1, 1, 1));
        assert_eq!(summary.failures()[0].label, "forum: GET /api/v1/forum/posts?page=2 200");

        let args = ReplayArgs { transcript: path, each: false };
        assert_eq!(run_replay(&args, &registry()).unwrap(), 1);
    }

    #[test]
    fn clean_run_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_transcript(
            dir.path(),
            json!([{"module": "forum", "method": "GET", "path": "/forum/posts",
                    "status": 200, "body": {"posts": []}}]),
        );
        let args = ReplayArgs { transcript: path, each: true };
        assert_eq!(run_replay(&args, &registry()).unwrap(), 0);
    }

    #[test]
    fn malformed_transcript_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_transcript(dir.path(), json!({"module": "forum"}));
        let err = load_transcript(&path).unwrap_err();
        assert!(err.to_string().contains("malformed transcript"));
    }
}
