//! # Check Subcommands
//!
//! Validate one captured body against its response or request schema.
//! The body comes from `--body FILE`, or stdin when omitted or `-`, so a
//! response can be piped straight from `curl`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use apicheck_schema::SchemaRegistry;

use crate::{read_body, report_outcome};

/// Arguments for the `check-response` subcommand.
#[derive(Args, Debug)]
pub struct CheckResponseArgs {
    /// Module name (e.g. `problem`).
    pub module: String,

    /// HTTP method of the call.
    pub method: String,

    /// Endpoint as dispatched, API prefix and query string allowed.
    pub path: String,

    /// Response status code.
    pub status: u16,

    /// JSON body file; stdin when omitted or `-`.
    #[arg(long)]
    pub body: Option<PathBuf>,
}

/// Arguments for the `check-request` subcommand.
#[derive(Args, Debug)]
pub struct CheckRequestArgs {
    /// Module name (e.g. `user`).
    pub module: String,

    /// `operationId` of the operation.
    pub operation_id: String,

    /// JSON body file; stdin when omitted or `-`.
    #[arg(long)]
    pub body: Option<PathBuf>,
}

/// Execute the `check-response` subcommand.
pub fn run_check_response(args: &CheckResponseArgs, registry: &SchemaRegistry) -> Result<u8> {
    let body = read_body(args.body.as_deref())?;
    let outcome =
        registry.validate_response(&args.module, &args.method, &args.path, args.status, &body);
    let label = format!(
        "{}: {} {} {}",
        args.module,
        args.method.to_uppercase(),
        args.path,
        args.status
    );
    Ok(report_outcome(&label, &outcome))
}

/// Execute the `check-request` subcommand.
pub fn run_check_request(args: &CheckRequestArgs, registry: &SchemaRegistry) -> Result<u8> {
    let body = read_body(args.body.as_deref())?;
    let outcome = registry.validate_request(&args.module, &args.operation_id, &body);
    let label = format!("{}: {} request", args.module, args.operation_id);
    Ok(report_outcome(&label, &outcome))
}
