//! # Inspection Subcommands
//!
//! `schemas` lists what was indexed; `show` prints one resolved schema.
//! Both exist to debug a specification: a key that is missing here will
//! be skipped at validation time.

use std::fmt::Write as _;

use anyhow::{bail, Result};
use clap::Args;

use apicheck_schema::SchemaRegistry;

/// Arguments for the `schemas` subcommand.
#[derive(Args, Debug)]
pub struct SchemasArgs {
    /// Only list this module.
    pub module: Option<String>,
}

/// Arguments for the `show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Module name (e.g. `user`).
    pub module: String,

    /// Exact schema key, e.g. `"POST /users/register 201"` or `registerUser_request`.
    pub key: String,
}

/// Execute the `schemas` subcommand.
pub fn run_schemas(args: &SchemasArgs, registry: &SchemaRegistry) -> Result<u8> {
    let listing = render_schemas(registry, args.module.as_deref());
    print!("{listing}");

    let loaded = match &args.module {
        Some(name) => registry.module(name).is_some(),
        None => registry.modules().next().is_some(),
    };
    Ok(if loaded { 0 } else { 1 })
}

/// Execute the `show` subcommand.
pub fn run_show(args: &ShowArgs, registry: &SchemaRegistry) -> Result<u8> {
    if registry.module(&args.module).is_none() {
        bail!(
            "module '{}' has no loaded specification under {}",
            args.module,
            registry.config().spec_dir.display()
        );
    }
    let Some(schema) = registry.schema(&args.module, &args.key) else {
        bail!(
            "no schema '{}' in module '{}' (run `apicheck schemas {}` to list keys)",
            args.key,
            args.module,
            args.module
        );
    };
    println!("{}", serde_json::to_string_pretty(schema)?);
    Ok(0)
}

/// Text listing of indexed keys, one module per block.
pub fn render_schemas(registry: &SchemaRegistry, module: Option<&str>) -> String {
    let mut out = String::new();
    let listing = registry.available_schemas(module);

    if listing.is_empty() {
        let _ = writeln!(
            out,
            "no specifications loaded from {}",
            registry.config().spec_dir.display()
        );
        return out;
    }

    for (name, keys) in &listing {
        match registry.module(name) {
            Some(index) => {
                let _ = writeln!(
                    out,
                    "{name} ({}, {} schemas)",
                    index.spec_path().display(),
                    keys.len()
                );
                if index.unresolved_refs() > 0 {
                    let _ = writeln!(out, "  ! {} unresolved references", index.unresolved_refs());
                }
            }
            None => {
                let _ = writeln!(out, "{name}: no loaded specification");
            }
        }
        for key in keys {
            let _ = writeln!(out, "  {key}");
        }
    }
    out
}
