//! # Schema Registry
//!
//! The validator handle test code holds on to. Built once from a
//! [`ValidatorConfig`]: every configured module whose specification file
//! exists is indexed eagerly, after which the registry is read-only and can
//! be shared freely (`&SchemaRegistry`, or an `Arc` across threads).
//!
//! There is no global instance. Construct one at process start and pass it
//! to whatever needs it; call [`SchemaRegistry::reload`] to pick up spec
//! changes on disk.
//!
//! ## Failure Policy
//!
//! Nothing here returns an error. Missing spec files are logged and the
//! module is absent; a missing module or key yields
//! [`ValidationOutcome::Skipped`]; a broken schema yields
//! [`ValidationOutcome::Failed`] carrying the compiler message.

use std::collections::BTreeMap;

use apicheck_core::{normalize_endpoint, HttpMethod, ValidatorConfig};
use serde_json::Value;

use crate::extract::{build_index, ModuleIndex};
use crate::outcome::ValidationOutcome;
use crate::validate::{check_guarded, SchemaValidationError};

/// Indexed schemas of every loaded module.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    config: ValidatorConfig,
    modules: BTreeMap<String, ModuleIndex>,
}

impl SchemaRegistry {
    /// Index every configured module found under `config.spec_dir`.
    pub fn load(config: ValidatorConfig) -> Self {
        let modules = index_modules(&config);
        Self { config, modules }
    }

    /// Assemble a registry from indices built elsewhere.
    pub fn from_indices(
        config: ValidatorConfig,
        indices: impl IntoIterator<Item = ModuleIndex>,
    ) -> Self {
        let modules = indices
            .into_iter()
            .map(|index| (index.module().to_string(), index))
            .collect();
        Self { config, modules }
    }

    /// Rebuild every index from disk.
    pub fn reload(&mut self) {
        self.modules = index_modules(&self.config);
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn module(&self, name: &str) -> Option<&ModuleIndex> {
        self.modules.get(name)
    }

    /// Loaded modules, by name.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleIndex> {
        self.modules.values()
    }

    /// Resolved schema stored under an exact key.
    pub fn schema(&self, module: &str, key: &str) -> Option<&Value> {
        self.modules.get(module)?.get(key)
    }

    /// Schema keys per module; only `module` when given (empty if it is not
    /// loaded).
    pub fn available_schemas(&self, module: Option<&str>) -> BTreeMap<String, Vec<String>> {
        let keys_of = |name: &str| -> Vec<String> {
            self.modules
                .get(name)
                .map(|index| index.keys().map(str::to_string).collect())
                .unwrap_or_default()
        };
        match module {
            Some(name) => BTreeMap::from([(name.to_string(), keys_of(name))]),
            None => self
                .modules
                .keys()
                .map(|name| (name.clone(), keys_of(name)))
                .collect(),
        }
    }

    /// Validate a response body.
    ///
    /// `endpoint` is the path as dispatched; the configured API prefix and
    /// any query string are removed before lookup, and concrete paths
    /// match templated spec paths (`/problems/42` → `/problems/{id}`).
    pub fn validate_response(
        &self,
        module: &str,
        method: &str,
        endpoint: &str,
        status: u16,
        body: &Value,
    ) -> ValidationOutcome {
        let Some(index) = self.modules.get(module) else {
            return module_not_loaded(module);
        };

        let path = normalize_endpoint(endpoint, &self.config.api_prefix);
        let wanted = format!("{} {path} {status}", method.to_uppercase());

        let Ok(method) = method.parse::<HttpMethod>() else {
            return skipped(format!("schema not found: {wanted} (module '{module}')"));
        };
        let Some((key, schema)) = index.response_schema(method, path, status) else {
            return skipped(format!("schema not found: {wanted} (module '{module}')"));
        };

        run_check(schema, body, &key, "schema validation failed")
    }

    /// Validate a request body against the operation's request schema.
    pub fn validate_request(
        &self,
        module: &str,
        operation_id: &str,
        body: &Value,
    ) -> ValidationOutcome {
        let Some(index) = self.modules.get(module) else {
            return module_not_loaded(module);
        };
        let Some((key, schema)) = index.request_schema(operation_id) else {
            return skipped(format!(
                "schema not found: request schema {operation_id}_request (module '{module}')"
            ));
        };

        run_check(schema, body, &key, "request schema validation failed")
    }
}

fn index_modules(config: &ValidatorConfig) -> BTreeMap<String, ModuleIndex> {
    let mut modules = BTreeMap::new();
    if !config.spec_dir.is_dir() {
        tracing::warn!(
            spec_dir = %config.spec_dir.display(),
            "specification directory not found; no schemas loaded"
        );
        return modules;
    }

    for module in &config.modules {
        let spec_path = config.spec_path(module);
        if !spec_path.is_file() {
            tracing::debug!(
                module = %module.name,
                spec = %spec_path.display(),
                "no specification file"
            );
            continue;
        }
        if let Some(index) = build_index(&module.name, &spec_path, &config.models_dir) {
            modules.insert(module.name.clone(), index);
        }
    }
    modules
}

fn module_not_loaded(module: &str) -> ValidationOutcome {
    skipped(format!(
        "schema not found: module '{module}' has no loaded specification"
    ))
}

fn skipped(message: String) -> ValidationOutcome {
    tracing::debug!(%message, "validation skipped");
    ValidationOutcome::Skipped { message }
}

fn run_check(schema: &Value, body: &Value, key: &str, headline: &str) -> ValidationOutcome {
    match check_guarded(schema, body) {
        Ok(()) => ValidationOutcome::Passed,
        Err(SchemaValidationError::ValidationFailed { violations }) => ValidationOutcome::Failed {
            message: format!("{headline} ({key}):\n{violations}"),
            violations: violations.into_vec(),
        },
        Err(e) => {
            tracing::warn!(key, error = %e, "schema could not be applied");
            ValidationOutcome::Failed {
                message: format!("validation error ({key}): {e}"),
                violations: Vec::new(),
            }
        }
    }
}
