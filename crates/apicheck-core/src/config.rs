//! Validator configuration.
//!
//! Says where specification files live, which modules to load, and which
//! API prefix the test client puts in front of every endpoint. Defaults
//! match the repository layout (`docs/openapi/<module>.yaml` with shared
//! schemas under `docs/openapi/models/`). Override via a config file,
//! environment variables, or explicit construction in tests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::document::read_document;
use crate::error::ConfigError;

/// Environment variable overriding [`ValidatorConfig::spec_dir`].
pub const ENV_SPEC_DIR: &str = "APICHECK_SPEC_DIR";
/// Environment variable overriding [`ValidatorConfig::api_prefix`].
pub const ENV_API_PREFIX: &str = "APICHECK_API_PREFIX";
/// Environment variable overriding [`ValidatorConfig::modules`], as
/// comma-separated `name=file` pairs.
pub const ENV_MODULES: &str = "APICHECK_MODULES";

/// A module name and the specification file that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    /// File name relative to [`ValidatorConfig::spec_dir`].
    pub file: String,
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }

    /// Parse a `name=file` pair.
    fn parse(entry: &str, source_name: &str) -> Result<Self, ConfigError> {
        match entry.split_once('=') {
            Some((name, file)) if !name.trim().is_empty() && !file.trim().is_empty() => {
                Ok(Self::new(name.trim(), file.trim()))
            }
            _ => Err(ConfigError::ModuleEntry {
                entry: entry.to_string(),
                source_name: source_name.to_string(),
            }),
        }
    }
}

/// Where to find specification files and how to map endpoints onto them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Directory containing one specification file per module.
    pub spec_dir: PathBuf,
    /// Prefix stripped from dispatched endpoints before lookup.
    pub api_prefix: String,
    /// Name of the shared-model directory next to each spec file.
    pub models_dir: String,
    /// Modules to load, in load order.
    pub modules: Vec<ModuleSpec>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            spec_dir: PathBuf::from("docs/openapi"),
            api_prefix: "/api/v1".to_string(),
            models_dir: "models".to_string(),
            modules: default_modules(),
        }
    }
}

/// The modules of the judge backend API.
pub fn default_modules() -> Vec<ModuleSpec> {
    ["user", "problem", "submission", "forum", "news"]
        .into_iter()
        .map(|name| ModuleSpec::new(name, format!("{name}.yaml")))
        .collect()
}

impl ValidatorConfig {
    /// Defaults pointing at `spec_dir`.
    pub fn with_spec_dir(spec_dir: impl Into<PathBuf>) -> Self {
        Self {
            spec_dir: spec_dir.into(),
            ..Self::default()
        }
    }

    /// Load a YAML or JSON config file. Missing fields take their defaults.
    ///
    /// A relative `spec_dir` is taken relative to the config file's
    /// directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let value = read_document(path)?;
        let mut config: Self =
            serde_json::from_value(value).map_err(|e| ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if config.spec_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.spec_dir = parent.join(&config.spec_dir);
            }
        }
        Ok(config)
    }

    /// Override fields from the `APICHECK_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Override fields from `APICHECK_*` values looked up through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply_overrides(
            lookup(ENV_SPEC_DIR).as_deref(),
            lookup(ENV_API_PREFIX).as_deref(),
            lookup(ENV_MODULES).as_deref(),
        )
    }

    fn apply_overrides(
        &mut self,
        spec_dir: Option<&str>,
        api_prefix: Option<&str>,
        modules: Option<&str>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = spec_dir.filter(|s| !s.is_empty()) {
            self.spec_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = api_prefix {
            self.api_prefix = prefix.to_string();
        }
        if let Some(list) = modules.filter(|s| !s.trim().is_empty()) {
            self.modules = parse_module_list(list, ENV_MODULES)?;
        }
        Ok(())
    }

    /// Absolute-or-relative path of a module's specification file.
    pub fn spec_path(&self, module: &ModuleSpec) -> PathBuf {
        self.spec_dir.join(&module.file)
    }

    /// Look up a configured module by name.
    pub fn module(&self, name: &str) -> Option<&ModuleSpec> {
        self.modules.iter().find(|m| m.name == name)
    }
}

/// Parse `user=user.yaml,problem=problem.yaml`.
pub fn parse_module_list(list: &str, source_name: &str) -> Result<Vec<ModuleSpec>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| ModuleSpec::parse(entry, source_name))
        .collect()
}
