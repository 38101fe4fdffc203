//! Checker configuration
//!
//! Reads configuration from:
//! - `.pyguiderc.yaml` / `.pyguiderc.json` (project-level)
//! - `~/.pyguiderc.yaml` (user-level)
//!
//! Every field has a default matching the checker's original tuning, so a
//! partial file only overrides what it names.

use crate::diagnostic::Severity;
use crate::rule::RuleCode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {which} pattern '{pattern}': {source}")]
    Pattern {
        which: &'static str,
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tunable parameters for all rules, built once per analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Module prefixes exempt from the import-modules-only check
    pub ignored_import_modules: Vec<String>,

    /// Number of AST nodes permitted in a try block
    pub max_try_nodes: usize,

    /// Number of AST nodes permitted in an except block
    pub max_except_nodes: usize,

    /// Number of AST nodes permitted in a finally block
    pub max_finally_nodes: usize,

    /// Naming convention for classes and type aliases (match from start)
    pub class_name_pattern: String,

    /// Naming convention for module-level constants (match from start)
    pub const_name_pattern: String,

    /// Severity overrides (rule id -> severity)
    pub severity: HashMap<String, Severity>,

    /// Disabled rules, by id or legacy id
    pub disabled: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            ignored_import_modules: vec!["__future__".to_string()],
            max_try_nodes: 25,
            max_except_nodes: 23,
            max_finally_nodes: 13,
            class_name_pattern: "[A-Z_][a-zA-Z0-9]+$".to_string(),
            const_name_pattern: "(([A-Z_][A-Z0-9_]*)|(__.*__))$".to_string(),
            severity: HashMap::new(),
            disabled: Vec::new(),
        }
    }
}

impl RuleConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file, dispatching on its extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext {
            "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
            "json" => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::Invalid(format!(
                "Unknown config file format: {}",
                ext
            ))),
        }
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_names = [
            ".pyguiderc.yaml",
            ".pyguiderc.yml",
            ".pyguiderc.json",
            "pyguide.yaml",
            "pyguide.yml",
            "pyguide.json",
        ];

        // Check current directory
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            for name in &config_names {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }

        // Return default config
        Ok(Self::default())
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, code: RuleCode) -> bool {
        !self
            .disabled
            .iter()
            .any(|d| d == code.id() || d == code.legacy_id())
    }

    /// Get severity override for a rule
    pub fn severity_override(&self, code: RuleCode) -> Option<Severity> {
        self.severity
            .get(code.id())
            .or_else(|| self.severity.get(code.legacy_id()))
            .copied()
    }

    /// Whether `module` falls under an ignored import prefix
    pub fn ignores_module(&self, module: &str) -> bool {
        self.ignored_import_modules
            .iter()
            .any(|prefix| module.starts_with(prefix.as_str()))
    }
}

/// Naming patterns compiled once per pass
#[derive(Debug, Clone)]
pub struct NamePatterns {
    class: Regex,
    constant: Regex,
    dunder: Regex,
}

impl NamePatterns {
    /// Compile the configured class/constant patterns
    pub fn compile(config: &RuleConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            class: anchored("class name", &config.class_name_pattern)?,
            constant: anchored("constant name", &config.const_name_pattern)?,
            dunder: anchored("dunder name", "__[a-z]+__$")?,
        })
    }

    /// Whether a module-level assignment to `name` is allowed
    ///
    /// Type aliases, constants and dunder names pass; everything else is a
    /// global variable.
    pub fn allows_global(&self, name: &str) -> bool {
        self.class.is_match(name) || self.constant.is_match(name) || self.dunder.is_match(name)
    }
}

/// Host patterns anchor at the start of the name, not anywhere within it
fn anchored(which: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(&format!("^(?:{})", pattern)).map_err(|source| ConfigError::Pattern {
        which,
        pattern: pattern.to_string(),
        source,
    })
}
