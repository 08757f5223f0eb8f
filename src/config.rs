//! Configuration for the rule engine.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DciError, Result};

/// Rule engine configuration, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Pattern a field name must match to be treated as a Role.
    #[serde(default = "default_role_format")]
    pub role_format: String,
    /// Pattern splitting a method name into (role, method) capture groups.
    #[serde(default = "default_role_method_format")]
    pub role_method_format: String,
    /// Dump the outgoing RoleMethod calls of this method.
    #[serde(default)]
    pub list_calls_in_role_method: Option<String>,
    /// Dump every call site to this RoleMethod, plus a final count.
    #[serde(default)]
    pub list_calls_to_role_method: Option<String>,
    /// Aggregate the contract calls observed per Role.
    #[serde(default)]
    pub list_role_interfaces: bool,
    /// Directory for exported visualization documents. None disables export.
    #[serde(default)]
    pub vis_data_dir: Option<PathBuf>,
}

fn default_role_format() -> String {
    "^[a-zA-Z0-9]+$".to_string()
}

fn default_role_method_format() -> String {
    "^([a-zA-Z0-9]+)_+([a-zA-Z0-9]+)$".to_string()
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            role_format: default_role_format(),
            role_method_format: default_role_method_format(),
            list_calls_in_role_method: None,
            list_calls_to_role_method: None,
            list_role_interfaces: false,
            vis_data_dir: None,
        }
    }
}

impl RuleConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }
}

/// Compiled naming conventions — the pluggable strategy behind Role and
/// RoleMethod recognition.
#[derive(Debug, Clone)]
pub struct Conventions {
    role: Regex,
    role_method: Regex,
}

impl Conventions {
    /// Compile the configured patterns. The role-method pattern must carry
    /// exactly two capture groups: role name and local method name.
    pub fn from_config(config: &RuleConfig) -> Result<Self> {
        let role = Regex::new(&config.role_format)?;
        let role_method = Regex::new(&config.role_method_format)?;

        if role_method.captures_len() != 3 {
            return Err(DciError::Config(format!(
                "role_method_format must have two capture groups (role, method): {}",
                config.role_method_format
            )));
        }

        Ok(Self { role, role_method })
    }

    /// Check whether a field name qualifies as a Role name.
    pub fn is_role_name(&self, name: &str) -> bool {
        self.role.is_match(name)
    }

    /// Split a method name into (role, local method) if it follows the
    /// RoleMethod convention.
    pub fn split_role_method(&self, name: &str) -> Option<(String, String)> {
        self.role_method.captures(name).map(|caps| {
            (
                caps.get(1).map_or("", |m| m.as_str()).to_string(),
                caps.get(2).map_or("", |m| m.as_str()).to_string(),
            )
        })
    }
}

impl Default for Conventions {
    fn default() -> Self {
        // The default patterns are statically valid.
        Self::from_config(&RuleConfig::default()).expect("default conventions compile")
    }
}
