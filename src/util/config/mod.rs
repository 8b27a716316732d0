//! yxir configuration system
//!
//! Project-level configuration with default-filling semantics.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Environment variables (YXIR_DCE_TRACE)
//! 3. Project-level (yxir.toml)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use yxir::util::config::load_project_config;
//!
//! let config = load_project_config(std::path::Path::new("yxir.toml")).unwrap();
//! assert!(config.dce.enabled);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable forcing the reachability trace on
pub const TRACE_ENV: &str = "YXIR_DCE_TRACE";

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "yxir.toml";

/// Backend whose reachability rules drive DCE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Js,
    Wasm,
    Native,
}

impl fmt::Display for Backend {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Backend::Js => write!(f, "js"),
            Backend::Wasm => write!(f, "wasm"),
            Backend::Native => write!(f, "native"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "js" => Ok(Backend::Js),
            "wasm" => Ok(Backend::Wasm),
            "native" => Ok(Backend::Native),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Dead-code elimination settings (`[dce]` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DceConfig {
    /// Run DCE at all
    pub enabled: bool,
    /// Reachability rules
    pub backend: Backend,
    /// Print the `"from" -> "to" // comment` trace to stdout
    pub print_reachability_info: bool,
    /// Only keep associated objects when `getAssociatedObject` is reachable
    pub remove_unused_associated_objects: bool,
    /// Top-level function kept as the program entry
    pub entry_point: String,
    /// Package prefix of runtime support declarations
    pub runtime_package_prefix: String,
    /// Fully-qualified names kept unconditionally
    pub extra_roots: Vec<String>,
    /// Regexes over fully-qualified names kept unconditionally
    pub keep_patterns: Vec<String>,
    /// Keep unused constructors of retained classes as empty stubs (JS)
    pub keep_unused_constructor_stubs: bool,
    /// Print statistics after the pass
    pub print_stats: bool,
}

impl Default for DceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: Backend::Js,
            print_reachability_info: false,
            remove_unused_associated_objects: true,
            entry_point: "main".to_string(),
            runtime_package_prefix: "runtime".to_string(),
            extra_roots: Vec::new(),
            keep_patterns: Vec::new(),
            keep_unused_constructor_stubs: true,
            print_stats: false,
        }
    }
}

impl DceConfig {
    /// Development preset: trace and statistics on, associated objects kept
    pub fn development() -> Self {
        Self {
            print_reachability_info: true,
            remove_unused_associated_objects: false,
            print_stats: true,
            ..Self::default()
        }
    }

    /// Release preset: stricter, quiet
    pub fn release() -> Self {
        Self {
            print_reachability_info: false,
            remove_unused_associated_objects: true,
            keep_unused_constructor_stubs: false,
            print_stats: false,
            ..Self::default()
        }
    }

    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(TRACE_ENV) {
            if trace_flag_enabled(&value) {
                self.print_reachability_info = true;
            }
        }
        self
    }
}

fn trace_flag_enabled(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes" | "on")
}

/// Project-level configuration (`yxir.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// DCE settings
    #[serde(default)]
    pub dce: DceConfig,
}

/// Parse project configuration from TOML text
pub fn parse_project_config(content: &str) -> Result<ProjectConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::ParseError)
}

/// Load project-level configuration
/// Returns default config if file doesn't exist
pub fn load_project_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;

    parse_project_config(&content)
}

/// Save project-level configuration
pub fn save_project_config(
    path: &Path,
    config: &ProjectConfig,
) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(ConfigError::IoError)?;
        }
    }

    let content = toml::to_string_pretty(config).map_err(ConfigError::SerializeError)?;
    fs::write(path, content).map_err(ConfigError::IoError)?;

    Ok(())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Config parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Config serialize error: {0}")]
    SerializeError(toml::ser::Error),
    #[error("Unknown backend `{0}` (expected js, wasm or native)")]
    UnknownBackend(String),
}

#[cfg(test)]
mod tests;
