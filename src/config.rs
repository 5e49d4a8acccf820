//! # Rule Configuration
//!
//! @title Scanner Configuration
//! @author Ramprasad
//!
//! Loads `sentinel.json`, the per-project rule configuration.
//!
//! ```json
//! {
//!   "rules": {
//!     "CA3075": { "enabled": true },
//!     "CA3077": { "severity": "high" }
//!   },
//!   "target_framework": "net48",
//!   "skip_types": ["MyApp.Generated.*"]
//! }
//! ```
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (`--target-framework`, `--skip-types`)
//! 2. The configuration file
//! 3. Compiled defaults of each detector

use crate::analysis::context::AnalysisOptions;
use crate::detectors::DetectorRegistry;
use crate::report::Severity;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "sentinel.json";

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid skip_types pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Enablement and severity override for one rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Top-level scanner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Overrides keyed by rule id (case-insensitive).
    pub rules: BTreeMap<String, RuleOverride>,

    /// Moniker used instead of the one each compilation declares.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_framework: Option<String>,

    /// Glob patterns over fully qualified type names excluded from analysis.
    pub skip_types: Vec<String>,
}

/// CLI flags that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub target_framework: Option<String>,
    pub skip_types: Vec<String>,
}

impl SentinelConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&path.display().to_string(), &content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `path` when given, else `sentinel.json` in the working directory
    /// if present, else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parses a configuration document.
    pub fn from_json(origin: &str, json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks patterns and warns about rule ids no detector owns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.skip_patterns()?;

        let registry = DetectorRegistry::new();
        for id in self.rules.keys() {
            if registry.get_detector(id).is_none() {
                log::warn!("Configuration names unknown rule `{}`", id);
            }
        }
        Ok(())
    }

    /// Applies CLI flags on top of the file.
    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(ref framework) = cli.target_framework {
            self.target_framework = Some(framework.clone());
        }
        self.skip_types.extend(cli.skip_types.iter().cloned());
    }

    /// Compiles `skip_types`.
    pub fn skip_patterns(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.skip_types
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Engine options derived from the configuration.
    pub fn analysis_options(&self) -> Result<AnalysisOptions, ConfigError> {
        Ok(AnalysisOptions {
            target_framework: self.target_framework.clone(),
            skip_types: self.skip_patterns()?,
            ..Default::default()
        })
    }

    /// A configuration spelling out every rule's defaults, as written by
    /// `init`.
    pub fn default_for(registry: &DetectorRegistry) -> Self {
        let rules = registry
            .detectors()
            .iter()
            .map(|d| {
                (
                    d.id().to_string(),
                    RuleOverride {
                        enabled: Some(d.enabled_by_default()),
                        severity: Some(d.severity()),
                    },
                )
            })
            .collect();

        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
