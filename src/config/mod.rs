use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_yml::Value;
use thiserror::Error;

use crate::diagnostic::Severity;

pub const CONFIG_FILE_NAME: &str = ".nodesel.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rule `{rule}`: {message}")]
    InvalidRule { rule: String, message: String },
    #[error("`{key}` must be {expected}")]
    InvalidKey { key: String, expected: &'static str },
}

/// One entry under `Rules:`.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    pub selectors: Vec<String>,
    pub message: Option<String>,
    pub severity: Option<Severity>,
    pub enabled: bool,
    pub exclude: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            selectors: Vec::new(),
            message: None,
            severity: None,
            enabled: true,
            exclude: Vec::new(),
        }
    }
}

/// Resolved configuration from `.nodesel.yml`.
#[derive(Debug, Default)]
pub struct ResolvedConfig {
    config_path: Option<PathBuf>,
    /// Rules in file order.
    rules: Vec<(String, RuleConfig)>,
    global_excludes: Vec<String>,
}

/// Load config from the given path, or look for `.nodesel.yml` in
/// `target_dir` and then the current directory. A missing file is an empty
/// config.
pub fn load_config(path: Option<&Path>, target_dir: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => target_dir
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .filter(|candidate| candidate.exists())
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "no config file found");
        return Ok(ResolvedConfig::default());
    }

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let mut config = parse_config(&contents)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    tracing::debug!(
        path = %config_path.display(),
        rules = config.rules.len(),
        excludes = config.global_excludes.len(),
        "loaded config"
    );
    config.config_path = Some(config_path);
    Ok(config)
}

/// Parse config text. Unknown top-level keys are ignored.
pub fn parse_config(contents: &str) -> Result<ResolvedConfig> {
    let raw: Value = serde_yml::from_str(contents).context("invalid YAML")?;
    let mut config = ResolvedConfig::default();

    let map = match &raw {
        Value::Mapping(map) => map,
        Value::Null => return Ok(config),
        _ => {
            return Err(ConfigError::InvalidKey {
                key: "<root>".to_string(),
                expected: "a mapping",
            }
            .into());
        }
    };

    for (key, value) in map {
        match key.as_str() {
            Some("AllFiles") => {
                if let Some(excludes) = extract_string_list(value, "Exclude") {
                    config.global_excludes = excludes;
                }
            }
            Some("Rules") => {
                let Some(rules) = value.as_mapping() else {
                    if value.is_null() {
                        continue;
                    }
                    return Err(ConfigError::InvalidKey {
                        key: "Rules".to_string(),
                        expected: "a mapping of rule names",
                    }
                    .into());
                };
                for (name, rule) in rules {
                    let Some(name) = name.as_str() else {
                        continue;
                    };
                    config
                        .rules
                        .push((name.to_string(), parse_rule_config(name, rule)?));
                }
            }
            _ => {}
        }
    }

    Ok(config)
}

impl ResolvedConfig {
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_path.as_deref().and_then(Path::parent)
    }

    pub fn rules(&self) -> &[(String, RuleConfig)] {
        &self.rules
    }

    /// Global exclude patterns from AllFiles.Exclude.
    pub fn global_excludes(&self) -> &[String] {
        &self.global_excludes
    }
}

fn invalid(rule: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidRule {
        rule: rule.to_string(),
        message: message.into(),
    }
}

fn parse_rule_config(name: &str, value: &Value) -> Result<RuleConfig, ConfigError> {
    let map = value
        .as_mapping()
        .ok_or_else(|| invalid(name, "expected a mapping"))?;
    let mut config = RuleConfig::default();

    for (k, v) in map {
        let Some(key) = k.as_str() else {
            continue;
        };
        match key {
            "Selector" | "Selectors" => {
                config.selectors = match v {
                    Value::String(s) => vec![s.clone()],
                    other => value_to_string_list(other)
                        .ok_or_else(|| invalid(name, "Selector must be a string or a list"))?,
                };
            }
            "Message" => {
                config.message = Some(
                    v.as_str()
                        .ok_or_else(|| invalid(name, "Message must be a string"))?
                        .to_string(),
                );
            }
            "Severity" => {
                let s = v
                    .as_str()
                    .ok_or_else(|| invalid(name, "Severity must be a string"))?;
                config.severity = Some(Severity::from_str(s).ok_or_else(|| {
                    invalid(
                        name,
                        format!("unknown severity `{s}` (expected info, warning, error or fatal)"),
                    )
                })?);
            }
            "Enabled" => {
                config.enabled = v
                    .as_bool()
                    .ok_or_else(|| invalid(name, "Enabled must be true or false"))?;
            }
            "Exclude" => {
                config.exclude = value_to_string_list(v)
                    .ok_or_else(|| invalid(name, "Exclude must be a list"))?;
            }
            other => {
                tracing::warn!(rule = name, key = other, "ignoring unknown rule key");
            }
        }
    }

    if config.selectors.is_empty() {
        return Err(invalid(name, "missing Selector"));
    }
    Ok(config)
}

fn extract_string_list(value: &Value, key: &str) -> Option<Vec<String>> {
    value
        .as_mapping()?
        .get(&Value::String(key.to_string()))
        .and_then(value_to_string_list)
}

fn value_to_string_list(value: &Value) -> Option<Vec<String>> {
    value.as_sequence().map(|seq| {
        seq.iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    })
}
