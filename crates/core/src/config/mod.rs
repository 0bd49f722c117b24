use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::env::HOOKWARDEN_CONFIG;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hook groups keyed by event name (e.g. "BeforeTool", "AfterTool").
    /// Group order and in-group hook order are the invocation order.
    #[serde(default)]
    pub hooks: BTreeMap<String, Vec<HookGroupConfig>>,

    #[serde(default)]
    pub hook_runtime: HookRuntimeConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookGroupConfig {
    /// Tool name pattern: exact name, glob, or `|`-separated alternatives.
    /// Empty or "*" matches every tool.
    #[serde(default)]
    pub matcher: String,

    #[serde(default)]
    pub hooks: Vec<HookConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Hook kind. Only "command" is supported.
    #[serde(rename = "type", default = "default_hook_type")]
    pub kind: String,

    /// Shell command line to execute
    pub command: String,

    /// Timeout in milliseconds (falls back to hook_runtime.default_timeout_ms)
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Display name used in logs and telemetry (defaults to the command)
    #[serde(default)]
    pub name: Option<String>,

    /// Extra environment variables for this hook. `$VAR` / `${VAR}` values are
    /// expanded from the engine environment at load time.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookRuntimeConfig {
    /// Master switch. When false, every hook stage passes calls through unchanged.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Timeout for hooks that do not set one (default: 60000)
    #[serde(default = "default_hook_timeout")]
    pub default_timeout_ms: u64,

    /// Engine environment variables copied into hook processes.
    /// Nothing else is inherited.
    #[serde(default = "default_env_passthrough")]
    pub env_passthrough: Vec<String>,

    /// Hook names that are loaded but never invoked
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Working directory for hook processes, exported as HOOKWARDEN_PROJECT_DIR
    #[serde(default)]
    pub project_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Append one JSON line per hook invocation to this file
    #[serde(default)]
    pub log_file: Option<String>,

    /// Emit each hook_call record as a structured tracing event
    #[serde(default = "default_true")]
    pub tracing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// On-disk configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    /// JSON and JSON5 (JSON5 is a superset, so plain settings.json files parse)
    Json5,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") | Some("json5") => ConfigFormat::Json5,
            _ => ConfigFormat::Toml,
        }
    }
}

// Default value functions
fn default_hook_type() -> String {
    "command".to_string()
}
fn default_true() -> bool {
    true
}
fn default_hook_timeout() -> u64 {
    60_000 // 60 seconds
}
fn default_env_passthrough() -> Vec<String> {
    vec!["PATH".to_string(), "HOME".to_string()]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for HookRuntimeConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            default_timeout_ms: default_hook_timeout(),
            env_passthrough: default_env_passthrough(),
            disabled: Vec::new(),
            project_dir: None,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            tracing: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from `explicit` if given, else from
    /// `$HOOKWARDEN_CONFIG`, else from the platform config directory. A missing default file yields an empty
    /// configuration (no hooks); a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        if let Some(path) = std::env::var_os(HOOKWARDEN_CONFIG) {
            return Self::load_from_path(Path::new(&path));
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content, ConfigFormat::from_path(path))
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let mut config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Json5 => json5::from_str(content)?,
        };
        config.expand_env_vars();
        Ok(config)
    }

    /// `config.toml` under the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "Hookwarden", "hookwarden")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Hook groups configured for `event_name`, in configuration order
    pub fn hook_groups(&self, event_name: &str) -> &[HookGroupConfig] {
        self.hooks.get(event_name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn expand_env_vars(&mut self) {
        for groups in self.hooks.values_mut() {
            for group in groups.iter_mut() {
                for hook in group.hooks.iter_mut() {
                    for value in hook.env.values_mut() {
                        *value = expand_env(value);
                    }
                }
            }
        }
        if let Some(ref mut log_file) = self.telemetry.log_file {
            *log_file = shellexpand::tilde(log_file).to_string();
        }
        if let Some(ref mut dir) = self.hook_runtime.project_dir {
            *dir = shellexpand::tilde(dir).to_string();
        }
    }
}

fn expand_env(s: &str) -> String {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).unwrap_or_else(|_| s.to_string())
    } else if let Some(var_name) = s.strip_prefix('$') {
        std::env::var(var_name).unwrap_or_else(|_| s.to_string())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_json_settings_shape() {
        let content = r#"{
            "hooks": {
                "BeforeTool": [
                    {
                        "matcher": "write_file",
                        "hooks": [
                            { "type": "command", "command": "/tmp/hook.sh", "timeout": 5000 }
                        ]
                    }
                ]
            }
        }"#;

        let config = Config::parse(content, ConfigFormat::Json5).unwrap();
        let groups = config.hook_groups("BeforeTool");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].matcher, "write_file");
        assert_eq!(groups[0].hooks[0].kind, "command");
        assert_eq!(groups[0].hooks[0].command, "/tmp/hook.sh");
        assert_eq!(groups[0].hooks[0].timeout, Some(5000));
        assert!(groups[0].hooks[0].enabled);
        assert!(config.hook_groups("AfterTool").is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
[hook_runtime]
default_timeout_ms = 1000
disabled = ["noisy"]

[[hooks.AfterTool]]
matcher = "*"

[[hooks.AfterTool.hooks]]
command = "audit"
name = "noisy"

[logging]
level = "debug"
"#;

        let config = Config::parse(content, ConfigFormat::Toml).unwrap();
        let hook = &config.hook_groups("AfterTool")[0].hooks[0];
        assert_eq!(hook.kind, "command"); // default
        assert_eq!(hook.timeout, None);
        assert_eq!(hook.name.as_deref(), Some("noisy"));
        assert_eq!(config.hook_runtime.default_timeout_ms, 1000);
        assert_eq!(config.hook_runtime.disabled, vec!["noisy".to_string()]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.hooks.is_empty());
        assert!(config.hook_runtime.enabled);
        assert_eq!(config.hook_runtime.default_timeout_ms, 60_000);
        assert_eq!(config.hook_runtime.env_passthrough, vec!["PATH", "HOME"]);
        assert!(config.telemetry.tracing);
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("settings.json")),
            ConfigFormat::Json5
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.toml")),
            ConfigFormat::Toml
        );
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{ "telemetry": { "log_file": "~/hooks.jsonl" } }"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        let log_file = config.telemetry.log_file.unwrap();
        assert!(!log_file.starts_with('~'));
        assert!(log_file.ends_with("hooks.jsonl"));
    }

    #[test]
    fn test_expand_env() {
        assert_eq!(expand_env("plain"), "plain");
        assert_eq!(
            expand_env("$HOOKWARDEN_TEST_SURELY_UNSET"),
            "$HOOKWARDEN_TEST_SURELY_UNSET"
        );
    }
}
