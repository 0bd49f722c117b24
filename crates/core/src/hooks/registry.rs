//! Hook descriptors and the read-only registry built from configuration

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use super::event::HookEvent;
use super::matcher::CompiledMatcher;
use crate::config::{Config, HookConfig};

/// A single command hook
#[derive(Debug, Clone, PartialEq)]
pub struct HookDescriptor {
    /// Name used in logs and telemetry (defaults to the command)
    pub name: String,

    /// Shell command line to execute
    pub command: String,

    pub timeout: Duration,

    /// Extra environment for the hook process
    pub env: BTreeMap<String, String>,

    pub enabled: bool,
}

impl HookDescriptor {
    pub fn new(command: impl Into<String>, timeout_ms: u64) -> Self {
        let command = command.into();
        Self {
            name: command.clone(),
            command,
            timeout: Duration::from_millis(timeout_ms),
            env: BTreeMap::new(),
            enabled: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    fn from_config(hook: &HookConfig, default_timeout_ms: u64) -> Result<Self> {
        if hook.command.trim().is_empty() {
            anyhow::bail!("Hook command must not be empty");
        }
        let timeout_ms = hook.timeout.unwrap_or(default_timeout_ms);
        let command = shellexpand::tilde(&hook.command).to_string();
        if timeout_ms == 0 {
            anyhow::bail!("Hook '{}' has a zero timeout", command);
        }

        Ok(Self {
            name: hook.name.clone().unwrap_or_else(|| command.clone()),
            command,
            timeout: Duration::from_millis(timeout_ms),
            env: hook.env.clone(),
            enabled: hook.enabled,
        })
    }
}

/// Hooks sharing one matcher, in registration order
#[derive(Debug, Clone)]
pub struct HookGroup {
    pub matcher: CompiledMatcher,
    pub hooks: Vec<HookDescriptor>,
}

/// One configured hook, for listing
#[derive(Debug, Clone, Serialize)]
pub struct HookSummary {
    pub event: String,
    pub matcher: String,
    pub matcher_valid: bool,
    pub name: String,
    pub command: String,
    pub timeout_ms: u64,
    pub active: bool,
}

/// Hook groups per event, compiled once and read-only afterwards.
///
/// Safe to share across concurrent hook stages without locking.
#[derive(Debug, Clone)]
pub struct HookRegistry {
    groups: HashMap<HookEvent, Vec<HookGroup>>,
    disabled: HashSet<String>,
    enabled: bool,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl HookRegistry {
    /// Create an empty registry with no hooks
    pub fn empty() -> Self {
        Self {
            groups: HashMap::new(),
            disabled: HashSet::new(),
            enabled: true,
        }
    }

    /// Build the registry from configuration.
    ///
    /// Unknown events and non-command hooks are skipped with a warning.
    /// Invalid matchers are logged here and never match afterwards.
    pub fn from_config(config: &Config) -> Result<Self> {
        let runtime = &config.hook_runtime;
        if runtime.default_timeout_ms == 0 {
            anyhow::bail!("hook_runtime.default_timeout_ms must be greater than zero");
        }

        let mut registry = Self {
            groups: HashMap::new(),
            disabled: runtime.disabled.iter().cloned().collect(),
            enabled: runtime.enabled,
        };

        for (event_name, groups) in &config.hooks {
            let Some(event) = HookEvent::from_name(event_name) else {
                warn!("Skipping hooks for unknown event '{}'", event_name);
                continue;
            };

            for group in groups {
                let mut hooks = Vec::with_capacity(group.hooks.len());
                for hook in &group.hooks {
                    if hook.kind != "command" {
                        warn!(
                            "Skipping {} hook '{}' with unsupported type '{}'",
                            event, hook.command, hook.kind
                        );
                        continue;
                    }
                    let descriptor =
                        HookDescriptor::from_config(hook, runtime.default_timeout_ms).map_err(
                            |e| anyhow::anyhow!("Invalid {} hook configuration: {}", event, e),
                        )?;
                    hooks.push(descriptor);
                }

                registry.groups.entry(event).or_default().push(HookGroup {
                    matcher: CompiledMatcher::compile_or_never(&group.matcher),
                    hooks,
                });
            }
        }

        debug!("Loaded {} hook(s)", registry.hook_count());
        Ok(registry)
    }

    /// Append a group for `event` (programmatic registration)
    pub fn with_group(mut self, event: HookEvent, matcher: &str, hooks: Vec<HookDescriptor>) -> Self {
        self.groups.entry(event).or_default().push(HookGroup {
            matcher: CompiledMatcher::compile_or_never(matcher),
            hooks,
        });
        self
    }

    /// Get the number of registered hooks
    pub fn hook_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|groups| groups.iter())
            .map(|g| g.hooks.len())
            .sum()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_active(&self, hook: &HookDescriptor) -> bool {
        hook.enabled && !self.disabled.contains(&hook.name)
    }

    /// Hooks to run for `tool_name` at `event`: every group whose matcher
    /// matches, in group order then in-group order, minus disabled hooks.
    pub fn matching(&self, event: HookEvent, tool_name: &str) -> Vec<&HookDescriptor> {
        self.groups
            .get(&event)
            .map(|groups| {
                groups
                    .iter()
                    .filter(|g| g.matcher.matches(tool_name))
                    .flat_map(|g| g.hooks.iter())
                    .filter(|h| self.is_active(h))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every configured hook, in event then registration order
    pub fn describe(&self) -> Vec<HookSummary> {
        let mut summaries = Vec::new();
        for event in HookEvent::ALL {
            let Some(groups) = self.groups.get(&event) else {
                continue;
            };
            for group in groups {
                for hook in &group.hooks {
                    summaries.push(HookSummary {
                        event: event.event_name().to_string(),
                        matcher: group.matcher.pattern().to_string(),
                        matcher_valid: group.matcher.is_valid(),
                        name: hook.name.clone(),
                        command: hook.command.clone(),
                        timeout_ms: hook.timeout_ms(),
                        active: self.enabled && self.is_active(hook),
                    });
                }
            }
        }
        summaries
    }
}
