//! Pending tool invocation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A pending tool invocation: tool name plus ordered arguments.
///
/// Immutable once built. Hook overrides produce a new value through
/// [`ToolCall::with_args`], so callers never observe a partially rewritten call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    name: String,
    args: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Build a call from a JSON value; `args` must be an object (or null for no args)
    pub fn from_value(name: impl Into<String>, args: Value) -> Result<Self> {
        let name = name.into();
        match args {
            Value::Object(map) => Ok(Self::new(name, map)),
            Value::Null => Ok(Self::new(name, Map::new())),
            other => anyhow::bail!(
                "Arguments for tool '{}' must be a JSON object, got {}",
                name,
                other
            ),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &Map<String, Value> {
        &self.args
    }

    /// Same tool, arguments replaced wholesale
    pub fn with_args(&self, args: Map<String, Value>) -> Self {
        Self {
            name: self.name.clone(),
            args,
        }
    }
}
