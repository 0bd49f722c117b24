//! Hook event types and the JSON payload piped to hook processes

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::tool_call::ToolCall;

/// Pipeline junctures at which hooks fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    /// Fired before a tool executes. Hooks may deny or rewrite the call.
    BeforeTool,
    /// Fired after a tool completes; the payload carries the tool output.
    AfterTool,
}

impl HookEvent {
    pub const ALL: [HookEvent; 2] = [HookEvent::BeforeTool, HookEvent::AfterTool];

    /// Get the event name as used in configuration and hook payloads
    pub fn event_name(&self) -> &'static str {
        match self {
            HookEvent::BeforeTool => "BeforeTool",
            HookEvent::AfterTool => "AfterTool",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.event_name() == name)
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

impl FromStr for HookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown hook event: {}", s))
    }
}

/// Payload written to a hook's stdin.
///
/// Built fresh for every invocation from the current tool call, so a hook
/// sees the overrides of every hook that ran before it.
#[derive(Debug, Clone, Serialize)]
pub struct HookInput {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: HookEvent,
    pub tool_name: String,
    pub tool_input: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// RFC 3339 creation time
    pub timestamp: String,
}

impl HookInput {
    pub fn new(event: HookEvent, call: &ToolCall, tool_output: Option<&Value>) -> Self {
        Self {
            hook_event_name: event,
            tool_name: call.name().to_string(),
            tool_input: call.args().clone(),
            tool_output: tool_output.cloned(),
            cwd: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn with_cwd(mut self, cwd: Option<String>) -> Self {
        self.cwd = cwd;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_call() -> ToolCall {
        ToolCall::from_value("write_file", json!({"file_path": "a.txt", "content": "hi"})).unwrap()
    }

    #[test]
    fn test_event_name_round_trip() {
        for event in HookEvent::ALL {
            assert_eq!(HookEvent::from_name(event.event_name()), Some(event));
        }
        assert_eq!(HookEvent::from_name("before_tool"), None);
        assert!("Nope".parse::<HookEvent>().is_err());
        assert_eq!("AfterTool".parse::<HookEvent>(), Ok(HookEvent::AfterTool));
    }

    #[test]
    fn test_before_tool_payload() {
        let input = HookInput::new(HookEvent::BeforeTool, &write_call(), None);
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(value["hookEventName"], "BeforeTool");
        assert_eq!(value["tool_name"], "write_file");
        assert_eq!(value["tool_input"]["file_path"], "a.txt");
        assert!(value.get("tool_output").is_none());
        assert!(value.get("cwd").is_none());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_after_tool_payload_carries_output() {
        let output = json!({"written": 2});
        let input = HookInput::new(HookEvent::AfterTool, &write_call(), Some(&output))
            .with_cwd(Some("/work".to_string()));
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(value["hookEventName"], "AfterTool");
        assert_eq!(value["tool_output"]["written"], 2);
        assert_eq!(value["cwd"], "/work");
    }
}
