//! Parsing of hook stdout into a typed decision
//!
//! Hook output is loosely shaped JSON. It is parsed once here into
//! [`Decision`]; nothing downstream looks at raw maps.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::event::HookEvent;

/// A hook's verdict
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Proceed, optionally replacing the tool arguments wholesale
    Allow(Option<Map<String, Value>>),
    Deny(Option<String>),
    /// Not auto-approved; the engine treats it as a deny
    Ask(Option<String>),
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow(_) => "allow",
            Decision::Deny(_) => "deny",
            Decision::Ask(_) => "ask",
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Allow(_) => None,
            Decision::Deny(reason) | Decision::Ask(reason) => reason.as_deref(),
        }
    }
}

/// Structured hook output after validation
#[derive(Debug, Clone, PartialEq)]
pub struct HookOutput {
    pub decision: Decision,
    pub system_message: Option<String>,
}

/// Result of reading a hook's stdout
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParsedStdout {
    Empty,
    /// Not JSON at all
    Unparsable,
    /// JSON, but not a valid hook output
    Malformed(String),
    Parsed(HookOutput),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHookOutput {
    #[serde(default)]
    decision: Option<RawDecision>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default, rename = "continue")]
    continue_run: Option<bool>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    system_message: Option<String>,
    #[serde(default)]
    hook_specific_output: Option<RawHookSpecificOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawDecision {
    #[serde(alias = "approve")]
    Allow,
    #[serde(alias = "block")]
    Deny,
    Ask,
}

#[derive(Debug, Deserialize)]
struct RawHookSpecificOutput {
    #[serde(default, rename = "hookEventName")]
    hook_event_name: Option<String>,
    #[serde(default)]
    tool_input: Option<Map<String, Value>>,
}

pub(crate) fn parse_stdout(stdout: &str, event: HookEvent) -> ParsedStdout {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return ParsedStdout::Empty;
    }

    // Whole document first: any JSON here is meant as the hook's answer
    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) if value.is_object() => value,
        // Only objects are hook outputs (serde also accepts sequences for structs)
        Ok(value) => {
            return ParsedStdout::Malformed(format!("expected a JSON object, got {}", value));
        }
        // Line-delimited output: the last non-empty line, if it is an object
        Err(_) => match trimmed
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .and_then(|line| serde_json::from_str::<Value>(line).ok())
            .filter(Value::is_object)
        {
            Some(value) => value,
            None => return ParsedStdout::Unparsable,
        },
    };

    match serde_json::from_value::<RawHookOutput>(value) {
        Ok(raw) => ParsedStdout::Parsed(raw.into_output(event)),
        Err(e) => ParsedStdout::Malformed(e.to_string()),
    }
}

impl RawHookOutput {
    fn into_output(self, event: HookEvent) -> HookOutput {
        let decision = if self.continue_run == Some(false) {
            Decision::Deny(self.stop_reason.or(self.reason))
        } else {
            match self.decision {
                None | Some(RawDecision::Allow) => {
                    Decision::Allow(tool_input_override(self.hook_specific_output, event))
                }
                Some(RawDecision::Deny) => Decision::Deny(self.reason),
                Some(RawDecision::Ask) => Decision::Ask(self.reason),
            }
        };

        HookOutput {
            decision,
            system_message: self.system_message,
        }
    }
}

fn tool_input_override(
    specific: Option<RawHookSpecificOutput>,
    event: HookEvent,
) -> Option<Map<String, Value>> {
    let specific = specific?;
    if let Some(ref name) = specific.hook_event_name
        && name != event.event_name()
    {
        warn!(
            "Ignoring tool_input override addressed to '{}' during {}",
            name, event
        );
        return None;
    }
    specific.tool_input
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(stdout: &str) -> HookOutput {
        match parse_stdout(stdout, HookEvent::BeforeTool) {
            ParsedStdout::Parsed(output) => output,
            other => panic!("expected Parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_unparsable() {
        assert_eq!(parse_stdout("", HookEvent::BeforeTool), ParsedStdout::Empty);
        assert_eq!(parse_stdout(" \n ", HookEvent::BeforeTool), ParsedStdout::Empty);
        assert_eq!(
            parse_stdout("all good", HookEvent::BeforeTool),
            ParsedStdout::Unparsable
        );
    }

    #[test]
    fn test_missing_decision_is_allow() {
        let output = parsed("{}");
        assert_eq!(output.decision, Decision::Allow(None));
    }

    #[test]
    fn test_deny_with_reason() {
        let output = parsed(r#"{"decision":"deny","reason":"blocked"}"#);
        assert_eq!(output.decision, Decision::Deny(Some("blocked".to_string())));
        assert_eq!(output.decision.reason(), Some("blocked"));
    }

    #[test]
    fn test_aliases() {
        assert!(parsed(r#"{"decision":"approve"}"#).decision.is_allow());
        assert_eq!(parsed(r#"{"decision":"block"}"#).decision, Decision::Deny(None));
        assert_eq!(parsed(r#"{"decision":"ask"}"#).decision.label(), "ask");
    }

    #[test]
    fn test_override() {
        let output = parsed(
            r#"{
                "decision": "allow",
                "hookSpecificOutput": {
                    "hookEventName": "BeforeTool",
                    "tool_input": {"file_path": "modified.txt", "content": "modified content"}
                }
            }"#,
        );
        let expected = json!({"file_path": "modified.txt", "content": "modified content"});
        assert_eq!(
            output.decision,
            Decision::Allow(Some(expected.as_object().unwrap().clone()))
        );
    }

    #[test]
    fn test_override_for_other_event_is_ignored() {
        let output = parsed(
            r#"{"hookSpecificOutput": {"hookEventName": "AfterTool", "tool_input": {"a": 1}}}"#,
        );
        assert_eq!(output.decision, Decision::Allow(None));
    }

    #[test]
    fn test_continue_false_denies() {
        let output = parsed(r#"{"decision":"allow","continue":false,"stopReason":"halt"}"#);
        assert_eq!(output.decision, Decision::Deny(Some("halt".to_string())));
    }

    #[test]
    fn test_system_message() {
        let output = parsed(r#"{"systemMessage":"checked by audit"}"#);
        assert_eq!(output.system_message.as_deref(), Some("checked by audit"));
    }

    #[test]
    fn test_last_line_fallback() {
        let output = parsed("starting audit\n{\"decision\":\"deny\",\"reason\":\"no\"}\n");
        assert_eq!(output.decision, Decision::Deny(Some("no".to_string())));
    }

    #[test]
    fn test_text_ending_in_scalar_is_unparsable() {
        for stdout in ["files checked:\n3\n", "done\ntrue", "status\nnull", "a\n[1, 2]"] {
            assert_eq!(
                parse_stdout(stdout, HookEvent::BeforeTool),
                ParsedStdout::Unparsable,
                "expected Unparsable for {:?}",
                stdout
            );
        }
    }

    #[test]
    fn test_schema_violations_are_malformed() {
        for stdout in [
            r#"{"decision":"maybe"}"#,
            r#"{"hookSpecificOutput":{"tool_input":"not an object"}}"#,
            r#"["allow"]"#,
            "42",
        ] {
            assert!(
                matches!(
                    parse_stdout(stdout, HookEvent::BeforeTool),
                    ParsedStdout::Malformed(_)
                ),
                "expected Malformed for {}",
                stdout
            );
        }
    }
}
