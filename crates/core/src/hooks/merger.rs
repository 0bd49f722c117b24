//! Folding hook decisions into the effective tool call

use serde::Serialize;

use super::invoker::HookInvocationResult;
use super::output::Decision;
use super::tool_call::ToolCall;

/// Why a stage denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "error")]
pub enum DenyCause {
    /// A hook decided deny
    Decision,
    /// A hook asked for confirmation, which this engine does not grant
    Ask,
    /// The hook was broken (timeout, crash, malformed output, ...); carries
    /// the error tag
    Failure(&'static str),
}

/// Terminal outcome of one hook stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MergedDecision {
    Proceed {
        /// The call to execute and to audit, with every override applied
        tool_call: ToolCall,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        system_messages: Vec<String>,
    },
    Deny {
        reason: String,
        hook_name: String,
        cause: DenyCause,
    },
}

impl MergedDecision {
    pub fn proceed(tool_call: ToolCall) -> Self {
        MergedDecision::Proceed {
            tool_call,
            system_messages: Vec::new(),
        }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, MergedDecision::Proceed { .. })
    }

    pub fn tool_call(&self) -> Option<&ToolCall> {
        match self {
            MergedDecision::Proceed { tool_call, .. } => Some(tool_call),
            MergedDecision::Deny { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            MergedDecision::Proceed { .. } => None,
            MergedDecision::Deny { reason, .. } => Some(reason),
        }
    }
}

/// Left-to-right fold of invocation results over a tool call.
///
/// Each allowing override replaces the current call with a new value; the
/// first deny (or ask, or failure) ends the fold.
#[derive(Debug, Clone)]
pub struct DecisionMerger {
    current: ToolCall,
    system_messages: Vec<String>,
}

impl DecisionMerger {
    pub fn new(tool_call: ToolCall) -> Self {
        Self {
            current: tool_call,
            system_messages: Vec::new(),
        }
    }

    /// The call the next hook should see
    pub fn current(&self) -> &ToolCall {
        &self.current
    }

    /// Apply one result. Returns the terminal decision if the fold must stop.
    pub fn fold(&mut self, result: &HookInvocationResult) -> Option<MergedDecision> {
        let hook_name = result.hook_name.clone();

        match &result.decision {
            Decision::Allow(overrides) => {
                if let Some(args) = overrides {
                    self.current = self.current.with_args(args.clone());
                }
                if let Some(ref message) = result.system_message {
                    self.system_messages.push(message.clone());
                }
                None
            }
            Decision::Deny(reason) => {
                let cause = match result.error {
                    Some(ref e) => DenyCause::Failure(e.kind()),
                    None => DenyCause::Decision,
                };
                let reason = non_blank(reason)
                    .unwrap_or_else(|| format!("Blocked by hook '{}'", hook_name));
                Some(MergedDecision::Deny {
                    reason,
                    hook_name,
                    cause,
                })
            }
            Decision::Ask(reason) => {
                let reason = non_blank(reason)
                    .unwrap_or_else(|| format!("Hook '{}' requires confirmation", hook_name));
                Some(MergedDecision::Deny {
                    reason,
                    hook_name,
                    cause: DenyCause::Ask,
                })
            }
        }
    }

    /// Proceed with the folded call
    pub fn finish(self) -> MergedDecision {
        MergedDecision::Proceed {
            tool_call: self.current,
            system_messages: self.system_messages,
        }
    }
}

/// A blank reason counts as no reason
fn non_blank(reason: &Option<String>) -> Option<String> {
    reason.clone().filter(|r| !r.trim().is_empty())
}
