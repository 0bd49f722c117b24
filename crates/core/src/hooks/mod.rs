//! Tool-call hook interception
//!
//! Hooks are shell commands registered per event and tool-name matcher:
//! - BeforeTool: before a tool executes (can deny or rewrite the call)
//! - AfterTool: after a tool completes (sees the tool output, can deny)
//!
//! Configuration shape (TOML or JSON):
//! ```json
//! {
//!   "hooks": {
//!     "BeforeTool": [
//!       {
//!         "matcher": "write_file",
//!         "hooks": [
//!           { "type": "command", "command": "/usr/local/bin/guard.sh", "timeout": 5000 }
//!         ]
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! The hook input JSON is piped to the command's stdin:
//! `{"hookEventName", "tool_name", "tool_input", "tool_output"?}`.
//! The hook answers on stdout:
//! `{"decision": "allow"|"deny"|"ask", "reason"?, "hookSpecificOutput"?: {"tool_input"?}}`.
//! No decision means allow. An allowing `tool_input` replaces the call's
//! arguments for every later hook and for the tool itself.

mod error;
mod event;
mod invoker;
mod matcher;
mod merger;
mod output;
mod registry;
mod stage;
mod telemetry;
mod tool_call;

pub use error::HookError;
pub use event::{HookEvent, HookInput};
pub use invoker::{HookInvocationResult, HookInvoker};
pub use matcher::{CompiledMatcher, MatchError, matches};
pub use merger::{DecisionMerger, DenyCause, MergedDecision};
pub use output::{Decision, HookOutput};
pub use registry::{HookDescriptor, HookGroup, HookRegistry, HookSummary};
pub use stage::HookStage;
pub use telemetry::{
    CompositeTelemetry, HOOK_CALL_EVENT, HookCallEvent, JsonlTelemetry, MemoryTelemetry,
    TelemetrySink, TracingTelemetry,
};
pub use tool_call::ToolCall;
