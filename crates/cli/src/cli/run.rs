use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use hookwarden_core::config::Config;
use hookwarden_core::hooks::{HookEvent, HookStage, MemoryTelemetry, ToolCall};
use serde_json::{Value, json};

use super::{parse_event, parse_json};

/// Exit status when a stage denies the call
pub const DENIED_EXIT: u8 = 2;

#[derive(Args)]
pub struct RunArgs {
    /// Hook event (BeforeTool or AfterTool)
    #[arg(long, value_parser = parse_event)]
    pub event: HookEvent,

    /// Tool name of the pending call
    #[arg(long)]
    pub tool: String,

    /// Tool arguments as a JSON object
    #[arg(long, value_parser = parse_json, default_value = "{}")]
    pub args: Value,

    /// Tool output as JSON (AfterTool only)
    #[arg(long, value_parser = parse_json)]
    pub tool_output: Option<Value>,
}

pub async fn run(args: RunArgs, config: &Config) -> Result<ExitCode> {
    let memory = Arc::new(MemoryTelemetry::new());
    let stage = HookStage::from_config(config, Some(memory.clone()))?;
    let call = ToolCall::from_value(args.tool, args.args)?;

    if args.event == HookEvent::BeforeTool && args.tool_output.is_some() {
        tracing::warn!("--tool-output is ignored for BeforeTool");
    }
    let tool_output = match args.event {
        HookEvent::AfterTool => Some(args.tool_output.unwrap_or(Value::Null)),
        HookEvent::BeforeTool => None,
    };

    let decision = stage.run(args.event, &call, tool_output.as_ref()).await;

    let output = json!({
        "decision": decision,
        "hook_calls": memory.events(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if decision.is_proceed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(DENIED_EXIT))
    }
}
