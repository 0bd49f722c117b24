use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use hookwarden_core::config::Config;
use hookwarden_core::hooks::{HookStage, MemoryTelemetry, MergedDecision, ToolCall};
use serde_json::{Value, json};
use tracing::info;

use super::parse_json;
use super::run::DENIED_EXIT;
use crate::tools::{create_tools, find_tool};

#[derive(Args)]
pub struct ExecArgs {
    /// Built-in tool to run (read_file or write_file)
    #[arg(long)]
    pub tool: String,

    /// Tool arguments as a JSON object
    #[arg(long, value_parser = parse_json, default_value = "{}")]
    pub args: Value,

    /// Directory relative file paths resolve against (defaults to the
    /// configured project directory, then the current directory)
    #[arg(long)]
    pub workdir: Option<PathBuf>,
}

pub async fn run(args: ExecArgs, config: &Config) -> Result<ExitCode> {
    let memory = Arc::new(MemoryTelemetry::new());
    let stage = HookStage::from_config(config, Some(memory.clone()))?;

    let workdir = match args.workdir {
        Some(dir) => dir,
        None => match config.hook_runtime.project_dir {
            Some(ref dir) => PathBuf::from(dir),
            None => std::env::current_dir().context("Failed to resolve working directory")?,
        },
    };
    let tools = create_tools(workdir);
    let tool = find_tool(&tools, &args.tool)?;

    let call = ToolCall::from_value(args.tool.clone(), args.args)?;

    let before = stage.before_tool(&call).await;
    let executed = match before {
        MergedDecision::Proceed { ref tool_call, .. } => tool_call.clone(),
        MergedDecision::Deny { .. } => {
            print_audit(json!({
                "requested": call,
                "executed": null,
                "before_tool": before,
                "hook_calls": memory.events(),
            }))?;
            return Ok(ExitCode::from(DENIED_EXIT));
        }
    };

    if executed != call {
        info!("Hooks rewrote the arguments of '{}'", executed.name());
    }
    let output = tool.execute(executed.args()).await?;

    let after = stage.after_tool(&executed, &output).await;
    let denied = !after.is_proceed();
    let output = if denied { Value::Null } else { output };

    print_audit(json!({
        "requested": call,
        "executed": executed,
        "before_tool": before,
        "output": output,
        "after_tool": after,
        "hook_calls": memory.events(),
    }))?;

    if denied {
        Ok(ExitCode::from(DENIED_EXIT))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_audit(record: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
