use anyhow::Result;
use clap::Args;
use hookwarden_core::config::Config;
use hookwarden_core::hooks::{HookEvent, HookRegistry};
use serde_json::json;

use super::parse_event;

#[derive(Args)]
pub struct HooksArgs {
    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

#[derive(Args)]
pub struct MatchArgs {
    /// Hook event (BeforeTool or AfterTool)
    #[arg(long, value_parser = parse_event)]
    pub event: HookEvent,

    /// Tool name to match against
    #[arg(long)]
    pub tool: String,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn list(args: HooksArgs, config: &Config) -> Result<()> {
    let registry = HookRegistry::from_config(config)?;
    let summaries = registry.describe();

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No hooks configured.");
        return Ok(());
    }
    if !registry.is_enabled() {
        println!("Hook runtime is disabled; no hook will run.\n");
    }
    for hook in &summaries {
        let matcher = if hook.matcher.is_empty() {
            "*"
        } else {
            hook.matcher.as_str()
        };
        let mut flags = Vec::new();
        if !hook.active {
            flags.push("disabled");
        }
        if !hook.matcher_valid {
            flags.push("invalid matcher");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!(
            "{:<10} {:<20} {} ({}ms){}",
            hook.event, matcher, hook.name, hook.timeout_ms, flags
        );
    }
    Ok(())
}

pub fn matching(args: MatchArgs, config: &Config) -> Result<()> {
    let registry = HookRegistry::from_config(config)?;
    let hooks = if registry.is_enabled() {
        registry.matching(args.event, &args.tool)
    } else {
        Vec::new()
    };

    if args.format == "json" {
        let output: Vec<_> = hooks
            .iter()
            .map(|hook| {
                json!({
                    "name": hook.name,
                    "command": hook.command,
                    "timeout_ms": hook.timeout_ms(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if hooks.is_empty() {
        println!("No {} hooks match tool '{}'.", args.event, args.tool);
        return Ok(());
    }
    for (i, hook) in hooks.iter().enumerate() {
        println!("{}. {} ({}ms)", i + 1, hook.name, hook.timeout_ms());
    }
    Ok(())
}
