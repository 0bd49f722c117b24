use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hookwarden_core::env::HOOKWARDEN_CONFIG;
use hookwarden_core::hooks::HookEvent;
use serde_json::Value;

pub mod exec;
pub mod hooks;
pub mod run;

#[derive(Parser)]
#[command(name = "hookwarden")]
#[command(author, version, about = "Run tool calls through externally registered hooks")]
pub struct Cli {
    /// Config file (TOML, or JSON/JSON5 by extension)
    #[arg(short, long, global = true, env = HOOKWARDEN_CONFIG)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the registered hooks
    Hooks(hooks::HooksArgs),

    /// Show which hooks would run for a tool call, without running them
    Match(hooks::MatchArgs),

    /// Run one hook stage and print the merged decision
    Run(run::RunArgs),

    /// Run a built-in tool through the BeforeTool and AfterTool stages
    Exec(exec::ExecArgs),
}

pub(crate) fn parse_event(s: &str) -> Result<HookEvent, String> {
    s.parse()
}

pub(crate) fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "hookwarden",
            "run",
            "--event",
            "BeforeTool",
            "--tool",
            "write_file",
            "--args",
            r#"{"file_path":"a.txt"}"#,
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.event, HookEvent::BeforeTool);
                assert_eq!(args.tool, "write_file");
                assert_eq!(args.args["file_path"], "a.txt");
                assert!(args.tool_output.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_rejects_unknown_event() {
        let result = Cli::try_parse_from([
            "hookwarden",
            "match",
            "--event",
            "Notification",
            "--tool",
            "write_file",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_invalid_args_json() {
        let result = Cli::try_parse_from([
            "hookwarden",
            "exec",
            "--tool",
            "write_file",
            "--args",
            "{not json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hookwarden", "hooks", "-v", "--config", "/tmp/h.toml"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/h.toml")));
    }
}
