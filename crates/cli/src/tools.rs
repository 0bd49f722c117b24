//! Built-in tools executed by `hookwarden exec`: read_file, write_file.
//!
//! These are the downstream collaborators of the hook stage. They only ever
//! see the effective (post-hook) call.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn execute(&self, args: &Map<String, Value>) -> Result<Value>;
}

/// Create the built-in tools, resolving relative paths against `workdir`
pub fn create_tools(workdir: PathBuf) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(ReadFileTool::new(workdir.clone())),
        Box::new(WriteFileTool::new(workdir)),
    ]
}

/// Look up a tool by name; the error lists every available tool
pub fn find_tool<'a>(tools: &'a [Box<dyn Tool>], name: &str) -> Result<&'a dyn Tool> {
    tools
        .iter()
        .find(|t| t.name() == name)
        .map(|t| t.as_ref())
        .ok_or_else(|| {
            let available: Vec<_> = tools
                .iter()
                .map(|t| format!("  {}: {}", t.name(), t.description()))
                .collect();
            anyhow::anyhow!(
                "Unknown tool '{}'. Available tools:\n{}",
                name,
                available.join("\n")
            )
        })
}

fn string_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing {}", key))
}

fn resolve(workdir: &Path, path: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(path).to_string());
    if expanded.is_absolute() {
        expanded
    } else {
        workdir.join(expanded)
    }
}

// Read File Tool
pub struct ReadFileTool {
    workdir: PathBuf,
}

impl ReadFileTool {
    pub fn new(workdir: PathBuf) -> Self {
        Self { workdir }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file (args: file_path)"
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<Value> {
        let path = resolve(&self.workdir, string_arg(args, "file_path")?);
        debug!("Reading file: {}", path.display());

        let content = fs::read_to_string(&path)?;
        Ok(json!({
            "file_path": path.display().to_string(),
            "content": content,
        }))
    }
}

// Write File Tool
pub struct WriteFileTool {
    workdir: PathBuf,
}

impl WriteFileTool {
    pub fn new(workdir: PathBuf) -> Self {
        Self { workdir }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file, creating or overwriting it (args: file_path, content)"
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<Value> {
        let path = resolve(&self.workdir, string_arg(args, "file_path")?);
        let content = string_arg(args, "content")?;
        debug!("Writing file: {}", path.display());

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;

        Ok(json!({
            "file_path": path.display().to_string(),
            "bytes_written": content.len(),
        }))
    }
}
