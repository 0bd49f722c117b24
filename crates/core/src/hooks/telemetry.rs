//! `hook_call` telemetry: one record per hook invocation

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::event::HookEvent;
use super::invoker::HookInvocationResult;
use crate::config::TelemetryConfig;

/// Telemetry event name for hook invocations
pub const HOOK_CALL_EVENT: &str = "hook_call";

/// One hook invocation, as reported to telemetry sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookCallEvent {
    /// Always [`HOOK_CALL_EVENT`]
    pub event: String,
    pub hook_name: String,
    pub event_name: String,
    pub tool_name: String,
    /// "allow", "deny" or "ask"; failures report "deny"
    pub decision: String,
    pub duration_ms: u64,
    pub exit_code: Option<i32>,
    /// Failure tag (e.g. "timeout") when the hook was broken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HookCallEvent {
    pub fn from_result(event: HookEvent, tool_name: &str, result: &HookInvocationResult) -> Self {
        Self {
            event: HOOK_CALL_EVENT.to_string(),
            hook_name: result.hook_name.clone(),
            event_name: event.event_name().to_string(),
            tool_name: tool_name.to_string(),
            decision: result.decision.label().to_string(),
            duration_ms: result.duration_ms(),
            exit_code: result.exit_code,
            error: result.error.as_ref().map(|e| e.kind().to_string()),
            reason: result.decision.reason().map(str::to_string),
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of hook_call records. Must never fail the hook stage.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: &HookCallEvent);
}

/// Logs each record as a structured tracing event
#[derive(Debug, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn emit(&self, event: &HookCallEvent) {
        info!(
            target: "hookwarden::telemetry",
            event = HOOK_CALL_EVENT,
            hook_name = %event.hook_name,
            event_name = %event.event_name,
            tool_name = %event.tool_name,
            decision = %event.decision,
            duration_ms = event.duration_ms,
            exit_code = ?event.exit_code,
            error = ?event.error,
            "hook_call"
        );
    }
}

/// Appends each record as one JSON line
#[derive(Debug)]
pub struct JsonlTelemetry {
    file: Mutex<File>,
}

impl JsonlTelemetry {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open telemetry log {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl TelemetrySink for JsonlTelemetry {
    fn emit(&self, event: &HookCallEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize hook_call record: {}", e);
                return;
            }
        };
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{}", line) {
            warn!("Failed to write hook_call record: {}", e);
        }
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    events: Mutex<Vec<HookCallEvent>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HookCallEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for MemoryTelemetry {
    fn emit(&self, event: &HookCallEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Forwards every record to each inner sink
#[derive(Default)]
pub struct CompositeTelemetry {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl CompositeTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Sinks selected by configuration (tracing and/or a JSON-lines file)
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        let mut composite = Self::new();
        if config.tracing {
            composite = composite.with(Arc::new(TracingTelemetry));
        }
        if let Some(ref path) = config.log_file {
            composite = composite.with(Arc::new(JsonlTelemetry::open(Path::new(path))?));
        }
        Ok(composite)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TelemetrySink for CompositeTelemetry {
    fn emit(&self, event: &HookCallEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::error::HookError;
    use crate::hooks::output::Decision;
    use std::time::Duration;
    use tempfile::TempDir;

    fn timed_out() -> HookInvocationResult {
        HookInvocationResult {
            hook_name: "/opt/hooks/slow.sh".to_string(),
            exit_code: None,
            duration: Duration::from_millis(1002),
            decision: Decision::Deny(Some("Hook failed: timed out after 1000ms".to_string())),
            system_message: None,
            error: Some(HookError::Timeout { timeout_ms: 1000 }),
        }
    }

    #[test]
    fn test_event_from_result() {
        let event = HookCallEvent::from_result(HookEvent::BeforeTool, "write_file", &timed_out());

        assert_eq!(event.event, "hook_call");
        assert_eq!(event.hook_name, "/opt/hooks/slow.sh");
        assert_eq!(event.event_name, "BeforeTool");
        assert_eq!(event.tool_name, "write_file");
        assert_eq!(event.decision, "deny");
        assert_eq!(event.duration_ms, 1002);
        assert_eq!(event.exit_code, None);
        assert_eq!(event.error.as_deref(), Some("timeout"));
        assert!(event.reason.unwrap().contains("timed out"));
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemoryTelemetry::new();
        assert!(sink.is_empty());
        sink.emit(&HookCallEvent::from_result(
            HookEvent::AfterTool,
            "read_file",
            &timed_out(),
        ));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].event_name, "AfterTool");
    }

    #[test]
    fn test_memory_sink_survives_poisoned_lock() {
        let sink = Arc::new(MemoryTelemetry::new());
        let poisoner = sink.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.events.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(sink.events.is_poisoned());

        sink.emit(&HookCallEvent::from_result(
            HookEvent::BeforeTool,
            "write_file",
            &timed_out(),
        ));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].tool_name, "write_file");
    }

    #[test]
    fn test_jsonl_sink_appends_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("hooks.jsonl");
        let sink = JsonlTelemetry::open(&path).unwrap();

        let event = HookCallEvent::from_result(HookEvent::BeforeTool, "write_file", &timed_out());
        sink.emit(&event);
        sink.emit(&event);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: HookCallEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_composite_fans_out() {
        let first = Arc::new(MemoryTelemetry::new());
        let mut second = MockTelemetrySink::new();
        second.expect_emit().times(1).return_const(());

        let composite = CompositeTelemetry::new()
            .with(first.clone())
            .with(Arc::new(second));
        composite.emit(&HookCallEvent::from_result(
            HookEvent::BeforeTool,
            "write_file",
            &timed_out(),
        ));

        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_from_config() {
        let composite = CompositeTelemetry::from_config(&TelemetryConfig::default()).unwrap();
        assert_eq!(composite.len(), 1);

        let quiet = TelemetryConfig {
            tracing: false,
            log_file: None,
        };
        assert!(CompositeTelemetry::from_config(&quiet).unwrap().is_empty());
    }
}
