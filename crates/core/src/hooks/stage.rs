//! Hook stage: the entry point used by the tool-call pipeline

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};

use super::event::{HookEvent, HookInput};
use super::invoker::HookInvoker;
use super::merger::{DecisionMerger, MergedDecision};
use super::registry::HookRegistry;
use super::telemetry::{CompositeTelemetry, HookCallEvent, TelemetrySink};
use super::tool_call::ToolCall;
use crate::config::Config;

/// Runs the hooks registered for one event against one tool call.
///
/// Holds no per-call state; concurrent runs for different tool calls share
/// only the read-only registry.
#[derive(Clone)]
pub struct HookStage {
    registry: Arc<HookRegistry>,
    invoker: HookInvoker,
    telemetry: Arc<dyn TelemetrySink>,
}

impl HookStage {
    pub fn new(
        registry: Arc<HookRegistry>,
        invoker: HookInvoker,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            registry,
            invoker,
            telemetry,
        }
    }

    /// Build a stage from configuration, with the configured telemetry sinks
    /// plus `extra` (if any)
    pub fn from_config(config: &Config, extra: Option<Arc<dyn TelemetrySink>>) -> Result<Self> {
        let registry = HookRegistry::from_config(config)?;
        let mut telemetry = CompositeTelemetry::from_config(&config.telemetry)?;
        if let Some(sink) = extra {
            telemetry = telemetry.with(sink);
        }
        Ok(Self::new(
            Arc::new(registry),
            HookInvoker::from_config(&config.hook_runtime),
            Arc::new(telemetry),
        ))
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub async fn before_tool(&self, call: &ToolCall) -> MergedDecision {
        self.run(HookEvent::BeforeTool, call, None).await
    }

    pub async fn after_tool(&self, call: &ToolCall, tool_output: &Value) -> MergedDecision {
        self.run(HookEvent::AfterTool, call, Some(tool_output)).await
    }

    /// Match, invoke each hook in order, fold decisions, report telemetry.
    ///
    /// Hooks run strictly one after another: each sees the call as rewritten
    /// by the hooks before it. The first deny stops the stage; later hooks
    /// are not invoked. Always returns a decision.
    pub async fn run(
        &self,
        event: HookEvent,
        call: &ToolCall,
        tool_output: Option<&Value>,
    ) -> MergedDecision {
        if !self.registry.is_enabled() {
            return MergedDecision::proceed(call.clone());
        }

        let hooks = self.registry.matching(event, call.name());
        if hooks.is_empty() {
            return MergedDecision::proceed(call.clone());
        }

        debug!(
            "Running {} {} hook(s) for tool '{}'",
            hooks.len(),
            event,
            call.name()
        );

        let cwd = self
            .invoker
            .project_dir()
            .map(|dir| dir.display().to_string());
        let mut merger = DecisionMerger::new(call.clone());

        for hook in hooks {
            let input =
                HookInput::new(event, merger.current(), tool_output).with_cwd(cwd.clone());
            let result = self.invoker.invoke(hook, &input).await;

            self.telemetry
                .emit(&HookCallEvent::from_result(event, call.name(), &result));

            if let Some(denied) = merger.fold(&result) {
                warn!(
                    "{} hook '{}' denied tool '{}': {}",
                    event,
                    hook.name,
                    call.name(),
                    denied.reason().unwrap_or_default()
                );
                return denied;
            }
        }

        merger.finish()
    }
}
