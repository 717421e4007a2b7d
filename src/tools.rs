//! Tool registry and the argument-validated invocation protocol.
//!
//! Each call walks the `Requested → ArgumentsValidated → Executing →
//! Completed | Failed` lifecycle. Arguments are validated against the
//! tool's argument schema before the capability runs; a validation failure
//! goes straight to `Failed` and the capability is never invoked. Calls of
//! one round execute concurrently with no ordering guarantee between them;
//! outcomes are attributed back by call id.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::error::SkaldError;
use crate::telemetry;
use crate::traits::ToolCapability;
use crate::types::{PatternMatchPolicy, ToolCall, ToolCallState, ToolOutcome, ToolSpec};
use crate::validate;

/// Maps tool names to capabilities for one session.
///
/// Registration replaces any capability of the same name. The registry
/// itself is passive; the session snapshots [`ToolSpec`]s out of it at
/// initialize/reset, which is when registration changes take effect.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolCapability>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under its own name, replacing any previous one.
    pub fn register(&mut self, tool: Arc<dyn ToolCapability>) {
        let name = tool.name().to_owned();
        debug!(tool = %name, "registering tool");
        self.tools.insert(name, tool);
    }

    /// Remove every registered capability.
    pub fn clear(&mut self) {
        self.tools.clear();
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Passive descriptions of every registered tool.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                argument_schema: tool.argument_schema().clone(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Execute every call of one generation round concurrently.
    ///
    /// The returned outcomes are in input-call order regardless of
    /// completion order; each carries its originating call id.
    pub async fn execute_round(
        &self,
        calls: &[ToolCall],
        policy: PatternMatchPolicy,
    ) -> Vec<ToolOutcome> {
        let futures = calls.iter().map(|call| self.execute_call(call, policy));
        join_all(futures).await
    }

    async fn execute_call(&self, call: &ToolCall, policy: PatternMatchPolicy) -> ToolOutcome {
        let mut state = ToolCallState::Requested;
        debug!(call_id = %call.id, tool = %call.name, ?state, "tool call requested");

        let result = match self.tools.get(&call.name) {
            None => Err(SkaldError::ToolExecutionFailed {
                tool: call.name.clone(),
                reason: "no tool registered under this name".into(),
            }),
            Some(tool) => {
                let report =
                    validate::validate_with(tool.argument_schema(), &call.arguments, policy);
                if !report.is_ok() {
                    warn!(
                        call_id = %call.id,
                        tool = %call.name,
                        violations = report.len(),
                        "tool arguments rejected, capability not invoked"
                    );
                    Err(SkaldError::ToolArgumentInvalid {
                        tool: call.name.clone(),
                        report,
                    })
                } else {
                    state = ToolCallState::ArgumentsValidated;
                    debug!(call_id = %call.id, tool = %call.name, ?state, "arguments validated");
                    state = ToolCallState::Executing;
                    debug!(call_id = %call.id, tool = %call.name, ?state, "invoking capability");
                    tool.invoke(&call.arguments).await.map_err(|e| match e {
                        // Preserve structured failures from nested skald use
                        err @ SkaldError::ToolExecutionFailed { .. } => err,
                        other => SkaldError::ToolExecutionFailed {
                            tool: call.name.clone(),
                            reason: other.to_string(),
                        },
                    })
                }
            }
        };

        let outcome = ToolOutcome {
            call_id: call.id.clone(),
            name: call.name.clone(),
            result,
        };
        let status = if outcome.result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::TOOL_CALLS_TOTAL,
            "tool" => call.name.clone(),
            "status" => status,
        )
        .increment(1);
        debug!(call_id = %call.id, tool = %call.name, state = ?outcome.state(), "tool call finished");
        outcome
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
