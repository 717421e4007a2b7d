//! Tool registry: registration, argument validation, concurrent rounds.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use skald::{
    PatternMatchPolicy, Result, SchemaDescriptor, SkaldError, ToolCall, ToolCallState,
    ToolCapability, ToolRegistry,
};

// ============================================================================
// Test capabilities
// ============================================================================

/// Echoes its arguments back, counting invocations and optionally sleeping
/// first so tests can scramble completion order.
struct EchoTool {
    name: String,
    schema: SchemaDescriptor,
    invocations: AtomicUsize,
    delay: Duration,
}

impl EchoTool {
    fn new(name: &str, schema: SchemaDescriptor) -> Self {
        Self {
            name: name.to_owned(),
            schema,
            invocations: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ToolCapability for EchoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "echoes its arguments"
    }

    fn argument_schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<serde_json::Value> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(json!({"echo": arguments}))
    }
}

/// Always fails at execution time.
struct BrokenTool {
    schema: SchemaDescriptor,
}

#[async_trait]
impl ToolCapability for BrokenTool {
    fn name(&self) -> &str {
        "broken"
    }

    fn argument_schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    async fn invoke(&self, _arguments: &serde_json::Value) -> Result<serde_json::Value> {
        Err(SkaldError::Backend("device said no".into()))
    }
}

fn city_args() -> SchemaDescriptor {
    SchemaDescriptor::structure([("city", SchemaDescriptor::string())])
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn register_replaces_same_name() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool::new("weather", city_args())));
    registry.register(Arc::new(EchoTool::new("weather", SchemaDescriptor::structure::<[(&str, _); 0], &str>([]))));
    assert_eq!(registry.len(), 1);
}

#[test]
fn clear_removes_everything() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool::new("weather", city_args())));
    registry.register(Arc::new(EchoTool::new("search", city_args())));
    assert_eq!(registry.len(), 2);
    registry.clear();
    assert!(registry.is_empty());
}

#[test]
fn specs_are_sorted_by_name() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool::new("weather", city_args())));
    registry.register(Arc::new(EchoTool::new("search", city_args())));

    let names: Vec<_> = registry.specs().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["search", "weather"]);
}

// ============================================================================
// Invocation protocol
// ============================================================================

#[tokio::test]
async fn invalid_arguments_never_invoke_the_capability() {
    let tool = Arc::new(EchoTool::new("weather", city_args()));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::clone(&tool) as Arc<dyn ToolCapability>);

    let calls = [ToolCall::new("call-1", "weather", json!({"city": 42}))];
    let outcomes = registry.execute_round(&calls, PatternMatchPolicy::Full).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].state(), ToolCallState::Failed);
    assert!(matches!(
        outcomes[0].result,
        Err(SkaldError::ToolArgumentInvalid { .. })
    ));
    assert_eq!(tool.invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn valid_arguments_reach_the_capability() {
    let tool = Arc::new(EchoTool::new("weather", city_args()));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::clone(&tool) as Arc<dyn ToolCapability>);

    let calls = [ToolCall::new("call-1", "weather", json!({"city": "Oslo"}))];
    let outcomes = registry.execute_round(&calls, PatternMatchPolicy::Full).await;

    assert_eq!(outcomes[0].state(), ToolCallState::Completed);
    assert_eq!(tool.invocations.load(Ordering::SeqCst), 1);
    assert_eq!(
        outcomes[0].result.as_ref().unwrap(),
        &json!({"echo": {"city": "Oslo"}})
    );
}

#[tokio::test]
async fn unknown_tool_fails_without_side_effects() {
    let registry = ToolRegistry::new();
    let calls = [ToolCall::new("call-1", "nonexistent", json!({}))];
    let outcomes = registry.execute_round(&calls, PatternMatchPolicy::Full).await;
    assert!(matches!(
        outcomes[0].result,
        Err(SkaldError::ToolExecutionFailed { .. })
    ));
}

#[tokio::test]
async fn execution_failure_maps_to_tool_execution_failed() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(BrokenTool {
        schema: SchemaDescriptor::structure::<[(&str, _); 0], &str>([]),
    }));

    let calls = [ToolCall::new("call-1", "broken", json!({}))];
    let outcomes = registry.execute_round(&calls, PatternMatchPolicy::Full).await;

    let Err(SkaldError::ToolExecutionFailed { tool, reason }) = &outcomes[0].result else {
        panic!("expected ToolExecutionFailed");
    };
    assert_eq!(tool, "broken");
    assert!(reason.contains("device said no"));
}

// ============================================================================
// Concurrent rounds
// ============================================================================

#[tokio::test(start_paused = true)]
async fn round_outcomes_keep_input_order_and_call_ids() {
    let mut registry = ToolRegistry::new();
    // slow tool first: completion order is the reverse of input order
    registry.register(Arc::new(
        EchoTool::new("slow", city_args()).with_delay(Duration::from_millis(50)),
    ));
    registry.register(Arc::new(EchoTool::new("fast", city_args())));

    let calls = [
        ToolCall::new("id-slow", "slow", json!({"city": "Bergen"})),
        ToolCall::new("id-fast", "fast", json!({"city": "Oslo"})),
    ];
    let outcomes = registry.execute_round(&calls, PatternMatchPolicy::Full).await;

    assert_eq!(outcomes[0].call_id, "id-slow");
    assert_eq!(outcomes[0].name, "slow");
    assert_eq!(outcomes[1].call_id, "id-fast");
    assert_eq!(
        outcomes[1].result.as_ref().unwrap(),
        &json!({"echo": {"city": "Oslo"}})
    );
}

#[tokio::test(start_paused = true)]
async fn calls_in_one_round_run_concurrently() {
    let mut registry = ToolRegistry::new();
    for name in ["a", "b", "c"] {
        registry.register(Arc::new(
            EchoTool::new(name, city_args()).with_delay(Duration::from_millis(100)),
        ));
    }

    let calls: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|n| ToolCall::new(format!("id-{n}"), *n, json!({"city": "Oslo"})))
        .collect();

    let start = tokio::time::Instant::now();
    let outcomes = registry.execute_round(&calls, PatternMatchPolicy::Full).await;
    let elapsed = start.elapsed();

    assert_eq!(outcomes.len(), 3);
    // concurrent: ~100ms, not ~300ms of sequential sleeps
    assert!(elapsed < Duration::from_millis(250), "round took {elapsed:?}");
}
