//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;

use skald::{
    Availability, FragmentStream, GenerationRequest, ModelBackend, ModelResponse,
    PatternMatchPolicy, Result, SchemaDescriptor, Skald, SkaldError, ToolCall, ToolCapability,
    ToolRegistry, telemetry,
};

// ============================================================================
// Mock backend / tool
// ============================================================================

/// Backend that always completes with a fixed value.
struct FixedBackend {
    value: serde_json::Value,
}

#[async_trait]
impl ModelBackend for FixedBackend {
    fn availability(&self) -> Availability {
        Availability::Available
    }

    async fn respond(&self, _request: &GenerationRequest) -> Result<ModelResponse> {
        Ok(ModelResponse::Complete(self.value.clone()))
    }

    async fn stream_response(&self, _request: &GenerationRequest) -> Result<FragmentStream> {
        Err(SkaldError::Backend("streaming not scripted".into()))
    }
}

/// Backend that streams a fixed list of fragments.
struct StreamingBackend {
    fragments: Vec<serde_json::Value>,
}

#[async_trait]
impl ModelBackend for StreamingBackend {
    fn availability(&self) -> Availability {
        Availability::Available
    }

    async fn respond(&self, _request: &GenerationRequest) -> Result<ModelResponse> {
        Err(SkaldError::Backend("respond not scripted".into()))
    }

    async fn stream_response(&self, _request: &GenerationRequest) -> Result<FragmentStream> {
        let fragments = self.fragments.clone();
        Ok(Box::pin(futures_util::stream::iter(
            fragments.into_iter().map(Ok),
        )))
    }
}

struct EchoTool {
    schema: SchemaDescriptor,
}

#[async_trait]
impl ToolCapability for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn argument_schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<serde_json::Value> {
        Ok(arguments.clone())
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn successful_generation_records_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let session = Skald::builder()
                    .backend(Arc::new(FixedBackend {
                        value: json!("a plain answer"),
                    }))
                    .build()?;
                session.initialize().await?;
                session.generate("say something", None).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();

    let count = counter_total(&snapshot, telemetry::GENERATIONS_TOTAL);
    assert_eq!(count, 1, "expected 1 generation counter");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn schema_violation_records_error_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let session = Skald::builder()
                    .backend(Arc::new(FixedBackend {
                        value: json!({ "stars": 42 }),
                    }))
                    .build()?;
                session.initialize().await?;
                let schema = SchemaDescriptor::structure([(
                    "stars",
                    SchemaDescriptor::integer_range(1, 5),
                )]);
                session.generate("rate it", Some(&schema)).await
            })
        })
    });
    assert!(matches!(result, Err(SkaldError::SchemaViolation(_))));

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_total(&snapshot, telemetry::SCHEMA_VIOLATIONS_TOTAL),
        1,
        "expected 1 schema-violation counter"
    );
    assert_eq!(
        counter_total(&snapshot, telemetry::GENERATIONS_TOTAL),
        1,
        "expected 1 generation counter for the failed attempt"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_stream_records_error_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let session = Skald::builder()
                    .backend(Arc::new(StreamingBackend {
                        fragments: vec![json!({ "score": 42 })],
                    }))
                    .build()
                    .unwrap();
                session.initialize().await.unwrap();
                let schema = SchemaDescriptor::structure([(
                    "score",
                    SchemaDescriptor::integer_range(1, 10),
                )]);
                let mut stream = session.generate_streaming("rate it", &schema).await.unwrap();
                stream.next().await.unwrap().unwrap();
                let err = stream.next().await.unwrap().unwrap_err();
                assert!(matches!(err, SkaldError::SchemaViolation(_)));
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_total(&snapshot, telemetry::GENERATIONS_TOTAL),
        1,
        "expected an error generation counter for the failed stream"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn tool_round_records_per_call_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let mut registry = ToolRegistry::new();
                registry.register(Arc::new(EchoTool {
                    schema: SchemaDescriptor::structure([("text", SchemaDescriptor::string())]),
                }));
                let calls = vec![
                    ToolCall::new("call-1", "echo", json!({ "text": "hi" })),
                    ToolCall::new("call-2", "missing", json!({})),
                ];
                registry
                    .execute_round(&calls, PatternMatchPolicy::Full)
                    .await
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    let count = counter_total(&snapshot, telemetry::TOOL_CALLS_TOTAL);
    assert_eq!(count, 2, "expected one counter increment per call");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn session_reset_records_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let session = Skald::builder()
                    .backend(Arc::new(FixedBackend { value: json!("ok") }))
                    .build()?;
                session.initialize().await?;
                session.reset_session().await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::SESSION_RESETS_TOTAL), 1);
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let session = Skald::builder()
        .backend(Arc::new(FixedBackend {
            value: json!("quiet"),
        }))
        .build()
        .unwrap();
    session.initialize().await.unwrap();
    let _result = session.generate("anything", None).await.unwrap();
}
