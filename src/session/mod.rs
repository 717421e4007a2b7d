//! Session orchestrator: configuration, transcript, request sequencing.
//!
//! A [`Session`] is an exclusive-access resource. All mutating operations
//! (initialize, generation, tool registration, configuration updates)
//! serialize through one `tokio::sync::Mutex`; only availability reads
//! bypass it. Streaming holds the lock for the stream's lifetime via an
//! owned guard, so no mutation can interleave a live stream and dropping
//! the stream releases the session.

mod builder;

pub use builder::{Skald, SkaldBuilder};

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::error::{Result, SkaldError};
use crate::merge::{SnapshotStream, bounded_fragments};
use crate::telemetry;
use crate::tools::ToolRegistry;
use crate::traits::{FragmentStream, ModelBackend, ToolCapability};
use crate::types::{
    Availability, GeneratedValue, GenerationRequest, ModelResponse, PatternMatchPolicy,
    SchemaDescriptor, SessionConfig, ToolRoundResult, ToolSpec, Transcript, TranscriptEntry,
};
use crate::validate;

/// Snapshot stream returned by [`Session::generate_streaming`].
pub type PartialStream = SnapshotStream<FragmentStream>;

/// Upper bound on tool rounds within one generation, so a backend stuck
/// requesting tools cannot loop forever.
const MAX_TOOL_ROUNDS: usize = 8;

/// Tool set and specs as they stood at the last initialize/reset.
///
/// Generations run against this snapshot; registry mutations after
/// initialize stay inert until the next reset.
struct LiveState {
    tools: ToolRegistry,
    specs: Vec<ToolSpec>,
}

struct SessionInner {
    config: SessionConfig,
    tools: ToolRegistry,
    transcript: Transcript,
    live: Option<LiveState>,
}

impl SessionInner {
    /// Allocate fresh live state from the current registry, gated on
    /// backend availability.
    fn allocate_live(&mut self, backend: &dyn ModelBackend) -> Result<()> {
        match backend.availability() {
            Availability::Available => {
                self.live = Some(LiveState {
                    specs: self.tools.specs(),
                    tools: self.tools.clone(),
                });
                Ok(())
            }
            Availability::Loading => Err(SkaldError::ModelNotReady),
            Availability::Unavailable => Err(SkaldError::ModelUnavailable),
        }
    }
}

/// One conversation with the model backend.
///
/// Owns the configuration, the registered tools, and the transcript.
/// Created through [`Skald::builder`]; must be [`initialize`d](Session::initialize)
/// before any generation.
pub struct Session {
    backend: Arc<dyn ModelBackend>,
    policy: PatternMatchPolicy,
    fragment_buffer: usize,
    inner: Arc<Mutex<SessionInner>>,
}

impl Session {
    pub(crate) fn new(
        backend: Arc<dyn ModelBackend>,
        config: SessionConfig,
        policy: PatternMatchPolicy,
        fragment_buffer: usize,
    ) -> Self {
        Self {
            backend,
            policy,
            fragment_buffer,
            inner: Arc::new(Mutex::new(SessionInner {
                config,
                tools: ToolRegistry::new(),
                transcript: Transcript::default(),
                live: None,
            })),
        }
    }

    /// Backend availability. Never takes the session lock.
    pub fn availability(&self) -> Availability {
        self.backend.availability()
    }

    /// Allocate fresh session state.
    ///
    /// Fails with [`SkaldError::ModelUnavailable`] or
    /// [`SkaldError::ModelNotReady`] depending on what the backend
    /// reports. Snapshots the registered tools; registrations made after
    /// this call take effect at the next initialize/reset.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.allocate_live(self.backend.as_ref())?;
        debug!(tools = inner.tools.len(), "session initialized");
        Ok(())
    }

    /// Register a tool. Effective from the next initialize/reset, not
    /// retroactively on an already-initialized session.
    pub async fn register_tool(&self, tool: Arc<dyn ToolCapability>) {
        let mut inner = self.inner.lock().await;
        inner.tools.register(tool);
    }

    /// Remove all registered tools. Effective from the next
    /// initialize/reset.
    pub async fn clear_tools(&self) {
        let mut inner = self.inner.lock().await;
        inner.tools.clear();
    }

    /// Current configuration.
    pub async fn configuration(&self) -> SessionConfig {
        self.inner.lock().await.config
    }

    /// Snapshot of the transcript so far.
    pub async fn transcript(&self) -> Transcript {
        self.inner.lock().await.transcript.clone()
    }

    /// Discard transcript and live state, then re-initialize with the
    /// current configuration. Registered tools survive.
    #[instrument(skip(self))]
    pub async fn reset_session(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.transcript.clear();
        inner.live = None;
        inner.allocate_live(self.backend.as_ref())?;
        metrics::counter!(telemetry::SESSION_RESETS_TOTAL).increment(1);
        debug!("session reset");
        Ok(())
    }

    /// Replace the configuration (already clamped at construction) and
    /// reset the session.
    #[instrument(skip(self, config))]
    pub async fn update_configuration(&self, config: SessionConfig) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.config = config;
        inner.transcript.clear();
        inner.live = None;
        inner.allocate_live(self.backend.as_ref())?;
        metrics::counter!(telemetry::SESSION_RESETS_TOTAL).increment(1);
        debug!("configuration replaced, session reset");
        Ok(())
    }

    /// One-shot generation, optionally structured.
    ///
    /// With a schema the response is validated against it and a failing
    /// value is never returned — the call fails with
    /// [`SkaldError::SchemaViolation`] instead. Tool-call rounds issued by
    /// the backend are resolved through the registered tools before the
    /// final response; every round is logged to the transcript.
    #[instrument(skip(self, prompt, schema), fields(structured = schema.is_some()))]
    pub async fn generate(
        &self,
        prompt: &str,
        schema: Option<&SchemaDescriptor>,
    ) -> Result<GeneratedValue> {
        let mut guard = self.inner.lock().await;
        let (request, tools) = {
            let live = guard.live.as_ref().ok_or(SkaldError::SessionNotInitialized)?;
            (
                build_request(prompt, schema, &guard.config, &live.specs),
                live.tools.clone(),
            )
        };
        guard.transcript.push(TranscriptEntry::Prompt {
            text: prompt.to_owned(),
        });

        let mut entries = Vec::new();
        let driven = drive_generation(
            self.backend.as_ref(),
            &tools,
            self.policy,
            request,
            &mut entries,
        )
        .await;
        for entry in entries {
            guard.transcript.push(entry);
        }

        let value = match driven {
            Ok(value) => value,
            Err(e) => {
                record_generation("generate", false);
                return Err(e);
            }
        };

        if let Some(schema) = schema {
            let report = validate::validate_with(schema, &value, self.policy);
            if !report.is_ok() {
                warn!(violations = report.len(), "generated value failed validation");
                metrics::counter!(telemetry::SCHEMA_VIOLATIONS_TOTAL,
                    "operation" => "generate",
                )
                .increment(1);
                record_generation("generate", false);
                return Err(SkaldError::SchemaViolation(report));
            }
        }

        guard.transcript.push(TranscriptEntry::Response {
            text: response_text(&value),
        });
        record_generation("generate", true);
        Ok(GeneratedValue::new(value))
    }

    /// Streaming structured generation.
    ///
    /// Returns a lazy, finite sequence of merged partial snapshots; see
    /// [`SnapshotStream`]. The session lock is held by the stream until it
    /// terminates or is dropped, and dropping it stops fragment consumption
    /// upstream — abandonment is the cancellation mechanism.
    #[instrument(skip(self, prompt, schema))]
    pub async fn generate_streaming(
        &self,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> Result<PartialStream> {
        let mut guard = self.inner.clone().lock_owned().await;
        let request = {
            let live = guard.live.as_ref().ok_or(SkaldError::SessionNotInitialized)?;
            build_request(prompt, Some(schema), &guard.config, &live.specs)
        };

        let upstream = self.backend.stream_response(&request).await?;
        let bounded = bounded_fragments(upstream, self.fragment_buffer);

        guard.transcript.push(TranscriptEntry::Prompt {
            text: prompt.to_owned(),
        });

        let stream = SnapshotStream::new(bounded, schema.clone(), self.policy)
            .with_terminal_hook(Box::new(move |outcome| match outcome {
                Some(partial) => {
                    guard.transcript.push(TranscriptEntry::Response {
                        text: response_text(partial.as_value()),
                    });
                    record_generation("generate_streaming", true);
                }
                None => record_generation("generate_streaming", false),
            }));
        Ok(stream)
    }

    /// Generate over independent prompts in parallel.
    ///
    /// Fans out one derived request per prompt; results come back in the
    /// original input order regardless of completion order. The first
    /// failure fails the batch.
    #[instrument(skip_all, fields(prompts = prompts.len(), structured = schema.is_some()))]
    pub async fn generate_batch(
        &self,
        prompts: &[&str],
        schema: Option<&SchemaDescriptor>,
    ) -> Result<Vec<GeneratedValue>> {
        let mut guard = self.inner.lock().await;
        let (config, specs, tools) = {
            let live = guard.live.as_ref().ok_or(SkaldError::SessionNotInitialized)?;
            (guard.config, live.specs.clone(), live.tools.clone())
        };

        let backend = self.backend.as_ref();
        let policy = self.policy;
        let futures = prompts.iter().map(|prompt| {
            let request = build_request(prompt, schema, &config, &specs);
            let tools = &tools;
            async move {
                let mut entries = Vec::new();
                let out = drive_generation(backend, tools, policy, request, &mut entries).await;
                (out, entries)
            }
        });

        // join_all yields results positionally, so index attribution is
        // preserved no matter which request finishes first.
        let gathered = join_all(futures).await;

        let mut values = Vec::with_capacity(prompts.len());
        for (prompt, (driven, entries)) in prompts.iter().zip(gathered) {
            guard.transcript.push(TranscriptEntry::Prompt {
                text: (*prompt).to_owned(),
            });
            for entry in entries {
                guard.transcript.push(entry);
            }
            let value = match driven {
                Ok(value) => value,
                Err(e) => {
                    record_generation("generate_batch", false);
                    return Err(e);
                }
            };
            if let Some(schema) = schema {
                let report = validate::validate_with(schema, &value, policy);
                if !report.is_ok() {
                    metrics::counter!(telemetry::SCHEMA_VIOLATIONS_TOTAL,
                        "operation" => "generate_batch",
                    )
                    .increment(1);
                    record_generation("generate_batch", false);
                    return Err(SkaldError::SchemaViolation(report));
                }
            }
            guard.transcript.push(TranscriptEntry::Response {
                text: response_text(&value),
            });
            values.push(GeneratedValue::new(value));
        }
        record_generation("generate_batch", true);
        Ok(values)
    }
}

/// Resolve tool rounds until the backend produces a complete value.
///
/// Transcript entries for every executed round are pushed to `entries`
/// even when the round fails, so the caller can log them before
/// propagating the error.
async fn drive_generation(
    backend: &dyn ModelBackend,
    tools: &ToolRegistry,
    policy: PatternMatchPolicy,
    mut request: GenerationRequest,
    entries: &mut Vec<TranscriptEntry>,
) -> Result<serde_json::Value> {
    for _ in 0..MAX_TOOL_ROUNDS {
        match backend.respond(&request).await? {
            ModelResponse::Complete(value) => return Ok(value),
            ModelResponse::ToolCalls(calls) => {
                debug!(calls = calls.len(), "resolving tool round");
                let outcomes = tools.execute_round(&calls, policy).await;
                let mut first_err = None;
                for (call, outcome) in calls.into_iter().zip(outcomes) {
                    entries.push(TranscriptEntry::ToolCall {
                        name: call.name,
                        arguments: call.arguments,
                        result: outcome
                            .result
                            .as_ref()
                            .map(Clone::clone)
                            .map_err(ToString::to_string),
                    });
                    match outcome.result {
                        Ok(value) => request.tool_results.push(ToolRoundResult {
                            call_id: outcome.call_id,
                            name: outcome.name,
                            result: value,
                        }),
                        Err(e) => {
                            if first_err.is_none() {
                                first_err = Some(e);
                            }
                        }
                    }
                }
                if let Some(e) = first_err {
                    return Err(e);
                }
            }
        }
    }
    Err(SkaldError::Backend(format!(
        "backend requested more than {MAX_TOOL_ROUNDS} tool rounds"
    )))
}

fn build_request(
    prompt: &str,
    schema: Option<&SchemaDescriptor>,
    config: &SessionConfig,
    specs: &[ToolSpec],
) -> GenerationRequest {
    GenerationRequest {
        prompt: prompt.to_owned(),
        schema: schema.cloned(),
        temperature: config.effective_temperature(),
        max_tokens: config.effective_max_tokens(),
        tools: specs.to_vec(),
        tool_results: Vec::new(),
    }
}

/// Transcript text of a response value: plain strings verbatim, structured
/// values as compact JSON.
fn response_text(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_owned(),
        None => value.to_string(),
    }
}

fn record_generation(operation: &'static str, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(telemetry::GENERATIONS_TOTAL,
        "operation" => operation,
        "status" => status,
    )
    .increment(1);
}
