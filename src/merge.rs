//! Partial-value merging and the streaming snapshot pipeline.
//!
//! Fragments arrive from the backend as a monotonically-extending view of
//! one in-progress generation, never a rollback: merging is a union of
//! presence where the newest fragment wins on conflict. A fragment that
//! introduces structure the schema does not declare fails with
//! [`SkaldError::SchemaMismatch`] rather than being silently dropped.
//!
//! [`SnapshotStream`] wraps the backend's fragment stream and yields one
//! merged [`PartialValue`] per fragment. The stream is lazy, finite, and
//! non-restartable; when the backend signals completion the accumulated
//! value must be fully present and pass constraint validation, or the
//! stream terminates with an error. Snapshots already yielded stand either
//! way. Dropping the stream stops fragment consumption — see
//! [`bounded_fragments`].

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use pin_project_lite::pin_project;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{Result, SkaldError};
use crate::types::{GeneratedValue, PartialValue, PatternMatchPolicy, SchemaDescriptor};
use crate::validate;

/// Default number of fragments buffered between backend and consumer.
pub const DEFAULT_FRAGMENT_BUFFER: usize = 16;

/// Merge one fragment into an accumulated partial value.
///
/// `null` leaves in the fragment read as absent and are skipped, so a
/// backend emitting sparse objects cannot retract presence. List elements
/// merge index-wise; elements past the current length are appended.
pub fn merge_fragment(
    schema: &SchemaDescriptor,
    partial: &mut PartialValue,
    fragment: serde_json::Value,
) -> Result<()> {
    merge_node(schema, partial.root_mut(), fragment, "$")
}

fn merge_node(
    schema: &SchemaDescriptor,
    current: &mut serde_json::Value,
    fragment: serde_json::Value,
    path: &str,
) -> Result<()> {
    if fragment.is_null() {
        return Ok(());
    }

    match schema {
        SchemaDescriptor::Struct { fields } => {
            let serde_json::Value::Object(frag_map) = fragment else {
                return Err(SkaldError::SchemaMismatch(format!(
                    "expected object fragment at {path}"
                )));
            };
            if !current.is_object() {
                *current = serde_json::Value::Object(serde_json::Map::new());
            }
            let map = current
                .as_object_mut()
                .unwrap_or_else(|| unreachable!("current coerced to object above"));
            for (key, frag_value) in frag_map {
                let Some((_, field_schema)) =
                    fields.iter().find(|(name, _)| *name == key)
                else {
                    return Err(SkaldError::SchemaMismatch(format!(
                        "fragment field '{path}.{key}' is not declared by the schema"
                    )));
                };
                let child = format!("{path}.{key}");
                let slot = map.entry(key).or_insert(serde_json::Value::Null);
                merge_node(field_schema, slot, frag_value, &child)?;
            }
            Ok(())
        }

        SchemaDescriptor::List { element, .. } => {
            let serde_json::Value::Array(frag_items) = fragment else {
                return Err(SkaldError::SchemaMismatch(format!(
                    "expected array fragment at {path}"
                )));
            };
            if !current.is_array() {
                *current = serde_json::Value::Array(Vec::new());
            }
            let items = current
                .as_array_mut()
                .unwrap_or_else(|| unreachable!("current coerced to array above"));
            for (i, frag_item) in frag_items.into_iter().enumerate() {
                let child = format!("{path}[{i}]");
                if i < items.len() {
                    merge_node(element, &mut items[i], frag_item, &child)?;
                } else {
                    let mut slot = serde_json::Value::Null;
                    merge_node(element, &mut slot, frag_item, &child)?;
                    items.push(slot);
                }
            }
            Ok(())
        }

        // Leaves: the newest fragment wins. Kind errors are the
        // validator's business at completion; only structural drift is a
        // mismatch here.
        SchemaDescriptor::Primitive { .. } | SchemaDescriptor::Enum { .. } => {
            if fragment.is_object() {
                return Err(SkaldError::SchemaMismatch(format!(
                    "expected leaf fragment at {path}, got object"
                )));
            }
            *current = fragment;
            Ok(())
        }
    }
}

pin_project! {
    /// Lazy, finite stream of merged partial snapshots.
    ///
    /// Yields one snapshot per upstream fragment. After the upstream ends,
    /// the accumulated value is checked for completeness and validated;
    /// failure surfaces as the final item. Non-restartable: once terminated
    /// it only returns `None`.
    pub struct SnapshotStream<S> {
        #[pin]
        inner: S,
        schema: SchemaDescriptor,
        policy: PatternMatchPolicy,
        partial: PartialValue,
        done: bool,
        on_terminal: Option<Box<dyn FnOnce(Option<&PartialValue>) + Send>>,
    }
}

impl<S> SnapshotStream<S>
where
    S: Stream<Item = Result<serde_json::Value>>,
{
    pub(crate) fn new(inner: S, schema: SchemaDescriptor, policy: PatternMatchPolicy) -> Self {
        Self {
            inner,
            schema,
            policy,
            partial: PartialValue::empty(),
            done: false,
            on_terminal: None,
        }
    }

    /// Hook run once when the stream terminates: with the final value on
    /// successful completion, with `None` on a terminal error.
    ///
    /// The session uses this to append the transcript entry, count the
    /// outcome, and release its exclusive guard. Abandoning the stream
    /// drops the hook (and the guard with it) without running it.
    pub(crate) fn with_terminal_hook(
        mut self,
        hook: Box<dyn FnOnce(Option<&PartialValue>) + Send>,
    ) -> Self {
        self.on_terminal = Some(hook);
        self
    }

    /// Target schema of this stream.
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Drive the stream to completion and return the final value.
    pub async fn into_generated(mut self) -> Result<GeneratedValue>
    where
        S: Unpin,
        Self: Unpin,
    {
        while let Some(snapshot) = self.next().await {
            snapshot?;
        }
        self.partial.clone().into_generated(&self.schema)
    }
}

impl<S> Stream for SnapshotStream<S>
where
    S: Stream<Item = Result<serde_json::Value>>,
{
    type Item = Result<PartialValue>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(fragment))) => {
                match merge_fragment(this.schema, this.partial, fragment) {
                    Ok(()) => Poll::Ready(Some(Ok(this.partial.clone()))),
                    Err(e) => {
                        *this.done = true;
                        if let Some(hook) = this.on_terminal.take() {
                            hook(None);
                        }
                        Poll::Ready(Some(Err(e)))
                    }
                }
            }

            Poll::Ready(Some(Err(e))) => {
                *this.done = true;
                if let Some(hook) = this.on_terminal.take() {
                    hook(None);
                }
                Poll::Ready(Some(Err(e)))
            }

            Poll::Ready(None) => {
                *this.done = true;
                if !this.partial.is_complete(this.schema) {
                    if let Some(hook) = this.on_terminal.take() {
                        hook(None);
                    }
                    return Poll::Ready(Some(Err(SkaldError::GenerationIncomplete)));
                }
                let report =
                    validate::validate_with(this.schema, this.partial.as_value(), *this.policy);
                if !report.is_ok() {
                    if let Some(hook) = this.on_terminal.take() {
                        hook(None);
                    }
                    return Poll::Ready(Some(Err(SkaldError::SchemaViolation(report))));
                }
                if let Some(hook) = this.on_terminal.take() {
                    hook(Some(this.partial));
                }
                Poll::Ready(None)
            }

            Poll::Pending => Poll::Pending,
        }
    }
}

/// Wrap a fragment stream in a bounded channel.
///
/// Spawns a producer task that pumps `inner` through a bounded `mpsc`
/// channel. A slow consumer applies backpressure instead of growing an
/// unbounded buffer, and a consumer that drops the stream makes the next
/// `send` fail, which stops the producer from consuming further upstream
/// fragments. This is what makes abandonment a real cancellation.
///
/// Requires a tokio runtime context.
pub(crate) fn bounded_fragments(
    inner: Pin<Box<dyn Stream<Item = Result<serde_json::Value>> + Send>>,
    buffer_size: usize,
) -> Pin<Box<dyn Stream<Item = Result<serde_json::Value>> + Send>> {
    let (tx, rx) = tokio::sync::mpsc::channel(buffer_size);

    tokio::spawn(async move {
        let mut inner = inner;
        while let Some(item) = inner.next().await {
            if tx.send(item).await.is_err() {
                break; // receiver dropped
            }
        }
    });

    Box::pin(ReceiverStream::new(rx))
}
