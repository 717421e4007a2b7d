//! Builder for configuring sessions.

use std::sync::Arc;

use super::Session;
use crate::error::{Result, SkaldError};
use crate::merge::DEFAULT_FRAGMENT_BUFFER;
use crate::traits::ModelBackend;
use crate::types::{PatternMatchPolicy, SessionConfig};

/// Main entry point for creating sessions.
pub struct Skald;

impl Skald {
    /// Create a new builder for configuring a session.
    pub fn builder() -> SkaldBuilder {
        SkaldBuilder::new()
    }
}

/// Builder for configuring a [`Session`].
///
/// A backend is required; everything else has defaults.
pub struct SkaldBuilder {
    backend: Option<Arc<dyn ModelBackend>>,
    config: SessionConfig,
    policy: PatternMatchPolicy,
    fragment_buffer: usize,
}

impl SkaldBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            config: SessionConfig::default(),
            policy: PatternMatchPolicy::default(),
            fragment_buffer: DEFAULT_FRAGMENT_BUFFER,
        }
    }

    /// The model collaborator this session drives.
    pub fn backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Full starting configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sampling temperature, clamped to `[0.0, 1.0]`.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config = self.config.temperature(temperature);
        self
    }

    /// Token budget, floored at 100.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config = self.config.max_tokens(max_tokens);
        self
    }

    /// Regex constraint matching policy (full-string by default).
    pub fn pattern_policy(mut self, policy: PatternMatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fragments buffered between backend and snapshot stream.
    pub fn fragment_buffer(mut self, size: usize) -> Self {
        self.fragment_buffer = size.max(1);
        self
    }

    /// Build the session. The session still needs
    /// [`initialize`](Session::initialize) before generating.
    pub fn build(self) -> Result<Session> {
        let backend = self
            .backend
            .ok_or_else(|| SkaldError::Configuration("no model backend configured".into()))?;
        Ok(Session::new(
            backend,
            self.config,
            self.policy,
            self.fragment_buffer,
        ))
    }
}

impl Default for SkaldBuilder {
    fn default() -> Self {
        Self::new()
    }
}
