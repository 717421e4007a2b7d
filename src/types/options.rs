//! Session configuration types.

use serde::{Deserialize, Serialize};

/// Lowest accepted `max_tokens`; smaller requests are floored here.
pub const MIN_MAX_TOKENS: usize = 100;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default generation budget in tokens.
pub const DEFAULT_MAX_TOKENS: usize = 1024;

/// Immutable per-session generation configuration.
///
/// Values are clamped at construction: temperature to `[0.0, 1.0]`,
/// `max_tokens` to at least [`MIN_MAX_TOKENS`]. Replacing the
/// configuration requires
/// [`Session::update_configuration`](crate::Session::update_configuration),
/// which resets the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    temperature: f32,
    max_tokens: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sampling temperature, clamped to `[0.0, 1.0]`.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    /// Set the token budget, floored at [`MIN_MAX_TOKENS`].
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.max(MIN_MAX_TOKENS);
        self
    }

    /// Effective temperature after clamping.
    pub fn effective_temperature(&self) -> f32 {
        self.temperature
    }

    /// Effective token budget after flooring.
    pub fn effective_max_tokens(&self) -> usize {
        self.max_tokens
    }
}
