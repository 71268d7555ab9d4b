//! Tuning knobs for the resolution pipeline.
//! Every field has a production default; a config file or environment only
//! needs to override what differs. Secrets are read from the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resolve::router::RecencyRouter;

/// Configuration for a `Resolver`, deserializable from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Language resolution is a no-op for.
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Validity of a whole-language bulk fetch.
    #[serde(default = "default_bulk_ttl_secs")]
    pub bulk_ttl_secs: u64,

    /// Validity of a cached provider response.
    #[serde(default = "default_response_ttl_secs")]
    pub response_ttl_secs: u64,

    /// Failures before the breaker opens.
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,

    /// Cooldown before an open breaker allows traffic again.
    #[serde(default = "default_breaker_cooldown_secs")]
    pub breaker_cooldown_secs: u64,

    /// Texts per provider batch call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between sequential batches.
    #[serde(default = "default_inter_batch_delay_secs")]
    pub inter_batch_delay_secs: u64,

    /// Minimum interval between any two live calls.
    #[serde(default = "default_min_call_interval_ms")]
    pub min_call_interval_ms: u64,

    /// Inputs longer than this skip static matching and go straight to the
    /// live tier (partial substitution is unreliable on full sentences).
    /// None disables the branch.
    #[serde(default = "default_static_length_limit")]
    pub static_length_limit: Option<usize>,

    /// Skip static matching for AI-generated context tags.
    #[serde(default)]
    pub skip_static_for_ai_content: bool,

    /// Recency ranks below this use the live tier in feed resolution.
    #[serde(default = "default_live_window")]
    pub live_window: usize,

    /// Start with the live tier hard-disabled.
    #[serde(default)]
    pub offline: bool,
}

fn default_source_language() -> String {
    crate::resolve::SOURCE_LANGUAGE.to_string()
}

fn default_bulk_ttl_secs() -> u64 {
    5 * 60
}

fn default_response_ttl_secs() -> u64 {
    24 * 3600
}

fn default_breaker_threshold() -> u32 {
    5
}

fn default_breaker_cooldown_secs() -> u64 {
    5 * 60
}

fn default_batch_size() -> usize {
    3
}

fn default_inter_batch_delay_secs() -> u64 {
    5
}

fn default_min_call_interval_ms() -> u64 {
    1000
}

fn default_static_length_limit() -> Option<usize> {
    Some(50)
}

fn default_live_window() -> usize {
    RecencyRouter::DEFAULT_LIVE_WINDOW
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            bulk_ttl_secs: default_bulk_ttl_secs(),
            response_ttl_secs: default_response_ttl_secs(),
            breaker_threshold: default_breaker_threshold(),
            breaker_cooldown_secs: default_breaker_cooldown_secs(),
            batch_size: default_batch_size(),
            inter_batch_delay_secs: default_inter_batch_delay_secs(),
            min_call_interval_ms: default_min_call_interval_ms(),
            static_length_limit: default_static_length_limit(),
            skip_static_for_ai_content: false,
            live_window: default_live_window(),
            offline: false,
        }
    }
}

impl ResolverConfig {
    /// Request-issuing side: length-based skip of static matching, no AI
    /// context branch.
    pub fn issuing() -> Self {
        Self::default()
    }

    /// Request-serving side: static matching is attempted for any length,
    /// but AI-generated content goes straight to the provider.
    pub fn serving() -> Self {
        Self {
            static_length_limit: None,
            skip_static_for_ai_content: true,
            ..Self::default()
        }
    }

    pub fn bulk_ttl(&self) -> Duration {
        Duration::from_secs(self.bulk_ttl_secs)
    }

    pub fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_secs)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_secs(self.inter_batch_delay_secs)
    }

    pub fn min_call_interval(&self) -> Duration {
        Duration::from_millis(self.min_call_interval_ms)
    }
}
