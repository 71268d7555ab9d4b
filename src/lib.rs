//! Babelgate: tiered translation resolution.
//! A resolution walks curated dictionaries, layered caches and a durable
//! store before paying for the external provider, and a circuit breaker
//! keeps provider outages invisible to callers: the worst case is always
//! the original text, never an error.

pub mod config;
pub mod metrics;
pub mod resolve;

pub use config::ResolverConfig;
pub use metrics::{MetricsRegistry, MetricsSummary};
pub use resolve::backoff::BackoffPolicy;
pub use resolve::batch::{BatchOptions, BatchTranslationClient};
pub use resolve::breaker::{BreakerStatus, CircuitBreaker};
pub use resolve::cache::{CacheStats, ResolutionCache};
pub use resolve::context::ContextTag;
pub use resolve::dictionary::StaticDictionary;
pub use resolve::gateway::GatewayClient;
pub use resolve::pipeline::{Resolver, ResolverBuilder};
pub use resolve::provider::ProviderClient;
pub use resolve::router::{RecencyRouter, Route};
pub use resolve::store::TranslationStore;
pub use resolve::summary::{AiAnalysis, FeedbackSummary, StageRating};
pub use resolve::{
    BulkSource, LiveTranslator, TranslateError, SOURCE_LANGUAGE, SUPPORTED_LANGUAGES,
};

/// Initialize tracing with an env-filter default suitable for services
/// embedding the resolver. Call once at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "babelgate=debug".parse().expect("static filter parses")),
        )
        .with_target(true)
        .init();
}
