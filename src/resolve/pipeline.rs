//! Tier orchestration.
//! One `Resolver` per process (or per tenant) owns the dictionary, cache
//! tables, breaker and live client as fields; callers get it injected
//! instead of reaching for shared module state. `resolve` never returns an
//! error: every failure below it is absorbed and the caller receives the
//! best available text, translated or original.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::metrics::{metric_names, MetricsRegistry};

use super::backoff::BackoffPolicy;
use super::batch::{BatchOptions, BatchTranslationClient};
use super::breaker::CircuitBreaker;
use super::cache::{CacheStats, ResolutionCache};
use super::context::ContextTag;
use super::dictionary::StaticDictionary;
use super::router::{RecencyRouter, Route};
use super::{BulkSource, LiveTranslator, TranslateError};

pub struct Resolver {
    config: ResolverConfig,
    dictionary: StaticDictionary,
    cache: ResolutionCache,
    breaker: Arc<CircuitBreaker>,
    live: BatchTranslationClient,
    bulk: Option<Arc<dyn BulkSource>>,
    router: RecencyRouter,
    metrics: Arc<MetricsRegistry>,
}

pub struct ResolverBuilder {
    config: ResolverConfig,
    dictionary: Option<StaticDictionary>,
    transport: Arc<dyn LiveTranslator>,
    bulk: Option<Arc<dyn BulkSource>>,
    batch_options: Option<BatchOptions>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl ResolverBuilder {
    pub fn new(config: ResolverConfig, transport: Arc<dyn LiveTranslator>) -> Self {
        Self {
            config,
            dictionary: None,
            transport,
            bulk: None,
            batch_options: None,
            metrics: None,
        }
    }

    pub fn dictionary(mut self, dictionary: StaticDictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn bulk_source(mut self, bulk: Arc<dyn BulkSource>) -> Self {
        self.bulk = Some(bulk);
        self
    }

    /// Override retry/throttle timing wholesale (tests shrink the delays).
    pub fn batch_options(mut self, options: BatchOptions) -> Self {
        self.batch_options = Some(options);
        self
    }

    pub fn metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Resolver {
        let breaker = Arc::new(CircuitBreaker::new(
            self.config.breaker_threshold,
            self.config.breaker_cooldown(),
        ));
        if self.config.offline {
            breaker.set_offline(true);
        }

        let batch_options = self.batch_options.unwrap_or_else(|| BatchOptions {
            batch_size: self.config.batch_size,
            inter_batch_delay: self.config.inter_batch_delay(),
            min_call_interval: self.config.min_call_interval(),
            batch_policy: BackoffPolicy::batch(),
            single_policy: BackoffPolicy::single(),
        });

        let live = BatchTranslationClient::with_options(
            self.transport,
            Arc::clone(&breaker),
            batch_options,
        );

        Resolver {
            cache: ResolutionCache::new(self.config.bulk_ttl()),
            dictionary: self.dictionary.unwrap_or_else(StaticDictionary::builtin),
            router: RecencyRouter::new(self.config.live_window),
            metrics: self.metrics.unwrap_or_default(),
            breaker,
            live,
            bulk: self.bulk,
            config: self.config,
        }
    }
}

impl Resolver {
    pub fn builder(config: ResolverConfig, transport: Arc<dyn LiveTranslator>) -> ResolverBuilder {
        ResolverBuilder::new(config, transport)
    }

    /// Issuing-side resolver: live calls and bulk fetches both go to the
    /// serving application.
    pub fn issuing(gateway_base_url: &str) -> Result<Self, TranslateError> {
        let gateway = Arc::new(super::gateway::GatewayClient::new(gateway_base_url)?);
        let transport: Arc<dyn LiveTranslator> = gateway.clone();
        Ok(Self::builder(ResolverConfig::issuing(), transport)
            .bulk_source(gateway)
            .build())
    }

    /// Serving-side resolver: live calls go to the external provider, bulk
    /// data comes from the durable store.
    pub fn serving(
        provider_base_url: &str,
        api_key: &str,
        store: super::store::TranslationStore,
    ) -> Result<Self, TranslateError> {
        let config = ResolverConfig::serving();
        let provider = Arc::new(super::provider::ProviderClient::with_response_ttl(
            provider_base_url,
            api_key,
            config.response_ttl(),
        )?);
        Ok(Self::builder(config, provider)
            .bulk_source(Arc::new(store))
            .build())
    }

    /// Resolve one text into the target language. Tier by tier, first hit
    /// wins; the original text is the terminal fallback.
    pub async fn resolve(&self, text: &str, language: &str, context: ContextTag) -> String {
        if text.trim().is_empty() || language == self.config.source_language {
            self.metrics.incr(metric_names::TIER_IDENTITY);
            return text.to_string();
        }

        let span = self.metrics.span(metric_names::RESOLVE_LATENCY);

        if let Some(hit) = self.try_static(text, language, context) {
            self.metrics.incr(metric_names::TIER_STATIC_HIT);
            span.finish();
            return hit;
        }

        if let Some(hit) = self.cache.get(language, text) {
            self.metrics.incr(metric_names::TIER_CACHE_HIT);
            span.finish();
            return hit;
        }

        if let Some(hit) = self.try_bulk(text, language).await {
            self.metrics.incr(metric_names::TIER_BULK_HIT);
            span.finish();
            return hit;
        }

        if !self.breaker.allow() {
            debug!(language, "live tier disabled, returning original");
            self.metrics.incr(metric_names::TIER_BREAKER_SKIP);
            span.finish();
            return text.to_string();
        }

        let resolved = match self.live.translate_single(text, language, context).await {
            Ok(translation) => {
                if translation != text {
                    self.cache.put_adhoc(language, text, translation.clone());
                }
                self.metrics.incr(metric_names::TIER_LIVE_OK);
                translation
            }
            Err(TranslateError::BreakerOpen) => {
                self.metrics.incr(metric_names::TIER_BREAKER_SKIP);
                text.to_string()
            }
            Err(err) => {
                warn!(language, error = %err, "live tier failed, returning original");
                self.metrics.incr(metric_names::TIER_LIVE_FALLBACK);
                text.to_string()
            }
        };
        span.finish();
        resolved
    }

    /// Resolve without ever touching the live tier: dictionary and whatever
    /// the cache already holds.
    pub fn resolve_static(&self, text: &str, language: &str) -> String {
        if text.trim().is_empty() || language == self.config.source_language {
            return text.to_string();
        }
        if let Some(hit) = self.dictionary.lookup(text, language) {
            self.metrics.incr(metric_names::TIER_STATIC_HIT);
            return hit;
        }
        if let Some(hit) = self.cache.get(language, text) {
            self.metrics.incr(metric_names::TIER_CACHE_HIT);
            return hit;
        }
        text.to_string()
    }

    /// Resolve an ordered list. Texts the local tiers can answer are served
    /// from there; the remaining misses go through the batch path in one
    /// pass. Output is positionally aligned with the input.
    pub async fn resolve_many(
        &self,
        texts: &[String],
        language: &str,
        context: ContextTag,
    ) -> Vec<String> {
        if texts.is_empty() || language == self.config.source_language {
            return texts.to_vec();
        }

        self.ensure_bulk_fresh(language).await;

        let mut results: Vec<Option<String>> = Vec::with_capacity(texts.len());
        let mut miss_indices = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                results.push(Some(text.clone()));
                continue;
            }
            if let Some(hit) = self.try_static(text, language, context) {
                self.metrics.incr(metric_names::TIER_STATIC_HIT);
                results.push(Some(hit));
            } else if let Some(hit) = self.cache.get(language, text) {
                self.metrics.incr(metric_names::TIER_CACHE_HIT);
                results.push(Some(hit));
            } else {
                results.push(None);
                miss_indices.push(i);
            }
        }

        if !miss_indices.is_empty() {
            let misses: Vec<String> = miss_indices.iter().map(|&i| texts[i].clone()).collect();
            let translated = if self.breaker.allow() {
                self.live.translate_many(&misses, language, context).await
            } else {
                self.metrics.incr(metric_names::TIER_BREAKER_SKIP);
                misses
            };
            for (&i, translation) in miss_indices.iter().zip(translated) {
                if translation != texts[i] {
                    self.cache.put_adhoc(language, &texts[i], translation.clone());
                    self.metrics.incr(metric_names::TIER_LIVE_OK);
                } else {
                    self.metrics.incr(metric_names::TIER_LIVE_FALLBACK);
                }
                results[i] = Some(translation);
            }
        }

        results
            .into_iter()
            .map(|r| r.expect("every position resolved"))
            .collect()
    }

    /// Resolve a recency-ordered feed (newest first). The newest items take
    /// the full pipeline; older ones stay on the static tier.
    pub async fn resolve_feed(
        &self,
        texts: &[String],
        language: &str,
        context: ContextTag,
    ) -> Vec<String> {
        if texts.is_empty() || language == self.config.source_language {
            return texts.to_vec();
        }

        let mut results = Vec::with_capacity(texts.len());
        for (rank, text) in texts.iter().enumerate() {
            match self.router.route(rank) {
                Route::Live => results.push(self.resolve(text, language, context).await),
                Route::Static => results.push(self.resolve_static(text, language)),
            }
        }
        results
    }

    /// Static-tier decision: dictionary lookup unless the profile skips it
    /// for this input.
    fn try_static(&self, text: &str, language: &str, context: ContextTag) -> Option<String> {
        if let Some(limit) = self.config.static_length_limit {
            if text.chars().count() > limit {
                return None;
            }
        }
        if self.config.skip_static_for_ai_content && context.is_ai_content() {
            return None;
        }
        self.dictionary.lookup(text, language)
    }

    /// Refresh the bulk table if stale, then retry the cache.
    async fn try_bulk(&self, text: &str, language: &str) -> Option<String> {
        self.ensure_bulk_fresh(language).await;
        self.cache.get(language, text)
    }

    async fn ensure_bulk_fresh(&self, language: &str) {
        let Some(bulk) = &self.bulk else { return };
        if self.cache.is_bulk_valid(language) {
            return;
        }
        let span = self.metrics.span(metric_names::BULK_REFRESH_LATENCY);
        match bulk.fetch_language(language).await {
            Ok(map) => {
                debug!(language, count = map.len(), "bulk table refreshed");
                self.cache.refresh_bulk(language, map);
            }
            Err(err) => {
                // A failed refresh is not a resolution failure; lower tiers
                // simply stay stale and the pipeline moves on.
                debug!(language, error = %err, "bulk refresh failed");
            }
        }
        span.finish();
    }

    /// Force a bulk refetch on the next resolution for this language.
    pub fn invalidate_language(&self, language: &str) {
        self.cache.clear(language);
    }

    pub fn clear_caches(&self) {
        self.cache.clear_all();
    }

    pub fn cache_stats(&self) -> std::collections::HashMap<String, CacheStats> {
        self.cache.stats()
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Hard-disable the live tier without waiting for failures to accumulate.
    pub fn set_offline(&self, offline: bool) {
        self.breaker.set_offline(offline);
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}
