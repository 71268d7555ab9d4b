//! Live-tier client: chunked batch translation with retry, backoff, breaker
//! accounting and a soft global throttle.
//!
//! The contract is length-preserving and never partial: `translate_many`
//! always returns exactly one output per input, falling back to the original
//! text for anything the live tier could not translate. A segment-count
//! mismatch discards the whole chunk and retries each text through the
//! single-text path. Concurrent batch work for the same language is
//! serialized by a per-language mutex so overlapping cache-miss sets do not
//! produce duplicate provider calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::backoff::BackoffPolicy;
use super::breaker::CircuitBreaker;
use super::context::ContextTag;
use super::{LiveTranslator, TranslateError};

/// Texts per provider call.
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Fixed pause between sequential batches, to smooth provider load.
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_secs(5);

/// Minimum interval between any two live calls.
pub const DEFAULT_MIN_CALL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    pub min_call_interval: Duration,
    pub batch_policy: BackoffPolicy,
    pub single_policy: BackoffPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
            min_call_interval: DEFAULT_MIN_CALL_INTERVAL,
            batch_policy: BackoffPolicy::batch(),
            single_policy: BackoffPolicy::single(),
        }
    }
}

pub struct BatchTranslationClient {
    transport: Arc<dyn LiveTranslator>,
    breaker: Arc<CircuitBreaker>,
    options: BatchOptions,
    /// Soft throttle: the next moment a live call may be sent.
    next_allowed: tokio::sync::Mutex<Instant>,
    /// Per-language single-flight locks for batch work.
    inflight: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl BatchTranslationClient {
    pub fn new(transport: Arc<dyn LiveTranslator>, breaker: Arc<CircuitBreaker>) -> Self {
        Self::with_options(transport, breaker, BatchOptions::default())
    }

    pub fn with_options(
        transport: Arc<dyn LiveTranslator>,
        breaker: Arc<CircuitBreaker>,
        options: BatchOptions,
    ) -> Self {
        Self {
            transport,
            breaker,
            options,
            next_allowed: tokio::sync::Mutex::new(Instant::now()),
            inflight: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Wait until the throttle allows another live call, then claim the slot.
    async fn rate_limit_wait(&self) {
        let mut next = self.next_allowed.lock().await;
        let now = Instant::now();
        if *next > now {
            tokio::time::sleep(*next - now).await;
        }
        *next = Instant::now() + self.options.min_call_interval;
    }

    fn language_lock(&self, language: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut inflight = self.inflight.lock();
        Arc::clone(
            inflight
                .entry(language.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Translate one text through the live tier with retries. Success
    /// re-arms the breaker; exhaustion records one failure.
    pub async fn translate_single(
        &self,
        text: &str,
        language: &str,
        context: ContextTag,
    ) -> Result<String, TranslateError> {
        if !self.breaker.allow() {
            return Err(TranslateError::BreakerOpen);
        }

        let policy = &self.options.single_policy;
        let mut last_err = TranslateError::Api("no attempts made".into());
        for attempt in 0..policy.max_attempts {
            self.rate_limit_wait().await;
            match self.transport.translate_one(text, language, context).await {
                Ok(translation) => {
                    self.breaker.record_success();
                    return Ok(translation);
                }
                Err(err) => {
                    let rate_limited = matches!(err, TranslateError::RateLimited);
                    warn!(
                        language,
                        attempt = attempt + 1,
                        max = policy.max_attempts,
                        error = %err,
                        "single translation attempt failed"
                    );
                    last_err = err;
                    if policy.should_retry(attempt) {
                        tokio::time::sleep(policy.delay_for(attempt, rate_limited)).await;
                    }
                }
            }
        }

        self.breaker.record_failure();
        Err(last_err)
    }

    /// Translate an ordered list, chunked through the batch path. Always
    /// returns one output per input; failed work falls back to the original
    /// text, never to partial results.
    pub async fn translate_many(
        &self,
        texts: &[String],
        language: &str,
        context: ContextTag,
    ) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }
        if !self.breaker.allow() {
            debug!(language, "live tier disabled, returning originals");
            return texts.to_vec();
        }

        // Serialize concurrent batch work per language.
        let lock = self.language_lock(language);
        let _guard = lock.lock().await;

        let batch_id = Uuid::new_v4();
        info!(
            %batch_id,
            language,
            texts = texts.len(),
            "batch translation started"
        );

        let chunks: Vec<&[String]> = texts.chunks(self.options.batch_size).collect();
        let last = chunks.len().saturating_sub(1);
        let mut results = Vec::with_capacity(texts.len());
        for (i, chunk) in chunks.into_iter().enumerate() {
            results.extend(self.translate_chunk(chunk, language, context).await);
            if i < last {
                tokio::time::sleep(self.options.inter_batch_delay).await;
            }
        }
        results
    }

    async fn translate_chunk(
        &self,
        chunk: &[String],
        language: &str,
        context: ContextTag,
    ) -> Vec<String> {
        let policy = &self.options.batch_policy;
        for attempt in 0..policy.max_attempts {
            self.rate_limit_wait().await;
            match self.transport.translate_batch(chunk, language, context).await {
                Ok(translations) => {
                    self.breaker.record_success();
                    return translations;
                }
                Err(TranslateError::CountMismatch { expected, got }) => {
                    // The batch is unusable as a whole; retry each text
                    // individually instead of re-sending the frame.
                    warn!(language, expected, got, "discarding batch, falling back per text");
                    return self.fallback_individually(chunk, language, context).await;
                }
                Err(err) => {
                    let rate_limited = matches!(err, TranslateError::RateLimited);
                    warn!(
                        language,
                        attempt = attempt + 1,
                        max = policy.max_attempts,
                        error = %err,
                        "batch attempt failed"
                    );
                    if policy.should_retry(attempt) {
                        tokio::time::sleep(policy.delay_for(attempt, rate_limited)).await;
                    }
                }
            }
        }

        self.breaker.record_failure();
        debug!(language, "batch attempts exhausted, returning originals");
        chunk.to_vec()
    }

    async fn fallback_individually(
        &self,
        chunk: &[String],
        language: &str,
        context: ContextTag,
    ) -> Vec<String> {
        let mut out = Vec::with_capacity(chunk.len());
        for text in chunk {
            match self.translate_single(text, language, context).await {
                Ok(translation) => out.push(translation),
                Err(_) => out.push(text.clone()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Reply {
        Translate,
        Mismatch,
        Fail,
        RateLimit,
    }

    struct ScriptedTransport {
        batch_reply: Reply,
        single_reply: Reply,
        batch_calls: AtomicUsize,
        single_calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(batch_reply: Reply, single_reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                batch_reply,
                single_reply,
                batch_calls: AtomicUsize::new(0),
                single_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LiveTranslator for ScriptedTransport {
        async fn translate_one(
            &self,
            text: &str,
            language: &str,
            _context: ContextTag,
        ) -> Result<String, TranslateError> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            match self.single_reply {
                Reply::Translate => Ok(format!("{text}:{language}")),
                Reply::RateLimit => Err(TranslateError::RateLimited),
                _ => Err(TranslateError::Api("single failed".into())),
            }
        }

        async fn translate_batch(
            &self,
            texts: &[String],
            language: &str,
            _context: ContextTag,
        ) -> Result<Vec<String>, TranslateError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            match self.batch_reply {
                Reply::Translate => {
                    Ok(texts.iter().map(|t| format!("{t}:{language}")).collect())
                }
                Reply::Mismatch => Err(TranslateError::CountMismatch {
                    expected: texts.len(),
                    got: texts.len().saturating_sub(1),
                }),
                Reply::RateLimit => Err(TranslateError::RateLimited),
                Reply::Fail => Err(TranslateError::Api("batch failed".into())),
            }
        }
    }

    fn fast_options() -> BatchOptions {
        BatchOptions {
            batch_size: 3,
            inter_batch_delay: Duration::from_millis(1),
            min_call_interval: Duration::ZERO,
            batch_policy: BackoffPolicy::new(2, Duration::from_millis(1), 2.0),
            single_policy: BackoffPolicy::new(3, Duration::from_millis(1), 2.0),
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text-{i}")).collect()
    }

    #[tokio::test]
    async fn successful_batch_translates_and_chunks() {
        let transport = ScriptedTransport::new(Reply::Translate, Reply::Translate);
        let breaker = Arc::new(CircuitBreaker::default());
        let client = BatchTranslationClient::with_options(
            transport.clone(),
            Arc::clone(&breaker),
            fast_options(),
        );

        let out = client.translate_many(&texts(5), "et", ContextTag::General).await;
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], "text-0:et");
        assert_eq!(out[4], "text-4:et");
        // Five texts at batch size three → two provider calls.
        assert_eq!(transport.batch_calls.load(Ordering::SeqCst), 2);
        assert_eq!(transport.single_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mismatch_falls_back_to_single_path() {
        let transport = ScriptedTransport::new(Reply::Mismatch, Reply::Translate);
        let breaker = Arc::new(CircuitBreaker::default());
        let client = BatchTranslationClient::with_options(
            transport.clone(),
            Arc::clone(&breaker),
            fast_options(),
        );

        let out = client.translate_many(&texts(3), "es", ContextTag::General).await;
        // Each text individually translated, none partially dropped.
        assert_eq!(out, vec!["text-0:es", "text-1:es", "text-2:es"]);
        assert_eq!(transport.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.single_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn mismatch_with_failing_singles_returns_all_originals() {
        let transport = ScriptedTransport::new(Reply::Mismatch, Reply::Fail);
        let breaker = Arc::new(CircuitBreaker::default());
        let client = BatchTranslationClient::with_options(
            transport.clone(),
            Arc::clone(&breaker),
            fast_options(),
        );

        let input = texts(3);
        let out = client.translate_many(&input, "es", ContextTag::General).await;
        // All three fall back to originals, not just the mismatched one.
        assert_eq!(out, input);
        // Each single-text fallback exhausted its own retry budget.
        assert_eq!(transport.single_calls.load(Ordering::SeqCst), 9);
        assert_eq!(breaker.status().failures, 3);
    }

    #[tokio::test]
    async fn exhausted_batch_records_one_failure_and_returns_originals() {
        let transport = ScriptedTransport::new(Reply::Fail, Reply::Translate);
        let breaker = Arc::new(CircuitBreaker::default());
        let client = BatchTranslationClient::with_options(
            transport.clone(),
            Arc::clone(&breaker),
            fast_options(),
        );

        let input = texts(2);
        let out = client.translate_many(&input, "ru", ContextTag::General).await;
        assert_eq!(out, input);
        assert_eq!(transport.batch_calls.load(Ordering::SeqCst), 2);
        assert_eq!(transport.single_calls.load(Ordering::SeqCst), 0);
        assert_eq!(breaker.status().failures, 1);
    }

    #[tokio::test]
    async fn rate_limited_batch_retries_with_backoff() {
        let transport = ScriptedTransport::new(Reply::RateLimit, Reply::Translate);
        let breaker = Arc::new(CircuitBreaker::default());
        let client = BatchTranslationClient::with_options(
            transport.clone(),
            Arc::clone(&breaker),
            fast_options(),
        );

        let input = texts(2);
        let out = client.translate_many(&input, "et", ContextTag::General).await;
        assert_eq!(out, input);
        // Both attempts of the retry budget were spent.
        assert_eq!(transport.batch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn open_breaker_short_circuits_without_calls() {
        let transport = ScriptedTransport::new(Reply::Translate, Reply::Translate);
        let breaker = Arc::new(CircuitBreaker::new(1, Duration::from_secs(300)));
        breaker.record_failure();
        let client = BatchTranslationClient::with_options(
            transport.clone(),
            Arc::clone(&breaker),
            fast_options(),
        );

        let input = texts(3);
        let out = client.translate_many(&input, "et", ContextTag::General).await;
        assert_eq!(out, input);
        assert_eq!(transport.batch_calls.load(Ordering::SeqCst), 0);

        let err = client
            .translate_single("text", "et", ContextTag::General)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::BreakerOpen));
        assert_eq!(transport.single_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_rearms_breaker() {
        let transport = ScriptedTransport::new(Reply::Translate, Reply::Translate);
        let breaker = Arc::new(CircuitBreaker::default());
        breaker.record_failure();
        breaker.record_failure();
        let client = BatchTranslationClient::with_options(
            transport,
            Arc::clone(&breaker),
            fast_options(),
        );

        client.translate_many(&texts(1), "et", ContextTag::General).await;
        assert_eq!(breaker.status().failures, 0);
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let transport = ScriptedTransport::new(Reply::Translate, Reply::Translate);
        let breaker = Arc::new(CircuitBreaker::default());
        let client =
            BatchTranslationClient::with_options(transport.clone(), breaker, fast_options());
        let out = client.translate_many(&[], "et", ContextTag::General).await;
        assert!(out.is_empty());
        assert_eq!(transport.batch_calls.load(Ordering::SeqCst), 0);
    }
}
