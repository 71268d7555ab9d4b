//! HTTP client for the external translation provider (serving side).
//! Connection pooling via reqwest, context-prefixed requests, response
//! caching, and separator framing for batches.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::cache::{ResponseCache, DEFAULT_RESPONSE_TTL};
use super::context::{strip_translated_prefix, ContextTag};
use super::detect::is_in_language;
use super::{
    LiveTranslator, TranslateError, TranslateRequest, TranslateResponse, SOURCE_LANGUAGE,
};

/// Token separating batch segments inside one provider call.
pub const SEPARATOR_TOKEN: &str = "---SEPARATOR---";

/// Separator as framed between texts (newline-padded for provider clarity).
const SEPARATOR_FRAME: &str = "\n---SEPARATOR---\n";

/// Bounded response cache size.
const RESPONSE_CACHE_CAPACITY: usize = 4096;

pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    responses: ResponseCache,
}

impl ProviderClient {
    /// Create a client against the given provider base URL.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, TranslateError> {
        Self::with_response_ttl(base_url, api_key, DEFAULT_RESPONSE_TTL)
    }

    pub fn with_response_ttl(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        response_ttl: Duration,
    ) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            responses: ResponseCache::new(RESPONSE_CACHE_CAPACITY, response_ttl),
        })
    }

    /// Create a client reading `TRANSLATE_PROVIDER_URL` / `TRANSLATE_API_KEY`
    /// from the environment.
    pub fn from_env() -> Result<Self, TranslateError> {
        let base_url = std::env::var("TRANSLATE_PROVIDER_URL").map_err(|_| {
            TranslateError::InvalidInput("TRANSLATE_PROVIDER_URL environment variable not set".into())
        })?;
        let api_key = std::env::var("TRANSLATE_API_KEY").map_err(|_| {
            TranslateError::InvalidInput("TRANSLATE_API_KEY environment variable not set".into())
        })?;
        Self::new(base_url, api_key)
    }

    /// One wire call. 429 maps to `RateLimited`, other non-success statuses
    /// to `Api`; retries belong to the caller.
    async fn post_translate(&self, request: &TranslateRequest) -> Result<String, TranslateError> {
        let response = self
            .http
            .post(format!("{}/translate", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(TranslateError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::Api(format!(
                "unexpected status {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: TranslateResponse = response.json().await?;
        Ok(parsed.translated_text.trim().to_string())
    }
}

#[async_trait]
impl LiveTranslator for ProviderClient {
    async fn translate_one(
        &self,
        text: &str,
        language: &str,
        context: ContextTag,
    ) -> Result<String, TranslateError> {
        if text.is_empty() || language == SOURCE_LANGUAGE {
            return Ok(text.to_string());
        }
        if is_in_language(text, language) {
            debug!(language, "text already in target language, skipping provider");
            return Ok(text.to_string());
        }

        let key = ResponseCache::compute_key(text, language, context.as_str());
        if let Some(cached) = self.responses.get(&key) {
            debug!(language, "provider response cache hit");
            return Ok(cached);
        }

        let request = TranslateRequest {
            text: context.apply(text),
            target_language: language.to_string(),
            context: Some(context.as_str().to_string()),
        };
        let raw = self.post_translate(&request).await?;
        let translation = strip_translated_prefix(&raw, language);

        self.responses.insert(key, translation.clone());
        debug!(language, context = context.as_str(), "provider translation ok");
        Ok(translation)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        language: &str,
        context: ContextTag,
    ) -> Result<Vec<String>, TranslateError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = TranslateRequest {
            text: texts.join(SEPARATOR_FRAME),
            target_language: language.to_string(),
            context: Some(context.as_str().to_string()),
        };
        let raw = self.post_translate(&request).await?;

        // If the provider ever emits the separator token inside a
        // translation, the segment count shifts and the whole batch is
        // discarded. No escaping is applied.
        let segments: Vec<String> = raw
            .split(SEPARATOR_TOKEN)
            .map(|s| s.trim().to_string())
            .collect();

        if segments.len() != texts.len() {
            warn!(
                expected = texts.len(),
                got = segments.len(),
                "batch segment count mismatch, discarding batch"
            );
            return Err(TranslateError::CountMismatch {
                expected: texts.len(),
                got: segments.len(),
            });
        }
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_frame_wraps_token() {
        assert!(SEPARATOR_FRAME.contains(SEPARATOR_TOKEN));
        let joined = ["a".to_string(), "b".to_string()].join(SEPARATOR_FRAME);
        let split: Vec<&str> = joined.split(SEPARATOR_TOKEN).map(|s| s.trim()).collect();
        assert_eq!(split, vec!["a", "b"]);
    }
}
