//! Tiered translation resolution.
//! Resolution walks the tiers in order (static dictionary, layered caches,
//! durable store, live provider) and falls back to the original text when
//! every tier misses or the live tier is disabled.

pub mod backoff;
pub mod batch;
pub mod breaker;
pub mod cache;
pub mod context;
pub mod detect;
pub mod dictionary;
pub mod gateway;
pub mod pipeline;
pub mod provider;
pub mod router;
pub mod store;
pub mod summary;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use self::context::ContextTag;

/// Language everything originates in. Resolution for it is the identity.
pub const SOURCE_LANGUAGE: &str = "en";

/// Languages with curated dictionary coverage.
pub const SUPPORTED_LANGUAGES: &[&str] = &["et", "es", "ru"];

/// Human-readable language name, as sent to the provider.
pub fn language_name(code: &str) -> Option<&'static str> {
    match code {
        "en" => Some("English"),
        "et" => Some("Estonian"),
        "es" => Some("Spanish"),
        "ru" => Some("Russian"),
        _ => None,
    }
}

/// Errors from the live tier. Tiers below it signal misses with `Option`,
/// never with an error; the pipeline absorbs everything here and callers of
/// `resolve` only ever see text.
#[derive(Debug, Clone)]
pub enum TranslateError {
    /// Provider or gateway returned a non-success status or the transport failed.
    Api(String),
    /// HTTP 429; triggers the exponential backoff policy.
    RateLimited,
    /// The request-level timeout elapsed.
    Timeout,
    /// Batch framing came back with the wrong number of segments.
    /// The whole batch is discarded, never partially accepted.
    CountMismatch { expected: usize, got: usize },
    /// Circuit breaker is open or offline mode is set. Expected degraded
    /// mode, not logged as an error.
    BreakerOpen,
    InvalidInput(String),
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateError::Api(msg) => write!(f, "API error: {msg}"),
            TranslateError::RateLimited => write!(f, "rate limited by provider"),
            TranslateError::Timeout => write!(f, "translation timeout"),
            TranslateError::CountMismatch { expected, got } => {
                write!(f, "segment count mismatch: expected {expected}, got {got}")
            }
            TranslateError::BreakerOpen => write!(f, "live tier disabled"),
            TranslateError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Timeout
        } else {
            TranslateError::Api(e.to_string())
        }
    }
}

/// Transport for the live tier. The serving side implements this against the
/// external provider, the issuing side against the serving application, and
/// tests against a counter.
///
/// Implementations do one wire call per method; retries, backoff, throttling
/// and breaker accounting all live in [`batch::BatchTranslationClient`].
#[async_trait]
pub trait LiveTranslator: Send + Sync {
    /// Translate one text. On success the result is a single translated string.
    async fn translate_one(
        &self,
        text: &str,
        language: &str,
        context: ContextTag,
    ) -> Result<String, TranslateError>;

    /// Translate an ordered batch. On success the result has exactly as many
    /// segments as the input, in the same order.
    async fn translate_batch(
        &self,
        texts: &[String],
        language: &str,
        context: ContextTag,
    ) -> Result<Vec<String>, TranslateError>;
}

/// Whole-language fetch of pre-approved translations. The serving side reads
/// its durable store, the issuing side calls the serving application's bulk
/// endpoint. A successful fetch atomically refreshes the language cache.
#[async_trait]
pub trait BulkSource: Send + Sync {
    async fn fetch_language(&self, language: &str) -> Result<HashMap<String, String>, TranslateError>;
}

// --- Wire contracts (camelCase JSON, shared by both HTTP clients) ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translated_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTranslateRequest {
    pub texts: Vec<String>,
    pub target_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTranslateResponse {
    pub translations: Vec<String>,
}

/// Payload of `GET /translations/{language}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationBundle {
    pub language: String,
    pub translations: HashMap<String, String>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_names_cover_supported_set() {
        for lang in SUPPORTED_LANGUAGES {
            assert!(language_name(lang).is_some(), "missing name for {lang}");
        }
        assert_eq!(language_name("en"), Some("English"));
        assert_eq!(language_name("xx"), None);
    }

    #[test]
    fn wire_types_use_camel_case() {
        let req = TranslateRequest {
            text: "good opening".into(),
            target_language: "et".into(),
            context: Some("sales_feedback".into()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("targetLanguage").is_some());
        assert!(json.get("target_language").is_none());

        let resp: TranslateResponse =
            serde_json::from_str(r#"{"translatedText":"Hea avamine"}"#).unwrap();
        assert_eq!(resp.translated_text, "Hea avamine");
    }

    #[test]
    fn context_field_omitted_when_absent() {
        let req = BatchTranslateRequest {
            texts: vec!["a".into()],
            target_language: "es".into(),
            context: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("context").is_none());
    }
}
