//! HTTP client for the serving application (issuing side).
//! Fetches whole-language bundles of pre-approved translations and forwards
//! single or batch live requests to the serving side's translation surface.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::context::ContextTag;
use super::{
    BatchTranslateRequest, BatchTranslateResponse, BulkSource, LiveTranslator, TranslateError,
    TranslateRequest, TranslateResponse, TranslationBundle,
};

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TranslateError> {
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
        Ok(response)
    }
}

#[async_trait]
impl BulkSource for GatewayClient {
    async fn fetch_language(
        &self,
        language: &str,
    ) -> Result<HashMap<String, String>, TranslateError> {
        let response = self
            .http
            .get(format!("{}/translations/{}", self.base_url, language))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let bundle: TranslationBundle = response.json().await?;
        debug!(language, count = bundle.count, "translation bundle fetched");
        Ok(bundle.translations)
    }
}

#[async_trait]
impl LiveTranslator for GatewayClient {
    async fn translate_one(
        &self,
        text: &str,
        language: &str,
        context: ContextTag,
    ) -> Result<String, TranslateError> {
        let request = TranslateRequest {
            text: text.to_string(),
            target_language: language.to_string(),
            context: Some(context.as_str().to_string()),
        };
        let response = self
            .http
            .post(format!("{}/translate", self.base_url))
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let parsed: TranslateResponse = response.json().await?;
        Ok(parsed.translated_text)
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
        let request = BatchTranslateRequest {
            texts: texts.to_vec(),
            target_language: language.to_string(),
            context: Some(context.as_str().to_string()),
        };
        let response = self
            .http
            .post(format!("{}/batch-translate", self.base_url))
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let parsed: BatchTranslateResponse = response.json().await?;

        if parsed.translations.len() != texts.len() {
            return Err(TranslateError::CountMismatch {
                expected: texts.len(),
                got: parsed.translations.len(),
            });
        }
        Ok(parsed.translations)
    }
}
