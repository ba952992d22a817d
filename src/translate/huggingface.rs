use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, TolkError};
use super::{CapabilityProvider, GenerationParams, IdentityCapability, LanguagePair, TranslationCapability};

#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
    pub parameters: InferenceParameters,
    pub options: InferenceOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceParameters {
    pub max_length: usize,
    pub num_beams: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceOptions {
    /// Block until a cold model is loaded instead of failing with 503
    pub wait_for_model: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceOutput {
    pub translation_text: String,
}

/// Acquires per-pair models from a Hugging Face style model hub
pub struct HuggingFaceProvider {
    client: Client,
    config: TranslateConfig,
    token: Option<String>,
    capabilities: HashMap<LanguagePair, Arc<HuggingFaceCapability>>,
}

impl HuggingFaceProvider {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("tolk/0.1.0")
            .build()?;

        let token = config
            .api_token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            client,
            config,
            token,
            capabilities: HashMap::new(),
        })
    }

    /// Model id serving `pair`: explicit override first, then the template
    pub fn model_id(&self, pair: &LanguagePair) -> String {
        match self.config.models.get(&pair.to_string()) {
            Some(model) => model.clone(),
            None => self
                .config
                .model_template
                .replace("{src}", &pair.source)
                .replace("{tgt}", &pair.target),
        }
    }

    async fn model_exists(&self, model_id: &str) -> Result<bool> {
        let url = format!("{}/api/models/{}", self.config.hub_endpoint, model_id);
        debug!("Checking model availability: {}", url);

        let response = with_token(self.client.get(&url), self.token.as_deref())
            .send()
            .await
            .map_err(|e| TolkError::Translation(format!("Failed to reach model hub: {}", e)))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            // The hub answers 401 instead of 404 for unknown repositories when unauthenticated
            StatusCode::UNAUTHORIZED if self.token.is_none() => Ok(false),
            StatusCode::UNAUTHORIZED => Err(TolkError::Translation(format!(
                "Model hub rejected the API token while looking up {}",
                model_id
            ))),
            status => Err(TolkError::Translation(format!(
                "Model hub returned {} for {}",
                status, model_id
            ))),
        }
    }
}

#[async_trait]
impl CapabilityProvider for HuggingFaceProvider {
    async fn acquire(&mut self, pair: &LanguagePair) -> Result<Arc<dyn TranslationCapability>> {
        if let Some(capability) = self.capabilities.get(pair) {
            return Ok(capability.clone());
        }

        // opus-mt publishes no same-language models; only an explicit override is looked up
        if pair.is_identity() && !self.config.models.contains_key(&pair.to_string()) {
            debug!("Passing {} through unchanged", pair);
            return Ok(Arc::new(IdentityCapability));
        }

        let model_id = self.model_id(pair);
        if !self.model_exists(&model_id).await? {
            info!("No model for {} ({} not found)", pair, model_id);
            return Err(TolkError::TranslationUnavailable(pair.clone()));
        }

        info!("Using model {} for {}", model_id, pair);
        let capability = Arc::new(HuggingFaceCapability {
            client: self.client.clone(),
            url: format!("{}/models/{}", self.config.endpoint, model_id),
            model_id,
            token: self.token.clone(),
        });
        self.capabilities.insert(pair.clone(), capability.clone());

        Ok(capability)
    }
}

/// One remote model translating a single language pair
pub struct HuggingFaceCapability {
    client: Client,
    url: String,
    model_id: String,
    token: Option<String>,
}

impl HuggingFaceCapability {
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl TranslationCapability for HuggingFaceCapability {
    async fn translate(&self, text: &str, params: &GenerationParams) -> Result<String> {
        let request = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                max_length: params.max_length,
                num_beams: params.num_beams,
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        debug!("Sending translation request to: {}", self.url);

        let response = with_token(self.client.post(&self.url), self.token.as_deref())
            .json(&request)
            .send()
            .await
            .map_err(|e| TolkError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TolkError::Translation(format!(
                "Inference API error {}: {}",
                status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TolkError::Translation(format!("Failed to read response: {}", e)))?;

        parse_inference_response(&body)
    }
}

fn with_token(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// Extract the translation from an inference response body
pub fn parse_inference_response(body: &str) -> Result<String> {
    let outputs: Vec<InferenceOutput> = serde_json::from_str(body)
        .map_err(|e| TolkError::Translation(format!("Failed to parse response: {}", e)))?;

    let text = outputs
        .into_iter()
        .next()
        .map(|output| output.translation_text.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(TolkError::Translation("Empty translation received".to_string()));
    }

    Ok(text)
}
