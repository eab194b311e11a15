//! Hugging Face Inference API enhancer.
//!
//! Sends the insight summaries to an instruction-tuned text-generation model
//! (<https://huggingface.co/inference-api>) and asks for a short executive
//! summary.

use super::InsightEnhancer;
use anyhow::{Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model endpoint.
const DEFAULT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.1";

/// Default timeout for API requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Closing tag of the instruction block; the generated text echoes the prompt
/// up to and including it.
const INSTRUCTION_END: &str = "[/INST]";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: Option<String>,
}

/// Configuration for the Hugging Face enhancer.
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    /// Full URL of the model's inference endpoint.
    pub model_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            model_url: DEFAULT_MODEL_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HuggingFaceConfig {
    /// Create a new configuration builder.
    pub fn builder() -> HuggingFaceConfigBuilder {
        HuggingFaceConfigBuilder::default()
    }
}

/// Builder for [`HuggingFaceConfig`].
#[derive(Default)]
pub struct HuggingFaceConfigBuilder {
    model_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl HuggingFaceConfigBuilder {
    /// Set the model endpoint URL.
    pub fn model_url(mut self, model_url: impl Into<String>) -> Self {
        self.model_url = Some(model_url.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> HuggingFaceConfig {
        HuggingFaceConfig {
            model_url: self
                .model_url
                .unwrap_or_else(|| DEFAULT_MODEL_URL.to_string()),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Narrative enhancer backed by the Hugging Face Inference API.
///
/// # Example
///
/// ```rust,ignore
/// use report_pipeline::ai::{HuggingFaceConfig, HuggingFaceEnhancer};
///
/// let enhancer = HuggingFaceEnhancer::new("hf_...")?;
///
/// let config = HuggingFaceConfig::builder().timeout_secs(10).build();
/// let enhancer = HuggingFaceEnhancer::with_config("hf_...", config)?;
/// ```
pub struct HuggingFaceEnhancer {
    api_token: String,
    config: HuggingFaceConfig,
    client: Client,
}

impl HuggingFaceEnhancer {
    /// Create an enhancer with the default model.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_config(api_token, HuggingFaceConfig::default())
    }

    /// Create an enhancer with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(api_token: impl Into<String>, config: HuggingFaceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            api_token: api_token.into(),
            config,
            client,
        })
    }

    fn call_api(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.config.model_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&InferenceRequest { inputs: prompt })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Hugging Face API Error {}: {}",
                status,
                response.text()?
            ));
        }

        let generations: Vec<Generation> = response.json()?;
        generations
            .into_iter()
            .next()
            .and_then(|g| g.generated_text)
            .ok_or_else(|| anyhow!("No generated text in Hugging Face response"))
    }
}

/// Build the instruction prompt around the insight summaries.
fn build_prompt(insights: &str) -> String {
    format!(
        "[INST] You are a data analyst. Create a 3-paragraph executive summary \
        from these insights:\n{}\n\n\
        Focus on:\n\
        - Key trends\n\
        - Business implications\n\
        - Actionable recommendations\n\
        Use simple, professional language. {}",
        insights, INSTRUCTION_END
    )
}

/// Keep only the model's answer: the text after the last instruction tag.
fn extract_narrative(generated: &str) -> Result<String> {
    let answer = generated
        .rsplit(INSTRUCTION_END)
        .next()
        .unwrap_or(generated)
        .trim();

    if answer.is_empty() {
        return Err(anyhow!("Hugging Face returned an empty narrative"));
    }
    Ok(answer.to_string())
}

impl InsightEnhancer for HuggingFaceEnhancer {
    fn enhance(&self, insights: &str) -> Result<String> {
        let prompt = build_prompt(insights);
        let generated = self.call_api(&prompt)?;
        extract_narrative(&generated)
    }

    fn name(&self) -> &str {
        "HuggingFace"
    }

    fn model(&self) -> Option<&str> {
        self.config.model_url.rsplit("/models/").next()
    }
}

// ============================================================================
// Tests
// ============================================================================
