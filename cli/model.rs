use codeloom_core::analysis::ModelClient;
use codeloom_core::{AppError, Result};
use serde_json::{Value, json};
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Blocking HTTP client for the Gemini `generateContent` endpoint. The
/// API key arrives here explicitly; nothing in the core crate ever
/// touches the environment or the network.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model_name: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model_name: String) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Model(format!("Failed to build HTTP client: {}", e)))?;
        Ok(GeminiClient {
            http,
            api_key,
            model_name,
        })
    }
}

impl ModelClient for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, self.model_name, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.7,
                "topP": 0.95,
                "topK": 40,
                "maxOutputTokens": 8192
            }
        });

        log::debug!(
            "Sending {} byte prompt to model {}",
            prompt.len(),
            self.model_name
        );
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| AppError::Model(format!("Model request failed: {}", e)))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .map_err(|e| AppError::Model(format!("Model response was not JSON: {}", e)))?;
        if !status.is_success() {
            return Err(AppError::Model(format!(
                "Model API returned {}: {}",
                status, payload
            )));
        }

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::Model(format!("Unexpected model response shape: {}", payload))
            })
    }
}
