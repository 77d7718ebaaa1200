//! Generative answerer backed by a local Ollama server (`POST /api/generate`).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use caserag_core::config::AnswererSettings;
use caserag_core::error::{Error, Result};
use caserag_core::traits::Answerer;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaAnswerer {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaAnswerer {
    pub fn new(settings: &AnswererSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| Error::Generation(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/api/generate", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }
}

impl Answerer for OllamaAnswerer {
    fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest { model: &self.model, prompt, stream: false, options: GenerateOptions { temperature: self.temperature } };
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "ollama generate");
        let response = self.client.post(&self.url).json(&request).send()
            .map_err(|e| Error::Generation(format!("request to {} failed: {e}", self.url)))?;
        let status = response.status();
        let body = response.text().map_err(|e| Error::Generation(format!("reading response failed: {e}")))?;
        if !status.is_success() {
            return Err(Error::Generation(format!("ollama returned {status}: {body}")));
        }
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<String> {
    let parsed: GenerateResponse = serde_json::from_str(body).map_err(|e| Error::Generation(format!("unexpected response body: {e}")))?;
    Ok(parsed.response.trim().to_string())
}
