// Ollama backend - detection and translation through a local LLM

use super::{DetectorInstance, DetectorService, GatewayError, TranslatorInstance, TranslatorService};
use crate::config::OllamaConfig;
use crate::conversation::types::{DetectionCandidate, LanguagePair, Readiness, SupportedLanguage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Serves both the detector and the translator capability from one Ollama model
#[derive(Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    languages: Vec<SupportedLanguage>,
}

impl OllamaBackend {
    pub fn new(config: &OllamaConfig, languages: Vec<SupportedLanguage>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            languages,
        })
    }

    fn language_name(&self, code: &str) -> String {
        self.languages
            .iter()
            .find(|l| l.code == code)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| code.to_string())
    }

    /// Model readiness from the list of locally pulled models
    async fn readiness(&self) -> Readiness {
        let response = match self.client.get(format!("{}/api/tags", self.endpoint)).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "ollama tags request rejected");
                return Readiness::No;
            }
            Err(e) => {
                debug!(error = %e, "ollama unreachable");
                return Readiness::No;
            }
        };

        match response.json::<TagsResponse>().await {
            Ok(tags) => readiness_for(&self.model, &tags),
            Err(_) => Readiness::No,
        }
    }

    async fn chat(&self, system: String, user: String, json: bool) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            stream: false,
            format: json.then(|| "json".to_string()),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Network(format!(
                "Ollama request failed: {}",
                response.status()
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        Ok(chat_response.message.content)
    }

    fn detection_prompt(&self) -> String {
        let known = self
            .languages
            .iter()
            .map(|l| format!("{} ({})", l.code, l.name))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"You identify the language of the text you are given.

Respond with JSON in this exact format:
{{
  "candidates": [{{ "language": "<ISO 639-1 code>", "confidence": <0.0-1.0> }}]
}}

List the most likely language first. Prefer these codes when they apply: {}.
If the language cannot be determined, return an empty list.
Respond ONLY with valid JSON, no other text."#,
            known
        )
    }

    fn translation_prompt(&self, pair: &LanguagePair) -> String {
        let source = if pair.source.is_unknown() {
            "the source language".to_string()
        } else {
            self.language_name(pair.source.as_str())
        };

        format!(
            "Translate the user's message from {} into {}. \
             Output ONLY the translation, with no quotes, notes or explanations.",
            source,
            self.language_name(pair.target.as_str())
        )
    }
}

fn readiness_for(model: &str, tags: &TagsResponse) -> Readiness {
    let pulled = tags.models.iter().any(|m| {
        m.name == model || m.name.strip_suffix(":latest").is_some_and(|base| base == model)
    });

    if pulled {
        Readiness::Readily
    } else {
        Readiness::AfterDownload
    }
}

/// Parse the model's JSON reply into candidates ordered best first
fn parse_candidates(content: &str) -> Result<Vec<DetectionCandidate>, GatewayError> {
    if content.trim().is_empty() {
        return Err(GatewayError::Detection("model returned an empty reply".to_string()));
    }

    let reply: DetectionReply = serde_json::from_str(content)
        .map_err(|e| GatewayError::Detection(format!("unreadable detection reply: {}", e)))?;

    let mut candidates: Vec<DetectionCandidate> = reply
        .candidates
        .into_iter()
        .filter(|c| !c.language.as_str().trim().is_empty())
        .map(|c| DetectionCandidate::new(c.language.as_str().trim().to_lowercase(), c.confidence))
        .collect();
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    Ok(candidates)
}

#[async_trait]
impl DetectorService for OllamaBackend {
    async fn capabilities(&self) -> Result<Readiness, GatewayError> {
        Ok(self.readiness().await)
    }

    async fn create(&self) -> Result<Box<dyn DetectorInstance>, GatewayError> {
        Ok(Box::new(OllamaDetector {
            backend: self.clone(),
        }))
    }
}

#[async_trait]
impl TranslatorService for OllamaBackend {
    async fn language_pair_available(&self, pair: &LanguagePair) -> Result<Readiness, GatewayError> {
        let known = |code: &str| self.languages.iter().any(|l| l.code == code);
        let source_ok = pair.source.is_unknown() || known(pair.source.as_str());

        if source_ok && known(pair.target.as_str()) && pair.source != pair.target {
            Ok(Readiness::Readily)
        } else {
            Ok(Readiness::No)
        }
    }

    async fn create(&self, pair: &LanguagePair) -> Result<Arc<dyn TranslatorInstance>, GatewayError> {
        Ok(Arc::new(OllamaTranslator {
            system_prompt: self.translation_prompt(pair),
            backend: self.clone(),
        }))
    }
}

struct OllamaDetector {
    backend: OllamaBackend,
}

#[async_trait]
impl DetectorInstance for OllamaDetector {
    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>, GatewayError> {
        let content = self
            .backend
            .chat(self.backend.detection_prompt(), text.to_string(), true)
            .await?;
        parse_candidates(&content)
    }
}

struct OllamaTranslator {
    backend: OllamaBackend,
    system_prompt: String,
}

#[async_trait]
impl TranslatorInstance for OllamaTranslator {
    async fn translate(&self, text: &str) -> Result<String, GatewayError> {
        let content = self
            .backend
            .chat(self.system_prompt.clone(), text.to_string(), false)
            .await?;

        let translated = content.trim();
        if translated.is_empty() {
            return Err(GatewayError::Translation("model returned an empty reply".to_string()));
        }
        Ok(translated.to_string())
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

#[derive(Deserialize)]
struct DetectionReply {
    #[serde(default)]
    candidates: Vec<DetectionCandidate>,
}
