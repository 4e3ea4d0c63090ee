// Orchestrator - drives detection on submit and translation on request

use super::gateway::LanguageServiceGateway;
use super::types::{
    Availability, ConversationEvent, LanguageCode, Message, Notice, SupportedLanguage,
};
use crate::config::ConversationConfig;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Capability state resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub detection_supported: bool,
}

impl Capabilities {
    pub async fn probe(gateway: &LanguageServiceGateway) -> Self {
        let detection_supported = gateway.probe_detection_support().await;
        info!(detection_supported, "language capabilities resolved");
        Self { detection_supported }
    }
}

struct ConversationState {
    messages: Vec<Message>,
    target_language: LanguageCode,
    draft: String,
}

/// Owns the conversation and mediates every gateway call
pub struct ConversationOrchestrator {
    gateway: Arc<LanguageServiceGateway>,
    capabilities: Capabilities,
    config: ConversationConfig,
    state: RwLock<ConversationState>,
    events: broadcast::Sender<ConversationEvent>,
}

impl ConversationOrchestrator {
    pub fn new(
        gateway: Arc<LanguageServiceGateway>,
        config: ConversationConfig,
        capabilities: Capabilities,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state = ConversationState {
            messages: Vec::new(),
            target_language: config.target_language.clone(),
            draft: String::new(),
        };

        Self {
            gateway,
            capabilities,
            config,
            state: RwLock::new(state),
            events,
        }
    }

    /// Probe capabilities, then build the orchestrator
    pub async fn bootstrap(gateway: Arc<LanguageServiceGateway>, config: ConversationConfig) -> Self {
        let capabilities = Capabilities::probe(&gateway).await;
        Self::new(gateway, config, capabilities)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    pub fn detection_supported(&self) -> bool {
        self.capabilities.detection_supported
    }

    pub fn supported_languages(&self) -> &[SupportedLanguage] {
        &self.config.languages
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.messages.clone()
    }

    pub async fn message(&self, index: usize) -> Option<Message> {
        self.state.read().await.messages.get(index).cloned()
    }

    pub async fn target_language(&self) -> LanguageCode {
        self.state.read().await.target_language.clone()
    }

    /// Select the target for later translation requests
    pub async fn set_target_language(&self, code: impl Into<LanguageCode>) -> Result<(), ConversationError> {
        let code = code.into();
        if !self.config.is_supported(&code) {
            return Err(ConversationError::UnsupportedLanguage(code));
        }

        debug!(language = %code, "target language selected");
        self.state.write().await.target_language = code;
        Ok(())
    }

    pub async fn draft(&self) -> String {
        self.state.read().await.draft.clone()
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.state.write().await.draft = text.into();
    }

    /// Submit the draft; it is cleared once a message was appended.
    ///
    /// Input set while detection was pending replaces the submitted text and is kept.
    pub async fn send_draft(&self) -> Option<usize> {
        let draft = self.draft().await;
        let index = self.submit(&draft).await?;

        let mut state = self.state.write().await;
        if state.draft == draft {
            state.draft.clear();
        }
        Some(index)
    }

    /// Append a message for `raw_text`, detecting its language first when supported.
    ///
    /// Whitespace-only input is ignored. The message is only appended once
    /// detection has resolved, so it never shows up without its final language.
    pub async fn submit(&self, raw_text: &str) -> Option<usize> {
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let detected = if self.capabilities.detection_supported {
            match self.gateway.detect_language(trimmed).await {
                Ok(code) => Some(code),
                Err(e) => {
                    warn!(error = %e, "language detection failed");
                    Some(LanguageCode::unknown())
                }
            }
        } else {
            None
        };

        let index = {
            let mut state = self.state.write().await;
            state.messages.push(Message::new(raw_text, detected.clone()));
            state.messages.len() - 1
        };

        info!(
            index,
            detected = detected.as_ref().map(|c| c.as_str()).unwrap_or("-"),
            "message appended"
        );
        self.emit(ConversationEvent::MessageAppended { index });
        Some(index)
    }

    /// Translate the message at `index` into the current target language.
    ///
    /// Failures leave the message untouched and are also broadcast as a notice.
    pub async fn request_translation(&self, index: usize) -> Result<(), TranslationError> {
        let result = self.translate_message(index).await;

        if let Err(e) = &result {
            warn!(index, error = %e, "translation request failed");
            if let Some(notice) = e.notice() {
                self.emit(ConversationEvent::Notice(notice));
            }
        }

        result
    }

    async fn translate_message(&self, index: usize) -> Result<(), TranslationError> {
        let (text, source, target) = {
            let state = self.state.read().await;
            let message = state
                .messages
                .get(index)
                .ok_or(TranslationError::MessageNotFound(index))?;

            if !message.translation_offered() {
                return Err(TranslationError::NotOffered(index));
            }

            let source = message
                .detected_language()
                .cloned()
                .unwrap_or_else(|| self.config.fallback_source_language.clone());

            (message.text().to_string(), source, state.target_language.clone())
        };

        if !self.gateway.translator_present() {
            return Err(TranslationError::ServiceUnavailable);
        }

        match self
            .gateway
            .probe_translation_pair_availability(&source, &target)
            .await
        {
            Availability::Available => {}
            Availability::Unknown => {
                debug!(from = %source, to = %target, "pair availability unknown, translating anyway");
            }
            Availability::Unavailable => {
                return Err(TranslationError::UnsupportedPair(source, target));
            }
        }

        let translated = self
            .gateway
            .translate(&source, &target, &text)
            .await
            .map_err(|e| TranslationError::TranslationFailed(e.to_string()))?;

        // Same-message requests are not serialized: the last one to finish wins
        if let Some(message) = self.state.write().await.messages.get_mut(index) {
            message.record_translation(&target, &translated);
        }

        info!(index, from = %source, to = %target, "message translated");
        self.emit(ConversationEvent::MessageTranslated { index });
        Ok(())
    }

    fn emit(&self, event: ConversationEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationError {
    #[error("Translation service unavailable")]
    ServiceUnavailable,

    #[error("Unsupported language pair: {0} -> {1}")]
    UnsupportedPair(LanguageCode, LanguageCode),

    #[error("Translation failed: {0}")]
    TranslationFailed(String),

    #[error("No message at index {0}")]
    MessageNotFound(usize),

    #[error("Translation no longer offered for message {0}")]
    NotOffered(usize),
}

impl TranslationError {
    /// User-facing notification, for the failures a user can act on
    pub fn notice(&self) -> Option<Notice> {
        match self {
            TranslationError::ServiceUnavailable => Some(Notice::warning(
                "Translation API is not supported in this environment.",
            )),
            TranslationError::UnsupportedPair(source, target) => Some(Notice::error(format!(
                "Translation from {} to {} is not supported.",
                source, target
            ))),
            TranslationError::TranslationFailed(_) => Some(Notice::error(
                "An error occurred during translation. Please try again.",
            )),
            TranslationError::MessageNotFound(_) | TranslationError::NotOffered(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversationError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(LanguageCode),
}
