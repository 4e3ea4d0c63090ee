// Conversation system - language detection and on-demand translation of chat messages

pub mod gateway;
pub mod orchestrator;
pub mod types;

pub use gateway::{
    Capability, DetectorInstance, DetectorService, GatewayError, LanguageServiceGateway, OllamaBackend,
    TranslatorInstance, TranslatorService,
};
pub use orchestrator::{Capabilities, ConversationError, ConversationOrchestrator, TranslationError};
pub use types::*;
