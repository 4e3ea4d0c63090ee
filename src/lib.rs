//! Polyglot - chat messages with automatic language detection and on-demand translation
//!
//! The [`conversation::ConversationOrchestrator`] owns the message log and talks to the
//! detector and translator through a [`conversation::LanguageServiceGateway`]. Both
//! services are injected as [`conversation::Capability`] values so a missing service is
//! an ordinary state, not an error.

pub mod config;
pub mod conversation;
