// Core types for the conversation system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A language code as reported by the detector or chosen by the user ("en", "fr", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Detection was attempted but gave no usable answer
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for LanguageCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl PartialEq<str> for LanguageCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LanguageCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Entry of the configured language list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedLanguage {
    pub code: LanguageCode,
    pub name: String,
}

impl SupportedLanguage {
    pub fn new(code: impl Into<LanguageCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Source/target combination handed to the translator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguagePair {
    pub fn new(source: impl Into<LanguageCode>, target: impl Into<LanguageCode>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Readiness reported by a host capability query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Readiness {
    No,
    Readily,
    AfterDownload,
}

impl Readiness {
    pub fn is_usable(&self) -> bool {
        !matches!(self, Readiness::No)
    }
}

/// Outcome of a language pair probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown, // probe failed, treated optimistically
}

/// One ranked answer from the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    pub language: LanguageCode,
    #[serde(default)]
    pub confidence: f32,
}

impl DetectionCandidate {
    pub fn new(language: impl Into<LanguageCode>, confidence: f32) -> Self {
        Self {
            language: language.into(),
            confidence,
        }
    }
}

/// One user utterance and what has been derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    text: String,
    detected_language: Option<LanguageCode>,
    translation_offered: bool,
    translation: Option<String>,
    sent_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(text: impl Into<String>, detected_language: Option<LanguageCode>) -> Self {
        Self {
            text: text.into(),
            detected_language,
            translation_offered: true,
            translation: None,
            sent_at: Utc::now(),
        }
    }

    /// Original text exactly as entered
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn detected_language(&self) -> Option<&LanguageCode> {
        self.detected_language.as_ref()
    }

    /// Whether a translate control should be shown for this message
    pub fn translation_offered(&self) -> bool {
        self.translation_offered
    }

    pub fn translation(&self) -> Option<&str> {
        self.translation.as_deref()
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    pub(crate) fn record_translation(&mut self, target: &LanguageCode, translated: &str) {
        self.translation = Some(format_translation(target, translated));
        self.translation_offered = false;
    }
}

/// Label a translated text with its target language
pub fn format_translation(target: &LanguageCode, translated: &str) -> String {
    format!("Translated ({}): {}", target, translated)
}

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// Transient notification for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// State changes broadcast to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    MessageAppended { index: usize },
    MessageTranslated { index: usize },
    Notice(Notice),
}
