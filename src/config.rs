//! Configuration file support

use crate::conversation::types::{LanguageCode, SupportedLanguage};
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const TRANSLATOR_TOKEN_ENV: &str = "POLYGLOT_TRANSLATOR_TOKEN";
pub const LANGUAGE_TOKEN_ENV: &str = "POLYGLOT_LANGUAGE_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Initial translation target
    #[serde(default = "default_target_language")]
    pub target_language: LanguageCode,

    /// Source used when a message has no detected language
    #[serde(default = "default_fallback_source")]
    pub fallback_source_language: LanguageCode,

    #[serde(default = "default_languages")]
    pub languages: Vec<SupportedLanguage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Keep one translator instance per language pair
    #[serde(default = "default_cache_translators")]
    pub cache_translators: bool,

    /// Treat a service without its activation token as absent
    #[serde(default)]
    pub require_activation: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_detector_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

// Defaults

fn default_target_language() -> LanguageCode {
    LanguageCode::new("fr")
}

fn default_fallback_source() -> LanguageCode {
    LanguageCode::new("en")
}

fn default_languages() -> Vec<SupportedLanguage> {
    vec![
        SupportedLanguage::new("en", "English"),
        SupportedLanguage::new("pt", "Portuguese"),
        SupportedLanguage::new("es", "Spanish"),
        SupportedLanguage::new("ru", "Russian"),
        SupportedLanguage::new("tr", "Turkish"),
        SupportedLanguage::new("fr", "French"),
    ]
}

fn default_cache_translators() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_timeout_ms() -> u64 {
    60000
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            fallback_source_language: default_fallback_source(),
            languages: default_languages(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache_translators: default_cache_translators(),
            require_activation: false,
            translator_token: None,
            language_detector_token: None,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ConversationConfig {
    pub fn is_supported(&self, code: &LanguageCode) -> bool {
        self.languages.iter().any(|l| &l.code == code)
    }

    /// Check the language list against the configured defaults
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.languages.is_empty() {
            bail!("at least one language must be configured");
        }

        let mut seen = HashSet::new();
        for language in &self.languages {
            if language.code.as_str().trim().is_empty() {
                bail!("language '{}' has an empty code", language.name);
            }
            if !seen.insert(&language.code) {
                bail!("language code '{}' is listed more than once", language.code);
            }
        }

        if !self.is_supported(&self.target_language) {
            bail!("target language '{}' is not in the language list", self.target_language);
        }
        if !self.is_supported(&self.fallback_source_language) {
            bail!(
                "fallback source language '{}' is not in the language list",
                self.fallback_source_language
            );
        }

        Ok(())
    }
}

impl GatewayConfig {
    /// Fill missing activation tokens from the environment
    pub fn apply_env(&mut self) {
        self.apply_tokens(
            std::env::var(TRANSLATOR_TOKEN_ENV).ok(),
            std::env::var(LANGUAGE_TOKEN_ENV).ok(),
        );
    }

    fn apply_tokens(&mut self, translator: Option<String>, language_detector: Option<String>) {
        if let Some(token) = translator.filter(|t| !t.trim().is_empty()) {
            self.translator_token = Some(token);
        }
        if let Some(token) = language_detector.filter(|t| !t.trim().is_empty()) {
            self.language_detector_token = Some(token);
        }
    }

    pub fn translator_activated(&self) -> bool {
        !self.require_activation || has_token(&self.translator_token)
    }

    pub fn detector_activated(&self) -> bool {
        !self.require_activation || has_token(&self.language_detector_token)
    }
}

fn has_token(token: &Option<String>) -> bool {
    token.as_deref().is_some_and(|t| !t.trim().is_empty())
}

impl AppConfig {
    /// Default location: <config dir>/polyglot/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("polyglot").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.conversation.validate()?;
        Ok(config)
    }

    /// Explicit path must exist; the default path falls back to defaults when absent
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };
        config.gateway.apply_env();
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.conversation.target_language, "fr");
        assert_eq!(config.conversation.fallback_source_language, "en");
        assert_eq!(config.conversation.languages.len(), 6);
        assert!(config.gateway.cache_translators);
        assert!(config.conversation.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
[conversation]
target_language = "es"

[ollama]
model = "gemma3:12b"
"#,
        )
        .unwrap();
        assert_eq!(config.conversation.target_language, "es");
        assert_eq!(config.conversation.languages.len(), 6);
        assert_eq!(config.ollama.model, "gemma3:12b");
        assert_eq!(config.ollama.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_custom_language_list() {
        let config = AppConfig::from_toml(
            r#"
[conversation]
target_language = "de"
fallback_source_language = "de"
languages = [{ code = "de", name = "German" }, { code = "it", name = "Italian" }]
"#,
        )
        .unwrap();
        assert!(config.conversation.is_supported(&"it".into()));
        assert!(!config.conversation.is_supported(&"fr".into()));
    }

    #[test]
    fn test_target_outside_list_rejected() {
        let result = AppConfig::from_toml(
            r#"
[conversation]
target_language = "ja"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let config = ConversationConfig {
            languages: vec![
                SupportedLanguage::new("en", "English"),
                SupportedLanguage::new("fr", "French"),
                SupportedLanguage::new("fr", "Français"),
            ],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_activation_requires_tokens() {
        let mut gateway = GatewayConfig {
            require_activation: true,
            ..Default::default()
        };
        assert!(!gateway.translator_activated());
        assert!(!gateway.detector_activated());

        gateway.apply_tokens(Some("abc".to_string()), Some("   ".to_string()));
        assert!(gateway.translator_activated());
        assert!(!gateway.detector_activated());

        gateway.require_activation = false;
        assert!(gateway.detector_activated());
    }

    #[test]
    fn test_round_trip_file() {
        let path = std::env::temp_dir().join(format!("polyglot-config-{}.toml", std::process::id()));
        let mut config = AppConfig::default();
        config.conversation.target_language = "ru".into();
        config.to_file(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.conversation.target_language, "ru");
        let _ = std::fs::remove_file(&path);
    }
}
