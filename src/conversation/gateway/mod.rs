// Language service gateway - probes and invokes the detector and translator services

mod ollama;

#[cfg(test)]
pub(crate) mod fakes;

pub use ollama::OllamaBackend;

use super::types::{Availability, DetectionCandidate, LanguageCode, LanguagePair, Readiness};
use crate::config::GatewayConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Host-provided language detection service
#[async_trait]
pub trait DetectorService: Send + Sync {
    async fn capabilities(&self) -> Result<Readiness, GatewayError>;

    async fn create(&self) -> Result<Box<dyn DetectorInstance>, GatewayError>;
}

#[async_trait]
pub trait DetectorInstance: Send + Sync {
    /// Candidates ordered best first
    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>, GatewayError>;
}

/// Host-provided translation service, gated per language pair
#[async_trait]
pub trait TranslatorService: Send + Sync {
    async fn language_pair_available(&self, pair: &LanguagePair) -> Result<Readiness, GatewayError>;

    async fn create(&self, pair: &LanguagePair) -> Result<Arc<dyn TranslatorInstance>, GatewayError>;
}

#[async_trait]
pub trait TranslatorInstance: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, GatewayError>;
}

/// A service that may be missing from the host environment
pub enum Capability<T: ?Sized> {
    Unavailable,
    Available(Arc<T>),
}

impl<T: ?Sized> Capability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    fn get(&self) -> Option<&Arc<T>> {
        match self {
            Capability::Available(service) => Some(service),
            Capability::Unavailable => None,
        }
    }
}

impl<T: ?Sized> Clone for Capability<T> {
    fn clone(&self) -> Self {
        match self {
            Capability::Available(service) => Capability::Available(service.clone()),
            Capability::Unavailable => Capability::Unavailable,
        }
    }
}

impl<T: ?Sized> From<Option<Arc<T>>> for Capability<T> {
    fn from(service: Option<Arc<T>>) -> Self {
        match service {
            Some(service) => Capability::Available(service),
            None => Capability::Unavailable,
        }
    }
}

/// Stable contract in front of the two capability-gated services
pub struct LanguageServiceGateway {
    detector: Capability<dyn DetectorService>,
    translator: Capability<dyn TranslatorService>,
    cache_translators: bool,
    translators: Mutex<HashMap<LanguagePair, Arc<dyn TranslatorInstance>>>,
}

impl LanguageServiceGateway {
    pub fn new(
        detector: Capability<dyn DetectorService>,
        translator: Capability<dyn TranslatorService>,
    ) -> Self {
        Self {
            detector,
            translator,
            cache_translators: false,
            translators: Mutex::new(HashMap::new()),
        }
    }

    /// Build a gateway honoring activation tokens and caching settings
    pub fn with_config(
        detector: Capability<dyn DetectorService>,
        translator: Capability<dyn TranslatorService>,
        config: &GatewayConfig,
    ) -> Self {
        let detector = if config.detector_activated() {
            detector
        } else {
            if detector.is_available() {
                warn!("language detector has no activation token, treating it as absent");
            }
            Capability::Unavailable
        };

        let translator = if config.translator_activated() {
            translator
        } else {
            if translator.is_available() {
                warn!("translator has no activation token, treating it as absent");
            }
            Capability::Unavailable
        };

        let mut gateway = Self::new(detector, translator);
        gateway.cache_translators = config.cache_translators;
        gateway
    }

    /// Whether language detection can be used in this environment
    pub async fn probe_detection_support(&self) -> bool {
        let Some(detector) = self.detector.get() else {
            debug!("language detector absent");
            return false;
        };

        match detector.capabilities().await {
            Ok(readiness) => {
                debug!(?readiness, "language detector capabilities");
                readiness.is_usable()
            }
            Err(e) => {
                warn!(error = %e, "language detector capability query failed");
                false
            }
        }
    }

    /// Most probable language of `text`, or "unknown" when the detector has no answer
    pub async fn detect_language(&self, text: &str) -> Result<LanguageCode, GatewayError> {
        let detector = self
            .detector
            .get()
            .ok_or(GatewayError::ServiceAbsent("language detector"))?;

        let instance = detector.create().await?;
        let candidates = instance.detect(text).await?;

        Ok(candidates
            .into_iter()
            .next()
            .map(|c| c.language)
            .unwrap_or_else(LanguageCode::unknown))
    }

    pub fn translator_present(&self) -> bool {
        self.translator.is_available()
    }

    pub async fn probe_translation_pair_availability(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Availability {
        let Some(translator) = self.translator.get() else {
            return Availability::Unavailable;
        };

        let pair = LanguagePair::new(source.clone(), target.clone());
        match translator.language_pair_available(&pair).await {
            Ok(readiness) if readiness.is_usable() => Availability::Available,
            Ok(_) => Availability::Unavailable,
            Err(e) => {
                warn!(%pair, error = %e, "language pair probe failed");
                Availability::Unknown
            }
        }
    }

    pub async fn translate(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
        text: &str,
    ) -> Result<String, GatewayError> {
        let translator = self
            .translator
            .get()
            .ok_or(GatewayError::ServiceAbsent("translator"))?;

        let pair = LanguagePair::new(source.clone(), target.clone());
        let instance = self
            .translator_instance(translator, &pair)
            .await
            .map_err(as_translation_error)?;

        instance.translate(text).await.map_err(as_translation_error)
    }

    async fn translator_instance(
        &self,
        translator: &Arc<dyn TranslatorService>,
        pair: &LanguagePair,
    ) -> Result<Arc<dyn TranslatorInstance>, GatewayError> {
        if !self.cache_translators {
            return translator.create(pair).await;
        }

        if let Some(instance) = self.translators.lock().await.get(pair) {
            return Ok(instance.clone());
        }

        // Created outside the lock; a concurrent miss for the same pair just creates twice
        let instance = translator.create(pair).await?;
        self.translators
            .lock()
            .await
            .entry(pair.clone())
            .or_insert_with(|| instance.clone());
        debug!(%pair, "cached translator instance");
        Ok(instance)
    }
}

fn as_translation_error(err: GatewayError) -> GatewayError {
    match err {
        GatewayError::Translation(msg) => GatewayError::Translation(msg),
        other => GatewayError::Translation(other.to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Service absent: {0}")]
    ServiceAbsent(&'static str),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
