// Deterministic in-memory services for tests

use super::{DetectorInstance, DetectorService, GatewayError, TranslatorInstance, TranslatorService};
use crate::conversation::types::{DetectionCandidate, LanguageCode, LanguagePair, Readiness};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub struct FakeDetector {
    readiness: Readiness,
    candidates: Vec<DetectionCandidate>,
    fail_capabilities: bool,
    fail_detect: bool,
    delay: Option<Duration>,
}

impl FakeDetector {
    /// Detector that always answers `language`
    pub fn new(language: &str) -> Self {
        Self::ranked(vec![DetectionCandidate::new(language, 0.9)])
    }

    pub fn ranked(candidates: Vec<DetectionCandidate>) -> Self {
        Self {
            readiness: Readiness::Readily,
            candidates,
            fail_capabilities: false,
            fail_detect: false,
            delay: None,
        }
    }

    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn failing_capabilities(mut self) -> Self {
        self.fail_capabilities = true;
        self
    }

    pub fn failing_detect(mut self) -> Self {
        self.fail_detect = true;
        self
    }

    /// Every detection takes `delay` to resolve
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl DetectorService for FakeDetector {
    async fn capabilities(&self) -> Result<Readiness, GatewayError> {
        if self.fail_capabilities {
            return Err(GatewayError::Network("detector unreachable".to_string()));
        }
        Ok(self.readiness)
    }

    async fn create(&self) -> Result<Box<dyn DetectorInstance>, GatewayError> {
        Ok(Box::new(FakeDetectorInstance {
            candidates: self.candidates.clone(),
            fail: self.fail_detect,
            delay: self.delay,
        }))
    }
}

struct FakeDetectorInstance {
    candidates: Vec<DetectionCandidate>,
    fail: bool,
    delay: Option<Duration>,
}

#[async_trait]
impl DetectorInstance for FakeDetectorInstance {
    async fn detect(&self, _text: &str) -> Result<Vec<DetectionCandidate>, GatewayError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(GatewayError::Detection("model not loaded".to_string()));
        }
        Ok(self.candidates.clone())
    }
}

/// Translator with a phrase table; unknown phrases come back as "[target] text"
pub struct FakeTranslator {
    phrases: HashMap<String, String>,
    unsupported: HashSet<LanguagePair>,
    delays: HashMap<LanguageCode, Duration>,
    fail_probe: bool,
    fail_create: bool,
    fail_translate: bool,
    probed: Arc<std::sync::Mutex<Vec<LanguagePair>>>,
    created: AtomicUsize,
    translated: Arc<AtomicUsize>,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self {
            phrases: HashMap::new(),
            unsupported: HashSet::new(),
            delays: HashMap::new(),
            fail_probe: false,
            fail_create: false,
            fail_translate: false,
            probed: Arc::new(std::sync::Mutex::new(Vec::new())),
            created: AtomicUsize::new(0),
            translated: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_phrase(mut self, text: &str, translated: &str) -> Self {
        self.phrases.insert(text.to_string(), translated.to_string());
        self
    }

    pub fn with_unsupported_pair(mut self, source: &str, target: &str) -> Self {
        self.unsupported.insert(LanguagePair::new(source, target));
        self
    }

    /// Translations into `target` take `delay` to resolve
    pub fn with_delay(mut self, target: &str, delay: Duration) -> Self {
        self.delays.insert(target.into(), delay);
        self
    }

    pub fn failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_translate(mut self) -> Self {
        self.fail_translate = true;
        self
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn translated(&self) -> usize {
        self.translated.load(Ordering::SeqCst)
    }

    pub fn probed(&self) -> Vec<LanguagePair> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslatorService for FakeTranslator {
    async fn language_pair_available(&self, pair: &LanguagePair) -> Result<Readiness, GatewayError> {
        self.probed.lock().unwrap().push(pair.clone());
        if self.fail_probe {
            return Err(GatewayError::Network("translator unreachable".to_string()));
        }
        if self.unsupported.contains(pair) {
            return Ok(Readiness::No);
        }
        Ok(Readiness::Readily)
    }

    async fn create(&self, pair: &LanguagePair) -> Result<Arc<dyn TranslatorInstance>, GatewayError> {
        if self.fail_create {
            return Err(GatewayError::Translation("model download failed".to_string()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeTranslatorInstance {
            target: pair.target.clone(),
            phrases: self.phrases.clone(),
            delay: self.delays.get(&pair.target).copied(),
            fail: self.fail_translate,
            translated: self.translated.clone(),
        }))
    }
}

struct FakeTranslatorInstance {
    target: LanguageCode,
    phrases: HashMap<String, String>,
    delay: Option<Duration>,
    fail: bool,
    translated: Arc<AtomicUsize>,
}

#[async_trait]
impl TranslatorInstance for FakeTranslatorInstance {
    async fn translate(&self, text: &str) -> Result<String, GatewayError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(GatewayError::Translation("translator crashed".to_string()));
        }
        self.translated.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .phrases
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", self.target, text)))
    }
}
