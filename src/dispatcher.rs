//! Translation dispatch.
//!
//! A request flows profile -> detection -> capability -> history. Detection and
//! capability failures abort before anything is recorded. A failure to record a
//! completed translation does not discard it: the text is returned together
//! with the history error.

use tracing::{info, warn};

use crate::config::Config;
use crate::detect::{DetectorFactory, LanguageDetector};
use crate::error::{Result, TolkError};
use crate::history::{HistoryLog, TranslationHistoryEntry};
use crate::profile::{ProfileRegistry, UserProfile};
use crate::store::JsonStore;
use crate::translate::{CapabilityProvider, GenerationParams, LanguagePair, ProviderFactory};

/// Result of a completed translation
#[derive(Debug)]
pub struct Translation {
    pub text: String,
    pub pair: LanguagePair,
    /// Set when the translation succeeded but could not be recorded
    pub history_error: Option<TolkError>,
}

impl Translation {
    pub fn is_recorded(&self) -> bool {
        self.history_error.is_none()
    }
}

pub struct TranslationDispatcher {
    profiles: ProfileRegistry,
    history: HistoryLog,
    detector: Box<dyn LanguageDetector>,
    provider: Box<dyn CapabilityProvider>,
    params: GenerationParams,
}

impl TranslationDispatcher {
    pub fn new(
        profiles: ProfileRegistry,
        history: HistoryLog,
        detector: Box<dyn LanguageDetector>,
        provider: Box<dyn CapabilityProvider>,
        params: GenerationParams,
    ) -> Self {
        Self {
            profiles,
            history,
            detector,
            provider,
            params,
        }
    }

    /// Build the dispatcher and its collaborators from configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = JsonStore::new(&config.storage.data_dir);
        let profiles = ProfileRegistry::load(
            store.clone(),
            config.storage.profiles_file.clone(),
            config.profile.default_target_lang.clone(),
        )
        .await?;
        let history = HistoryLog::new(store, config.storage.history_file.clone());
        let detector = DetectorFactory::create_detector(&config.detect)?;
        let provider = ProviderFactory::create_provider(config.translate.clone())?;

        Ok(Self::new(
            profiles,
            history,
            detector,
            provider,
            GenerationParams::from_config(&config.translate),
        ))
    }

    pub async fn translate(&mut self, text: &str, user_id: &str) -> Result<Translation> {
        let profile = self.profiles.get(user_id);

        let source = self.detector.detect(text).map_err(|e| match e {
            TolkError::Detection(_) => e,
            other => TolkError::Detection(other.to_string()),
        })?;
        let pair = LanguagePair::new(source, profile.target_lang);
        info!("Translating for {} ({})", user_id, pair);

        let capability = self.provider.acquire(&pair).await?;
        let translated = capability
            .translate(text, &self.params)
            .await
            .map_err(|e| match e {
                TolkError::Translation(_) => e,
                other => TolkError::Translation(other.to_string()),
            })?;

        let entry = TranslationHistoryEntry::new(user_id, text, &translated);
        let history_error = match self.history.append(entry).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Translation for {} was not recorded: {}", user_id, e);
                Some(e)
            }
        };

        Ok(Translation {
            text: translated,
            pair,
            history_error,
        })
    }

    pub fn profile(&mut self, user_id: &str) -> UserProfile {
        self.profiles.get(user_id)
    }

    pub async fn register(&mut self, user_id: &str, target_lang: &str) -> Result<UserProfile> {
        self.profiles.register(user_id, target_lang).await
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }
}
