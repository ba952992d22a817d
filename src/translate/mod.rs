// Translation capabilities
//
// A capability translates between exactly one ordered pair of languages. The
// provider hands out capabilities per pair and reports pairs it has no model
// for as `TolkError::TranslationUnavailable`.

pub mod huggingface;

use std::fmt;
use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TranslateConfig;
use crate::error::Result;

pub use huggingface::{HuggingFaceCapability, HuggingFaceProvider};

/// Ordered (source, target) language codes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into().to_lowercase(),
            target: target.into().to_lowercase(),
        }
    }

    /// Source and target are the same language
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// Decoding constraints passed to every translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    pub max_length: usize,
    pub num_beams: usize,
}

impl GenerationParams {
    pub fn from_config(config: &TranslateConfig) -> Self {
        Self {
            max_length: config.max_length,
            num_beams: config.num_beams,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 50,
            num_beams: 5,
        }
    }
}

/// A model translating one language pair
#[async_trait]
pub trait TranslationCapability: Send + Sync {
    async fn translate(&self, text: &str, params: &GenerationParams) -> Result<String>;
}

/// Returns text unchanged; serves pairs whose source and target coincide
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCapability;

#[async_trait]
impl TranslationCapability for IdentityCapability {
    async fn translate(&self, text: &str, _params: &GenerationParams) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Hands out the capability for a language pair
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Capability for `pair`, or `TranslationUnavailable` if no model exists
    async fn acquire(&mut self, pair: &LanguagePair) -> Result<Arc<dyn TranslationCapability>>;
}

/// Factory for creating provider instances
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_provider(config: TranslateConfig) -> Result<Box<dyn CapabilityProvider>> {
        Ok(Box::new(HuggingFaceProvider::new(config)?))
    }
}
