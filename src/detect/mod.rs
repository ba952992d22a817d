// Source language detection
//
// The dispatcher only sees the `LanguageDetector` trait; the default backend is
// trigram based (whatlang) and runs in-process.

pub mod trigram;

use crate::config::DetectConfig;
use crate::error::Result;

pub use trigram::WhatlangDetector;

/// Detects the language of a piece of text
#[cfg_attr(test, mockall::automock)]
pub trait LanguageDetector: Send + Sync {
    /// Two-letter language code for `text`, or a detection error when the
    /// text is empty or the language cannot be decided
    fn detect(&self, text: &str) -> Result<String>;
}

/// Factory for creating detector instances
pub struct DetectorFactory;

impl DetectorFactory {
    pub fn create_detector(config: &DetectConfig) -> Result<Box<dyn LanguageDetector>> {
        Ok(Box::new(WhatlangDetector::from_config(config)?))
    }
}
