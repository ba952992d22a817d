use thiserror::Error;

use crate::translate::LanguagePair;

#[derive(Error, Debug)]
pub enum TolkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Language detection error: {0}")]
    Detection(String),

    #[error("No translation model available for {0}")]
    TranslationUnavailable(LanguagePair),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TolkError {
    /// Message shown to the person at the chat prompt
    pub fn user_message(&self) -> String {
        match self {
            Self::Detection(_) => {
                "Could not detect the language of that text. Try a longer sentence.".to_string()
            }
            Self::TranslationUnavailable(pair) => format!(
                "Sorry, translating from '{}' to '{}' is not supported.",
                pair.source, pair.target
            ),
            Self::Translation(e) => format!("Translation failed: {}", e),
            Self::Persistence(e) => format!("Could not save your data: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TolkError>;
