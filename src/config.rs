use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use crate::error::{Result, TolkError};

// Generation defaults match the opus-mt checkpoints the tool was built around
fn default_max_length() -> usize {
    50
}

fn default_num_beams() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub detect: DetectConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding profile and history files (and logs)
    pub data_dir: PathBuf,
    /// File name of the user profile collection
    pub profiles_file: String,
    /// File name of the translation history collection
    pub history_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Target language given to users seen for the first time
    pub default_target_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Languages the detector may answer with (comma-separated, empty = any)
    pub acceptable_languages: String,
    /// Detections below this confidence are rejected
    pub min_confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Inference endpoint serving the translation models
    pub endpoint: String,
    /// Model hub used to check whether a model exists for a pair
    pub hub_endpoint: String,
    /// Model id template, `{src}` and `{tgt}` are replaced by language codes
    pub model_template: String,
    /// Maximum length of the generated translation
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Beam width used during generation
    #[serde(default = "default_num_beams")]
    pub num_beams: usize,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable holding the API token, if any
    pub api_token_env: Option<String>,
    /// Explicit model ids per pair, keyed "src-tgt"
    #[serde(default)]
    pub models: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Word that ends the conversation (case-insensitive)
    pub exit_word: String,
    /// Prompt printed before each line of input
    pub prompt: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".tolk"),
            profiles_file: "user_profiles.json".to_string(),
            history_file: "translation_history.json".to_string(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            default_target_lang: "en".to_string(),
        }
    }
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            acceptable_languages: String::new(),
            min_confidence: 0.0,
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co".to_string(),
            hub_endpoint: "https://huggingface.co".to_string(),
            model_template: "Helsinki-NLP/opus-mt-{src}-{tgt}".to_string(),
            max_length: default_max_length(),
            num_beams: default_num_beams(),
            timeout_secs: default_timeout_secs(),
            api_token_env: Some("HF_API_TOKEN".to_string()),
            models: BTreeMap::new(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            exit_word: "exit".to_string(),
            prompt: "You: ".to_string(),
        }
    }
}

impl DetectConfig {
    /// Acceptable languages as a list of trimmed, lowercase codes
    pub fn acceptable_codes(&self) -> Vec<String> {
        self.acceptable_languages
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TolkError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| TolkError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TolkError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TolkError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.profile.default_target_lang, "en");
        assert_eq!(config.translate.max_length, 50);
        assert_eq!(config.translate.num_beams, 5);
        assert_eq!(config.chat.exit_word, "exit");
        assert!(config.detect.acceptable_codes().is_empty());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tolk.toml");
        std::fs::write(
            &path,
            "[profile]\ndefault_target_lang = \"de\"\n\n[detect]\nacceptable_languages = \"en, FR ,de\"\nmin_confidence = 0.5\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.profile.default_target_lang, "de");
        assert_eq!(config.detect.acceptable_codes(), vec!["en", "fr", "de"]);
        assert_eq!(config.storage.history_file, "translation_history.json");
        assert_eq!(config.translate.num_beams, 5);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tolk.toml");

        let mut config = Config::default();
        config
            .translate
            .models
            .insert("en-ja".to_string(), "Helsinki-NLP/opus-mt-en-jap".to_string());
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(
            loaded.translate.models.get("en-ja").map(String::as_str),
            Some("Helsinki-NLP/opus-mt-en-jap")
        );
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tolk.toml");
        std::fs::write(&path, "[storage\nbroken").unwrap();

        assert!(matches!(Config::from_file(&path), Err(TolkError::Config(_))));
    }
}
