use tracing::{debug, info};
use whatlang::{Detector, Lang};

use crate::config::DetectConfig;
use crate::error::{Result, TolkError};
use super::LanguageDetector;

/// Trigram language detector backed by whatlang
pub struct WhatlangDetector {
    detector: Detector,
    min_confidence: f64,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self {
            detector: Detector::new(),
            min_confidence: 0.0,
        }
    }

    pub fn from_config(config: &DetectConfig) -> Result<Self> {
        let codes = config.acceptable_codes();

        let detector = if codes.is_empty() {
            Detector::new()
        } else {
            let mut allowlist = Vec::with_capacity(codes.len());
            for code in &codes {
                let lang = lang_from_code(code).ok_or_else(|| {
                    TolkError::Config(format!("Unknown detection language '{}'", code))
                })?;
                allowlist.push(lang);
            }
            Detector::with_allowlist(allowlist)
        };

        info!(
            "Initialized language detector ({} languages, min confidence {})",
            if codes.is_empty() { "all".to_string() } else { codes.len().to_string() },
            config.min_confidence
        );

        Ok(Self {
            detector,
            min_confidence: config.min_confidence,
        })
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(TolkError::Detection("no text to detect".to_string()));
        }

        let info = self
            .detector
            .detect(text)
            .ok_or_else(|| TolkError::Detection("language could not be determined".to_string()))?;

        if info.confidence() < self.min_confidence {
            return Err(TolkError::Detection(format!(
                "confidence {:.2} for {} is below {:.2}",
                info.confidence(),
                info.lang().eng_name(),
                self.min_confidence
            )));
        }

        let code = iso639_1(info.lang());
        debug!(
            "Detected {} ({:.2} confidence, reliable: {})",
            code,
            info.confidence(),
            info.is_reliable()
        );
        Ok(code.to_string())
    }
}

/// Two-letter code for a whatlang language, falling back to its ISO 639-3 code
pub fn iso639_1(lang: Lang) -> &'static str {
    match lang {
        Lang::Afr => "af",
        Lang::Ara => "ar",
        Lang::Bul => "bg",
        Lang::Ben => "bn",
        Lang::Cat => "ca",
        Lang::Ces => "cs",
        Lang::Cmn => "zh",
        Lang::Dan => "da",
        Lang::Deu => "de",
        Lang::Ell => "el",
        Lang::Eng => "en",
        Lang::Epo => "eo",
        Lang::Spa => "es",
        Lang::Est => "et",
        Lang::Fin => "fi",
        Lang::Fra => "fr",
        Lang::Heb => "he",
        Lang::Hin => "hi",
        Lang::Hrv => "hr",
        Lang::Hun => "hu",
        Lang::Ind => "id",
        Lang::Ita => "it",
        Lang::Jpn => "ja",
        Lang::Kat => "ka",
        Lang::Kor => "ko",
        Lang::Lat => "la",
        Lang::Lav => "lv",
        Lang::Lit => "lt",
        Lang::Mkd => "mk",
        Lang::Nld => "nl",
        Lang::Nob => "nb",
        Lang::Pol => "pl",
        Lang::Por => "pt",
        Lang::Ron => "ro",
        Lang::Rus => "ru",
        Lang::Slk => "sk",
        Lang::Slv => "sl",
        Lang::Swe => "sv",
        Lang::Tam => "ta",
        Lang::Tha => "th",
        Lang::Tur => "tr",
        Lang::Ukr => "uk",
        Lang::Urd => "ur",
        Lang::Vie => "vi",
        other => other.code(),
    }
}

/// Reverse of [`iso639_1`], also accepting ISO 639-3 codes
pub fn lang_from_code(code: &str) -> Option<Lang> {
    let code = code.trim().to_lowercase();
    Lang::all()
        .iter()
        .copied()
        .find(|&lang| iso639_1(lang) == code || lang.code() == code)
}
