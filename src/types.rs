use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Result, SourceLanguage, TargetLanguage, TranslatorError};

/// Upper bound on the number of characters per request.
pub const MAX_TEXT_CHARS: usize = 5000;

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\r?\n)+").expect("valid regex"));
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// A single translation job.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranslationRequest {
    pub text: String,
    pub source: SourceLanguage,
    pub target: TargetLanguage,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source: SourceLanguage, target: TargetLanguage) -> Self {
        Self {
            text: text.into(),
            source,
            target,
        }
    }

    /// Builds a request from language code strings.
    ///
    /// Empty or unknown codes are rejected with [`TranslatorError::Validation`].
    pub fn from_codes(text: impl Into<String>, source: &str, target: &str) -> Result<Self> {
        if source.trim().is_empty() || target.trim().is_empty() {
            return Err(TranslatorError::Validation("language is missing".to_owned()));
        }
        Ok(Self::new(text, source.parse()?, target.parse()?))
    }

    /// Checks the text bounds. Pure; runs before every dispatch.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(TranslatorError::Validation("text is empty".to_owned()));
        }
        let length = self.text.chars().count();
        if length > MAX_TEXT_CHARS {
            return Err(TranslatorError::Validation(format!(
                "text length is limited to {MAX_TEXT_CHARS} characters, got {length}"
            )));
        }
        Ok(())
    }
}

/// One candidate translation returned by the service.
#[derive(Clone, Debug, PartialEq)]
pub struct Beam {
    pub text: String,
    pub score: Option<f64>,
    pub total_log_prob: Option<f64>,
    pub num_symbols: Option<u32>,
}

impl Beam {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score: None,
            total_log_prob: None,
            num_symbols: None,
        }
    }
}

/// A successful translation.
#[derive(Clone, Debug, PartialEq)]
pub struct Translation {
    /// Best candidate, identical to the first beam's text.
    pub text: String,
    /// All candidates in service order. The browser transport yields one.
    pub beams: Vec<Beam>,
    /// Source language detected or confirmed by the service.
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

impl Translation {
    /// Wraps extracted text that carries no ranking metadata.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            beams: vec![Beam::new(text.clone())],
            text,
            source_lang: None,
            target_lang: None,
        }
    }

    /// Texts of all beams, best first.
    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.beams.iter().map(|beam| beam.text.as_str())
    }

    pub(crate) fn post_processed(mut self) -> Self {
        self.text = normalize_whitespace(&self.text);
        for beam in &mut self.beams {
            beam.text = normalize_whitespace(&beam.text);
        }
        self
    }
}

/// Trims `text`, joins line breaks with a space, and collapses whitespace runs.
pub fn normalize_whitespace(text: &str) -> String {
    let joined = LINE_BREAKS.replace_all(text.trim(), " ");
    WHITESPACE_RUNS.replace_all(&joined, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> TranslationRequest {
        TranslationRequest::new(text, SourceLanguage::English, TargetLanguage::German)
    }

    #[test]
    fn empty_and_blank_text_is_rejected() {
        assert!(matches!(
            request("").validate(),
            Err(TranslatorError::Validation(_))
        ));
        assert!(matches!(
            request(" \n\t ").validate(),
            Err(TranslatorError::Validation(_))
        ));
    }

    #[test]
    fn length_limit_counts_characters_not_bytes() {
        let at_limit = "ü".repeat(MAX_TEXT_CHARS);
        assert!(request(&at_limit).validate().is_ok());

        let over_limit = "a".repeat(MAX_TEXT_CHARS + 1);
        let err = request(&over_limit).validate().unwrap_err();
        assert!(err.to_string().contains("5000"));
    }

    #[test]
    fn from_codes_rejects_missing_and_unknown_languages() {
        assert!(matches!(
            TranslationRequest::from_codes("Hello", "", "de-DE"),
            Err(TranslatorError::Validation(_))
        ));
        assert!(matches!(
            TranslationRequest::from_codes("Hello", "en", "zz"),
            Err(TranslatorError::Validation(_))
        ));

        let ok = TranslationRequest::from_codes("Hello", "auto", "de-DE").unwrap();
        assert_eq!(ok.source, SourceLanguage::AutoDetect);
        assert_eq!(ok.target, TargetLanguage::German);
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(normalize_whitespace("Hello\n\nworld   there"), "Hello world there");
        assert_eq!(normalize_whitespace("  a\r\nb \t c  "), "a b c");
    }

    #[test]
    fn post_processing_applies_to_every_beam() {
        let mut translation = Translation::from_text("Hallo\n\nWelt");
        translation.beams.push(Beam::new("Hallo   Welt !"));
        let processed = translation.post_processed();
        assert_eq!(processed.text, "Hallo Welt");
        assert_eq!(
            processed.alternatives().collect::<Vec<_>>(),
            vec!["Hallo Welt", "Hallo Welt !"]
        );
    }
}
