//! Askama templates for the upload page and translation fragments.
//!
//! - `base.html` - Common layout with CSS and the fetch script
//! - `index.html` - Upload form and usage notes
//! - `partials/translate_result.html` - Result, warning or error fragment

use askama::Template;
use askama_web::WebTemplate;
use doc_translator_core::{
    DocumentTranslator, ExtractedText, Outcome, TranslatedText, accepted_extensions, language_name,
};

/// Landing page with upload form.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Value for the file input's `accept` attribute
    pub accept: String,
    pub target_language: &'static str,
    pub backend: &'static str,
    pub max_upload_mb: usize,
}

impl IndexTemplate {
    pub fn new(translator: &DocumentTranslator, max_upload_mb: usize) -> Self {
        Self {
            accept: accepted_extensions(),
            target_language: language_name(&translator.config().target_lang),
            backend: translator.translator_name(),
            max_upload_mb,
        }
    }
}

/// Fragment swapped into the page after `/api/translate`.
#[derive(Template, WebTemplate)]
#[template(path = "partials/translate_result.html")]
pub struct TranslateResultTemplate {
    pub success: bool,
    pub text: String,
    /// Download name without extension
    pub base_name: String,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub ocr_used: bool,
    pub chunk_count: usize,
}

impl TranslateResultTemplate {
    /// Build from a pipeline outcome; an empty outcome shows its warning.
    pub fn from_outcome(outcome: &Outcome, base_name: String) -> Self {
        let text = outcome
            .translated
            .as_ref()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default();
        Self {
            success: outcome.warning.is_none(),
            text,
            base_name,
            warning: outcome.warning.map(|w| w.message().to_string()),
            error: None,
            ocr_used: outcome.extracted.as_ref().is_some_and(ExtractedText::ocr_used),
            chunk_count: outcome.translated.as_ref().map_or(0, TranslatedText::chunk_count),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            base_name: String::new(),
            warning: None,
            error: Some(message.into()),
            ocr_used: false,
            chunk_count: 0,
        }
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use doc_translator_core::Warning;

    #[test]
    fn test_result_escapes_text() {
        let outcome = Outcome {
            translated: Some(TranslatedText::new("<b>ආයුබෝවන්</b>", 1)),
            ..Outcome::default()
        };
        let html = TranslateResultTemplate::from_outcome(&outcome, "letter-si".into())
            .render()
            .unwrap();
        assert!(html.contains("&lt;b&gt;ආයුබෝවන්"));
        assert!(html.contains("letter-si"));
        assert!(html.contains("value=\"pdf\""));
    }

    #[test]
    fn test_warning_has_no_downloads() {
        let outcome = Outcome {
            warning: Some(Warning::NoTextDetected),
            ..Outcome::default()
        };
        let html = TranslateResultTemplate::from_outcome(&outcome, "scan-si".into())
            .render()
            .unwrap();
        assert!(html.contains("No text could be detected"));
        assert!(!html.contains("/api/render"));
    }

    #[test]
    fn test_error_fragment() {
        let html = TranslateResultTemplate::error("Translation service error: HTTP 502")
            .render()
            .unwrap();
        assert!(html.contains("Translation service error"));
        assert!(!html.contains("/api/render"));
    }
}
