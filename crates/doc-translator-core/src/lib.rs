//! Document Translator Core Library
//!
//! Translates English documents into Sinhala:
//! - Text extraction from TXT, DOCX and PDF files
//! - OCR for scanned PDFs and images via Tesseract
//! - Chunked translation through Google Translate or OpenAI-compatible APIs
//! - Plain text or PDF output, typeset by an external HTML-to-PDF engine

pub mod config;
pub mod document;
pub mod error;
pub mod ocr;
pub mod render;
pub mod translator;
pub mod util;

pub use config::{
    AppConfig, Lang, OcrConfig, RenderConfig, TranslatorBackend, TranslatorConfig, DEFAULT_SOURCE_LANG,
    DEFAULT_TARGET_LANG, SUPPORTED_EXTENSIONS, language_name,
};
pub use document::{
    Document, DocumentKind, DocumentLoader, ExtractedText, ImageKind, PdfDocument, accepted_extensions,
};
pub use error::{Error, Result};
pub use ocr::{OcrEngine, TesseractEngine};
pub use render::{OutputArtifact, OutputFormat, Renderer};
pub use translator::{TranslateOptions, TranslatedText, Translator, create_translator, translate_text};

use std::sync::Arc;
use tracing::{info, warn};

/// Stage reported to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Extracting,
    Translating { done: usize, total: usize },
    Rendering,
}

/// Progress callback shared by the CLI progress bar and tests.
pub type ProgressFn<'a> = &'a (dyn Fn(Progress) + Send + Sync);

/// Non-fatal condition surfaced to the user instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// OCR ran but recognized nothing
    NoTextDetected,
    /// The document has no text at all
    EmptyDocument,
}

impl Warning {
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoTextDetected => {
                "No text could be detected in the document. Try a clearer scan, or disable OCR if the file has a text layer."
            }
            Self::EmptyDocument => "The document contains no text to translate.",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of the extraction stage
#[derive(Debug, Clone)]
pub enum Extraction {
    Text(ExtractedText),
    /// Nothing to translate; carries the warning to show
    Empty { warning: Warning },
}

/// Everything one run of the pipeline produced.
///
/// An empty extraction leaves `translated` and `artifact` unset.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub extracted: Option<ExtractedText>,
    pub translated: Option<TranslatedText>,
    pub artifact: Option<OutputArtifact>,
    pub warning: Option<Warning>,
}

/// High-level document translator that combines all components
pub struct DocumentTranslator {
    loader: DocumentLoader,
    translator: Arc<dyn Translator>,
    renderer: Renderer,
    config: AppConfig,
}

impl DocumentTranslator {
    /// Create a translator with Tesseract OCR and the configured backend
    pub fn new(config: AppConfig) -> Result<Self> {
        let translator = create_translator(&config.translator)?;
        let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractEngine::new(&config.ocr));
        Ok(Self::with_components(translator, ocr, config))
    }

    /// Create with custom translation and OCR backends
    pub fn with_components(translator: Arc<dyn Translator>, ocr: Arc<dyn OcrEngine>, config: AppConfig) -> Self {
        let loader = DocumentLoader::new(ocr, &config.ocr);
        let renderer = Renderer::new(config.render.clone(), config.target_lang.clone());
        Self {
            loader,
            translator,
            renderer,
            config,
        }
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn translator_name(&self) -> &'static str {
        self.translator.name()
    }

    /// Check that the OCR engine and its language pack are installed.
    pub async fn ocr_status(&self) -> Result<()> {
        let ocr = self.loader.ocr_engine();
        ocr.ensure_available(ocr.default_language()).await
    }

    /// Output file name without extension: `<stem>-<target>`.
    pub fn output_base_name(&self, file_name: &str) -> String {
        format!("{}-{}", util::output_stem(file_name), self.config.target_lang)
    }

    /// Extract the English text of a document.
    ///
    /// Documents without text and OCR runs that detect nothing yield
    /// [`Extraction::Empty`] rather than an error.
    pub async fn extract(&self, doc: &Document, use_ocr: bool) -> Result<Extraction> {
        match self.loader.load(doc, use_ocr).await {
            Ok(text) if text.is_blank() => {
                warn!("{} contains no text", doc.file_name());
                Ok(Extraction::Empty {
                    warning: Warning::EmptyDocument,
                })
            }
            Ok(text) => {
                info!(
                    "Extracted {} chars from {} ({}, {} pages, ocr: {})",
                    text.as_str().chars().count(),
                    doc.file_name(),
                    text.kind(),
                    text.pages(),
                    text.ocr_used()
                );
                Ok(Extraction::Text(text))
            }
            Err(Error::NoTextDetected) => {
                warn!("OCR detected no text in {}", doc.file_name());
                Ok(Extraction::Empty {
                    warning: Warning::NoTextDetected,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Translate extracted text into the configured target language.
    pub async fn translate(&self, text: &ExtractedText, progress: Option<ProgressFn<'_>>) -> Result<TranslatedText> {
        let report = |done: usize, total: usize| {
            if let Some(progress) = progress {
                progress(Progress::Translating { done, total });
            }
        };

        translate_text(
            self.translator.as_ref(),
            text,
            &self.config.source_lang,
            &self.config.target_lang,
            TranslateOptions::from(&self.config.translator),
            Some(&report),
        )
        .await
    }

    /// Render translated text to an output file.
    pub async fn render(&self, text: &TranslatedText, format: OutputFormat, base_name: &str) -> Result<OutputArtifact> {
        self.renderer.render(text, format, base_name).await
    }

    /// Run extraction, translation and rendering for one document.
    pub async fn process(
        &self,
        doc: &Document,
        use_ocr: bool,
        format: OutputFormat,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<Outcome> {
        if let Some(progress) = progress {
            progress(Progress::Extracting);
        }
        let extracted = match self.extract(doc, use_ocr).await? {
            Extraction::Text(text) => text,
            Extraction::Empty { warning } => {
                return Ok(Outcome {
                    warning: Some(warning),
                    ..Outcome::default()
                });
            }
        };

        let translated = self.translate(&extracted, progress).await?;

        if let Some(progress) = progress {
            progress(Progress::Rendering);
        }
        let artifact = self
            .render(&translated, format, &self.output_base_name(doc.file_name()))
            .await?;

        info!("Produced {} ({} bytes)", artifact.file_name, artifact.bytes.len());
        Ok(Outcome {
            extracted: Some(extracted),
            translated: Some(translated),
            artifact: Some(artifact),
            warning: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_output_base_name() {
        let translator = DocumentTranslator::new(AppConfig::default()).unwrap();
        assert_eq!(translator.output_base_name("Annual Report.docx"), "Annual Report-si");
        assert_eq!(translator.output_base_name("scan"), "scan-si");
    }

    #[test]
    fn test_warning_messages() {
        assert!(Warning::NoTextDetected.message().contains("No text"));
        assert_eq!(Warning::EmptyDocument.to_string(), Warning::EmptyDocument.message());
    }
}
