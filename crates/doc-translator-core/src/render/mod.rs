//! Output rendering: plain UTF-8 text, or a PDF typeset by an external
//! engine from a generated HTML document.

mod engine;
mod font;
mod html;

pub use font::missing_glyphs;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{Lang, RenderConfig};
use crate::error::{Error, Result};
use crate::translator::TranslatedText;
use engine::{FontFile, PdfEngine};

/// Downloadable output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Pdf,
}

impl OutputFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Pdf => "pdf",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Txt => "text/plain; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "pdf" => Ok(Self::Pdf),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Rendered file ready for download
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Turns translated text into output files.
pub struct Renderer {
    config: RenderConfig,
    target: Lang,
    engine: PdfEngine,
}

impl Renderer {
    pub fn new(config: RenderConfig, target: Lang) -> Self {
        let engine = PdfEngine::new(&config);
        Self { config, target, engine }
    }

    /// Render `text` as `<base_name>.<ext>`.
    ///
    /// Either a complete artifact is returned or an error; never a partial file.
    pub async fn render(&self, text: &TranslatedText, format: OutputFormat, base_name: &str) -> Result<OutputArtifact> {
        info!("Rendering {} output", format);
        let bytes = match format {
            OutputFormat::Txt => text.as_str().as_bytes().to_vec(),
            OutputFormat::Pdf => self.render_pdf(text.as_str(), base_name).await?,
        };

        Ok(OutputArtifact {
            format,
            bytes,
            file_name: format!("{base_name}.{}", format.extension()),
        })
    }

    async fn render_pdf(&self, text: &str, title: &str) -> Result<Vec<u8>> {
        let font_data = match &self.config.font_path {
            Some(path) => {
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|e| Error::render("PDF", format!("cannot read font {}: {e}", path.display())))?;
                font::check_coverage(path, &data, text)?;
                let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("ttf");
                Some((format!("document-font.{extension}"), data))
            }
            None => None,
        };

        let html = html::build_document(
            text,
            self.target.as_str(),
            title,
            &self.config,
            font_data.as_ref().map(|(name, _)| name.as_str()),
        )?;

        let font = font_data.as_ref().map(|(file_name, data)| FontFile {
            file_name: file_name.clone(),
            data,
        });
        let pdf = self.engine.html_to_pdf(&html, font).await?;
        engine::stamp_metadata(&pdf, title, self.target.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn renderer(config: RenderConfig) -> Renderer {
        Renderer::new(config, Lang::new("si"))
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("PDF".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!(".txt".parse::<OutputFormat>().unwrap(), OutputFormat::Txt);
        assert!("docx".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Pdf.mime_type(), "application/pdf");
        assert_eq!(OutputFormat::default(), OutputFormat::Txt);
    }

    #[tokio::test]
    async fn test_txt_is_plain_utf8() {
        let text = TranslatedText::new("ආයුබෝවන්\nලංකාව\n", 1);
        let artifact = renderer(RenderConfig::default())
            .render(&text, OutputFormat::Txt, "letter-si")
            .await
            .unwrap();
        assert_eq!(artifact.bytes, "ආයුබෝවන්\nලංකාව\n".as_bytes());
        assert_eq!(artifact.file_name, "letter-si.txt");
    }

    #[tokio::test]
    async fn test_unreadable_font_is_render_error() {
        let config = RenderConfig {
            font_path: Some("/nonexistent/NotoSansSinhala.ttf".into()),
            ..RenderConfig::default()
        };
        let err = renderer(config)
            .render(&TranslatedText::new("ආයුබෝවන්", 1), OutputFormat::Pdf, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Render { format: "PDF", .. }));
    }
}
