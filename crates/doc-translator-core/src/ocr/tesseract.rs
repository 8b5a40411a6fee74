use std::io::ErrorKind;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::OcrEngine;
use crate::config::OcrConfig;
use crate::error::{Error, Result};

const FORMAT: &str = "image";

/// OCR engine wrapping the `tesseract` CLI tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: String,
    language: String,
    page_segmentation_mode: Option<u32>,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            language: config.language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }

    /// Installed language packs, as reported by `tesseract --list-langs`.
    pub async fn list_languages(&self) -> Result<Vec<String>> {
        let output = Command::new(&self.command)
            .arg("--list-langs")
            .output()
            .await
            .map_err(|e| self.spawn_error(&e))?;

        if !output.status.success() {
            return Err(Error::OcrUnavailable(format!(
                "{} --list-langs failed: {}",
                self.command,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // Tesseract 3.x prints the list on stderr
        let mut langs = parse_language_list(&String::from_utf8_lossy(&output.stdout));
        if langs.is_empty() {
            langs = parse_language_list(&String::from_utf8_lossy(&output.stderr));
        }
        Ok(langs)
    }

    fn spawn_error(&self, e: &std::io::Error) -> Error {
        if e.kind() == ErrorKind::NotFound {
            Error::OcrUnavailable(format!(
                "'{}' not found; install Tesseract OCR and the required language data",
                self.command
            ))
        } else {
            Error::OcrUnavailable(format!("cannot run {}: {e}", self.command))
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn default_language(&self) -> &str {
        &self.language
    }

    async fn ensure_available(&self, language: &str) -> Result<()> {
        let available = self.list_languages().await?;
        let missing: Vec<&str> = language
            .split('+')
            .map(str::trim)
            .filter(|lang| !lang.is_empty() && !available.iter().any(|a| a == lang))
            .collect();

        if missing.is_empty() {
            debug!("tesseract languages available: {}", available.join(", "));
            Ok(())
        } else {
            warn!("tesseract language pack(s) missing: {}", missing.join(", "));
            Err(Error::OcrUnavailable(format!(
                "language pack(s) not installed: {} (available: {})",
                missing.join(", "),
                available.join(", ")
            )))
        }
    }

    #[instrument(level = "debug", skip_all, fields(language = %language, bytes = image.len()))]
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
        let format = image::guess_format(image)
            .map_err(|e| Error::extraction(FORMAT, format!("unrecognized image data: {e}")))?;
        let extension = mime_guess::get_mime_extensions_str(format.to_mime_type())
            .and_then(|exts| exts.first())
            .copied()
            .unwrap_or("png");

        // Tesseract reads its input from disk
        let tmpdir = tempfile::Builder::new().prefix("tesseract").tempdir()?;
        let input_path = tmpdir.path().join(format!("input.{extension}"));
        tokio::fs::write(&input_path, image).await?;

        let mut command = Command::new(&self.command);
        command.arg(&input_path).arg("stdout").arg("-l").arg(language);
        if let Some(psm) = self.page_segmentation_mode {
            command.arg("--psm").arg(psm.to_string());
        }
        let output = command
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(&e))?;
        check_for_command_failure(&self.command, &output)?;

        let text = clean_output(&String::from_utf8_lossy(&output.stdout));
        if text.trim().is_empty() {
            debug!("tesseract returned no text");
            return Err(Error::NoTextDetected);
        }
        debug!("tesseract recognized {} chars", text.chars().count());
        Ok(text)
    }
}

fn check_for_command_failure(command: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    // A missing traineddata file makes tesseract exit non-zero
    if stderr.contains("Failed loading language") || stderr.contains("Error opening data file") {
        return Err(Error::OcrUnavailable(stderr.trim().to_string()));
    }
    Err(Error::extraction(FORMAT, format!("{command} failed ({}): {}", output.status, stderr.trim())))
}

/// Skip the "List of available languages" header line.
fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter(|line| !line.starts_with("List of available languages"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Drop page-break form feeds and trailing whitespace from tesseract output.
fn clean_output(raw: &str) -> String {
    raw.replace('\u{000C}', "").trim_end().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn engine(command: &str) -> TesseractEngine {
        TesseractEngine::new(&OcrConfig {
            command: command.to_string(),
            ..OcrConfig::default()
        })
    }

    #[test]
    fn test_parse_language_list() {
        let listing = "List of available languages in \"/usr/share/tesseract-ocr/5/tessdata/\" (3):\neng\nosd\nsin\n";
        assert_eq!(parse_language_list(listing), vec!["eng", "osd", "sin"]);
    }

    #[test]
    fn test_clean_output_strips_form_feed() {
        assert_eq!(clean_output("Hello world\n\n\u{000C}"), "Hello world");
        assert_eq!(clean_output("\u{000C}"), "");
    }

    #[test]
    fn test_default_language_is_sinhala() {
        assert_eq!(engine("tesseract").default_language(), "sin");
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let engine = engine("doc-translator-no-such-tesseract");
        let err = engine.ensure_available("sin").await.unwrap_err();
        assert!(matches!(err, Error::OcrUnavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_non_image_bytes_rejected_before_spawning() {
        let engine = engine("doc-translator-no-such-tesseract");
        let err = engine.recognize(b"definitely not an image", "sin").await.unwrap_err();
        assert!(matches!(err, Error::Extraction { format: "image", .. }), "got {err:?}");
    }
}
