//! External HTML-to-PDF engine and PDF metadata stamping.
//!
//! Complex-script shaping (Sinhala conjuncts, vowel signs) is left to the
//! engine, WeasyPrint by default, which uses HarfBuzz.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use lopdf::{Document, Object, StringFormat};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::error::{Error, Result};

const FORMAT: &str = "PDF";
const PRODUCER: &str = concat!("doc-translator ", env!("CARGO_PKG_VERSION"));

/// Font file the engine loads, written next to the HTML input.
pub(crate) struct FontFile<'a> {
    pub file_name: String,
    pub data: &'a [u8],
}

pub(crate) struct PdfEngine {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PdfEngine {
    pub(crate) fn new(config: &RenderConfig) -> Self {
        Self {
            command: config.engine_command.clone(),
            args: config.engine_args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Convert an HTML document to PDF bytes.
    pub(crate) async fn html_to_pdf(&self, html: &str, font: Option<FontFile<'_>>) -> Result<Vec<u8>> {
        let workdir = tempfile::Builder::new().prefix("doc-translator-render").tempdir()?;
        let html_path = workdir.path().join("document.html");
        let pdf_path = workdir.path().join("document.pdf");

        tokio::fs::write(&html_path, html).await?;
        if let Some(font) = font {
            tokio::fs::write(workdir.path().join(&font.file_name), font.data).await?;
        }

        info!("Running {} to produce PDF", self.command);
        let child = Command::new(&self.command)
            .args(&self.args)
            .arg(&html_path)
            .arg(&pdf_path)
            .current_dir(workdir.path())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                Error::render(
                    FORMAT,
                    format!("{} did not finish within {}s", self.command, self.timeout.as_secs()),
                )
            })?
            .map_err(|e| self.spawn_error(&e))?;

        if !output.status.success() {
            return Err(Error::render(
                FORMAT,
                format!(
                    "{} failed ({}): {}",
                    self.command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        read_output(&pdf_path).await
    }

    fn spawn_error(&self, e: &std::io::Error) -> Error {
        if e.kind() == ErrorKind::NotFound {
            Error::render(
                FORMAT,
                format!("'{}' not found; install WeasyPrint or set render.engine_command", self.command),
            )
        } else {
            Error::render(FORMAT, format!("cannot run {}: {e}", self.command))
        }
    }
}

async fn read_output(path: &Path) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) if !bytes.is_empty() => {
            debug!("Engine produced {} bytes", bytes.len());
            Ok(bytes)
        }
        Ok(_) => Err(Error::render(FORMAT, "engine produced an empty file")),
        Err(e) => Err(Error::render(FORMAT, format!("engine produced no output: {e}"))),
    }
}

/// Set the document title, producer and language on a finished PDF.
pub(crate) fn stamp_metadata(pdf: &[u8], title: &str, lang: &str) -> Result<Vec<u8>> {
    let mut doc =
        Document::load_mem(pdf).map_err(|e| Error::render(FORMAT, format!("engine output is not a valid PDF: {e}")))?;

    let info_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Title", text_string(title)),
        ("Producer", text_string(PRODUCER)),
    ]));
    doc.trailer.set("Info", Object::Reference(info_id));

    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| Error::render(FORMAT, format!("PDF has no catalog: {e}")))?;
    doc.get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| Error::render(FORMAT, format!("PDF catalog is malformed: {e}")))?
        .set("Lang", Object::string_literal(lang));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| Error::render(FORMAT, format!("failed to write PDF: {e}")))?;
    Ok(output)
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
