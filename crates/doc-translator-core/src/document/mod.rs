//! Document loading: uploaded bytes in, English text out.
//!
//! The declared file type selects the extraction path:
//! - TXT: strict UTF-8 decode
//! - DOCX: body paragraphs in document order
//! - PDF: embedded text layer, or rasterize + OCR when requested
//! - Images: always OCR

mod docx;
mod pdf;

pub use pdf::PdfDocument;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::{OcrConfig, SUPPORTED_EXTENSIONS};
use crate::error::{Error, Result};
use crate::ocr::OcrEngine;
use crate::util::dotted_extension;

/// Raster image formats handed to OCR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Bmp,
    Tiff,
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Txt,
    Docx,
    Pdf,
    Image(ImageKind),
}

impl DocumentKind {
    /// Resolve from an extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Txt),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Image(ImageKind::Jpeg)),
            "png" => Some(Self::Image(ImageKind::Png)),
            "bmp" => Some(Self::Image(ImageKind::Bmp)),
            "tif" | "tiff" => Some(Self::Image(ImageKind::Tiff)),
            _ => None,
        }
    }

    /// Resolve from a MIME type such as `application/pdf`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Some(Self::Txt),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some(Self::Docx),
            "application/pdf" => Some(Self::Pdf),
            "image/jpeg" | "image/jpg" => Some(Self::Image(ImageKind::Jpeg)),
            "image/png" => Some(Self::Image(ImageKind::Png)),
            "image/bmp" | "image/x-bmp" | "image/x-ms-bmp" => Some(Self::Image(ImageKind::Bmp)),
            "image/tiff" => Some(Self::Image(ImageKind::Tiff)),
            _ => None,
        }
    }

    /// The file extension decides; the declared MIME type is only consulted
    /// when the name has no extension.
    pub fn resolve(file_name: &str, declared_mime: Option<&str>) -> Result<Self> {
        if let Some(ext) = dotted_extension(file_name) {
            return Self::from_extension(&ext).ok_or(Error::UnsupportedFormat(ext));
        }
        declared_mime
            .and_then(Self::from_mime)
            .ok_or_else(|| Error::UnsupportedFormat(declared_mime.unwrap_or(file_name).to_string()))
    }

    /// Short label used in messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Txt => "TXT",
            Self::Docx => "DOCX",
            Self::Pdf => "PDF",
            Self::Image(_) => "image",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An uploaded file: raw bytes plus the name it was declared with.
#[derive(Clone)]
pub struct Document {
    bytes: Arc<[u8]>,
    file_name: String,
    kind: DocumentKind,
}

impl Document {
    /// Fails with `UnsupportedFormat` when the declared type is not supported.
    pub fn new(bytes: impl Into<Vec<u8>>, file_name: impl Into<String>, declared_mime: Option<&str>) -> Result<Self> {
        let file_name = file_name.into();
        let kind = DocumentKind::resolve(&file_name, declared_mime)?;
        Ok(Self {
            bytes: Arc::from(bytes.into()),
            file_name,
            kind,
        })
    }

    /// Read a document from disk, resolving its type from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        // Check the type before reading potentially large files
        DocumentKind::resolve(&file_name, None)?;
        let bytes = std::fs::read(path)?;
        Self::new(bytes, file_name, None)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub const fn kind(&self) -> DocumentKind {
        self.kind
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("kind", &self.kind)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// English text extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    text: String,
    kind: DocumentKind,
    ocr_used: bool,
    pages: usize,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>, kind: DocumentKind, ocr_used: bool, pages: usize) -> Self {
        Self {
            text: text.into(),
            kind,
            ocr_used,
            pages,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub const fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub const fn ocr_used(&self) -> bool {
        self.ocr_used
    }

    /// Page count for PDFs; 1 for everything else.
    pub const fn pages(&self) -> usize {
        self.pages
    }

    /// True when there is nothing worth translating.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extracts text from documents, delegating to OCR where needed.
///
/// OCR runs with the engine's default language model.
pub struct DocumentLoader {
    ocr: Arc<dyn OcrEngine>,
    dpi: u32,
}

impl DocumentLoader {
    pub fn new(ocr: Arc<dyn OcrEngine>, config: &OcrConfig) -> Self {
        Self { ocr, dpi: config.dpi }
    }

    pub fn ocr_engine(&self) -> &Arc<dyn OcrEngine> {
        &self.ocr
    }

    /// Extract the text of a document.
    ///
    /// `use_ocr` only changes the PDF path; images always go through OCR
    /// and TXT/DOCX never do.
    pub async fn load(&self, doc: &Document, use_ocr: bool) -> Result<ExtractedText> {
        info!("Extracting text from {} ({})", doc.file_name(), doc.kind());

        match doc.kind() {
            DocumentKind::Txt => {
                let text = std::str::from_utf8(doc.bytes())
                    .map_err(|e| Error::extraction("TXT", format!("file is not valid UTF-8: {e}")))?;
                Ok(ExtractedText::new(text, DocumentKind::Txt, false, 1))
            }
            DocumentKind::Docx => {
                let bytes = Arc::clone(&doc.bytes);
                let text = run_blocking("DOCX", move || docx::extract_text(&bytes)).await?;
                Ok(ExtractedText::new(text, DocumentKind::Docx, false, 1))
            }
            DocumentKind::Pdf if use_ocr => self.load_pdf_with_ocr(doc).await,
            DocumentKind::Pdf => {
                let bytes = Arc::clone(&doc.bytes);
                let (text, pages) = run_blocking("PDF", move || {
                    let pdf = PdfDocument::from_bytes(&bytes)?;
                    Ok((pdf.text()?, pdf.page_count()))
                })
                .await?;
                debug!("Extracted text layer of {} pages", pages);
                Ok(ExtractedText::new(text, DocumentKind::Pdf, false, pages))
            }
            kind @ DocumentKind::Image(_) => {
                image::guess_format(doc.bytes())
                    .map_err(|e| Error::extraction("image", format!("not a readable image: {e}")))?;
                let language = self.ocr.default_language();
                self.ocr.ensure_available(language).await?;
                let text = self.ocr.recognize(doc.bytes(), language).await?;
                Ok(ExtractedText::new(text, kind, true, 1))
            }
        }
    }

    /// Rasterize and OCR a PDF page by page.
    ///
    /// A blocking task renders pages from one MuPDF handle and hands them
    /// over a single-slot channel, so at most one rendered page waits for
    /// OCR at a time.
    async fn load_pdf_with_ocr(&self, doc: &Document) -> Result<ExtractedText> {
        let language = self.ocr.default_language();
        self.ocr.ensure_available(language).await?;

        let bytes = Arc::clone(&doc.bytes);
        let dpi = self.dpi;
        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(1);
        let renderer = tokio::task::spawn_blocking(move || -> Result<usize> {
            let pdf = PdfDocument::from_bytes(&bytes)?;
            pdf.for_each_page_png(dpi, |image| tx.blocking_send(image).is_ok())?;
            Ok(pdf.page_count())
        });

        info!("Running {} OCR at {} dpi", self.ocr.name(), dpi);

        let mut text = String::new();
        let mut found_text = false;
        let mut page_num = 0;
        while let Some(image) = rx.recv().await {
            page_num += 1;
            match self.ocr.recognize(&image, language).await {
                Ok(page_text) => {
                    found_text = true;
                    text.push_str(&page_text);
                }
                Err(Error::NoTextDetected) => {
                    debug!("No text detected on page {}", page_num);
                }
                Err(e) => return Err(e),
            }
            text.push('\n');
        }

        // Surfaces parse and render failures once the channel closes
        let pages = renderer
            .await
            .map_err(|e| Error::extraction("PDF", format!("extraction task failed: {e}")))??;

        if !found_text {
            return Err(Error::NoTextDetected);
        }
        Ok(ExtractedText::new(text, DocumentKind::Pdf, true, pages))
    }
}

/// Run parser work off the async runtime.
async fn run_blocking<T, F>(format: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::extraction(format, format!("extraction task failed: {e}")))?
}

/// Accepted extensions for upload widgets (".pdf,.docx,...").
pub fn accepted_extensions() -> String {
    SUPPORTED_EXTENSIONS.join(",")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_extension(".PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_extension("docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_extension(".jpeg"), Some(DocumentKind::Image(ImageKind::Jpeg)));
        assert_eq!(DocumentKind::from_extension(".tif"), Some(DocumentKind::Image(ImageKind::Tiff)));
        assert_eq!(DocumentKind::from_extension(".doc"), None);
    }

    #[test]
    fn test_every_advertised_extension_resolves() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(DocumentKind::from_extension(ext).is_some(), "{ext} should resolve");
        }
    }

    #[test]
    fn test_resolve_unknown_extension() {
        let err = DocumentKind::resolve("notes.xyz", Some("text/plain")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref ext) if ext == ".xyz"));
    }

    #[test]
    fn test_resolve_falls_back_to_mime() {
        let kind = DocumentKind::resolve("upload", Some("application/pdf; charset=binary")).unwrap();
        assert_eq!(kind, DocumentKind::Pdf);
        assert!(DocumentKind::resolve("upload", None).is_err());
    }

    #[test]
    fn test_accepted_extensions() {
        let accepted = accepted_extensions();
        assert!(accepted.starts_with(".pdf,.docx,.txt"));
    }
}
