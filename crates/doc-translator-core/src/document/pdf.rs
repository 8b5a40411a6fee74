//! PDF access through MuPDF: embedded text layer and page rasterization.
//!
//! MuPDF handles are not `Send`, so a [`PdfDocument`] is opened and used
//! entirely inside one `spawn_blocking` call. Every page is read from that
//! single handle.

use image::{ImageEncoder, RgbaImage};
use mupdf::{Colorspace, Document as MuDocument, Matrix, TextPageOptions};

use crate::error::{Error, Result};

const FORMAT: &str = "PDF";

/// PDF points per inch; MuPDF renders at 72 dpi for a scale of 1.0.
const POINTS_PER_INCH: f32 = 72.0;

/// An open PDF document
pub struct PdfDocument {
    doc: MuDocument,
    page_count: usize,
}

impl PdfDocument {
    /// Open a PDF from bytes, failing if MuPDF cannot parse it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = MuDocument::from_bytes(bytes, "")
            .map_err(|e| Error::extraction(FORMAT, format!("failed to parse PDF: {e}")))?;
        let page_count = doc
            .page_count()
            .map_err(|e| Error::extraction(FORMAT, format!("failed to get page count: {e}")))?;

        Ok(Self {
            doc,
            page_count: usize::try_from(page_count).unwrap_or(0),
        })
    }

    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    fn load_page(&self, page_num: usize) -> Result<mupdf::Page> {
        self.doc
            .load_page(page_index(page_num, self.page_count)?)
            .map_err(|e| Error::extraction(FORMAT, format!("failed to load page {}: {e}", page_num + 1)))
    }

    /// Text layer of one page.
    ///
    /// Each MuPDF block becomes one paragraph line, with words hyphenated
    /// across a line break rejoined.
    pub fn page_text(&self, page_num: usize) -> Result<String> {
        let page = self.load_page(page_num)?;
        let text_page = page.to_text_page(TextPageOptions::empty()).map_err(|e| {
            Error::extraction(FORMAT, format!("failed to read text of page {}: {e}", page_num + 1))
        })?;

        let paragraphs: Vec<String> = text_page
            .blocks()
            .map(|block| {
                let lines: Vec<String> = block
                    .lines()
                    .map(|line| line.chars().filter_map(|c| c.char()).collect())
                    .collect();
                join_block_lines(lines.iter().map(String::as_str))
            })
            .filter(|paragraph| !paragraph.is_empty())
            .collect();

        Ok(paragraphs.join("\n"))
    }

    /// Text layer of the whole document, each page followed by a newline.
    pub fn text(&self) -> Result<String> {
        let mut text = String::new();
        for page_num in 0..self.page_count {
            text.push_str(&self.page_text(page_num)?);
            text.push('\n');
        }
        Ok(text)
    }

    /// Rasterize a page to PNG at the given resolution.
    pub fn render_page_png(&self, page_num: usize, dpi: u32) -> Result<Vec<u8>> {
        let img = self.render_page(page_num, dpi)?;

        let mut png_data = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new_with_quality(
            &mut png_data,
            image::codecs::png::CompressionType::Fast,
            image::codecs::png::FilterType::Adaptive,
        );
        encoder
            .write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgba8)
            .map_err(|e| Error::extraction(FORMAT, format!("failed to encode page {}: {e}", page_num + 1)))?;

        Ok(png_data)
    }

    /// Rasterize pages in order, handing each PNG to `sink` as soon as it
    /// is encoded. Stops early when `sink` returns `false`.
    pub fn for_each_page_png(&self, dpi: u32, mut sink: impl FnMut(Vec<u8>) -> bool) -> Result<()> {
        for page_num in 0..self.page_count {
            if !sink(self.render_page_png(page_num, dpi)?) {
                break;
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)] // dpi values are small
    fn render_page(&self, page_num: usize, dpi: u32) -> Result<RgbaImage> {
        let page = self.load_page(page_num)?;

        let scale = dpi as f32 / POINTS_PER_INCH;
        let matrix = Matrix::new_scale(scale, scale);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
            .map_err(|e| Error::extraction(FORMAT, format!("failed to rasterize page {}: {e}", page_num + 1)))?;

        let n = pixmap.n() as usize;
        let mut rgba = Vec::with_capacity(pixmap.samples().len() / n.max(1) * 4);
        for px in pixmap.samples().chunks(n) {
            match n {
                1 => rgba.extend_from_slice(&[px[0], px[0], px[0], 255]),
                3 => rgba.extend_from_slice(&[px[0], px[1], px[2], 255]),
                4 => rgba.extend_from_slice(px),
                _ => {
                    return Err(Error::extraction(
                        FORMAT,
                        format!("unexpected pixel format with {n} components"),
                    ));
                }
            }
        }

        RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba)
            .ok_or_else(|| Error::extraction(FORMAT, "failed to create image buffer"))
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .finish()
    }
}

/// Join the lines of one text block into a paragraph.
///
/// Lines are joined with a space. A word hyphenated across a line break
/// ("transla-" + "tion") is rejoined; compounds ("self-" + "Contained") and
/// spaced dashes ("pages -" + "see") keep their hyphen.
fn join_block_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    let mut paragraph = String::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if paragraph.is_empty() {
            paragraph.push_str(line);
            continue;
        }
        if is_broken_word(&paragraph, line) {
            paragraph.pop();
        } else if !ends_with_attached_hyphen(&paragraph) {
            paragraph.push(' ');
        }
        paragraph.push_str(line);
    }
    paragraph
}

/// A trailing hyphen directly after a non-space character ("self-", "10-").
fn ends_with_attached_hyphen(paragraph: &str) -> bool {
    let mut tail = paragraph.chars().rev();
    tail.next() == Some('-') && tail.next().is_some_and(|c| !c.is_whitespace())
}

/// A trailing hyphen after a letter, followed by a lowercase continuation.
fn is_broken_word(paragraph: &str, next_line: &str) -> bool {
    let mut tail = paragraph.chars().rev();
    tail.next() == Some('-')
        && tail.next().is_some_and(char::is_alphabetic)
        && next_line.chars().next().is_some_and(char::is_lowercase)
}

/// MuPDF addresses pages with `i32`.
fn page_index(page_num: usize, total: usize) -> Result<i32> {
    if page_num >= total {
        return Err(Error::extraction(
            FORMAT,
            format!("invalid page number {page_num} (document has {total} pages)"),
        ));
    }
    i32::try_from(page_num).map_err(|_| Error::extraction(FORMAT, format!("page number {page_num} out of range")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_index_bounds() {
        assert_eq!(page_index(0, 3).unwrap(), 0);
        assert_eq!(page_index(2, 3).unwrap(), 2);
        assert!(page_index(3, 3).is_err());
    }

    #[test]
    fn test_invalid_pdf_bytes() {
        let result = PdfDocument::from_bytes(&[0u8, 1, 2, 3]);
        assert!(matches!(result, Err(Error::Extraction { format: "PDF", .. })));
    }

    #[test]
    fn test_empty_pdf_bytes() {
        assert!(PdfDocument::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_block_lines_joined_with_spaces() {
        assert_eq!(join_block_lines(["The quick brown", "  fox jumps ", ""]), "The quick brown fox jumps");
    }

    #[test]
    fn test_hyphenated_word_rejoined() {
        assert_eq!(join_block_lines(["a transla-", "tion memory"]), "a translation memory");
    }

    #[test]
    fn test_hyphens_that_belong_to_the_text_are_kept() {
        // Compound split after its hyphen
        assert_eq!(join_block_lines(["self-", "Contained unit"]), "self-Contained unit");
        // Spaced dash at the end of a line
        assert_eq!(join_block_lines(["ten pages -", "see below"]), "ten pages - see below");
        // Numeric range
        assert_eq!(join_block_lines(["pages 10-", "12"]), "pages 10-12");
    }
}
