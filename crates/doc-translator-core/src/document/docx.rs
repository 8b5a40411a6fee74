//! DOCX paragraph text extraction.
//!
//! Reads `word/document.xml` out of the OOXML zip container and emits the
//! body-level paragraphs in document order, one per line. Paragraphs inside
//! tables and text boxes are not part of the body paragraph list.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::error::{Error, Result};

const FORMAT: &str = "DOCX";
const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the text of every body paragraph, joined with `\n`.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::extraction(FORMAT, format!("not a valid DOCX container: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| Error::extraction(FORMAT, format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::extraction(FORMAT, format!("failed to read {DOCUMENT_PART}: {e}")))?;

    Ok(paragraphs_from_xml(&xml)?.join("\n"))
}

/// Walk `document.xml` and collect body paragraph texts.
pub(crate) fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut table_depth = 0usize;
    let mut paragraph_depth = 0usize;
    // Paragraph and run properties hold tab stop definitions, not content
    let mut properties_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::extraction(FORMAT, format!("malformed {DOCUMENT_PART}: {e}")))?;

        let collecting = table_depth == 0 && paragraph_depth == 1 && properties_depth == 0;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:pPr" | b"w:rPr" => properties_depth += 1,
                b"w:p" => {
                    paragraph_depth += 1;
                    if table_depth == 0 && paragraph_depth == 1 {
                        current.clear();
                    }
                }
                b"w:t" => in_text = true,
                b"w:tab" if collecting => current.push('\t'),
                b"w:br" | b"w:cr" if collecting => current.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" if collecting => current.push('\t'),
                b"w:br" | b"w:cr" if collecting => current.push('\n'),
                // Self-closing paragraph: still a (blank) body paragraph
                b"w:p" if table_depth == 0 && paragraph_depth == 0 => paragraphs.push(String::new()),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:pPr" | b"w:rPr" => properties_depth = properties_depth.saturating_sub(1),
                b"w:p" => {
                    if table_depth == 0 && paragraph_depth == 1 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Text(t) if in_text && collecting => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::extraction(FORMAT, format!("bad text escape: {e}")))?;
                current.push_str(&text);
            }
            Event::CData(t) if in_text && collecting => {
                current.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
