//! Glyph coverage check for the configured output font.
//!
//! Sinhala needs a font that actually carries the script; otherwise the PDF
//! engine silently substitutes boxes. The check parses the font with
//! `ttf-parser` and looks up every printable character of the text.

use std::collections::BTreeSet;
use std::path::Path;

use ttf_parser::Face;

use crate::error::{Error, Result};

const FORMAT: &str = "PDF";

/// Show at most this many missing characters in the error message.
const MAX_REPORTED: usize = 12;

/// Characters that are shaped away or invisible and need no glyph:
/// ZWSP, ZWNJ, ZWJ, LRM, RLM, word joiner, BOM and soft hyphen.
fn needs_glyph(c: char) -> bool {
    !(c.is_whitespace()
        || c.is_control()
        || matches!(
            c,
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{200E}' | '\u{200F}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
        ))
}

/// Characters of `text` the font has no glyph for, in code point order.
pub fn missing_glyphs(font_data: &[u8], text: &str) -> Result<Vec<char>> {
    let face = Face::parse(font_data, 0).map_err(|e| Error::render(FORMAT, format!("failed to parse font: {e}")))?;

    let missing: BTreeSet<char> = text
        .chars()
        .filter(|&c| needs_glyph(c) && face.glyph_index(c).is_none())
        .collect();
    Ok(missing.into_iter().collect())
}

/// Fail with a `Render` error naming the characters the font cannot draw.
pub fn check_coverage(font_path: &Path, font_data: &[u8], text: &str) -> Result<()> {
    let missing = missing_glyphs(font_data, text)?;
    if missing.is_empty() {
        return Ok(());
    }

    let listed: Vec<String> = missing
        .iter()
        .take(MAX_REPORTED)
        .map(|c| format!("'{c}' (U+{:04X})", u32::from(*c)))
        .collect();
    let more = missing.len().saturating_sub(MAX_REPORTED);
    Err(Error::render(
        FORMAT,
        format!(
            "font {} has no glyphs for {}{}",
            font_path.display(),
            listed.join(", "),
            if more > 0 { format!(" and {more} more") } else { String::new() }
        ),
    ))
}
