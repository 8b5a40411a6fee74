//! Splitting text into service-sized chunks.
//!
//! Whole paragraphs are packed greedily; a paragraph longer than the limit
//! is cut at a sentence end, else at whitespace, else at a character
//! boundary. Concatenating every `text + separator` reproduces the input.

/// A piece of text to translate and the separator that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub separator: String,
}

impl Chunk {
    fn new(text: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            separator: separator.into(),
        }
    }

    /// Whitespace-only chunks are passed through untranslated.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Split `text` into chunks of at most `max_chars` characters each.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<Chunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for paragraph in text.split('\n') {
        let len = paragraph.chars().count();

        if len > max_chars {
            if let Some((packed, _)) = current.take() {
                chunks.push(Chunk::new(packed, "\n"));
            }
            chunks.extend(split_long_paragraph(paragraph, max_chars));
            continue;
        }

        if let Some((packed, packed_len)) = current.as_mut() {
            if *packed_len + 1 + len <= max_chars {
                packed.push('\n');
                packed.push_str(paragraph);
                *packed_len += 1 + len;
                continue;
            }
        }
        if let Some((packed, _)) = current.replace((paragraph.to_string(), len)) {
            chunks.push(Chunk::new(packed, "\n"));
        }
    }

    match current {
        Some((packed, _)) => chunks.push(Chunk::new(packed, "")),
        // Text ended with an oversized paragraph: nothing follows it
        None => {
            if let Some(last) = chunks.last_mut() {
                last.separator.clear();
            }
        }
    }

    chunks
}

/// Cut one oversized paragraph; the final piece carries a `\n` separator.
fn split_long_paragraph(paragraph: &str, max_chars: usize) -> Vec<Chunk> {
    let mut pieces = Vec::new();
    let mut remaining = paragraph;

    while remaining.chars().count() > max_chars {
        let limit = remaining.char_indices().nth(max_chars).map_or(remaining.len(), |(i, _)| i);

        match find_break(remaining, limit) {
            Some(cut) => {
                let piece = remaining[..cut].trim_end();
                let rest = &remaining[piece.len()..];
                let rest_trimmed = rest.trim_start();
                let separator = &rest[..rest.len() - rest_trimmed.len()];
                pieces.push(Chunk::new(piece, separator));
                remaining = rest_trimmed;
            }
            None => {
                pieces.push(Chunk::new(&remaining[..limit], ""));
                remaining = &remaining[limit..];
            }
        }
    }

    pieces.push(Chunk::new(remaining, "\n"));
    pieces
}

/// Byte offset of the best whitespace to cut at within `remaining[..=limit]`.
///
/// Prefers whitespace that follows sentence punctuation. Returns `None`
/// when cutting there would leave an empty piece.
fn find_break(remaining: &str, limit: usize) -> Option<usize> {
    let mut last_space = None;
    let mut last_sentence = None;
    let mut prev = None;

    for (i, c) in remaining.char_indices() {
        if i > limit {
            break;
        }
        if c.is_whitespace() {
            last_space = Some(i);
            if matches!(prev, Some('.' | '!' | '?' | ';' | ':')) {
                last_sentence = Some(i);
            }
        }
        prev = Some(c);
    }

    last_sentence
        .or(last_space)
        .filter(|&cut| !remaining[..cut].trim_end().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(chunks: &[Chunk]) -> String {
        chunks.iter().map(|c| format!("{}{}", c.text, c.separator)).collect()
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_into_chunks("Hello world.\nSecond line.", 4500);
        assert_eq!(chunks, vec![Chunk::new("Hello world.\nSecond line.", "")]);
    }

    #[test]
    fn test_paragraphs_packed_within_limit() {
        let text = "aaaa\nbbbb\ncccc\ndddd";
        let chunks = split_into_chunks(text, 9);
        assert_eq!(chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(), vec!["aaaa\nbbbb", "cccc\ndddd"]);
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn test_long_paragraph_split_at_sentence_end() {
        let text = "One two three. Four five six seven.";
        let chunks = split_into_chunks(text, 20);
        assert_eq!(chunks[0].text, "One two three.");
        assert_eq!(chunks[0].separator, " ");
        assert_eq!(rejoin(&chunks), text);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 20));
    }

    #[test]
    fn test_long_paragraph_split_at_whitespace() {
        let text = "alpha beta gamma delta epsilon";
        let chunks = split_into_chunks(text, 12);
        assert_eq!(chunks[0].text, "alpha beta");
        assert_eq!(rejoin(&chunks), text);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 12));
    }

    #[test]
    fn test_hard_split_respects_char_boundaries() {
        let text = "ශ්‍රීලංකාවශ්‍රීලංකාව";
        let chunks = split_into_chunks(text, 7);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 7));
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn test_structure_preserved_around_long_paragraph() {
        let long = "word ".repeat(10);
        let text = format!("Intro\n\n{}\nOutro\n", long.trim_end());
        let chunks = split_into_chunks(&text, 16);
        assert_eq!(rejoin(&chunks), text);
        assert_eq!(chunks.first().map(|c| c.text.as_str()), Some("Intro\n"));
    }

    #[test]
    fn test_text_ending_with_long_paragraph() {
        let text = "short\nthis paragraph is too long";
        let chunks = split_into_chunks(text, 10);
        assert_eq!(chunks.last().map(|c| c.separator.as_str()), Some(""));
        assert_eq!(rejoin(&chunks), text);
    }

    #[test]
    fn test_blank_chunks_detected() {
        let chunks = split_into_chunks("\n\n", 10);
        assert_eq!(rejoin(&chunks), "\n\n");
        assert!(chunks.iter().all(Chunk::is_blank));
    }
}
