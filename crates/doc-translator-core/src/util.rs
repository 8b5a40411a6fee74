//! Utility functions shared across the crate.

use std::path::{Path, PathBuf};

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Lowercased extension of a file name, including the leading dot.
pub fn dotted_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// File stem used to name output artifacts ("report.pdf" -> "report").
pub fn output_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_extension() {
        assert_eq!(dotted_extension("Scan.TIFF").as_deref(), Some(".tiff"));
        assert_eq!(dotted_extension("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(dotted_extension("README"), None);
        assert_eq!(dotted_extension("trailing."), None);
    }

    #[test]
    fn test_output_stem() {
        assert_eq!(output_stem("letter.docx"), "letter");
        assert_eq!(output_stem("/tmp/uploads/photo.png"), "photo");
        assert_eq!(output_stem(""), "document");
    }
}
