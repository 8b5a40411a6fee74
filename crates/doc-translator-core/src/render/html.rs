use askama::Template;

use crate::config::RenderConfig;
use crate::error::{Error, Result};

/// Standalone HTML page handed to the PDF engine.
#[derive(Template)]
#[template(path = "document.html")]
struct DocumentHtml<'a> {
    lang: &'a str,
    title: &'a str,
    font_family: String,
    /// Font file next to the HTML, relative URL
    font_src: Option<&'a str>,
    font_size_pt: f32,
    line_height: f32,
    page_size: String,
    paragraphs: Vec<&'a str>,
}

/// Build the HTML document: one `<p>` per line of `text`.
pub(crate) fn build_document(
    text: &str,
    lang: &str,
    title: &str,
    config: &RenderConfig,
    font_src: Option<&str>,
) -> Result<String> {
    let page = DocumentHtml {
        lang,
        title,
        font_family: css_safe(&config.font_family, |c| c != '"' && c != '\\' && c != '<'),
        font_src,
        font_size_pt: config.font_size_pt,
        line_height: config.line_height,
        page_size: css_safe(&config.page_size, |c| c.is_ascii_alphanumeric() || c == ' ' || c == '.'),
        paragraphs: text.trim_end_matches('\n').split('\n').collect(),
    };
    page.render()
        .map_err(|e| Error::render("PDF", format!("failed to build HTML: {e}")))
}

/// Drop characters that could escape the CSS string or value they land in.
fn css_safe(value: &str, keep: impl Fn(char) -> bool) -> String {
    value.chars().filter(|&c| keep(c)).collect()
}
