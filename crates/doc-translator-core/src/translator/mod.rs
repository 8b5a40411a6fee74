//! Translation adapter: chunking plus the external translation services.

pub mod chunk;
mod google;
mod http;
mod openai;
mod traits;

pub use google::GoogleTranslator;
pub use openai::OpenAiTranslator;
pub use traits::{Translator, TranslatorInfo};

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::config::{Lang, TranslatorBackend, TranslatorConfig};
use crate::document::ExtractedText;
use crate::error::Result;
use chunk::{Chunk, split_into_chunks};

/// Create a translator from configuration
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    let translator: Arc<dyn Translator> = match config.backend {
        TranslatorBackend::Google => Arc::new(GoogleTranslator::new(config)?),
        TranslatorBackend::OpenAi => Arc::new(OpenAiTranslator::new(config)?),
    };
    info!("Using {} translator", translator.name());
    Ok(translator)
}

/// Sinhala text produced by translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedText {
    text: String,
    chunk_count: usize,
}

impl TranslatedText {
    pub fn new(text: impl Into<String>, chunk_count: usize) -> Self {
        Self {
            text: text.into(),
            chunk_count,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Number of chunks the source was split into.
    pub const fn chunk_count(&self) -> usize {
        self.chunk_count
    }
}

/// Chunking and request fan-out settings.
#[derive(Debug, Clone, Copy)]
pub struct TranslateOptions {
    pub max_chunk_chars: usize,
    pub concurrency: usize,
}

impl From<&TranslatorConfig> for TranslateOptions {
    fn from(config: &TranslatorConfig) -> Self {
        Self {
            max_chunk_chars: config.max_chunk_chars,
            concurrency: config.concurrency,
        }
    }
}

/// Callback receiving `(chunks_done, chunks_total)`.
pub type ChunkProgress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Translate a whole text chunk by chunk.
///
/// Up to `concurrency` requests are in flight, but results are reassembled
/// in source order. The first failing chunk aborts the translation.
pub async fn translate_text(
    translator: &dyn Translator,
    text: &ExtractedText,
    source: &Lang,
    target: &Lang,
    options: TranslateOptions,
    progress: Option<ChunkProgress<'_>>,
) -> Result<TranslatedText> {
    let chunks = split_into_chunks(text.as_str(), options.max_chunk_chars);
    let total = chunks.len();
    info!(
        "Translating {} chars in {} chunks ({} -> {})",
        text.as_str().chars().count(),
        total,
        source,
        target
    );

    let mut results = stream::iter(chunks.into_iter().map(|chunk| translate_chunk(translator, chunk, source, target)))
        .buffered(options.concurrency.max(1));

    let mut output = String::with_capacity(text.as_str().len() * 2);
    let mut done = 0;
    while let Some(result) = results.next().await {
        output.push_str(&result?);
        done += 1;
        debug!("Chunk {}/{} translated", done, total);
        if let Some(progress) = progress {
            progress(done, total);
        }
    }

    Ok(TranslatedText::new(output, total))
}

/// Translate one chunk, keeping its surrounding whitespace and separator.
async fn translate_chunk(translator: &dyn Translator, chunk: Chunk, source: &Lang, target: &Lang) -> Result<String> {
    if chunk.is_blank() {
        return Ok(format!("{}{}", chunk.text, chunk.separator));
    }

    let core = chunk.text.trim();
    let leading = &chunk.text[..chunk.text.len() - chunk.text.trim_start().len()];
    let trailing = &chunk.text[leading.len() + core.len()..];

    let translated = translator.translate(core, source, target).await?;
    Ok(format!("{leading}{translated}{trailing}{}", chunk.separator))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::document::DocumentKind;
    use crate::error::Error;

    /// Upper-cases input; earlier chunks answer more slowly.
    struct SlowUpper {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for SlowUpper {
        fn info(&self) -> TranslatorInfo {
            TranslatorInfo {
                name: "slow-upper",
            }
        }

        async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = 30u64.saturating_sub(n as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(text.to_uppercase())
        }
    }

    struct FailOn(&'static str);

    #[async_trait]
    impl Translator for FailOn {
        fn info(&self) -> TranslatorInfo {
            TranslatorInfo {
                name: "fail-on",
            }
        }

        async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
            if text.contains(self.0) {
                Err(Error::TranslationService("boom".to_string()))
            } else {
                Ok(text.to_string())
            }
        }
    }

    fn extracted(text: &str) -> ExtractedText {
        ExtractedText::new(text, DocumentKind::Txt, false, 1)
    }

    fn langs() -> (Lang, Lang) {
        (Lang::new("en"), Lang::new("si"))
    }

    #[tokio::test]
    async fn test_order_preserved_with_concurrency() {
        let translator = SlowUpper {
            calls: AtomicUsize::new(0),
        };
        let (source, target) = langs();
        let options = TranslateOptions {
            max_chunk_chars: 5,
            concurrency: 4,
        };
        let result = translate_text(&translator, &extracted("one\ntwo\nthree\nfour"), &source, &target, options, None)
            .await
            .unwrap();
        assert_eq!(result.as_str(), "ONE\nTWO\nTHREE\nFOUR");
        assert_eq!(result.chunk_count(), 4);
    }

    #[tokio::test]
    async fn test_whitespace_kept_and_blank_chunks_skipped() {
        let translator = SlowUpper {
            calls: AtomicUsize::new(0),
        };
        let (source, target) = langs();
        let options = TranslateOptions {
            max_chunk_chars: 4500,
            concurrency: 1,
        };
        let result = translate_text(&translator, &extracted("  hello\n\n"), &source, &target, options, None)
            .await
            .unwrap();
        assert_eq!(result.as_str(), "  HELLO\n\n");

        let blank = translate_text(&translator, &extracted("\n \n"), &source, &target, options, None)
            .await
            .unwrap();
        assert_eq!(blank.as_str(), "\n \n");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_error_aborts() {
        let (source, target) = langs();
        let options = TranslateOptions {
            max_chunk_chars: 4,
            concurrency: 2,
        };
        let err = translate_text(&FailOn("bad"), &extracted("ok\nbad\nok"), &source, &target, options, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TranslationService(_)));
    }

    #[tokio::test]
    async fn test_progress_reported_per_chunk() {
        let seen = Mutex::new(Vec::new());
        let record = |done: usize, total: usize| seen.lock().unwrap().push((done, total));
        let (source, target) = langs();
        let options = TranslateOptions {
            max_chunk_chars: 3,
            concurrency: 1,
        };
        translate_text(&FailOn("never"), &extracted("abc\ndef"), &source, &target, options, Some(&record))
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_create_translator_backends() {
        let google = create_translator(&TranslatorConfig::default()).unwrap();
        assert_eq!(google.name(), "Google Translate");

        let config = TranslatorConfig {
            backend: TranslatorBackend::OpenAi,
            ..TranslatorConfig::default()
        };
        assert_eq!(create_translator(&config).unwrap().name(), "OpenAI Compatible");
    }
}
