use async_trait::async_trait;

use crate::config::Lang;
use crate::error::Result;

/// Information about a translator backend
#[derive(Debug, Clone)]
pub struct TranslatorInfo {
    /// Human-readable name
    pub name: &'static str,
}

/// Trait for translation backends
#[async_trait]
pub trait Translator: Send + Sync {
    /// Get information about this translator
    fn info(&self) -> TranslatorInfo;

    /// Get the translator name (convenience method)
    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Translate one chunk from source language to target language.
    ///
    /// Chunks are already sized for the service; implementations send them
    /// as a single request.
    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String>;
}
