use anyhow::Result;
use doc_translator_core::{AppConfig, DocumentTranslator};

/// Shared application state.
///
/// Holds only immutable configuration and the translation pipeline;
/// nothing a request uploads or produces outlives that request.
pub struct AppState {
    pub translator: DocumentTranslator,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let translator = DocumentTranslator::new(config)?;
        Ok(Self { translator })
    }

    #[cfg(test)]
    pub const fn from_translator(translator: DocumentTranslator) -> Self {
        Self { translator }
    }
}
