use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::render::OutputFormat;

/// Language codes following ISO 639-1 (e.g. "en", "si")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn default_source_lang() -> Lang {
    Lang::new(DEFAULT_SOURCE_LANG)
}

fn default_target_lang() -> Lang {
    Lang::new(DEFAULT_TARGET_LANG)
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which external translation service to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorBackend {
    /// Google Translate (public web endpoint, or Cloud Translation v2 with an API key)
    #[default]
    Google,
    /// Any OpenAI-compatible chat completions API
    OpenAi,
}

impl TranslatorBackend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
        }
    }
}

/// Translation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub backend: TranslatorBackend,
    /// Overrides the backend's default base URL
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier (OpenAI-compatible backend only)
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum characters per request
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    /// Chunks translated concurrently (results are always re-sequenced)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retry once when the service signals a transient failure
    #[serde(default = "default_true")]
    pub retry_transient: bool,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Request-size limit of the public Google Translate endpoint, with headroom.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 4500;

const fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

const fn default_concurrency() -> usize {
    1
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_true() -> bool {
    true
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            backend: TranslatorBackend::default(),
            api_base: None,
            api_key: None,
            model: default_model(),
            max_chunk_chars: default_max_chunk_chars(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            retry_transient: true,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// OCR engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract executable
    #[serde(default = "default_ocr_command")]
    pub command: String,
    /// Trained language model passed as `-l`
    #[serde(default = "default_ocr_language")]
    pub language: String,
    /// Tesseract `--psm` value (engine default when unset)
    #[serde(default)]
    pub page_segmentation_mode: Option<u32>,
    /// Resolution used when rasterizing PDF pages for OCR
    #[serde(default = "default_ocr_dpi")]
    pub dpi: u32,
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

fn default_ocr_language() -> String {
    DEFAULT_OCR_LANGUAGE.to_string()
}

const fn default_ocr_dpi() -> u32 {
    200
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: default_ocr_command(),
            language: default_ocr_language(),
            page_segmentation_mode: None,
            dpi: default_ocr_dpi(),
        }
    }
}

/// PDF output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// HTML-to-PDF engine executable (invoked as `<cmd> [args] <in.html> <out.pdf>`)
    #[serde(default = "default_engine_command")]
    pub engine_command: String,
    #[serde(default)]
    pub engine_args: Vec<String>,
    /// CSS font family with Sinhala coverage
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Font file to embed; also used to verify glyph coverage
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default = "default_font_size_pt")]
    pub font_size_pt: f32,
    #[serde(default = "default_line_height")]
    pub line_height: f32,
    /// CSS `@page` size (e.g. "A4", "Letter")
    #[serde(default = "default_page_size")]
    pub page_size: String,
    #[serde(default = "default_render_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_engine_command() -> String {
    "weasyprint".to_string()
}

fn default_font_family() -> String {
    "Noto Sans Sinhala".to_string()
}

const fn default_font_size_pt() -> f32 {
    12.0
}

const fn default_line_height() -> f32 {
    1.6
}

fn default_page_size() -> String {
    "A4".to_string()
}

const fn default_render_timeout_secs() -> u64 {
    120
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine_command: default_engine_command(),
            engine_args: Vec::new(),
            font_family: default_font_family(),
            font_path: None,
            font_size_pt: default_font_size_pt(),
            line_height: default_line_height(),
            page_size: default_page_size(),
            timeout_secs: default_render_timeout_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,

    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Output format when none is requested explicitly
    #[serde(default)]
    pub default_format: OutputFormat,

    #[serde(default)]
    pub translator: TranslatorConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            default_format: OutputFormat::default(),
            translator: TranslatorConfig::default(),
            ocr: OcrConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

/// Prefix for environment overrides, e.g. `DOC_TRANSLATOR_TRANSLATOR__API_KEY`.
pub const ENV_PREFIX: &str = "DOC_TRANSLATOR";

impl AppConfig {
    /// Load configuration from a single TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load layered configuration.
    ///
    /// Later sources win: `~/.config/doc-translator/config.toml`,
    /// `./config.toml`, the explicit file (which must exist), then
    /// `DOC_TRANSLATOR_*` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut optional = Vec::new();
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("doc-translator").join("config.toml");
            tracing::debug!("Looking for user config at {}", user_config.display());
            optional.push(user_config);
        }
        optional.push(PathBuf::from("config.toml"));

        Self::load_layered(&optional, explicit, None)
    }

    /// Merge `optional` files, then `explicit`, then the environment.
    ///
    /// `env` replaces the process environment when given.
    fn load_layered(
        optional: &[PathBuf],
        explicit: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        for path in optional {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| Error::ConfigLoad(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.translator.max_chunk_chars == 0 {
            return Err(Error::ConfigInvalid {
                field: "translator.max_chunk_chars".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.translator.concurrency == 0 {
            return Err(Error::ConfigInvalid {
                field: "translator.concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.ocr.language.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                field: "ocr.language".to_string(),
                reason: "must name a trained language model".to_string(),
            });
        }
        if self.render.engine_command.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                field: "render.engine_command".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::ConfigLoad(format!("Failed to serialize config: {e}")))
    }
}

/// Default source language code
pub const DEFAULT_SOURCE_LANG: &str = "en";
/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "si";
/// Default Tesseract language model
pub const DEFAULT_OCR_LANGUAGE: &str = "sin";

/// File extensions accepted by the loader, in display order.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &[".pdf", ".docx", ".txt", ".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".tif"];

/// Human-readable language name for prompts and page metadata.
pub fn language_name(lang: &Lang) -> &'static str {
    match lang.as_str() {
        "en" => "English",
        "si" => "Sinhala",
        "ta" => "Tamil",
        "hi" => "Hindi",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "zh-CN" => "Simplified Chinese",
        "ja" => "Japanese",
        _ => "the specified language",
    }
}
