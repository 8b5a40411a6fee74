//! Document Translator CLI - translate English documents into Sinhala.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use doc_translator_core::{
    AppConfig, Document, DocumentTranslator, Lang, OutputFormat, Progress, TranslatorBackend,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatOption {
    Txt,
    Pdf,
}

impl From<FormatOption> for OutputFormat {
    fn from(opt: FormatOption) -> Self {
        match opt {
            FormatOption::Txt => Self::Txt,
            FormatOption::Pdf => Self::Pdf,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendOption {
    Google,
    Openai,
}

impl From<BackendOption> for TranslatorBackend {
    fn from(opt: BackendOption) -> Self {
        match opt {
            BackendOption::Google => Self::Google,
            BackendOption::Openai => Self::OpenAi,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "doc-translate")]
#[command(author, version, about = "Translate English documents (PDF, DOCX, TXT, images) into Sinhala", long_about = None)]
struct Args {
    /// Input document (.pdf, .docx, .txt, .jpg, .jpeg, .png, .bmp, .tif, .tiff)
    #[arg(required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// Output file (default: <input>-<target>.<format> beside the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run OCR on PDF pages instead of reading the text layer
    #[arg(long)]
    ocr: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum)]
    format: Option<FormatOption>,

    /// Source language code
    #[arg(short = 's', long)]
    source: Option<String>,

    /// Target language code
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Translation service
    #[arg(long, value_enum)]
    backend: Option<BackendOption>,

    /// Translation API base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Translation API key (Google Cloud key, or bearer token for OpenAI-compatible APIs)
    #[arg(long, env = "DOC_TRANSLATOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name for OpenAI-compatible APIs
    #[arg(long)]
    model: Option<String>,

    /// Maximum characters per translation request
    #[arg(long)]
    max_chunk_chars: Option<usize>,

    /// Translation requests in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Font file with Sinhala coverage for PDF output
    #[arg(long)]
    font: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also print the translated text to stdout
    #[arg(long)]
    print_text: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Command line flags win over config files and environment.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(source) = &self.source {
            config.source_lang = Lang::new(source);
        }
        if let Some(target) = &self.target {
            config.target_lang = Lang::new(target);
        }
        if let Some(format) = self.format {
            config.default_format = format.into();
        }
        if let Some(backend) = self.backend {
            config.translator.backend = backend.into();
        }
        if let Some(api_base) = &self.api_base {
            config.translator.api_base = Some(api_base.clone());
        }
        if let Some(api_key) = &self.api_key {
            config.translator.api_key = Some(api_key.clone());
        }
        if let Some(model) = &self.model {
            config.translator.model.clone_from(model);
        }
        if let Some(max_chunk_chars) = self.max_chunk_chars {
            config.translator.max_chunk_chars = max_chunk_chars;
        }
        if let Some(concurrency) = self.concurrency {
            config.translator.concurrency = concurrency;
        }
        if let Some(font) = &self.font {
            config.render.font_path = Some(font.clone());
        }
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

fn default_output_path(input: &Path, file_name: &str) -> PathBuf {
    input.with_file_name(file_name)
}

/// Configuration safe to print: secrets are masked.
fn redacted(mut config: AppConfig) -> AppConfig {
    if config.translator.api_key.is_some() {
        config.translator.api_key = Some("<redacted>".to_string());
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        // CLI output is intentional
        #[allow(clippy::print_stdout)]
        {
            print!("{}", redacted(config).to_toml()?);
        }
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        anyhow::bail!("No input document given");
    };

    info!("Loading document: {}", input.display());
    let doc = Document::from_file(input).with_context(|| format!("Failed to load {}", input.display()))?;

    let format = config.default_format;
    let translator = DocumentTranslator::new(config).context("Failed to initialize translator")?;

    let pb = progress_bar();
    let report = |progress: Progress| match progress {
        Progress::Extracting => pb.set_message("extracting text"),
        Progress::Translating { done, total } => {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
            pb.set_message("translating");
        }
        Progress::Rendering => pb.set_message(format!("rendering {format}")),
    };

    let outcome = translator
        .process(&doc, args.ocr, format, Some(&report))
        .await
        .with_context(|| format!("Failed to translate {}", input.display()));
    pb.finish_and_clear();
    let outcome = outcome?;

    if let Some(warning) = outcome.warning {
        // CLI output is intentional
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Warning: {warning}");
            eprintln!("No output written.");
        }
        return Ok(());
    }

    if args.print_text
        && let Some(translated) = &outcome.translated
    {
        #[allow(clippy::print_stdout)]
        {
            println!("{}", translated.as_str());
        }
    }

    let Some(artifact) = outcome.artifact else {
        anyhow::bail!("Translation produced no output");
    };

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input, &artifact.file_name));

    std::fs::write(&output_path, &artifact.bytes)
        .with_context(|| format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stderr)]
    {
        eprintln!("Translated {} saved to: {}", artifact.format, output_path.display());
    }

    Ok(())
}
