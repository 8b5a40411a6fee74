//! Document Translator Web - upload a document, read and download its Sinhala translation.

mod helpers;
mod routes;
mod state;
mod templates;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    routing::{get, post},
};
use clap::Parser;
use doc_translator_core::AppConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "doc-translator-web")]
#[command(author, version, about = "Document Translator Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(routes::index))
        // API endpoints
        .route("/api/translate", post(routes::translate_document))
        .route("/api/render", post(routes::render_download))
        .route("/api/health", get(routes::health))
        // Middleware
        // Translations are never cached; downloads set their own headers
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(routes::MAX_UPLOAD_MB * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // reqwest and hyper are chatty at debug level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},hyper=info,reqwest=info")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let state = Arc::new(AppState::new(config).context("Failed to initialize application state")?);

    match state.translator.ocr_status().await {
        Ok(()) => info!("OCR engine ready"),
        Err(e) => tracing::warn!("{} (scanned PDFs and images will be rejected)", e),
    }
    info!("Translating with {}", state.translator.translator_name());

    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use doc_translator_core::translator::TranslatorInfo;
    use doc_translator_core::{DocumentTranslator, Lang, OcrEngine, TesseractEngine, Translator};
    use tower::ServiceExt;

    struct UppercaseTranslator;

    #[async_trait]
    impl Translator for UppercaseTranslator {
        fn info(&self) -> TranslatorInfo {
            TranslatorInfo {
                name: "Uppercase",
            }
        }

        async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> doc_translator_core::Result<String> {
            Ok(text.to_uppercase())
        }
    }

    fn test_app() -> Router {
        let config = AppConfig::default();
        let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractEngine::new(&config.ocr));
        let translator = DocumentTranslator::with_components(Arc::new(UppercaseTranslator), ocr, config);
        app(Arc::new(AppState::from_translator(translator)))
    }

    fn multipart_request(file_name: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--BOUNDARY\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{contents}\r\n--BOUNDARY--\r\n"
        );
        Request::post("/api/translate")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    fn render_request(body: &str) -> Request<Body> {
        Request::post("/api/render")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_page() {
        let response = test_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store, max-age=0");
        let html = body_text(response).await;
        assert!(html.contains("name=\"use_ocr\""));
        assert!(html.contains(".pdf,.docx,.txt"));
    }

    #[tokio::test]
    async fn test_translate_txt_upload() {
        let response = test_app()
            .oneshot(multipart_request("letter.txt", "hello world"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("HELLO WORLD"));
        assert!(html.contains("letter-si"));
    }

    #[tokio::test]
    async fn test_translate_empty_txt_warns() {
        let response = test_app().oneshot(multipart_request("blank.txt", "  ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("no text to translate"));
    }

    #[tokio::test]
    async fn test_translate_unsupported_format() {
        let response = test_app()
            .oneshot(multipart_request("notes.xyz", "hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let html = body_text(response).await;
        assert!(html.contains("Unsupported file format"));
    }

    #[tokio::test]
    async fn test_render_txt_download() {
        let response = test_app()
            .oneshot(render_request("text=line+one%0D%0Aline+two&format=txt&file_name=letter-si"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"letter-si.txt\""));
        assert_eq!(body_text(response).await, "line one\nline two");
    }

    #[tokio::test]
    async fn test_render_unknown_format() {
        let response = test_app()
            .oneshot(render_request("text=x&format=docx&file_name=letter-si"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["backend"], "Uppercase");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["ocr_available"].is_boolean());
    }
}
