use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::http::{self, Attempt, RetryPolicy, invalid_response};
use super::traits::{Translator, TranslatorInfo};
use crate::config::{Lang, TranslatorConfig};
use crate::error::Result;

/// Public endpoint used by the Google Translate web widgets
pub const DEFAULT_WEB_BASE: &str = "https://translate.googleapis.com";
/// Cloud Translation API (requires a key)
pub const DEFAULT_CLOUD_BASE: &str = "https://translation.googleapis.com";

const SERVICE: &str = "Google Translate";

/// Google Translate client.
///
/// Without an API key the keyless web endpoint is used; with one, the
/// Cloud Translation v2 API.
pub struct GoogleTranslator {
    client: Client,
    api_base: Option<String>,
    api_key: Option<String>,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct CloudRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct CloudResponse {
    data: CloudData,
}

#[derive(Debug, Deserialize)]
struct CloudData {
    translations: Vec<CloudTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudTranslation {
    translated_text: String,
}

impl GoogleTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_secs)?,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            retry: RetryPolicy::new(config.retry_transient, config.retry_delay_ms),
        })
    }

    fn base(&self, default: &str) -> String {
        self.api_base
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    async fn translate_web(&self, text: &str, source: &Lang, target: &Lang) -> Attempt<String> {
        let url = format!(
            "{}/translate_a/single?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.base(DEFAULT_WEB_BASE),
            urlencoding::encode(source.as_str()),
            urlencoding::encode(target.as_str()),
            urlencoding::encode(text)
        );

        let response = http::send(SERVICE, self.client.get(&url)).await?;
        let body: Value = response.json().await.map_err(|e| invalid_response(SERVICE, e))?;
        parse_web_response(&body).ok_or_else(|| invalid_response(SERVICE, "no translated segments"))
    }

    async fn translate_cloud(&self, key: &str, text: &str, source: &Lang, target: &Lang) -> Attempt<String> {
        let url = format!("{}/language/translate/v2", self.base(DEFAULT_CLOUD_BASE));
        let request = CloudRequest {
            q: text,
            source: source.as_str(),
            target: target.as_str(),
            format: "text",
        };

        let response = http::send(SERVICE, self.client.post(&url).query(&[("key", key)]).json(&request)).await?;
        let body: CloudResponse = response.json().await.map_err(|e| invalid_response(SERVICE, e))?;
        body.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| invalid_response(SERVICE, "no translations in response"))
    }
}

/// The web endpoint answers with nested arrays:
/// `[[["translated", "original", ...], ...], ...]`.
fn parse_web_response(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "Google Translate",
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        if text.trim().is_empty() || source == target {
            return Ok(text.to_string());
        }

        debug!("Translating {} chars via {}", text.chars().count(), SERVICE);
        match self.api_key.as_deref() {
            Some(key) => self.retry.run(SERVICE, || self.translate_cloud(key, text, source, target)).await,
            None => self.retry.run(SERVICE, || self.translate_web(text, source, target)).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web_response_concatenates_segments() {
        let body: Value = serde_json::from_str(
            r#"[[["ආයුබෝවන්. ","Hello. ",null,null,10],["ඔබට කෙසේද?","How are you?",null,null,10]],null,"en"]"#,
        )
        .unwrap();
        assert_eq!(parse_web_response(&body).unwrap(), "ආයුබෝවන්. ඔබට කෙසේද?");
    }

    #[test]
    fn test_parse_web_response_rejects_unexpected_shape() {
        assert!(parse_web_response(&serde_json::json!({"error": "nope"})).is_none());
        assert!(parse_web_response(&serde_json::json!([null, null, "en"])).is_none());
    }

    #[test]
    fn test_cloud_response_shape() {
        let body: CloudResponse =
            serde_json::from_str(r#"{"data":{"translations":[{"translatedText":"ආයුබෝවන්","detectedSourceLanguage":"en"}]}}"#)
                .unwrap();
        assert_eq!(body.data.translations[0].translated_text, "ආයුබෝවන්");
    }

    #[tokio::test]
    async fn test_same_language_passthrough() {
        let translator = GoogleTranslator::new(&TranslatorConfig::default()).unwrap();
        let lang = Lang::new("si");
        assert_eq!(translator.translate("ආයුබෝවන්", &lang, &lang).await.unwrap(), "ආයුබෝවන්");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_translation_error() {
        let config = TranslatorConfig {
            api_base: Some("http://127.0.0.1:9".to_string()),
            retry_delay_ms: 0,
            timeout_secs: 2,
            ..TranslatorConfig::default()
        };
        let translator = GoogleTranslator::new(&config).unwrap();
        let err = translator
            .translate("Hello", &Lang::new("en"), &Lang::new("si"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::TranslationService(_)), "got {err:?}");
    }
}
