/* src/server/core/rust/src/translator.rs */

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TranslatorSection;
use crate::errors::MosaicError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
  pub texts: BTreeMap<String, String>,
  pub target_language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
  /// May omit keys; callers fall back to the source text for those.
  #[serde(default)]
  pub translated_texts: BTreeMap<String, String>,
}

/// Opaque text-in / text-out translation provider.
#[async_trait]
pub trait Translator: Send + Sync {
  async fn translate(
    &self,
    request: TranslationRequest,
  ) -> Result<TranslationResponse, MosaicError>;
}

/// Translator backed by an HTTP endpoint accepting a JSON `TranslationRequest`
/// and answering with a JSON `TranslationResponse`.
pub struct HttpTranslator {
  client: reqwest::Client,
  endpoint: String,
  api_key: Option<String>,
}

impl HttpTranslator {
  pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, MosaicError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| MosaicError::internal(format!("failed to build translator client: {e}")))?;
    Ok(Self { client, endpoint: endpoint.into(), api_key: None })
  }

  /// Build from config, reading the API key from the named environment
  /// variable when one is configured.
  pub fn from_config(section: &TranslatorSection) -> Result<Self, MosaicError> {
    let mut translator =
      Self::new(section.endpoint.clone(), Duration::from_secs(section.timeout_secs))?;
    if let Some(var) = &section.api_key_env {
      let key = std::env::var(var).map_err(|_| {
        MosaicError::internal(format!("translator api key variable {var} is not set"))
      })?;
      translator.api_key = Some(key);
    }
    Ok(translator)
  }

  pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
    self.api_key = Some(key.into());
    self
  }
}

#[async_trait]
impl Translator for HttpTranslator {
  async fn translate(
    &self,
    request: TranslationRequest,
  ) -> Result<TranslationResponse, MosaicError> {
    let mut req = self.client.post(&self.endpoint).json(&request);
    if let Some(key) = &self.api_key {
      req = req.bearer_auth(key);
    }
    let resp = req
      .send()
      .await
      .map_err(|e| MosaicError::translation_failed(format!("translator request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(MosaicError::translation_failed(format!("translator returned HTTP {status}")));
    }

    resp
      .json()
      .await
      .map_err(|e| {
        MosaicError::translation_failed(format!("failed to parse translator response: {e}"))
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn wire_field_names() {
    let req = TranslationRequest {
      texts: [("title".to_string(), "Hello".to_string())].into(),
      target_language: "de".to_string(),
    };
    assert_eq!(
      serde_json::to_value(&req).unwrap(),
      json!({"texts": {"title": "Hello"}, "targetLanguage": "de"})
    );

    let resp: TranslationResponse =
      serde_json::from_value(json!({"translatedTexts": {"title": "Hallo"}})).unwrap();
    assert_eq!(resp.translated_texts["title"], "Hallo");

    let empty: TranslationResponse = serde_json::from_value(json!({})).unwrap();
    assert!(empty.translated_texts.is_empty());
  }

  #[test]
  fn from_config_requires_key_variable() {
    let section = TranslatorSection {
      endpoint: "http://localhost:9".to_string(),
      api_key_env: Some("MOSAIC_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
      timeout_secs: 1,
    };
    let err = HttpTranslator::from_config(&section).err().unwrap();
    assert!(err.message().contains("MOSAIC_TEST_KEY_THAT_IS_NEVER_SET"));
  }

  #[tokio::test]
  async fn unreachable_endpoint_is_translation_failure() {
    let translator =
      HttpTranslator::new("http://127.0.0.1:9/translate", Duration::from_millis(500)).unwrap();
    let req = TranslationRequest { texts: BTreeMap::new(), target_language: "de".to_string() };
    let err = translator.translate(req).await.unwrap_err();
    assert_eq!(err.code(), "TRANSLATION_FAILED");
  }
}
