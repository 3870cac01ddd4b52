use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::OcrConfig;
use crate::error::{LumiraError, Result};

pub const DEFAULT_LANGUAGE: &str = "eng";
pub const DEFAULT_ENGINE: u8 = 2;

/// Text extraction through the OCR.Space `parse/image` endpoint.
pub struct OcrSpaceClient {
    config: OcrConfig,
    client: Client,
}

impl OcrSpaceClient {
    pub fn new(config: OcrConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LumiraError::Http(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn parse_image(
        &self,
        filename: &str,
        content: &[u8],
        language: Option<&str>,
        engine: Option<u8>,
    ) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| LumiraError::Ocr("OCR_SPACE_API_KEY is not configured.".to_string()))?;

        let filename = if filename.trim().is_empty() {
            "upload"
        } else {
            filename.trim()
        };
        let data_url = format!(
            "data:{};base64,{}",
            mime_for(filename),
            general_purpose::STANDARD.encode(content)
        );
        let engine = engine.unwrap_or(DEFAULT_ENGINE).to_string();
        let form = [
            ("base64Image", data_url.as_str()),
            ("filename", filename),
            ("language", language.unwrap_or(DEFAULT_LANGUAGE)),
            ("isOverlayRequired", "false"),
            ("OCREngine", engine.as_str()),
        ];

        debug!(filename, bytes = content.len(), "sending image to ocr.space");
        let response = self
            .client
            .post(&self.config.api_url)
            .header("apikey", api_key)
            .form(&form)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| LumiraError::Ocr(format!("OCR request failed: {e}")))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LumiraError::Ocr(format!("OCR request failed: {e}")))?;
        extract_text(&payload)
    }
}

fn extract_text(payload: &Value) -> Result<String> {
    if payload
        .get("IsErroredOnProcessing")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        let errors = payload
            .get("ErrorMessage")
            .filter(|v| !v.is_null())
            .or_else(|| payload.get("ErrorDetails").filter(|v| !v.is_null()));
        let message = match errors {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                .collect::<Vec<_>>()
                .join("; "),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => "Unknown error".to_string(),
        };
        return Err(LumiraError::Ocr(message));
    }

    Ok(payload
        .get("ParsedResults")
        .and_then(|v| v.as_array())
        .and_then(|results| results.first())
        .and_then(|first| first.get("ParsedText"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string())
}

fn mime_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "image/png",
    }
}
