use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::GigaChatConfig;
use crate::domains::message::ChatMessage;
use crate::error::{LumiraError, Result};
use crate::interfaces::providers::LlmProvider;

const FRIENDLY_SYSTEM_PROMPT: &str = "Ты дружелюбный помощник.";
const TOKEN_REFRESH_MARGIN_MS: i64 = 60_000;
const DEFAULT_TOKEN_TTL_MS: i64 = 30 * 60_000;

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at_ms: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_at: Option<i64>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the GigaChat OAuth endpoint and chat-completions API.
pub struct GigaChatProvider {
    config: GigaChatConfig,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl GigaChatProvider {
    pub fn new(config: GigaChatConfig) -> Result<Self> {
        if !config.verify_ssl {
            debug!("gigachat TLS certificate verification disabled");
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| LumiraError::Http(e.to_string()))?;
        Ok(Self {
            config,
            client,
            token: Mutex::new(None),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Returns a cached access token, requesting a new one when it is close
    /// to expiry.
    pub async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.expires_at_ms - TOKEN_REFRESH_MARGIN_MS > now_ms() {
                return Ok(token.value.clone());
            }
        }
        let token = self.request_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn request_token(&self) -> Result<CachedToken> {
        let credentials = format!("{}:{}", self.config.client_id, self.config.client_secret);
        let basic = general_purpose::STANDARD.encode(credentials.as_bytes());

        let response = self
            .client
            .post(&self.config.auth_url)
            .timeout(Duration::from_secs(30))
            .header("Accept", "application/json")
            .header("RqUID", &self.config.rquid)
            .header("Authorization", format!("Basic {basic}"))
            .form(&[
                ("scope", self.config.scope.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| LumiraError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LumiraError::Http(format!(
                "token request failed with {status}: {body}"
            )));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| LumiraError::Serialization(e.to_string()))?;
        let expires_at_ms = payload
            .expires_at
            .unwrap_or_else(|| now_ms() + DEFAULT_TOKEN_TTL_MS);
        info!(scope = %self.config.scope, "obtained gigachat access token");
        Ok(CachedToken {
            value: payload.access_token,
            expires_at_ms,
        })
    }

    async fn post_chat(&self, token: &str, messages: &[ChatMessage]) -> Result<reqwest::Response> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_url.trim_end_matches('/')
        );
        self.client
            .post(url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(&ChatRequest {
                model: &self.config.model,
                messages,
            })
            .send()
            .await
            .map_err(|e| LumiraError::Http(e.to_string()))
    }

    /// Single exchange with the default friendly-assistant persona.
    pub async fn chat_with_system(&self, user_message: &str) -> Result<String> {
        self.generate_text(user_message, FRIENDLY_SYSTEM_PROMPT).await
    }
}

#[async_trait]
impl LlmProvider for GigaChatProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let token = self.access_token().await?;
        let mut response = self.post_chat(&token, &messages).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("gigachat rejected the access token, refreshing");
            self.invalidate_token().await;
            let token = self.access_token().await?;
            response = self.post_chat(&token, &messages).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LumiraError::Http(format!(
                "chat completion failed with {status}: {body}"
            )));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| LumiraError::Serialization(e.to_string()))?;
        let choice = payload
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LumiraError::Serialization("No choices returned".to_string()))?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
