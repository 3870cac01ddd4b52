use serde::{Deserialize, Serialize};

use crate::error::{LumiraError, Result};

pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const DEFAULT_MODEL: &str = "GigaChat";
pub const DEFAULT_RQUID: &str = "fd648f05-0e2b-41bf-8753-5c197c62e598";
pub const DEFAULT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_API_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1";
pub const DEFAULT_OCR_URL: &str = "https://api.ocr.space/parse/image";
pub const DEFAULT_DB_PATH: &str = "./lumira.db";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GigaChatConfig {
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub model: String,
    pub rquid: String,
    pub auth_url: String,
    pub api_url: String,
    pub verify_ssl: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OcrConfig {
    pub api_key: Option<String>,
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub sqlite_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub gigachat: GigaChatConfig,
    pub ocr: OcrConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

impl Config {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| {
                LumiraError::Config(format!(
                    "Environment variable '{key}' is not set. \
                     Add it to your .env or hosting platform configuration."
                ))
            })
        };

        let gigachat = GigaChatConfig {
            client_id: require("GIGACHAT_CLIENT_ID")?,
            client_secret: require("GIGACHAT_CLIENT_SECRET")?,
            scope: get("GIGACHAT_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            model: get("GIGACHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            rquid: get("GIGACHAT_RQUID").unwrap_or_else(|| DEFAULT_RQUID.to_string()),
            auth_url: get("GIGACHAT_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            api_url: get("GIGACHAT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            verify_ssl: get("GIGACHAT_VERIFY_SSL")
                .map(|value| parse_bool(&value))
                .unwrap_or(false),
        };

        let ocr = OcrConfig {
            api_key: get("OCR_SPACE_API_KEY"),
            api_url: get("OCR_SPACE_API_URL").unwrap_or_else(|| DEFAULT_OCR_URL.to_string()),
        };

        let mut server = ServerConfig::default();
        if let Some(host) = get("HOST") {
            server.host = host;
        }
        if let Some(port) = get("PORT") {
            server.port = port
                .parse()
                .map_err(|_| LumiraError::Config(format!("PORT must be a port number, got '{port}'")))?;
        }

        let sqlite_path = match get("DATABASE_URL") {
            Some(url) => sqlite_path_from_url(&url)?,
            None => get("LUMIRA_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
        };

        Ok(Config {
            gigachat,
            ocr,
            server,
            database: DatabaseConfig { sqlite_path },
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn sqlite_path_from_url(url: &str) -> Result<String> {
    let lowered = url.to_ascii_lowercase();
    if lowered.starts_with("postgres://") || lowered.starts_with("postgresql://") {
        return Err(LumiraError::Config(
            "DATABASE_URL points to Postgres, but only SQLite storage is supported; \
             migrate the data manually or unset DATABASE_URL"
                .to_string(),
        ));
    }
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    if path.is_empty() {
        return Err(LumiraError::Config("DATABASE_URL has an empty path".to_string()));
    }
    Ok(path.to_string())
}
