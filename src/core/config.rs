use std::env;
use std::path::PathBuf;

use crate::timestamp::DateOrder;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CACHE_PATH: &str = "chat-digest-cache.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub cache_path: PathBuf,
    pub date_order: DateOrder,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let date_order = match env::var("CHAT_DIGEST_DATE_ORDER") {
            Ok(raw) => raw
                .parse::<DateOrder>()
                .map_err(|e| format!("CHAT_DIGEST_DATE_ORDER: {}", e))?,
            Err(_) => DateOrder::default(),
        };

        let http_timeout_secs = match env::var("CHAT_DIGEST_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("CHAT_DIGEST_HTTP_TIMEOUT_SECS: {}", e))?,
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            gemini_api_key: env::var("GEMINI_API_KEY")
                .map_err(|e| format!("GEMINI_API_KEY: {}", e))?,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.to_string()),
            cache_path: env::var("CHAT_DIGEST_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_PATH)),
            date_order,
            http_timeout_secs,
        })
    }
}
