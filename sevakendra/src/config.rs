use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConsultError, Result};

pub const DEFAULT_SPECIALIST_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";
pub const DEFAULT_CHAT_MODEL: &str = "google/gemini-2.5-pro";
pub const DEFAULT_OCR_MODEL: &str = "openai/gpt-4.1-mini";

/// Service configuration, resolved once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub openrouter_api_key: String,
    pub specialist_model: String,
    pub specialist_temperature: f64,
    pub chat_model: String,
    pub ocr_model: String,
    pub fanout_workers: usize,
    pub result_path: PathBuf,
    pub upload_dir: PathBuf,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let openrouter_api_key = env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConsultError::Config("OPENROUTER_API_KEY not set".to_string()))?;

        Ok(Self {
            port: parse_var("PORT", 3000)?,
            openrouter_api_key,
            specialist_model: string_var("SPECIALIST_MODEL", DEFAULT_SPECIALIST_MODEL),
            specialist_temperature: parse_var("SPECIALIST_TEMPERATURE", 0.0)?,
            chat_model: string_var("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            ocr_model: string_var("OCR_MODEL", DEFAULT_OCR_MODEL),
            fanout_workers: parse_var("FANOUT_WORKERS", 3)?,
            result_path: PathBuf::from(string_var("RESULT_PATH", "results/final_diagnosis.txt")),
            upload_dir: PathBuf::from(string_var("UPLOAD_DIR", "uploads")),
            http_timeout: Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", 120)?),
        })
    }

    /// Configuration with defaults for everything but the credential.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            port: 3000,
            openrouter_api_key: api_key.into(),
            specialist_model: DEFAULT_SPECIALIST_MODEL.to_string(),
            specialist_temperature: 0.0,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            fanout_workers: 3,
            result_path: PathBuf::from("results/final_diagnosis.txt"),
            upload_dir: PathBuf::from("uploads"),
            http_timeout: Duration::from_secs(120),
        }
    }
}

fn string_var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConsultError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}
