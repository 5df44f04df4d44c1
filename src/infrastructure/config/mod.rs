pub mod cli;

pub use cli::Cli;

use crate::domain::audio::AssemblySettings;
use crate::domain::tts::{LanguageCode, RetryPolicy};
use crate::error::{AppError, AppResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub voice: String,
    pub primary_language: LanguageCode,
    pub secondary_language: LanguageCode,
    pub api_calls_per_minute: usize,
    pub max_retries: u32,
    pub retry_delay_seconds: f64,
    pub pause_multiplier_repeat: f64,
    pub pause_multiplier_next: f64,
    pub output_dir: PathBuf,
    pub http_timeout_seconds: u64,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Config("please set the GEMINI_API_KEY environment variable".to_string())
            })?;

        let config = Config {
            gemini_api_key,
            gemini_base_url: var(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            gemini_model: var("GEMINI_TTS_MODEL", "gemini-2.5-flash-preview-tts"),
            voice: var("TTS_VOICE", "Zephyr"),
            primary_language: parse_setting("PRIMARY_LANGUAGE", &var("PRIMARY_LANGUAGE", "nl"))?,
            secondary_language: parse_setting(
                "SECONDARY_LANGUAGE",
                &var("SECONDARY_LANGUAGE", "en"),
            )?,
            api_calls_per_minute: parse_setting(
                "API_CALLS_PER_MINUTE",
                &var("API_CALLS_PER_MINUTE", "10"),
            )?,
            max_retries: parse_setting("MAX_RETRIES", &var("MAX_RETRIES", "10"))?,
            retry_delay_seconds: parse_setting(
                "RETRY_DELAY_SECONDS",
                &var("RETRY_DELAY_SECONDS", "5"),
            )?,
            pause_multiplier_repeat: parse_setting(
                "PAUSE_MULTIPLIER_REPEAT",
                &var("PAUSE_MULTIPLIER_REPEAT", "1.5"),
            )?,
            pause_multiplier_next: parse_setting(
                "PAUSE_MULTIPLIER_NEXT",
                &var("PAUSE_MULTIPLIER_NEXT", "2.5"),
            )?,
            output_dir: PathBuf::from(var("OUTPUT_FOLDER", "output_audio")),
            http_timeout_seconds: parse_setting(
                "HTTP_TIMEOUT_SECONDS",
                &var("HTTP_TIMEOUT_SECONDS", "120"),
            )?,
            log_format: match var("LOG_FORMAT", "pretty").to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.api_calls_per_minute == 0 {
            return Err(AppError::Config("API_CALLS_PER_MINUTE must be at least 1".into()));
        }
        if self.max_retries == 0 {
            return Err(AppError::Config("MAX_RETRIES must be at least 1".into()));
        }
        for (name, value) in [
            ("RETRY_DELAY_SECONDS", self.retry_delay_seconds),
            ("PAUSE_MULTIPLIER_REPEAT", self.pause_multiplier_repeat),
            ("PAUSE_MULTIPLIER_NEXT", self.pause_multiplier_next),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Config(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            retry_delay: Duration::from_secs_f64(self.retry_delay_seconds),
        }
    }

    pub fn assembly_settings(&self) -> AssemblySettings {
        AssemblySettings {
            primary_language: self.primary_language,
            secondary_language: self.secondary_language,
            pause_multiplier_repeat: self.pause_multiplier_repeat,
            pause_multiplier_next: self.pause_multiplier_next,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

fn parse_setting<T>(name: &str, raw: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| AppError::Config(format!("invalid {name} '{raw}': {e}")))
}
