use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_MODELS: &str = "llama3,mistral,deepseek-coder";

/// Application configuration loaded from environment variables.
/// Read once at startup; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub ollama_url: String,
    /// Ordered fallback list. The first entry is the preferred model.
    pub models: Vec<String>,
    pub max_resume_chars: usize,
    pub temperature: f32,
    /// Bounded wait per model attempt. `None` waits for the backend indefinitely.
    pub model_timeout: Option<Duration>,
    pub sample_fallback: bool,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let models = parse_model_list(&env_or("ANALYZER_MODELS", DEFAULT_MODELS));
        if models.is_empty() {
            bail!("ANALYZER_MODELS must name at least one model");
        }

        let temperature = env_or("ANALYZER_TEMPERATURE", "0.3")
            .parse::<f32>()
            .context("ANALYZER_TEMPERATURE must be a number")?;
        if !(0.0..=2.0).contains(&temperature) {
            bail!("ANALYZER_TEMPERATURE must be between 0.0 and 2.0, got {temperature}");
        }

        let timeout_secs = env_or("ANALYZER_MODEL_TIMEOUT_SECS", "120")
            .parse::<u64>()
            .context("ANALYZER_MODEL_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434")
                .trim_end_matches('/')
                .to_string(),
            models,
            max_resume_chars: env_or("ANALYZER_MAX_RESUME_CHARS", "5000")
                .parse::<usize>()
                .context("ANALYZER_MAX_RESUME_CHARS must be a positive integer")?,
            temperature,
            model_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            sample_fallback: parse_flag(&env_or("ANALYZER_SAMPLE_FALLBACK", "true"))
                .context("ANALYZER_SAMPLE_FALLBACK must be true or false")?,
            max_upload_bytes: env_or("ANALYZER_MAX_UPLOAD_BYTES", "10485760")
                .parse::<usize>()
                .context("ANALYZER_MAX_UPLOAD_BYTES must be a byte count")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Splits a comma-separated model list, dropping blanks.
fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognised flag value '{other}'"),
    }
}
