//! Environment configuration
//!
//! Values come from the process environment, optionally seeded from `.env`.

use crate::error::AnalysisError;
use crate::input::DEFAULT_MAX_AUDIO_BYTES;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_THINKING_BUDGET: u32 = 16384;
pub const DEFAULT_PORT: u16 = 8080;

/// Settings for the Gemini oracle
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Per-call budget; applies to each of the concurrent samples separately
    pub timeout: Duration,
    pub temperature: f32,
    pub thinking_budget: u32,
}

impl OracleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_ORACLE_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            thinking_budget: DEFAULT_THINKING_BUDGET,
        }
    }

    /// `generateContent` endpoint for the configured model
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Full runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub oracle: OracleConfig,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load `.env` (if present) and read the environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnalysisError::Config("GEMINI_API_KEY not configured".to_string()))?;

        let mut oracle = OracleConfig::new(api_key);

        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            oracle.model = model;
        }
        if let Some(base_url) = lookup("GEMINI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            oracle.base_url = base_url;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "ORACLE_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(AnalysisError::Config(
                    "ORACLE_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            oracle.timeout = Duration::from_secs(secs);
        }
        if let Some(temperature) = parse_var::<f32>(&lookup, "ORACLE_TEMPERATURE")? {
            oracle.temperature = temperature;
        }
        if let Some(budget) = parse_var::<u32>(&lookup, "ORACLE_THINKING_BUDGET")? {
            oracle.thinking_budget = budget;
        }

        let port = match parse_var::<u16>(&lookup, "PORT")? {
            Some(port) => port,
            None => parse_var::<u16>(&lookup, "API_PORT")?.unwrap_or(DEFAULT_PORT),
        };

        let max_upload_bytes =
            parse_var::<usize>(&lookup, "MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_AUDIO_BYTES);

        Ok(Self {
            oracle,
            port,
            max_upload_bytes,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AnalysisError::Config(format!("invalid {}='{}': {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();

        assert_eq!(config.oracle.model, DEFAULT_MODEL);
        assert_eq!(config.oracle.timeout, DEFAULT_ORACLE_TIMEOUT);
        assert_eq!(config.oracle.thinking_budget, 16384);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(
            config.oracle.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent"
        );
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
            ("ORACLE_TIMEOUT_SECS", "45"),
            ("API_PORT", "9000"),
            ("MAX_UPLOAD_BYTES", "1024"),
        ]))
        .unwrap();

        assert_eq!(config.oracle.model, "gemini-2.5-flash");
        assert_eq!(config.oracle.timeout, Duration::from_secs(45));
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("ORACLE_TIMEOUT_SECS", "soon")
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("ORACLE_TIMEOUT_SECS", "0")
        ]))
        .is_err());
    }
}
