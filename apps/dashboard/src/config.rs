use std::time::Duration;

use anyhow::{Context, Result};

/// Dashboard configuration loaded from environment variables (and `.env`
/// when present). Every variable has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the screening backend, without trailing slash.
    pub backend_url: String,
    pub port: u16,
    pub rust_log: String,
    pub request_timeout: Duration,
    pub health_poll_interval: Duration,
    /// Auto-dismiss delay, counted from when a notification is first shown.
    pub notification_ttl: Duration,
    /// Sessions unused for this long are forgotten.
    pub session_idle_timeout: Duration,
    /// Pause after an upload batch before reloading the resume list, so
    /// backend processing has started.
    pub upload_refresh_delay: Duration,
    pub max_upload_batch_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend_url = var("BACKEND_URL")
            .unwrap_or_else(|| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            backend_url,
            port: parse_or(&var, "PORT", 3000u16)?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            request_timeout: Duration::from_secs(parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?),
            health_poll_interval: Duration::from_secs(
                parse_or(&var, "HEALTH_POLL_INTERVAL_SECS", 30u64)?.max(1),
            ),
            notification_ttl: Duration::from_secs(parse_or(&var, "NOTIFICATION_TTL_SECS", 5)?),
            session_idle_timeout: Duration::from_secs(parse_or(
                &var,
                "SESSION_IDLE_TIMEOUT_SECS",
                24 * 60 * 60,
            )?),
            upload_refresh_delay: Duration::from_millis(parse_or(
                &var,
                "UPLOAD_REFRESH_DELAY_MS",
                1500,
            )?),
            max_upload_batch_bytes: parse_or::<usize>(&var, "MAX_UPLOAD_BATCH_MB", 64)? * 1024 * 1024,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.port, 3000);
        assert_eq!(config.notification_ttl, Duration::from_secs(5));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(86_400));
        assert_eq!(config.upload_refresh_delay, Duration::from_millis(1500));
        assert_eq!(config.max_upload_batch_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = Config::from_vars(vars(&[
            ("BACKEND_URL", "http://api:8000/"),
            ("PORT", "8081"),
            ("HEALTH_POLL_INTERVAL_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.backend_url, "http://api:8000");
        assert_eq!(config.port, 8081);
        assert_eq!(config.health_poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let err = Config::from_vars(vars(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
