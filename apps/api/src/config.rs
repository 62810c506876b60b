use anyhow::{ensure, Context, Result};

/// Upper bound for any minute-based TTL (one year).
const MAX_TTL_MINUTES: i64 = 525_600;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the recruitment backend that stores applications.
    pub backend_url: String,
    /// Token the backend expects on admin-entered applications.
    pub backend_admin_token: Option<String>,
    pub backend_timeout_secs: u64,
    pub admin_password: String,
    pub admin_session_ttl_minutes: i64,
    /// Forms untouched for this long are dropped from the registry.
    pub form_idle_ttl_minutes: i64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            backend_url: require_env("BACKEND_URL")?,
            backend_admin_token: std::env::var("BACKEND_ADMIN_TOKEN").ok(),
            backend_timeout_secs: parse_env("BACKEND_TIMEOUT_SECS", 30)?,
            admin_password: require_env("ADMIN_PASSWORD")?,
            admin_session_ttl_minutes: parse_ttl_minutes("ADMIN_SESSION_TTL_MINUTES", 60)?,
            form_idle_ttl_minutes: parse_ttl_minutes("FORM_IDLE_TTL_MINUTES", 30)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_ttl_minutes(key: &str, default: i64) -> Result<i64> {
    let minutes = parse_env(key, default)?;
    ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "{key} must be between 1 and {MAX_TTL_MINUTES}, got {minutes}"
    );
    Ok(minutes)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "BACKEND_URL",
            "BACKEND_ADMIN_TOKEN",
            "BACKEND_TIMEOUT_SECS",
            "ADMIN_PASSWORD",
            "ADMIN_SESSION_TTL_MINUTES",
            "FORM_IDLE_TTL_MINUTES",
            "MAX_UPLOAD_BYTES",
            "PORT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults_apply_when_optional_vars_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        std::env::set_var("BACKEND_URL", "http://localhost:5000");
        std::env::set_var("ADMIN_PASSWORD", "secret");

        let config = Config::from_env().expect("config loads");
        assert_eq!(config.backend_url, "http://localhost:5000");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.admin_session_ttl_minutes, 60);
        assert_eq!(config.form_idle_ttl_minutes, 30);
        assert_eq!(config.backend_admin_token, None);
    }

    #[test]
    fn test_missing_backend_url_fails() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        std::env::set_var("ADMIN_PASSWORD", "secret");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("BACKEND_URL"));
    }

    #[test]
    fn test_invalid_port_fails() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        std::env::set_var("BACKEND_URL", "http://localhost:5000");
        std::env::set_var("ADMIN_PASSWORD", "secret");
        std::env::set_var("PORT", "eighty");
        assert!(Config::from_env().is_err());
        std::env::remove_var("PORT");
    }

    #[test]
    fn test_ttl_out_of_range_fails() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        for (key, raw) in [
            ("ADMIN_SESSION_TTL_MINUTES", "0"),
            ("ADMIN_SESSION_TTL_MINUTES", "-5"),
            ("ADMIN_SESSION_TTL_MINUTES", "9223372036854775807"),
            ("FORM_IDLE_TTL_MINUTES", "600000"),
        ] {
            reset_env();
            std::env::set_var("BACKEND_URL", "http://localhost:5000");
            std::env::set_var("ADMIN_PASSWORD", "secret");
            std::env::set_var(key, raw);
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains(key), "{key}={raw}");
        }
        reset_env();
    }
}
