//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Most callers use the free accessor functions at the bottom of this module
//! (`config::host()`, `config::access_code_ttl_seconds()`, ...) rather than
//! holding the read guard themselves.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    /// Base URL of the event backend. Empty means the station runs against
    /// the in-process local backend.
    pub backend_url: String,
    pub backend_timeout_secs: u64,
    pub access_code_ttl_seconds: u64,
    pub session_ttl_minutes: i64,
    /// Check-in points granted by the local backend.
    pub check_in_points: Vec<String>,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Splits a comma separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every key has a default so the station can boot on a bare kiosk.
    /// Malformed numeric values fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "checkin-station".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info,services=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "data/station.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parse_or("PORT", 3000),
            backend_url: env::var("BACKEND_URL").unwrap_or_default(),
            backend_timeout_secs: parse_or("BACKEND_TIMEOUT_SECS", 10),
            access_code_ttl_seconds: parse_or("ACCESS_CODE_TTL_SECONDS", 300),
            session_ttl_minutes: parse_or("SESSION_TTL_MINUTES", 120),
            check_in_points: parse_list(
                &env::var("CHECK_IN_POINTS").unwrap_or_else(|_| "Main Entrance".into()),
            ),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    /// Override `env` value.
    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_host(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.host = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_backend_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.backend_url = value.into());
    }

    pub fn set_access_code_ttl_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.access_code_ttl_seconds = value);
    }

    pub fn set_session_ttl_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.session_ttl_minutes = value);
    }

    pub fn set_check_in_points(value: Vec<String>) {
        AppConfig::set_field(|cfg| cfg.check_in_points = value);
    }
}

// --- Free accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn backend_url() -> String {
    AppConfig::global().backend_url.clone()
}

pub fn backend_timeout_secs() -> u64 {
    AppConfig::global().backend_timeout_secs
}

pub fn access_code_ttl_seconds() -> u64 {
    AppConfig::global().access_code_ttl_seconds
}

pub fn session_ttl_minutes() -> i64 {
    AppConfig::global().session_ttl_minutes
}

pub fn check_in_points() -> Vec<String> {
    AppConfig::global().check_in_points.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parse_list_drops_blanks_and_trims() {
        assert_eq!(
            parse_list(" Main Entrance, ,Hall B ,"),
            vec!["Main Entrance".to_string(), "Hall B".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    #[serial]
    fn setters_override_global_values() {
        AppConfig::set_access_code_ttl_seconds(42);
        AppConfig::set_check_in_points(vec!["Gate 4".into()]);
        assert_eq!(access_code_ttl_seconds(), 42);
        assert_eq!(check_in_points(), vec!["Gate 4".to_string()]);

        AppConfig::reset();
        assert_ne!(access_code_ttl_seconds(), 42);
    }
}
