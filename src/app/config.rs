use std::time::Duration;

use crate::app::AppError;
use crate::domain::session::{CredentialMode, StorageMode};

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_MOCK_EXTERNAL_URL: &str = "http://localhost:8000/mock-external";
const DEFAULT_TOKEN_DB_PATH: &str = "./data/session.db";
const REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub mock_external_url: String,
    pub request_timeout: Duration,
    pub credential_mode: CredentialMode,
    pub storage_mode: StorageMode,
    pub token_db_path: String,
    pub use_mock: bool,
    pub credentials: Option<Credentials>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential_mode = CredentialMode::for_environment(lookup("APP_ENV").as_deref());
        let storage_mode = match non_empty(&lookup, "TOKEN_STORAGE") {
            Some(raw) => raw
                .parse::<StorageMode>()
                .map_err(|err| AppError::config(format!("TOKEN_STORAGE: {err}")))?,
            None => StorageMode::Persisted,
        };

        let credentials = match (
            non_empty(&lookup, "DASHBOARD_USERNAME"),
            lookup("DASHBOARD_PASSWORD").filter(|v| !v.is_empty()),
        ) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            _ => {
                return Err(AppError::config(
                    "DASHBOARD_USERNAME and DASHBOARD_PASSWORD must be set together",
                ));
            }
        };

        Ok(Self {
            api_url: non_empty(&lookup, "API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            mock_external_url: non_empty(&lookup, "MOCK_EXTERNAL_URL")
                .unwrap_or_else(|| DEFAULT_MOCK_EXTERNAL_URL.to_string()),
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            credential_mode,
            // Cookie credentials never touch client storage.
            storage_mode: match credential_mode {
                CredentialMode::Cookie => StorageMode::MemoryOnly,
                CredentialMode::Bearer => storage_mode,
            },
            token_db_path: non_empty(&lookup, "TOKEN_DB_PATH")
                .unwrap_or_else(|| DEFAULT_TOKEN_DB_PATH.to_string()),
            use_mock: parse_bool_or_default(&lookup, "USE_MOCK", true)?,
            credentials,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MockApiConfig {
    pub bind: String,
    pub prefix: String,
    pub failure_rate: f64,
    pub health_failure_rate: f64,
    pub simulate_latency: bool,
}

impl MockApiConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = non_empty(&lookup, "MOCK_API_PREFIX")
            .unwrap_or_else(|| "/mock-external".to_string());
        let prefix = match prefix.trim_end_matches('/') {
            "" => String::new(),
            trimmed if trimmed.starts_with('/') => trimmed.to_string(),
            trimmed => format!("/{trimmed}"),
        };

        Ok(Self {
            bind: non_empty(&lookup, "MOCK_API_BIND")
                .unwrap_or_else(|| "127.0.0.1:8000".to_string()),
            prefix,
            failure_rate: parse_rate(&lookup, "MOCK_FAILURE_RATE", 0.03)?,
            health_failure_rate: parse_rate(&lookup, "MOCK_HEALTH_FAILURE_RATE", 0.01)?,
            simulate_latency: parse_bool_or_default(&lookup, "MOCK_SIMULATE_LATENCY", true)?,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool_or_default<F>(lookup: &F, key: &str, default: bool) -> Result<bool, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::config(format!("{key} must be a boolean"))),
        },
        None => Ok(default),
    }
}

fn parse_rate<F>(lookup: &F, key: &str, default: f64) -> Result<f64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let rate = match non_empty(lookup, key) {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number")))?,
        None => default,
    };

    if !(0.0..=1.0).contains(&rate) {
        return Err(AppError::config(format!("{key} must be between 0 and 1")));
    }
    Ok(rate)
}
