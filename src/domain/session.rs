use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Persisted,
    MemoryOnly,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persisted => "persisted",
            Self::MemoryOnly => "memory-only",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "persisted" => Ok(Self::Persisted),
            "memory" | "memory-only" => Ok(Self::MemoryOnly),
            other => Err(format!("unknown token storage mode {other:?}")),
        }
    }
}

// `Cookie` relies on httpOnly cookies from the backend: no authorization
// header is produced and tokens stay in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    Bearer,
    Cookie,
}

impl CredentialMode {
    pub fn for_environment(app_env: Option<&str>) -> Self {
        match app_env.map(str::trim) {
            Some(env) if env.eq_ignore_ascii_case("production") => Self::Cookie,
            _ => Self::Bearer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub storage_mode: StorageMode,
}

impl Session {
    pub fn anonymous(storage_mode: StorageMode) -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            storage_mode,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.access_token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn authenticate(&mut self, access_token: &str, refresh_token: &str) {
        self.access_token = Some(access_token.to_string());
        self.refresh_token = Some(refresh_token.to_string());
    }

    pub fn restore(&mut self, persisted: PersistedTokens) {
        self.access_token = persisted.access_token.filter(|token| !token.is_empty());
        self.refresh_token = persisted.refresh_token.filter(|token| !token.is_empty());
    }

    pub fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("storage_mode", &self.storage_mode)
            .finish()
    }
}
