use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::http::{error_detail, join_url};
use crate::adapters::token_store::{TokenStore, TokenStoreError};
use crate::domain::session::{AuthTokens, CredentialMode, Session, StorageMode};
use crate::domain::user::{Registration, UserRecord, UserRole};

const LOGIN_FAILED: &str = "authorization failed";
const REGISTER_FAILED: &str = "registration failed";
const CURRENT_USER_FAILED: &str = "failed to fetch current user";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{message}")]
    Rejected { message: String },
    #[error("no refresh token available")]
    MissingRefreshToken,
    #[error("session expired, please log in again")]
    SessionExpired,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("auth request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to persist session tokens: {0}")]
    Storage(#[from] TokenStoreError),
}

impl SessionError {
    pub fn auth(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(error) => Some(error),
            _ => None,
        }
    }
}

pub enum TokenStorage {
    Persisted(Box<dyn TokenStore>),
    MemoryOnly,
}

impl TokenStorage {
    pub fn mode(&self) -> StorageMode {
        match self {
            Self::Persisted(_) => StorageMode::Persisted,
            Self::MemoryOnly => StorageMode::MemoryOnly,
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Token fields sit behind a mutex that is never held across an await, so
/// concurrent refreshes are not coordinated: the last completed write wins.
pub struct SessionManager {
    client: Client,
    api_url: String,
    credential_mode: CredentialMode,
    storage: TokenStorage,
    session: Mutex<Session>,
}

impl SessionManager {
    pub fn init(
        client: Client,
        api_url: impl Into<String>,
        credential_mode: CredentialMode,
        storage: TokenStorage,
    ) -> Result<Self, SessionError> {
        let storage = match (credential_mode, storage) {
            (CredentialMode::Cookie, TokenStorage::Persisted(_)) => {
                tracing::warn!("cookie credentials are memory-only; ignoring token store");
                TokenStorage::MemoryOnly
            }
            (_, storage) => storage,
        };

        let mut session = Session::anonymous(storage.mode());
        if let TokenStorage::Persisted(store) = &storage {
            session.restore(store.load()?);
        }

        tracing::info!(
            credential_mode = ?credential_mode,
            storage_mode = %session.storage_mode,
            authenticated = session.is_authenticated(),
            "session manager initialized"
        );

        Ok(Self {
            client,
            api_url: api_url.into(),
            credential_mode,
            storage,
            session: Mutex::new(session),
        })
    }

    pub fn credential_mode(&self) -> CredentialMode {
        self.credential_mode
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage.mode()
    }

    pub fn snapshot(&self) -> Session {
        self.session().clone()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, SessionError> {
        let url = join_url(&self.api_url, "/api/auth/login/");
        tracing::debug!(url = %url, username, "login request");

        let response = self
            .client
            .post(&url)
            .json(&Credentials { username, password })
            .send()
            .await?;
        let response = reject_unless_success(response, LOGIN_FAILED).await?;
        let tokens: AuthTokens = response.json().await?;

        self.store_tokens(&tokens.access, &tokens.refresh)?;
        tracing::info!(username, "login succeeded");

        Ok(self.snapshot())
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirmation: &str,
        email: Option<&str>,
        role: Option<UserRole>,
    ) -> Result<UserRecord, SessionError> {
        let url = join_url(&self.api_url, "/api/auth/register/");
        let registration = Registration {
            username: username.to_string(),
            password: password.to_string(),
            password2: confirmation.to_string(),
            email: email.map(ToString::to_string),
            role,
        };

        let response = self.client.post(&url).json(&registration).send().await?;
        let response = reject_unless_success(response, REGISTER_FAILED).await?;
        let user: UserRecord = response.json().await?;

        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn current_user(&self) -> Result<UserRecord, SessionError> {
        let url = join_url(&self.api_url, "/api/auth/me/");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_header())
            .send()
            .await?;
        let response = reject_unless_success(response, CURRENT_USER_FAILED).await?;

        Ok(response.json().await?)
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Any failure after the request is attempted ends the session: memory and
    /// persisted tokens are cleared before the error is returned.
    pub async fn refresh_access_token(&self) -> Result<String, SessionError> {
        let Some(refresh_token) = self.session().refresh_token.clone() else {
            return Err(AuthError::MissingRefreshToken.into());
        };

        let refreshed = match self.request_refresh(&refresh_token).await {
            Ok(access_token) => self
                .store_tokens(&access_token, &refresh_token)
                .map(|()| access_token),
            Err(error) => Err(error),
        };

        match refreshed {
            Ok(access_token) => {
                tracing::info!("access token refreshed");
                Ok(access_token)
            }
            Err(error) => {
                tracing::warn!(error = %error, "token refresh failed, ending session");
                self.logout();
                Err(AuthError::SessionExpired.into())
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<String, SessionError> {
        let url = join_url(&self.api_url, "/api/auth/refresh/");

        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;
        let response = reject_unless_success(response, "refresh token rejected").await?;
        let body: RefreshResponse = response.json().await?;

        Ok(body.access)
    }

    pub fn auth_header(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.credential_mode == CredentialMode::Cookie {
            return headers;
        }

        if let Some(token) = self.session().access_token.as_deref() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("access token is not a valid header value"),
            }
        }

        headers
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn logout(&self) {
        self.session().clear();

        // TODO: call the backend logout endpoint once it exists so the refresh token is revoked.
        if let TokenStorage::Persisted(store) = &self.storage
            && let Err(error) = store.clear()
        {
            tracing::warn!(error = %error, "failed to erase persisted tokens");
        }

        tracing::info!("session cleared");
    }

    fn store_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), SessionError> {
        if let TokenStorage::Persisted(store) = &self.storage {
            store.save(access_token, refresh_token)?;
        }
        self.session().authenticate(access_token, refresh_token);
        Ok(())
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn reject_unless_success(
    response: Response,
    default_message: &str,
) -> Result<Response, SessionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = error_detail(response)
        .await
        .unwrap_or_else(|| default_message.to_string());
    tracing::warn!(status = status.as_u16(), message = %message, "auth request rejected");

    Err(AuthError::Rejected { message }.into())
}
