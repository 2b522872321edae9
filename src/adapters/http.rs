use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;

use crate::domain::session::CredentialMode;

const USER_AGENT: &str = concat!("well-dashboard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    error: Option<String>,
}

// Cookie mode keeps a jar for the httpOnly session cookies.
pub fn build_client(
    timeout: Duration,
    credential_mode: CredentialMode,
) -> Result<Client, reqwest::Error> {
    let builder = Client::builder().timeout(timeout).user_agent(USER_AGENT);

    let builder = match credential_mode {
        CredentialMode::Cookie => builder.cookie_store(true),
        CredentialMode::Bearer => builder,
    };

    builder.build()
}

pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

pub async fn error_detail(response: Response) -> Option<String> {
    response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail.or(body.error))
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}
