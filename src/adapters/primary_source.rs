use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::adapters::gateway::{GatewayError, WellSource, ensure_success, validate_path_id};
use crate::adapters::http::join_url;
use crate::adapters::session_manager::SessionManager;
use crate::domain::health::HealthReport;
use crate::domain::telemetry::{TelemetrySampleSet, TelemetryWindow};
use crate::domain::well::{PrimaryWell, WellList, WellRecord};

pub struct PrimaryWellSource {
    client: Client,
    api_url: String,
    session: Arc<SessionManager>,
}

impl PrimaryWellSource {
    pub fn new(client: Client, api_url: impl Into<String>, session: Arc<SessionManager>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            session,
        }
    }

    /// Sends with the current auth header. A 401 triggers exactly one
    /// refresh and one retry; a second 401 is returned as `Unauthorized`.
    async fn send_authorized<F>(&self, build: F) -> Result<Response, GatewayError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = build(&self.client)
            .headers(self.session.auth_header())
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!("access token rejected, refreshing before retry");
        self.session.refresh_access_token().await?;

        let retried = build(&self.client)
            .headers(self.session.auth_header())
            .send()
            .await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("request still unauthorized after token refresh");
            return Err(GatewayError::Unauthorized);
        }

        Ok(retried)
    }
}

impl WellSource for PrimaryWellSource {
    async fn wells(&self) -> Result<WellList, GatewayError> {
        let url = join_url(&self.api_url, "/api/wells/");
        let response = self.send_authorized(|client| client.get(&url)).await?;
        let wells: Vec<PrimaryWell> = ensure_success(response).await?.json().await?;

        Ok(WellList::Primary(wells))
    }

    async fn well_by_id(&self, id: &str) -> Result<WellRecord, GatewayError> {
        let id = validate_path_id(id)?;
        let numeric_id: i64 = id
            .parse()
            .map_err(|_| GatewayError::InvalidWellId { id: id.to_string() })?;

        let url = join_url(&self.api_url, &format!("/api/wells/{numeric_id}/"));
        let response = self.send_authorized(|client| client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound { id: id.to_string() });
        }

        let well: PrimaryWell = ensure_success(response).await?.json().await?;
        Ok(WellRecord::Primary(well))
    }

    async fn well_telemetry(
        &self,
        _id: &str,
        _window: TelemetryWindow,
    ) -> Result<TelemetrySampleSet, GatewayError> {
        Err(GatewayError::Unimplemented("well telemetry"))
    }

    async fn health(&self) -> Result<HealthReport, GatewayError> {
        let url = join_url(&self.api_url, "/api/health/");
        let response = self
            .client
            .get(&url)
            .headers(self.session.auth_header())
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }
}
