use reqwest::{Client, StatusCode};

use crate::adapters::gateway::{GatewayError, WellSource, ensure_success, validate_path_id};
use crate::adapters::http::{error_detail, join_url};
use crate::domain::health::HealthReport;
use crate::domain::telemetry::{TelemetrySampleSet, TelemetryWindow};
use crate::domain::well::{ApiEnvelope, MockWell, WellList, WellListEnvelope, WellRecord};

#[derive(Debug, Clone)]
pub struct MockWellSource {
    client: Client,
    base_url: String,
}

impl MockWellSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, GatewayError> {
        let url = join_url(&self.base_url, path);
        tracing::debug!(url = %url, "mock api GET");
        Ok(self.client.get(&url).send().await?)
    }
}

impl WellSource for MockWellSource {
    async fn wells(&self) -> Result<WellList, GatewayError> {
        let response = ensure_success(self.get("/api/v1/wells/").await?).await?;
        let body = response.bytes().await?;

        let envelope = WellListEnvelope::parse(&body);
        let shape = envelope.shape();
        if matches!(envelope, WellListEnvelope::Unrecognized(_)) {
            tracing::warn!(body_len = body.len(), "unrecognized mock well list shape");
        }

        let decoded = envelope.decode();
        for rejected in &decoded.rejected {
            tracing::warn!(
                index = rejected.index,
                reason = %rejected.reason,
                "skipping malformed mock well"
            );
        }
        tracing::debug!(
            shape,
            wells = decoded.wells.len(),
            rejected = decoded.rejected.len(),
            "mock well list decoded"
        );

        Ok(WellList::Mock(decoded.wells))
    }

    async fn well_by_id(&self, id: &str) -> Result<WellRecord, GatewayError> {
        let id = validate_path_id(id)?;
        let response = self.get(&format!("/api/v1/wells/{id}/")).await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(GatewayError::NotFound { id: id.to_string() });
            }
            StatusCode::BAD_REQUEST => {
                let detail = error_detail(response).await;
                tracing::debug!(well_id = id, detail = ?detail, "mock api rejected well id");
                return Err(GatewayError::InvalidWellId { id: id.to_string() });
            }
            _ => {}
        }

        let envelope: ApiEnvelope<Option<MockWell>> = ensure_success(response).await?.json().await?;
        envelope
            .data
            .map(WellRecord::Mock)
            .ok_or_else(|| GatewayError::NotFound { id: id.to_string() })
    }

    async fn well_telemetry(
        &self,
        id: &str,
        window: TelemetryWindow,
    ) -> Result<TelemetrySampleSet, GatewayError> {
        let id = validate_path_id(id)?;
        let url = join_url(&self.base_url, &format!("/api/v1/wells/{id}/telemetry/"));
        tracing::debug!(url = %url, hours = window.hours, points = window.points, "mock api GET");

        let response = self
            .client
            .get(&url)
            .query(&[("hours", window.hours), ("points", window.points)])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(GatewayError::NotFound { id: id.to_string() }),
            StatusCode::BAD_REQUEST => {
                return Err(GatewayError::InvalidWellId { id: id.to_string() });
            }
            _ => {}
        }

        let envelope: ApiEnvelope<Option<TelemetrySampleSet>> =
            ensure_success(response).await?.json().await?;
        let telemetry = envelope
            .data
            .ok_or_else(|| GatewayError::NotFound { id: id.to_string() })?;
        telemetry.validate()?;

        Ok(telemetry)
    }

    async fn health(&self) -> Result<HealthReport, GatewayError> {
        let response = ensure_success(self.get("/api/v1/health/").await?).await?;
        Ok(response.json().await?)
    }
}
