use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::Response;
use thiserror::Error;

use crate::adapters::http::error_detail;
use crate::adapters::mock_source::MockWellSource;
use crate::adapters::primary_source::PrimaryWellSource;
use crate::adapters::session_manager::SessionError;
use crate::domain::health::HealthReport;
use crate::domain::telemetry::{TelemetryError, TelemetrySampleSet, TelemetryWindow};
use crate::domain::well::{ApiMode, WellList, WellRecord};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("request still unauthorized after refreshing the access token")]
    Unauthorized,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("well {id} not found")]
    NotFound { id: String },
    #[error("invalid well id {id:?}")]
    InvalidWellId { id: String },
    #[error("unexpected response status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },
    #[error("{0} is not available from the real API")]
    Unimplemented(&'static str),
    #[error("invalid telemetry payload: {0}")]
    InvalidTelemetry(#[from] TelemetryError),
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(GatewayError::Status {
        status: status.as_u16(),
        detail: error_detail(response).await,
    })
}

pub(crate) fn validate_path_id(id: &str) -> Result<&str, GatewayError> {
    let trimmed = id.trim();
    // Ids become a single path segment; dot segments would be normalized away.
    if trimmed.is_empty()
        || trimmed.contains(['/', '\\', '?', '#', '%'])
        || trimmed == "."
        || trimmed == ".."
    {
        return Err(GatewayError::InvalidWellId { id: id.to_string() });
    }
    Ok(trimmed)
}

pub trait WellSource {
    fn wells(&self) -> impl Future<Output = Result<WellList, GatewayError>>;

    fn well_by_id(&self, id: &str) -> impl Future<Output = Result<WellRecord, GatewayError>>;

    fn well_telemetry(
        &self,
        id: &str,
        window: TelemetryWindow,
    ) -> impl Future<Output = Result<TelemetrySampleSet, GatewayError>>;

    fn health(&self) -> impl Future<Output = Result<HealthReport, GatewayError>>;
}

/// The mode is read once when a call starts, so switching never affects a
/// request that is already in flight.
pub struct WellDataGateway<M = MockWellSource, P = PrimaryWellSource> {
    mock: M,
    primary: P,
    use_mock: AtomicBool,
}

impl<M, P> WellDataGateway<M, P>
where
    M: WellSource,
    P: WellSource,
{
    pub fn new(mock: M, primary: P, use_mock: bool) -> Self {
        Self {
            mock,
            primary,
            use_mock: AtomicBool::new(use_mock),
        }
    }

    pub fn set_use_mock(&self, use_mock: bool) {
        self.use_mock.store(use_mock, Ordering::SeqCst);
        tracing::info!(mode = %self.current_mode(), "switched external API mode");
    }

    pub fn current_mode(&self) -> ApiMode {
        if self.use_mock.load(Ordering::SeqCst) {
            ApiMode::Mock
        } else {
            ApiMode::Real
        }
    }

    pub async fn get_wells(&self) -> Result<WellList, GatewayError> {
        let mode = self.current_mode();
        let result = match mode {
            ApiMode::Mock => self.mock.wells().await,
            ApiMode::Real => self.primary.wells().await,
        };

        match &result {
            Ok(wells) => tracing::info!(mode = %mode, count = wells.len(), "wells fetched"),
            Err(error) => tracing::warn!(mode = %mode, error = %error, "failed to fetch wells"),
        }
        result
    }

    pub async fn get_well_by_id(&self, id: &str) -> Result<WellRecord, GatewayError> {
        let mode = self.current_mode();
        let result = match mode {
            ApiMode::Mock => self.mock.well_by_id(id).await,
            ApiMode::Real => self.primary.well_by_id(id).await,
        };

        if let Err(error) = &result {
            tracing::warn!(mode = %mode, well_id = id, error = %error, "failed to fetch well");
        }
        result
    }

    pub async fn get_well_telemetry(
        &self,
        id: &str,
        window: TelemetryWindow,
    ) -> Result<TelemetrySampleSet, GatewayError> {
        let mode = self.current_mode();
        let result = match mode {
            ApiMode::Mock => self.mock.well_telemetry(id, window).await,
            ApiMode::Real => self.primary.well_telemetry(id, window).await,
        };

        if let Err(error) = &result {
            tracing::warn!(
                mode = %mode,
                well_id = id,
                hours = window.hours,
                points = window.points,
                error = %error,
                "failed to fetch telemetry"
            );
        }
        result
    }

    /// Never fails: any error is folded into an `unhealthy` report.
    pub async fn check_health(&self) -> HealthReport {
        let mode = self.current_mode();
        let result = match mode {
            ApiMode::Mock => self.mock.health().await,
            ApiMode::Real => self.primary.health().await,
        };

        result.unwrap_or_else(|error| {
            tracing::warn!(mode = %mode, error = %error, "health check failed");
            HealthReport::unhealthy(error)
        })
    }
}
