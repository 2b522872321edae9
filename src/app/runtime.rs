use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use crate::adapters::gateway::{WellDataGateway, WellSource};
use crate::adapters::http::build_client;
use crate::adapters::mock_api::{MockApiSettings, MockApiState, configure_routes};
use crate::adapters::mock_source::MockWellSource;
use crate::adapters::primary_source::PrimaryWellSource;
use crate::adapters::session_manager::{SessionManager, TokenStorage};
use crate::adapters::token_store::SqliteTokenStore;
use crate::app::config::{ClientConfig, Credentials, MockApiConfig};
use crate::app::error::AppError;
use crate::domain::session::StorageMode;
use crate::domain::telemetry::TelemetryWindow;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub health_status: String,
    pub well_count: usize,
    pub first_well: Option<String>,
    pub telemetry_points: Option<usize>,
}

pub fn run(config: ClientConfig) -> Result<(), AppError> {
    let client =
        build_client(config.request_timeout, config.credential_mode).map_err(AppError::runtime)?;

    let storage = match config.storage_mode {
        StorageMode::Persisted => TokenStorage::Persisted(Box::new(
            SqliteTokenStore::open(&config.token_db_path).map_err(AppError::storage)?,
        )),
        StorageMode::MemoryOnly => TokenStorage::MemoryOnly,
    };

    let session = Arc::new(
        SessionManager::init(
            client.clone(),
            config.api_url.clone(),
            config.credential_mode,
            storage,
        )
        .map_err(AppError::storage)?,
    );

    let gateway = WellDataGateway::new(
        MockWellSource::new(client.clone(), config.mock_external_url.clone()),
        PrimaryWellSource::new(client, config.api_url.clone(), Arc::clone(&session)),
        config.use_mock,
    );

    let summary = actix_web::rt::System::new().block_on(async move {
        refresh_dashboard(&session, &gateway, config.credentials.as_ref()).await
    })?;

    tracing::info!(
        health = %summary.health_status,
        wells = summary.well_count,
        first_well = summary.first_well.as_deref().unwrap_or("-"),
        telemetry_points = summary.telemetry_points.unwrap_or(0),
        "dashboard refresh complete"
    );
    Ok(())
}

pub async fn refresh_dashboard<M, P>(
    session: &SessionManager,
    gateway: &WellDataGateway<M, P>,
    credentials: Option<&Credentials>,
) -> Result<DashboardSummary, AppError>
where
    M: WellSource,
    P: WellSource,
{
    if let Some(credentials) = credentials {
        session
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(AppError::runtime)?;
    }

    if session.is_authenticated() {
        match session.current_user().await {
            Ok(user) => tracing::info!(
                user_id = user.id,
                username = %user.username,
                role = ?user.role,
                "signed in"
            ),
            Err(error) => tracing::warn!(error = %error, "failed to load current user"),
        }
    }

    let health = gateway.check_health().await;
    if !health.is_healthy() {
        tracing::warn!(
            mode = %gateway.current_mode(),
            error = health.error().unwrap_or("unknown"),
            "external api reported unhealthy"
        );
    }

    let wells = gateway.get_wells().await.map_err(AppError::runtime)?;
    let first_well = wells.ids().into_iter().next();

    let mut telemetry_points = None;
    if let Some(id) = &first_well {
        match gateway.get_well_by_id(id).await {
            Ok(record) => tracing::info!(well_id = %id, mode = %record.mode(), "well detail loaded"),
            Err(error) => tracing::warn!(well_id = %id, error = %error, "well detail unavailable"),
        }

        match gateway
            .get_well_telemetry(id, TelemetryWindow::default())
            .await
        {
            Ok(samples) => telemetry_points = Some(samples.len()),
            Err(error) => tracing::warn!(well_id = %id, error = %error, "telemetry unavailable"),
        }
    }

    Ok(DashboardSummary {
        health_status: health.status,
        well_count: wells.len(),
        first_well,
        telemetry_points,
    })
}

pub fn run_mock_api(config: MockApiConfig) -> Result<(), AppError> {
    let state = MockApiState {
        settings: MockApiSettings {
            failure_rate: config.failure_rate,
            health_failure_rate: config.health_failure_rate,
            simulate_latency: config.simulate_latency,
        },
    };
    let prefix = config.prefix.clone();

    tracing::info!(bind = %config.bind, prefix = %prefix, "mock api server starting");

    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                App::new()
                    .wrap(Cors::permissive())
                    .app_data(web::Data::new(state.clone()))
                    .service(web::scope(&prefix).configure(configure_routes))
            })
            .bind(&config.bind)?
            .run()
            .await
        })
        .map_err(AppError::runtime)
}
