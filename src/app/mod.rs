mod config;
mod error;
mod logging;
mod runtime;

pub use error::AppError;

pub fn run() -> Result<(), AppError> {
    logging::init(logging::CLIENT_FILTER)?;

    let config = config::ClientConfig::from_env()?;

    tracing::info!(
        api_url = %config.api_url,
        mock_external_url = %config.mock_external_url,
        credential_mode = ?config.credential_mode,
        storage_mode = %config.storage_mode,
        use_mock = config.use_mock,
        timeout_ms = config.request_timeout.as_millis() as u64,
        "dashboard client bootstrap initialized"
    );

    runtime::run(config)
}

pub fn run_mock_api() -> Result<(), AppError> {
    logging::init(logging::MOCK_API_FILTER)?;

    let config = config::MockApiConfig::from_env()?;

    tracing::info!(
        bind = %config.bind,
        prefix = %config.prefix,
        failure_rate = config.failure_rate,
        health_failure_rate = config.health_failure_rate,
        simulate_latency = config.simulate_latency,
        "mock api bootstrap initialized"
    );

    runtime::run_mock_api(config)
}
