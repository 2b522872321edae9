use tracing_subscriber::{EnvFilter, fmt};

use crate::app::AppError;

pub const CLIENT_FILTER: &str = "info,reqwest=warn,hyper_util=warn";
pub const MOCK_API_FILTER: &str = "info,actix_server=warn";

pub fn init(default_directives: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(AppError::logging_init)
}
