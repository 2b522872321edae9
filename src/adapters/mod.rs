pub mod gateway;
pub mod http;
pub mod mock_api;
pub mod mock_source;
pub mod primary_source;
pub mod session_manager;
pub mod token_store;
