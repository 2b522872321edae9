pub mod health;
pub mod session;
pub mod telemetry;
pub mod user;
pub mod well;
