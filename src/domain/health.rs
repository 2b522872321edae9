use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNHEALTHY: &str = "unhealthy";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HealthReport {
    pub fn unhealthy<E: Display>(error: E) -> Self {
        let mut details = Map::new();
        details.insert("error".to_string(), Value::String(error.to_string()));
        Self {
            status: UNHEALTHY.to_string(),
            details,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ok")
    }

    pub fn error(&self) -> Option<&str> {
        self.details.get("error").and_then(Value::as_str)
    }
}
