use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMode {
    Mock,
    Real,
}

impl ApiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Real => "real",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockWellStatus {
    Active,
    Inactive,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockWell {
    pub well_id: String,
    pub temperature: f64,
    pub flow_rate: f64,
    pub pressure: f64,
    pub depth: f64,
    pub status: MockWellStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_maintenance: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryWellStatus {
    Active,
    Inactive,
    Maintenance,
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrimaryWell {
    pub id: i64,
    pub well_number: String,
    #[serde(rename = "field")]
    pub field_name: String,
    #[serde(deserialize_with = "decimal")]
    pub latitude: f64,
    #[serde(deserialize_with = "decimal")]
    pub longitude: f64,
    #[serde(default)]
    pub depth: Option<f64>,
    pub status: PrimaryWellStatus,
    pub status_display: String,
    pub current_pressure: Option<f64>,
    pub measured_flow_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub last_data_update: DateTime<Utc>,
}

// Decimal fields are serialized as strings by the primary API.
fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Number(value) => Ok(value),
        Decimal::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid decimal {text:?}"))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellsPayload {
    pub wells: Vec<MockWell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NestedWells {
    pub wells: Vec<Value>,
}

// Shape is decided on raw values so one malformed well cannot hide the rest.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WellListEnvelope {
    Nested { data: NestedWells },
    Flat { wells: Vec<Value> },
    Bare(Vec<Value>),
    Unrecognized(IgnoredAny),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedWell {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct DecodedWells {
    pub wells: Vec<MockWell>,
    pub rejected: Vec<RejectedWell>,
}

impl WellListEnvelope {
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or(Self::Unrecognized(IgnoredAny))
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Self::Nested { .. } => "nested",
            Self::Flat { .. } => "flat",
            Self::Bare(_) => "bare",
            Self::Unrecognized(_) => "unrecognized",
        }
    }

    pub fn decode(self) -> DecodedWells {
        let items = match self {
            Self::Nested { data } => data.wells,
            Self::Flat { wells } => wells,
            Self::Bare(wells) => wells,
            Self::Unrecognized(_) => return DecodedWells::default(),
        };

        let mut decoded = DecodedWells {
            wells: Vec::with_capacity(items.len()),
            rejected: Vec::new(),
        };
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<MockWell>(item) {
                Ok(well) => decoded.wells.push(well),
                Err(error) => decoded.rejected.push(RejectedWell {
                    index,
                    reason: error.to_string(),
                }),
            }
        }
        decoded
    }
}

// Keyed by the producing mode; the two shapes are never merged.
#[derive(Debug, Clone, PartialEq)]
pub enum WellList {
    Mock(Vec<MockWell>),
    Primary(Vec<PrimaryWell>),
}

impl WellList {
    pub fn mode(&self) -> ApiMode {
        match self {
            Self::Mock(_) => ApiMode::Mock,
            Self::Primary(_) => ApiMode::Real,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Mock(wells) => wells.len(),
            Self::Primary(wells) => wells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<String> {
        match self {
            Self::Mock(wells) => wells.iter().map(|well| well.well_id.clone()).collect(),
            Self::Primary(wells) => wells.iter().map(|well| well.id.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WellRecord {
    Mock(MockWell),
    Primary(PrimaryWell),
}

impl WellRecord {
    pub fn mode(&self) -> ApiMode {
        match self {
            Self::Mock(_) => ApiMode::Mock,
            Self::Primary(_) => ApiMode::Real,
        }
    }
}
