use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Duration;

use actix_web::{HttpResponse, Responder, get, web};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use crate::domain::telemetry::{
    DEFAULT_TELEMETRY_HOURS, DEFAULT_TELEMETRY_POINTS, MAX_TELEMETRY_POINTS, TelemetrySampleSet,
    TelemetrySeries,
};
use crate::domain::well::{ApiEnvelope, Coordinates, MockWell, MockWellStatus, WellsPayload};

pub const API_VERSION: &str = "1.0.0";
const KNOWN_WELLS: std::ops::RangeInclusive<u32> = 1..=10;
const STATUS_CHOICES: [MockWellStatus; 5] = [
    MockWellStatus::Active,
    MockWellStatus::Active,
    MockWellStatus::Active,
    MockWellStatus::Maintenance,
    MockWellStatus::Inactive,
];
const FIELD_NAMES: [&str; 3] = ["North", "South", "West"];
const OPERATORS: [&str; 3] = ["Gazprom", "Lukoil", "Rosneft"];

#[derive(Debug, Clone)]
pub struct MockApiSettings {
    pub failure_rate: f64,
    pub health_failure_rate: f64,
    pub simulate_latency: bool,
}

#[derive(Debug, Clone)]
pub struct MockApiState {
    pub settings: MockApiSettings,
}

impl MockApiState {
    async fn latency(&self, range_ms: Range<u64>) {
        if !self.settings.simulate_latency {
            return;
        }
        let delay = rand::thread_rng().gen_range(range_ms);
        actix_web::rt::time::sleep(Duration::from_millis(delay)).await;
    }

    fn should_fail(&self, rate: f64) -> bool {
        rate > 0.0 && rand::thread_rng().gen_bool(rate.min(1.0))
    }
}

#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    pub hours: Option<u32>,
    pub points: Option<u32>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(api_root)
        .service(wells_list)
        .service(well_detail)
        .service(well_telemetry)
        .service(health_check);
}

#[get("/")]
async fn api_root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "api": "Mock Well Monitoring API",
        "version": API_VERSION,
        "description": "Stand-in for the external well monitoring system",
        "endpoints": {
            "wells_list": "/api/v1/wells/",
            "well_detail": "/api/v1/wells/{id}/",
            "well_telemetry": "/api/v1/wells/{id}/telemetry/",
            "health": "/api/v1/health/"
        }
    }))
}

#[get("/api/v1/wells/")]
async fn wells_list(state: web::Data<MockApiState>) -> impl Responder {
    state.latency(50..500).await;

    if state.should_fail(state.settings.failure_rate) {
        tracing::warn!("mock api injecting 503 for wells list");
        return HttpResponse::ServiceUnavailable()
            .insert_header(("Retry-After", "30"))
            .json(json!({ "error": "Service temporarily unavailable" }));
    }

    let now = Utc::now();
    let wells = {
        let mut rng = rand::thread_rng();
        let count = rng.gen_range(2..=10);
        generate_wells(&mut rng, count, now)
    };

    tracing::info!(count = wells.len(), "mock api served wells list");
    HttpResponse::Ok().json(ApiEnvelope {
        success: true,
        data: WellsPayload {
            count: Some(wells.len()),
            wells,
            timestamp: Some(now.to_rfc3339()),
            api_version: Some(API_VERSION.to_string()),
        },
    })
}

#[get("/api/v1/wells/{well_id}/")]
async fn well_detail(state: web::Data<MockApiState>, path: web::Path<String>) -> impl Responder {
    let well_id = path.into_inner();
    state.latency(100..300).await;

    let number = match known_well_number(&well_id) {
        Ok(number) => number,
        Err(response) => return response,
    };

    let well = {
        let mut rng = rand::thread_rng();
        let mut well = generate_well(&mut rng, number, Utc::now());
        well.well_id = well_id.clone();
        well.installation_date = Some("2020-05-15".to_string());
        well.field_name = Some(FIELD_NAMES[rng.gen_range(0..FIELD_NAMES.len())].to_string());
        well.operator = Some(OPERATORS[rng.gen_range(0..OPERATORS.len())].to_string());
        well.last_maintenance = Some("2024-11-20".to_string());
        well
    };

    tracing::info!(well_id = %well_id, "mock api served well detail");
    HttpResponse::Ok().json(ApiEnvelope {
        success: true,
        data: well,
    })
}

#[get("/api/v1/wells/{well_id}/telemetry/")]
async fn well_telemetry(
    state: web::Data<MockApiState>,
    path: web::Path<String>,
    query: web::Query<TelemetryQuery>,
) -> impl Responder {
    let well_id = path.into_inner();
    state.latency(200..800).await;

    let hours = query.hours.unwrap_or(DEFAULT_TELEMETRY_HOURS);
    let points = query
        .points
        .unwrap_or(DEFAULT_TELEMETRY_POINTS)
        .min(MAX_TELEMETRY_POINTS);

    let number = match known_well_number(&well_id) {
        Ok(number) => number,
        Err(response) => return response,
    };

    let telemetry = generate_telemetry(
        &mut rand::thread_rng(),
        number,
        hours,
        points,
        Utc::now().timestamp(),
    );

    let units = BTreeMap::from([
        ("temperature".to_string(), "°C".to_string()),
        ("pressure".to_string(), "atm".to_string()),
        ("flow_rate".to_string(), "m³/day".to_string()),
    ]);

    tracing::info!(well_id = %well_id, hours, points, "mock api served telemetry");
    HttpResponse::Ok().json(ApiEnvelope {
        success: true,
        data: TelemetrySampleSet {
            well_id,
            parameters: vec![
                "temperature".to_string(),
                "pressure".to_string(),
                "flow_rate".to_string(),
            ],
            units,
            telemetry,
            period_hours: hours,
            points,
        },
    })
}

#[get("/api/v1/health/")]
async fn health_check(state: web::Data<MockApiState>) -> impl Responder {
    state.latency(10..50).await;
    let now = Utc::now();

    if state.should_fail(state.settings.health_failure_rate) {
        tracing::error!("mock api injecting critical health failure");
        return HttpResponse::InternalServerError().json(json!({
            "status": "critical",
            "error": "Database connection failed",
            "timestamp": now.to_rfc3339()
        }));
    }

    let body = {
        let mut rng = rand::thread_rng();
        let last_cron_run = now - chrono::Duration::minutes(rng.gen_range(0..=60));
        let message_queue = if rng.gen_bool(0.95) {
            "online"
        } else {
            "degraded"
        };
        json!({
            "status": "healthy",
            "timestamp": now.to_rfc3339(),
            "version": API_VERSION,
            "environment": "mock",
            "metrics": {
                "uptime_seconds": rng.gen_range(1_000_000..=2_000_000),
                "memory_usage_mb": round1(rng.gen_range(512.0..2048.0)),
                "cpu_percent": round1(rng.gen_range(5.0..40.0)),
                "active_connections": rng.gen_range(50..=200),
                "request_rate_per_minute": rng.gen_range(100..=500),
                "last_cron_run": last_cron_run.to_rfc3339()
            },
            "services": {
                "database": "online",
                "cache": "online",
                "message_queue": message_queue,
                "storage": "online"
            }
        })
    };

    HttpResponse::Ok().json(body)
}

fn known_well_number(well_id: &str) -> Result<u32, HttpResponse> {
    let Some(number) = parse_well_number(well_id) else {
        tracing::warn!(well_id, "mock api rejected malformed well id");
        return Err(HttpResponse::BadRequest().json(json!({
            "error": format!("Invalid well ID format: {well_id}")
        })));
    };

    if !KNOWN_WELLS.contains(&number) {
        tracing::warn!(well_id, "mock api well not found");
        return Err(HttpResponse::NotFound().json(json!({
            "error": format!("Well {well_id} not found")
        })));
    }

    Ok(number)
}

pub fn parse_well_number(well_id: &str) -> Option<u32> {
    well_id.split('-').nth(1)?.parse().ok()
}

pub fn generate_wells<R: Rng>(rng: &mut R, count: u32, now: DateTime<Utc>) -> Vec<MockWell> {
    (1..=count).map(|number| generate_well(rng, number, now)).collect()
}

pub fn generate_well<R: Rng>(rng: &mut R, number: u32, now: DateTime<Utc>) -> MockWell {
    let base_temperature = 80.0 + rng.gen_range(0.0..25.0);
    let base_flow = 50.0 + rng.gen_range(0.0..150.0);
    let base_pressure = 30.0 + rng.gen_range(0.0..25.0);
    // Slow drift so consecutive polls differ.
    let time_factor = now.timestamp() as f64 / 10_000.0;

    MockWell {
        well_id: format!("WELL-{number:03}"),
        temperature: round1(base_temperature + rng.gen_range(-2.0..2.0) + time_factor % 5.0),
        flow_rate: round1(base_flow + rng.gen_range(-10.0..10.0) + time_factor % 20.0),
        pressure: round1(base_pressure + rng.gen_range(-1.0..1.0) + time_factor % 3.0),
        depth: round1(2000.0 + rng.gen_range(0.0..1500.0)),
        status: STATUS_CHOICES[rng.gen_range(0..STATUS_CHOICES.len())],
        coordinates: Some(Coordinates {
            lat: 55.75 + rng.gen_range(-0.01..0.01),
            lon: 37.61 + rng.gen_range(-0.01..0.01),
        }),
        last_updated: Some(now.to_rfc3339()),
        installation_date: None,
        field_name: None,
        operator: None,
        last_maintenance: None,
    }
}

/// `points` samples covering the last `hours`, oldest first, at least one second apart.
pub fn generate_telemetry<R: Rng>(
    rng: &mut R,
    well_number: u32,
    hours: u32,
    points: u32,
    now_secs: i64,
) -> TelemetrySeries {
    if points == 0 {
        return TelemetrySeries::default();
    }

    let step = (f64::from(hours) * 3600.0 / f64::from(points)).max(1.0);
    let timestamps: Vec<i64> = (0..points)
        .rev()
        .map(|i| (now_secs as f64 - f64::from(i) * step).floor() as i64)
        .collect();

    let base_temperature = 80.0 + f64::from(well_number) * 2.0;
    let base_pressure = 35.0 + f64::from(well_number) * 1.5;
    let base_flow = 100.0 + f64::from(well_number) * 10.0;

    let mut series = TelemetrySeries {
        timestamps: Vec::with_capacity(timestamps.len()),
        temperature: Vec::with_capacity(timestamps.len()),
        pressure: Vec::with_capacity(timestamps.len()),
        flow_rate: Vec::with_capacity(timestamps.len()),
    };

    for (index, timestamp) in timestamps.into_iter().enumerate() {
        let season = (timestamp as f64 / 10_000.0).sin() * 3.0;
        let noise = rng.gen_range(-1.0..1.0);

        series.timestamps.push(timestamp);
        series
            .temperature
            .push(round1(base_temperature + season + noise + index as f64 * 0.01));
        series
            .pressure
            .push(round1(base_pressure + season * 0.5 + noise * 0.5));
        series
            .flow_rate
            .push(round1((base_flow + season * 2.0 + noise * 2.0).max(0.0)));
    }

    series
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, body::to_bytes, http::StatusCode, web};
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{
        MockApiSettings, MockApiState, configure_routes, generate_telemetry, generate_wells,
        parse_well_number,
    };
    use crate::domain::telemetry::TelemetrySampleSet;
    use crate::domain::well::{ApiEnvelope, MockWell, WellListEnvelope};

    fn quiet_state() -> MockApiState {
        MockApiState {
            settings: MockApiSettings {
                failure_rate: 0.0,
                health_failure_rate: 0.0,
                simulate_latency: false,
            },
        }
    }

    fn failing_state() -> MockApiState {
        MockApiState {
            settings: MockApiSettings {
                failure_rate: 1.0,
                health_failure_rate: 1.0,
                simulate_latency: false,
            },
        }
    }

    async fn get(state: MockApiState, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = TestRequest::get().uri(uri).to_request();
        let resp = call_service(&app, req).await;
        let status = resp.status();
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        let json = serde_json::from_slice(&body).expect("body should be json");
        (status, json)
    }

    #[test]
    fn parses_well_numbers() {
        assert_eq!(parse_well_number("WELL-001"), Some(1));
        assert_eq!(parse_well_number("WELL-10"), Some(10));
        assert_eq!(parse_well_number("WELL"), None);
        assert_eq!(parse_well_number("WELL-abc"), None);
    }

    #[test]
    fn generated_wells_are_numbered_and_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let wells = generate_wells(&mut rng, 3, Utc::now());

        let ids: Vec<&str> = wells.iter().map(|well| well.well_id.as_str()).collect();
        assert_eq!(ids, ["WELL-001", "WELL-002", "WELL-003"]);
        for well in &wells {
            assert!((2000.0..=3500.0).contains(&well.depth));
            assert!(well.coordinates.is_some());
        }
    }

    #[test]
    fn generated_telemetry_is_aligned_and_increasing() {
        let mut rng = StdRng::seed_from_u64(11);
        let series = generate_telemetry(&mut rng, 2, 24, 100, 1_700_000_000);

        assert_eq!(series.timestamps.len(), 100);
        assert_eq!(series.temperature.len(), 100);
        assert_eq!(series.pressure.len(), 100);
        assert_eq!(series.flow_rate.len(), 100);
        assert_eq!(*series.timestamps.last().expect("last sample"), 1_700_000_000);
        assert!(series.timestamps.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(series.flow_rate.iter().all(|value| *value >= 0.0));
    }

    #[test]
    fn dense_telemetry_keeps_timestamps_distinct() {
        let mut rng = StdRng::seed_from_u64(3);
        let series = generate_telemetry(&mut rng, 1, 0, 50, 1_700_000_000);

        assert!(series.timestamps.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[actix_web::test]
    async fn wells_list_uses_nested_envelope() {
        let (status, json) = get(quiet_state(), "/api/v1/wells/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["api_version"], "1.0.0");
        let count = json["data"]["count"].as_u64().expect("count should be a number");
        assert!((2..=10).contains(&count));

        let envelope = WellListEnvelope::parse(json.to_string().as_bytes());
        assert_eq!(envelope.shape(), "nested");
        assert_eq!(envelope.decode().wells.len() as u64, count);
    }

    #[actix_web::test]
    async fn injected_failure_returns_service_unavailable() {
        let app = init_service(
            App::new()
                .app_data(web::Data::new(failing_state()))
                .configure(configure_routes),
        )
        .await;

        let req = TestRequest::get().uri("/api/v1/wells/").to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            resp.headers()
                .get("Retry-After")
                .and_then(|value| value.to_str().ok()),
            Some("30")
        );
    }

    #[actix_web::test]
    async fn well_detail_adds_metadata() {
        let (status, json) = get(quiet_state(), "/api/v1/wells/WELL-004/").await;

        assert_eq!(status, StatusCode::OK);
        let envelope: ApiEnvelope<MockWell> =
            serde_json::from_value(json).expect("detail should decode");
        assert_eq!(envelope.data.well_id, "WELL-004");
        assert_eq!(envelope.data.installation_date.as_deref(), Some("2020-05-15"));
        assert!(envelope.data.operator.is_some());
        assert!(envelope.data.field_name.is_some());
    }

    #[actix_web::test]
    async fn well_detail_validates_ids() {
        let (status, json) = get(quiet_state(), "/api/v1/wells/WELL-011/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Well WELL-011 not found");

        let (status, _) = get(quiet_state(), "/api/v1/wells/oops/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn telemetry_caps_points_and_reports_units() {
        let (status, json) = get(
            quiet_state(),
            "/api/v1/wells/WELL-002/telemetry/?hours=48&points=5000",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let envelope: ApiEnvelope<TelemetrySampleSet> =
            serde_json::from_value(json).expect("telemetry should decode");
        let telemetry = envelope.data;
        assert_eq!(telemetry.points, 1000);
        assert_eq!(telemetry.period_hours, 48);
        assert_eq!(telemetry.len(), 1000);
        assert_eq!(telemetry.units["pressure"], "atm");
        assert_eq!(telemetry.validate(), Ok(()));
    }

    #[actix_web::test]
    async fn health_reports_status() {
        let (status, json) = get(quiet_state(), "/api/v1/health/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["services"]["database"], "online");

        let (status, json) = get(failing_state(), "/api/v1/health/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "critical");
    }

    #[actix_web::test]
    async fn root_lists_endpoints() {
        let (status, json) = get(quiet_state(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["endpoints"]["health"], "/api/v1/health/");
    }
}
