use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, get, post, web};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::adapters::http::build_client;
use crate::domain::session::CredentialMode;

// Nothing listens on the discard port.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9";

// The directory is removed when the returned guard drops.
pub fn temp_db_path(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join(name);
    (dir, path)
}

pub fn test_client(credential_mode: CredentialMode) -> Client {
    build_client(Duration::from_secs(5), credential_mode).expect("http client should build")
}

pub struct TestServer {
    pub base_url: String,
    handle: ServerHandle,
}

impl TestServer {
    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

// Must be called inside an actix runtime.
pub fn spawn_server<F>(configure: F) -> TestServer
where
    F: Fn(&mut web::ServiceConfig) + Send + Clone + 'static,
{
    let server = HttpServer::new(move || App::new().configure(configure.clone()))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("test server should bind");
    let addr = server.addrs()[0];

    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    TestServer {
        base_url: format!("http://{addr}"),
        handle,
    }
}

pub fn spawn_json_server(path: &'static str, status: u16, body: Value) -> TestServer {
    spawn_server(move |cfg: &mut web::ServiceConfig| {
        let body = body.clone();
        cfg.route(
            path,
            web::get().to(move || {
                let body = body.clone();
                async move {
                    let status = actix_web::http::StatusCode::from_u16(status)
                        .expect("test status should be valid");
                    HttpResponse::build(status).json(body)
                }
            }),
        );
    })
}

pub struct FakePrimaryApi {
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub wells_calls: AtomicUsize,
    pub accepted_access: Mutex<Vec<String>>,
    // `None` makes refresh fail.
    pub refreshed_access: Mutex<Option<String>>,
}

impl Default for FakePrimaryApi {
    fn default() -> Self {
        Self {
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            wells_calls: AtomicUsize::new(0),
            accepted_access: Mutex::new(vec!["A".to_string()]),
            refreshed_access: Mutex::new(Some("A2".to_string())),
        }
    }
}

impl FakePrimaryApi {
    pub fn accept_only(&self, tokens: &[&str]) {
        *self.accepted_access.lock().expect("lock should be available") =
            tokens.iter().map(ToString::to_string).collect();
    }

    pub fn issue_on_refresh(&self, token: Option<&str>) {
        *self.refreshed_access.lock().expect("lock should be available") =
            token.map(ToString::to_string);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn authorized(&self, req: &HttpRequest) -> bool {
        let Some(token) = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
        else {
            return false;
        };

        self.accepted_access
            .lock()
            .expect("lock should be available")
            .iter()
            .any(|accepted| accepted == token)
    }
}

pub fn spawn_primary_api(state: web::Data<FakePrimaryApi>) -> TestServer {
    spawn_server(move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(state.clone())
            .service(login)
            .service(register)
            .service(me)
            .service(refresh)
            .service(wells)
            .service(well_detail)
            .service(health);
    })
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "detail": "Given token not valid for any token type"
    }))
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

#[post("/api/auth/login/")]
async fn login(state: web::Data<FakePrimaryApi>, body: web::Json<LoginBody>) -> impl Responder {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    if body.username == "admin" && body.password == "secret" {
        HttpResponse::Ok().json(json!({ "access": "A", "refresh": "R" }))
    } else {
        HttpResponse::Unauthorized().json(json!({
            "detail": "No active account found with the given credentials"
        }))
    }
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    password: String,
    password2: String,
    email: Option<String>,
}

#[post("/api/auth/register/")]
async fn register(body: web::Json<RegisterBody>) -> impl Responder {
    if body.password != body.password2 {
        return HttpResponse::BadRequest().json(json!({
            "password": ["Passwords do not match"]
        }));
    }
    if body.username == "admin" {
        return HttpResponse::BadRequest().json(json!({
            "detail": "A user with that username already exists."
        }));
    }

    HttpResponse::Created().json(json!({
        "id": 2,
        "username": body.username,
        "email": body.email.clone().unwrap_or_default()
    }))
}

#[get("/api/auth/me/")]
async fn me(state: web::Data<FakePrimaryApi>, req: HttpRequest) -> impl Responder {
    if !state.authorized(&req) {
        return unauthorized();
    }

    HttpResponse::Ok().json(json!({
        "id": 1,
        "username": "admin",
        "email": "admin@example.com",
        "role": "admin",
        "date_joined": "2025-01-01T00:00:00Z",
        "last_login": null
    }))
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

#[post("/api/auth/refresh/")]
async fn refresh(state: web::Data<FakePrimaryApi>, body: web::Json<RefreshBody>) -> impl Responder {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let issued = state
        .refreshed_access
        .lock()
        .expect("lock should be available")
        .clone();

    match issued {
        Some(access) if body.refresh == "R" => HttpResponse::Ok().json(json!({ "access": access })),
        _ => HttpResponse::Unauthorized().json(json!({
            "detail": "Token is invalid or expired"
        })),
    }
}

pub fn primary_well_json(id: i64) -> Value {
    json!({
        "id": id,
        "well_number": format!("N-{id:03}"),
        "field": "North",
        "latitude": "55.755800",
        "longitude": "37.617300",
        "depth": 2450.0,
        "status": "active",
        "status_display": "Active",
        "current_pressure": 45.2,
        "measured_flow_rate": 120.3,
        "temperature": 85.5,
        "last_data_update": "2025-03-01T12:30:00Z"
    })
}

#[get("/api/wells/")]
async fn wells(state: web::Data<FakePrimaryApi>, req: HttpRequest) -> impl Responder {
    state.wells_calls.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&req) {
        return unauthorized();
    }

    HttpResponse::Ok().json(json!([primary_well_json(1), primary_well_json(2)]))
}

#[get("/api/wells/{id}/")]
async fn well_detail(
    state: web::Data<FakePrimaryApi>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    if !state.authorized(&req) {
        return unauthorized();
    }

    match path.into_inner() {
        id @ 1..=2 => HttpResponse::Ok().json(primary_well_json(id)),
        _ => HttpResponse::NotFound().json(json!({ "detail": "Not found." })),
    }
}

#[get("/api/health/")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
