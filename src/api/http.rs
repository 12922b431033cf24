use std::net::SocketAddr;

use axum::{
    Router,
    extract::{Json, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::DepletionLimits;

use super::{
    DepleteArgs, FixedArgs, PlanArgs, SolveArgs, VariableArgs, build_limits, deplete_report,
    fixed_report, plan_report, solve_report, variable_report,
};

#[derive(Copy, Clone, Debug)]
struct ServerConfig {
    limits: DepletionLimits,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixedPayload {
    principal: f64,
    rate: f64,
    years: u32,
    #[serde(default)]
    contribution: f64,
}

impl From<FixedPayload> for FixedArgs {
    fn from(value: FixedPayload) -> Self {
        FixedArgs {
            principal: value.principal,
            rate: value.rate,
            years: value.years,
            contribution: value.contribution,
            json: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariablePayload {
    principal: f64,
    rates: Vec<f64>,
    #[serde(default)]
    contribution: f64,
}

impl From<VariablePayload> for VariableArgs {
    fn from(value: VariablePayload) -> Self {
        VariableArgs {
            principal: value.principal,
            rates: value.rates,
            contribution: value.contribution,
            json: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepletePayload {
    principal: f64,
    withdrawal: f64,
    rate: f64,
    #[serde(default)]
    years: Option<u32>,
    #[serde(default)]
    max_depletion_years: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolvePayload {
    principal: f64,
    rate: f64,
    years: u32,
}

impl From<SolvePayload> for SolveArgs {
    fn from(value: SolvePayload) -> Self {
        SolveArgs {
            principal: value.principal,
            rate: value.rate,
            years: value.years,
            json: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanPayload {
    principal: f64,
    rate: f64,
    years: u32,
    #[serde(default)]
    contribution: f64,
    retirement_rate: f64,
    retirement_years: u32,
    #[serde(default)]
    withdrawal: Option<f64>,
    #[serde(default)]
    max_depletion_years: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn run_http_server(port: u16, limits: DepletionLimits) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("retireplan HTTP API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/api/health");

    axum::serve(listener, router(ServerConfig { limits })).await
}

fn router(config: ServerConfig) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/accumulate/fixed", post(fixed_handler))
        .route("/api/accumulate/variable", post(variable_handler))
        .route("/api/deplete", post(deplete_handler))
        .route("/api/sustainable-withdrawal", post(solve_handler))
        .route("/api/plan", post(plan_handler))
        .fallback(not_found_handler)
        .with_state(config)
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn fixed_handler(Json(payload): Json<FixedPayload>) -> Response {
    let args = FixedArgs::from(payload);
    respond_blocking(move || fixed_report(&args)).await
}

async fn variable_handler(Json(payload): Json<VariablePayload>) -> Response {
    let args = VariableArgs::from(payload);
    respond_blocking(move || variable_report(&args)).await
}

async fn deplete_handler(
    State(config): State<ServerConfig>,
    Json(payload): Json<DepletePayload>,
) -> Response {
    let limits = match request_limits(config, payload.max_depletion_years) {
        Ok(limits) => limits,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let args = DepleteArgs {
        principal: payload.principal,
        withdrawal: payload.withdrawal,
        rate: payload.rate,
        years: payload.years,
        json: true,
    };
    respond_blocking(move || deplete_report(&args, limits)).await
}

async fn solve_handler(Json(payload): Json<SolvePayload>) -> Response {
    let args = SolveArgs::from(payload);
    respond_blocking(move || solve_report(&args)).await
}

async fn plan_handler(
    State(config): State<ServerConfig>,
    Json(payload): Json<PlanPayload>,
) -> Response {
    let limits = match request_limits(config, payload.max_depletion_years) {
        Ok(limits) => limits,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let args = PlanArgs {
        principal: payload.principal,
        rate: payload.rate,
        years: payload.years,
        contribution: payload.contribution,
        retirement_rate: payload.retirement_rate,
        retirement_years: payload.retirement_years,
        withdrawal: payload.withdrawal,
        json: true,
    };
    respond_blocking(move || plan_report(&args, limits)).await
}

/// A request may lower the server's run-to-depletion cap but never raise it.
fn request_limits(
    config: ServerConfig,
    max_depletion_years: Option<u32>,
) -> Result<DepletionLimits, String> {
    match max_depletion_years {
        Some(years) if years > config.limits.max_years => Err(format!(
            "--max-depletion-years must be <= {}",
            config.limits.max_years
        )),
        Some(years) => build_limits(years),
        None => Ok(config.limits),
    }
}

async fn respond_blocking<T, F>(work: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => respond(result),
        Err(err) => {
            warn!("simulation task failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn respond<T: Serialize>(result: Result<T, String>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(msg) => {
            warn!("rejected request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
