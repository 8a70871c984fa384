use std::collections::BTreeMap;
use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::circuit_breaker::CircuitSnapshot;
use crate::config::AggregatorConfig;
use crate::monitor::EndpointStats;
use crate::service::{NewsResponse, NewsService};

pub const DEFAULT_TOLERANCE: i32 = 50;
pub const DEFAULT_HORIZON: &str = "medium";

#[derive(Clone)]
pub struct AppState {
    service: Arc<NewsService>,
}

impl AppState {
    pub fn new(service: NewsService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn from_config(cfg: &AggregatorConfig) -> Self {
        Self::new(NewsService::from_config(cfg))
    }

    pub fn service(&self) -> &NewsService {
        &self.service
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(news))
        .route("/debug/perf", get(debug_perf))
        .route("/debug/breakers", get(debug_breakers))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Router over the offline catalog; handy for tests and local poking.
pub fn router() -> Router {
    create_router(AppState::from_config(&AggregatorConfig::offline()))
}

/// Raw query; numbers are parsed in the handler so bad input gets the JSON error shape.
#[derive(Debug, serde::Deserialize)]
struct NewsQuery {
    #[serde(default)]
    tolerance: Option<String>,
    #[serde(default)]
    horizon: Option<String>,
    #[serde(default)]
    amount: Option<String>,
}

fn bad_request(msg: String) -> (StatusCode, Json<NewsResponse>) {
    (StatusCode::BAD_REQUEST, Json(NewsResponse::error(msg)))
}

async fn news(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> (StatusCode, Json<NewsResponse>) {
    let tolerance = match q.tolerance.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_TOLERANCE,
        Some(raw) => match raw.parse::<i32>() {
            Ok(t) => t,
            Err(_) => return bad_request(format!("risk tolerance must be an integer, got {raw:?}")),
        },
    };
    let amount = match q.amount.as_deref().map(str::trim) {
        None | Some("") => 0,
        Some(raw) => match raw.parse::<i64>() {
            Ok(a) => a,
            Err(_) => return bad_request(format!("investment amount must be an integer, got {raw:?}")),
        },
    };
    let horizon = q.horizon.unwrap_or_else(|| DEFAULT_HORIZON.to_string());

    if !(0..=100).contains(&tolerance) {
        return bad_request(format!(
            "risk tolerance must be within 0..=100, got {tolerance}"
        ));
    }

    let resp = state
        .service
        .get_news_by_risk_profile(tolerance, &horizon, amount)
        .await;
    let status = if resp.is_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(resp))
}

async fn debug_perf(State(state): State<AppState>) -> Json<BTreeMap<String, EndpointStats>> {
    Json(state.service.context().monitor.snapshot())
}

async fn debug_breakers(State(state): State<AppState>) -> Json<BTreeMap<String, CircuitSnapshot>> {
    Json(state.service.context().breaker.snapshot())
}
