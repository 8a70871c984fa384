//! Risk-profiled news service: binary entrypoint
//! Boots the Axum HTTP server: config, tracing, metrics, routes.

use risk_news_aggregator::{api, metrics::Metrics, AggregatorConfig};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - AGGREGATOR_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("AGGREGATOR_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("risk_news_aggregator=info,warn"));

    // the runtime may already own the global subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AggregatorConfig::load_default()?;
    tracing::info!(
        offline = cfg.crawl.offline,
        max_results = cfg.crawl.max_results,
        "aggregator config loaded"
    );

    let metrics = Metrics::init(&cfg)?;
    let state = api::AppState::from_config(&cfg);
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
