//! Code Clash Back binary entrypoint wiring REST, SSE, and the judge client.

use std::{env, fs, net::SocketAddr, path::Path, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod config;
mod dao;
mod dto;
mod error;
mod judge;
mod routes;
mod services;
mod state;

use catalog::InMemoryCatalog;
use config::AppConfig;
use dao::{accounts::InMemoryAccountStore, reports::InMemoryReportStore};
use judge::{Judge, http::HttpJudge, offline::OfflineJudge};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();

    let catalog = load_catalog(&config)?;
    let judge = build_judge(&config)?;

    let app_state = AppState::new(
        config,
        Arc::new(catalog),
        judge,
        Arc::new(InMemoryAccountStore::default()),
        Arc::new(InMemoryReportStore::default()),
    );
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Seed the in-memory problem bank from the configured JSON file, when one is
/// set. An empty bank is valid; starting a match will fail until problems
/// exist.
fn load_catalog(config: &AppConfig) -> anyhow::Result<InMemoryCatalog> {
    let Some(path) = &config.problem_bank_path else {
        warn!("no problem bank configured; starting with an empty bank");
        return Ok(InMemoryCatalog::default());
    };

    let catalog = read_problem_bank(path)
        .with_context(|| format!("loading problem bank from {}", path.display()))?;
    info!(
        path = %path.display(),
        problems = catalog.len(),
        "problem bank loaded"
    );
    Ok(catalog)
}

/// Parse a problem bank file: a JSON array of problems.
fn read_problem_bank(path: &Path) -> anyhow::Result<InMemoryCatalog> {
    let contents = fs::read_to_string(path).context("reading problem bank")?;
    let problems: Vec<state::problem::Problem> =
        serde_json::from_str(&contents).context("parsing problem bank")?;
    Ok(InMemoryCatalog::with_problems(problems))
}

/// Select the grading backend. The offline judge is never a silent fallback;
/// it must be requested through configuration.
fn build_judge(config: &AppConfig) -> anyhow::Result<Arc<dyn Judge>> {
    if config.judge.offline {
        warn!("offline judge enabled; every submission will receive full marks");
        return Ok(Arc::new(OfflineJudge));
    }

    let judge = HttpJudge::new(&config.judge).context("building judge client")?;
    info!(base_url = %config.judge.base_url, "using HTTP judge");
    Ok(Arc::new(judge))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
