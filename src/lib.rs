//! # Stein
//!
//! Admin console for a beer-drinking contest tracker. All contest data lives
//! in an external API server; this service fetches it over HTTP/JSON, renders
//! the tables and the checkin-validation queue as HTML, and forwards operator
//! edits (add/delete/validate/dismiss) back upstream.

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod models;
pub mod queue;
pub mod render;
pub mod routes;
pub mod state;

use routes::{
    add_entity, contest_overview, delete_entity, dismiss_checkin, lookup, submit_decision,
    validation_page,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/contests/{contest_id}", get(contest_overview))
        .route(
            "/contests/{contest_id}/validate",
            get(validation_page).post(submit_decision),
        )
        .route("/contests/{contest_id}/dismiss", post(dismiss_checkin))
        .route("/contests/{contest_id}/lookup/{kind}", get(lookup))
        .route("/contests/{contest_id}/{plural}", post(add_entity))
        .route(
            "/contests/{contest_id}/{plural}/{entity_id}/delete",
            post(delete_entity),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Console running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Console shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
