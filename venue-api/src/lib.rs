use axum::{http::Method, routing::get, Json, Router};
use serde_json::{json, Value};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub mod actor;
pub mod availability;
pub mod bookings;
pub mod error;
pub mod state;

pub use state::{AppState, Runtime};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
            actor::ACTOR_ID_HEADER,
            actor::ACTOR_ROLE_HEADER,
        ]);

    Router::new()
        .route("/health", get(health))
        .merge(bookings::routes())
        .merge(availability::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve until `shutdown` resolves, then give queued booking confirmations up
/// to `runtime.shutdown_drain` to reach the sink.
pub async fn serve<F>(listener: TcpListener, runtime: Runtime, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let Runtime {
        state,
        worker,
        shutdown_drain,
    } = runtime;
    let notifications = worker.map(|worker| worker.spawn());

    // The router owns the last notifier handle; once serve returns it is
    // dropped and the worker exits after emptying its queue.
    axum::serve(listener, app(state)).with_graceful_shutdown(shutdown).await?;

    if let Some(handle) = notifications {
        info!("Draining queued booking confirmations");
        match tokio::time::timeout(shutdown_drain, handle).await {
            Ok(Ok(())) => info!("Notification queue drained"),
            Ok(Err(e)) => error!("Notification worker failed: {}", e),
            Err(_) => warn!("Confirmations still queued after {:?}, exiting anyway", shutdown_drain),
        }
    }
    Ok(())
}
