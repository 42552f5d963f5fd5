use anyhow::{Context, Result};
use axum::Router;
use axum::http::Method;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use super::health::healthz;
use super::posts::{get_post, list_posts};
use crate::metrics_exporter::render_metrics;
use crate::state::AppState;

pub fn build_api_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(|| async { render_metrics() }))
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{slug}", get(get_post))
        .merge(view_counter::handlers::router::<AppState>())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS]),
        )
        .with_state(state)
}

pub async fn run_api(state: AppState, bind: String, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, build_api_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}
