use anyhow::Result;
use site_server::api::server::run_api;
use site_server::config::loader::load_with_discovery;
use site_server::content::ContentLibrary;
use site_server::metrics_exporter::init_metrics;
use site_server::state::{AppState, build_view_counter};
use site_server::store_monitor::monitor_store;
use site_server::supervisor::Supervisor;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = load_with_discovery()?;
    init_metrics()?;

    let views = build_view_counter(&config.views)?;
    tracing::info!(
        "view counters enabled={} prefix={}",
        views.is_enabled(),
        views.prefix()
    );
    let content = ContentLibrary::new(config.content.posts_dir.clone());
    tracing::info!("serving posts from {}", content.posts_dir().display());

    let monitored = views.clone();
    let state = AppState::new(views, content);
    let bind = config.server.bind.clone();

    let mut supervisor = Supervisor::new();
    if let Some(every) = config.views.health_check_interval() {
        supervisor.spawn("store-monitor", move |shutdown| {
            monitor_store(monitored, every, shutdown)
        });
    }
    supervisor.spawn("api", move |shutdown| run_api(state, bind, shutdown));
    supervisor.run().await
}
