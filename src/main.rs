use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use build_relay::config::Config;
use build_relay::github::GitHubApp;
use build_relay::server::{build_router, AppState};
use build_relay::store::MemoryStore;
use build_relay::sync;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "build_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    let store = Arc::new(MemoryStore::new());
    store
        .seed(config.workflows.clone(), config.organizations.clone())
        .await;
    tracing::info!(
        workflows = config.workflows.len(),
        organizations = config.organizations.len(),
        "seeded store"
    );

    let app = GitHubApp::new(config.github.app.id, &config.github.app.private_key)?;

    tokio::spawn(sync::run_dispatcher(Arc::clone(&store), app.clone()));

    let state = AppState::new(
        store,
        app,
        config.github.app.webhook_secret.as_bytes().to_vec(),
        Some(config.github.app.id),
    );
    let router = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
