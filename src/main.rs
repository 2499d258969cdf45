use anyhow::{Context, Result};
use axum::middleware::from_fn;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod auth;
mod components;
mod config;
mod controllers;
mod crypto;
mod errors;
mod extractors;
mod htmx;
mod middleware;
mod models;
mod navigation;
mod notifications;
mod routes;
mod session;
mod shell;
mod storage;
mod store;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bizdesk=info,tower_http=info")),
        )
        .init();

    let config = Arc::new(config::Config::from_env()?);

    let store = open_store(&config);

    let notifier = Arc::new(notifications::Notifier::new(
        config.toast_ttl,
        config::TOAST_SWEEP_INTERVAL,
    ));
    notifier.start();

    let shell = shell::Shell::new("");
    let mut view_changes = shell.subscribe();
    tokio::spawn(async move {
        while view_changes.changed().await.is_ok() {
            let view = *view_changes.borrow_and_update();
            tracing::debug!(%view, "active view changed");
        }
    });

    let state = models::AppState {
        store,
        shell: Arc::new(Mutex::new(shell)),
        notifier: Arc::clone(&notifier),
        config: Arc::clone(&config),
    };
    let app = routes::get_routes()
        .layer(from_fn(middleware::html_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        addr = %config.addr,
        storage = ?config.storage,
        data_dir = %config.data_dir.display(),
        "listening",
    );
    let result = axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await
        .context("server error");

    notifier.stop();
    result
}

fn open_store(config: &config::Config) -> Arc<dyn store::StoreAccessor> {
    let key = &config.storage_key;
    match config.storage {
        config::StorageKind::File => {
            let storage = storage::FileStorage::new(&config.data_dir);
            Arc::new(store::SharedStore::new(store::DocumentStore::open(
                storage, key,
            )))
        }
        config::StorageKind::Memory => {
            let storage = storage::MemoryStorage::new();
            Arc::new(store::SharedStore::new(store::DocumentStore::open(
                storage, key,
            )))
        }
    }
}
