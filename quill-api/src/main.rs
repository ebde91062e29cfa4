use quill_api::{
    config::{Config, StoreKind},
    server::{self, ServerState},
};
use quill_common::snowflake::{NodeId, NodeIdOutOfRangeError};
use quill_db::{DbClient, DbError, MemoryStore, PostStore};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Invalid NODE_ID: {0}")]
    NodeId(#[from] NodeIdOutOfRangeError),
    #[error("Error opening the post store: {0}")]
    Store(#[from] DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "quill_api=debug,quill_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_config() -> Result<Config, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .env file found");
        } else {
            return Err(e.into());
        }
    }

    Ok(Config::from_env()?)
}

async fn open_store(config: &Config) -> Result<Arc<dyn PostStore>, InitError> {
    let node_id = NodeId::try_from(config.node_id)?;

    let store: Arc<dyn PostStore> = match config.store {
        StoreKind::Postgres => Arc::new(DbClient::connect(&config.database_url, node_id).await?),
        StoreKind::Memory => {
            warn!("Using in-memory post store, posts will not survive a restart");
            Arc::new(MemoryStore::new(node_id))
        }
    };
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "Could not listen for ctrl-c, shutting down");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let config = get_config()?;

    let store = open_store(&config).await?;

    let app = server::app(ServerState::new(Arc::clone(&store))).layer(TraceLayer::new_for_http());

    let server_address = SocketAddr::new(config.server_address, config.port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe);

    store.close().await;
    served
}
