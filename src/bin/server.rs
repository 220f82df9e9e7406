//! `emporium-server`: serve the API with the configured store
//!
//! ```sh
//! emporium-server [config.yaml]
//! ```
//!
//! Without a `database_url` (or without the `postgres` feature) the server
//! runs on an empty in-memory store.

use anyhow::Result;
use emporium::config::ServerConfig;
use emporium::server::ServerBuilder;
use emporium::storage::InMemoryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_yaml_file(&path)?,
        None => ServerConfig::default(),
    }
    .with_env_overrides()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .init();

    let builder = ServerBuilder::new().with_config(config.clone());
    let builder = match config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let store =
                emporium::storage::PostgresStore::connect(url, config.max_connections).await?;
            store.migrate().await?;
            tracing::info!("using postgres store");
            builder.with_store(store)
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            tracing::warn!("database_url is set but the postgres feature is disabled; using in-memory store");
            builder.with_store(InMemoryStore::new())
        }
        None => {
            tracing::info!("no database_url configured; using in-memory store");
            builder.with_store(InMemoryStore::new())
        }
    };

    builder.serve().await
}
