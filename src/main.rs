use std::sync::Arc;

use caballus::config::Config;
use caballus::db::PgStore;
use caballus::engine::{Engine, EngineOptions};
use caballus::error::Error;
use caballus::external::{HttpIdentityProvider, PgNotifier};
use caballus::server::{serve, GateOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let store = PgStore::new(
        &config.database_url,
        config.database_max_connections,
        config.lock_timeout,
    )
    .await?;
    let notifier = PgNotifier::new(store.pool().clone());

    let engine = Engine::new(
        Arc::new(store),
        Arc::new(notifier),
        EngineOptions {
            transaction_timeout: config.transaction_timeout,
            notification_timeout: config.notification_timeout,
        },
    )?;

    let identity = HttpIdentityProvider::new(
        config.identity_api_base.clone(),
        config.identity_api_key.clone(),
    );

    let options = GateOptions {
        identity_timeout: config.identity_timeout,
    };

    serve(engine, identity, options, config.listen_addr).await
}
