pub mod cors;
pub mod gate;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    routing::{any, get},
    Router,
};

use crate::server::handlers::{health, offers};
use crate::{
    api::API,
    error::{unexpected_error, Error},
    external::IdentityProvider,
};

pub type DynAPI = Arc<dyn API + Send + Sync>;
pub type DynIdentityProvider = Arc<dyn IdentityProvider>;

#[derive(Clone, Copy, Debug)]
pub struct GateOptions {
    pub identity_timeout: Duration,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            identity_timeout: Duration::from_secs(5),
        }
    }
}

pub fn router<T, I>(api: T, identity: I, options: GateOptions) -> Router
where
    T: API + Sync + Send + 'static,
    I: IdentityProvider + 'static,
{
    let api = Arc::new(api) as DynAPI;
    let identity = Arc::new(identity) as DynIdentityProvider;

    Router::new()
        .route("/accept-offer", any(offers::accept))
        .route("/offers/accept", any(offers::accept))
        .route("/health", get(health::check))
        .layer(Extension(api))
        .layer(Extension(identity))
        .layer(Extension(options))
}

pub async fn serve<T, I>(
    api: T,
    identity: I,
    options: GateOptions,
    addr: SocketAddr,
) -> Result<(), Error>
where
    T: API + Sync + Send + 'static,
    I: IdentityProvider + 'static,
{
    let app = router(api, identity, options);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "server error");
            unexpected_error()
        })
}
