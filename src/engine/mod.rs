mod helpers;
mod notification_api;
mod offer_api;
mod ride_api;

use std::sync::Arc;
use std::time::Duration;

use oso::Oso;

use crate::{
    api::API,
    auth::authorizor,
    db::Store,
    error::{forbidden_error, Error},
    external::Notifier,
};

#[derive(Clone, Copy, Debug)]
pub struct EngineOptions {
    /// Upper bound for everything a transaction does before its commit.
    pub transaction_timeout: Duration,
    /// Upper bound for a single notification send.
    pub notification_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            transaction_timeout: Duration::from_secs(10),
            notification_timeout: Duration::from_secs(3),
        }
    }
}

pub struct Engine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    authorizor: Oso,
    options: EngineOptions,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        options: EngineOptions,
    ) -> Result<Self, Error> {
        Ok(Self {
            store,
            notifier,
            authorizor: authorizor::new()?,
            options,
        })
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(forbidden_error())
    }
}

impl API for Engine {}
