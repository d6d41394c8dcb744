//! In-process collaborators and fixtures for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    auth::User,
    db::MemoryStore,
    engine::{Engine, EngineOptions},
    entities::{Coordinates, Location, Notification, Offer, Ride},
    error::{unauthorized_error, upstream_error, Error},
    external::{IdentityProvider, Notifier},
};

/// Accepts exactly the tokens it was given.
#[derive(Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, User>,
    delay: Option<Duration>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, user: User) -> Self {
        self.users.insert(token.into(), user);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, token: &str) -> Result<User, Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.users.get(token).cloned().ok_or_else(unauthorized_error)
    }
}

/// Records every notification it accepts; selected recipients fail or stall.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: HashSet<Uuid>,
    stalled: HashSet<Uuid>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, recipient_id: Uuid) -> Self {
        self.failing.insert(recipient_id);
        self
    }

    pub fn stalling_for(mut self, recipient_id: Uuid) -> Self {
        self.stalled.insert(recipient_id);
        self
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), Error> {
        if self.failing.contains(&notification.recipient_id) {
            return Err(upstream_error());
        }

        if self.stalled.contains(&notification.recipient_id) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        self.sent.lock().await.push(notification.clone());

        Ok(())
    }
}

pub fn location(description: &str) -> Location {
    Location::new(
        Coordinates {
            latitude: 24.7136,
            longitude: 46.6753,
        },
        description.into(),
    )
}

/// Stores a requested ride for `passenger_id` with one pending offer per driver.
pub async fn seed_ride(
    store: &MemoryStore,
    passenger_id: Uuid,
    driver_ids: &[Uuid],
) -> (Ride, Vec<Offer>) {
    let ride = Ride::new(
        passenger_id,
        location("King Fahd Rd"),
        location("Olaya St"),
        "standard".into(),
    );
    store.insert_ride(ride.clone()).await;

    let mut offers = Vec::with_capacity(driver_ids.len());
    for (i, driver_id) in driver_ids.iter().enumerate() {
        let offer = Offer::new(ride.id, *driver_id, Some(20.0 + i as f64));
        store.insert_offer(offer.clone()).await;
        offers.push(offer);
    }

    (ride, offers)
}

pub fn engine(store: &MemoryStore, notifier: Arc<dyn Notifier>) -> Engine {
    engine_with_options(store, notifier, EngineOptions::default())
}

pub fn engine_with_options(
    store: &MemoryStore,
    notifier: Arc<dyn Notifier>,
    options: EngineOptions,
) -> Engine {
    Engine::new(Arc::new(store.clone()), notifier, options)
        .expect("authorization policy should load")
}
