use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Store, Transaction};
use crate::entities::{Offer, OfferStatus, Ride};
use crate::error::{database_error, Error};

#[derive(Clone, Debug, Default)]
struct Tables {
    rides: HashMap<Uuid, Ride>,
    offers: HashMap<Uuid, Offer>,
}

/// In-process store for tests.
///
/// A transaction holds the only lock on every table for its whole lifetime
/// and works on a staged copy, so transactions are fully serialized and an
/// uncommitted transaction leaves nothing behind.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_ride_updates: Arc<AtomicBool>,
    transactions_started: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_ride(&self, ride: Ride) {
        self.tables.lock().await.rides.insert(ride.id, ride);
    }

    pub async fn insert_offer(&self, offer: Offer) {
        self.tables.lock().await.offers.insert(offer.id, offer);
    }

    pub async fn offer(&self, id: Uuid) -> Option<Offer> {
        self.tables.lock().await.offers.get(&id).cloned()
    }

    pub async fn ride(&self, id: Uuid) -> Option<Ride> {
        self.tables.lock().await.rides.get(&id).cloned()
    }

    /// Makes every ride update fail as if the database had dropped the statement.
    pub fn fail_ride_updates(&self, fail: bool) {
        self.fail_ride_updates.store(fail, Ordering::SeqCst);
    }

    pub fn transactions_started(&self) -> usize {
        self.transactions_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, Error> {
        self.transactions_started.fetch_add(1, Ordering::SeqCst);

        let guard = self.tables.clone().lock_owned().await;
        let staged = (*guard).clone();

        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            fail_ride_updates: self.fail_ride_updates.load(Ordering::SeqCst),
        }))
    }

    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        Ok(self.ride(id).await)
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    fail_ride_updates: bool,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn fetch_offer(&mut self, id: Uuid) -> Result<Option<Offer>, Error> {
        Ok(self.staged.offers.get(&id).cloned())
    }

    async fn fetch_offer_for_update(&mut self, id: Uuid) -> Result<Option<Offer>, Error> {
        Ok(self.staged.offers.get(&id).cloned())
    }

    async fn fetch_ride_for_update(&mut self, id: Uuid) -> Result<Option<Ride>, Error> {
        Ok(self.staged.rides.get(&id).cloned())
    }

    async fn fetch_pending_offers_for_update(
        &mut self,
        ride_id: Uuid,
        except: Uuid,
    ) -> Result<Vec<Offer>, Error> {
        let mut offers: Vec<Offer> = self
            .staged
            .offers
            .values()
            .filter(|o| o.ride_id == ride_id && o.id != except && o.status == OfferStatus::Pending)
            .cloned()
            .collect();
        offers.sort_by_key(|o| o.id);

        Ok(offers)
    }

    async fn update_offer(&mut self, offer: &Offer) -> Result<(), Error> {
        match self.staged.offers.get_mut(&offer.id) {
            Some(existing) => {
                *existing = offer.clone();
                Ok(())
            }
            None => Err(database_error(format!("offer {} does not exist", offer.id))),
        }
    }

    async fn update_ride(&mut self, ride: &Ride) -> Result<(), Error> {
        if self.fail_ride_updates {
            return Err(database_error("injected ride update failure"));
        }

        match self.staged.rides.get_mut(&ride.id) {
            Some(existing) => {
                *existing = ride.clone();
                Ok(())
            }
            None => Err(database_error(format!("ride {} does not exist", ride.id))),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let MemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), Error> {
        Ok(())
    }
}
