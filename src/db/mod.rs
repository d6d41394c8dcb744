//! Storage contract for the acceptance transaction.
//!
//! A [`Store`] hands out [`Transaction`]s. Everything read through a
//! transaction's `*_for_update` methods stays locked against other
//! transactions until the transaction is committed, rolled back or dropped,
//! and dropping an uncommitted transaction discards all of its writes.

#[cfg(any(test, feature = "test-support"))]
mod memory;
mod postgres;

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Offer, Ride};
use crate::error::Error;

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, Error>;

    /// Unlocked read used outside of any transaction.
    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error>;
}

#[async_trait]
pub trait Transaction: Send {
    /// Reads an offer without locking it.
    async fn fetch_offer(&mut self, id: Uuid) -> Result<Option<Offer>, Error>;

    async fn fetch_offer_for_update(&mut self, id: Uuid) -> Result<Option<Offer>, Error>;

    async fn fetch_ride_for_update(&mut self, id: Uuid) -> Result<Option<Ride>, Error>;

    /// Locks every pending offer on the ride except `except`.
    async fn fetch_pending_offers_for_update(
        &mut self,
        ride_id: Uuid,
        except: Uuid,
    ) -> Result<Vec<Offer>, Error>;

    async fn update_offer(&mut self, offer: &Offer) -> Result<(), Error>;

    async fn update_ride(&mut self, ride: &Ride) -> Result<(), Error>;

    async fn commit(self: Box<Self>) -> Result<(), Error>;

    async fn rollback(self: Box<Self>) -> Result<(), Error>;
}
