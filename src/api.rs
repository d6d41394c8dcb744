use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Acceptance, FanoutReport, Ride};
use crate::error::Error;

#[async_trait]
pub trait OfferAPI {
    /// Assigns the offer's driver to its ride and rejects every competing
    /// pending offer, all in one transaction.
    async fn accept_offer(&self, user: User, offer_id: Uuid) -> Result<Acceptance, Error>;
}

#[async_trait]
pub trait RideAPI {
    async fn find_ride(&self, user: User, id: Uuid) -> Result<Ride, Error>;
}

#[async_trait]
pub trait NotificationAPI {
    /// Best effort: individual delivery failures are logged and counted, never returned.
    async fn announce_acceptance(&self, acceptance: &Acceptance) -> FanoutReport;
}

pub trait API: OfferAPI + RideAPI + NotificationAPI {}
