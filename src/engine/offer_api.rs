use super::helpers::reject_competing_offers;
use super::Engine;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time;
use uuid::Uuid;

use crate::{
    api::OfferAPI,
    auth::User,
    db::Transaction,
    entities::Acceptance,
    error::{not_found_error, timeout_error, Error},
};

#[async_trait]
impl OfferAPI for Engine {
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn accept_offer(&self, user: User, offer_id: Uuid) -> Result<Acceptance, Error> {
        // on timeout the staged transaction is dropped with the future and rolled back
        let (tx, acceptance) = time::timeout(
            self.options.transaction_timeout,
            self.stage_acceptance(&user, offer_id),
        )
        .await
        .map_err(|_| {
            tracing::error!("acceptance transaction timed out before commit");
            timeout_error("offer acceptance timed out")
        })??;

        tx.commit().await?;

        tracing::info!(
            ride_id = %acceptance.ride_id,
            driver_id = %acceptance.driver_id,
            rejected = acceptance.rejected_driver_ids.len(),
            "offer accepted"
        );

        Ok(acceptance)
    }
}

impl Engine {
    /// Runs every read and write of the acceptance inside one transaction and
    /// hands the still uncommitted transaction back on success.
    async fn stage_acceptance(
        &self,
        user: &User,
        offer_id: Uuid,
    ) -> Result<(Box<dyn Transaction>, Acceptance), Error> {
        let mut tx = self.store.begin().await?;

        let resolved = self
            .resolve_offer(tx.as_mut(), user, offer_id, Utc::now())
            .await;

        match resolved {
            Ok(acceptance) => Ok((tx, acceptance)),
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }

                if err.kind.is_internal() {
                    tracing::error!(error = %err, "offer acceptance failed");
                } else {
                    tracing::info!(reason = %err, "offer not accepted");
                }

                Err(err)
            }
        }
    }

    async fn resolve_offer(
        &self,
        tx: &mut dyn Transaction,
        user: &User,
        offer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Acceptance, Error> {
        tracing::debug!("fetching offer without lock");
        let offer = tx
            .fetch_offer(offer_id)
            .await?
            .ok_or_else(|| not_found_error("offer not found"))?;

        // the ride row is always locked before any offer row
        let mut ride = tx
            .fetch_ride_for_update(offer.ride_id)
            .await?
            .ok_or_else(|| not_found_error("ride not found"))?;

        self.authorize(user.clone(), "accept_offer", ride.clone())?;

        let mut offer = tx
            .fetch_offer_for_update(offer_id)
            .await?
            .ok_or_else(|| not_found_error("offer not found"))?;

        offer.accept(now)?;
        ride.assign_driver(&offer, now)?;

        let rejected_driver_ids = reject_competing_offers(tx, &offer, now).await?;

        tx.update_offer(&offer).await?;
        tx.update_ride(&ride).await?;

        Ok(Acceptance::new(&ride, &offer, rejected_driver_ids))
    }
}
