use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{db::Transaction, entities::Offer, error::Error};

/// Rejects every other pending offer on the accepted offer's ride and returns
/// the drivers behind them, in lock order.
#[tracing::instrument(skip(tx, accepted), fields(ride_id = %accepted.ride_id))]
pub async fn reject_competing_offers(
    tx: &mut dyn Transaction,
    accepted: &Offer,
    now: DateTime<Utc>,
) -> Result<Vec<Uuid>, Error> {
    let competing = tx
        .fetch_pending_offers_for_update(accepted.ride_id, accepted.id)
        .await?;

    let mut driver_ids = Vec::with_capacity(competing.len());

    for mut offer in competing {
        offer.reject(now)?;
        tx.update_offer(&offer).await?;

        driver_ids.push(offer.driver_id);
    }

    tracing::debug!(count = driver_ids.len(), "rejected competing offers");

    Ok(driver_ids)
}
