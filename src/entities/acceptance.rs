use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Offer, Ride};

/// Outcome of a successful acceptance, consumed by the fan-out and the response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acceptance {
    pub ride_id: Uuid,
    pub offer_id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Uuid,
    pub rejected_driver_ids: Vec<Uuid>,
}

impl Acceptance {
    /// A driver may hold several pending offers on one ride, so the rejected ids
    /// are de-duplicated and the winning driver is left out.
    pub fn new(ride: &Ride, offer: &Offer, rejected_driver_ids: Vec<Uuid>) -> Self {
        let mut unique = Vec::with_capacity(rejected_driver_ids.len());

        for driver_id in rejected_driver_ids {
            if driver_id != offer.driver_id && !unique.contains(&driver_id) {
                unique.push(driver_id);
            }
        }

        Self {
            ride_id: ride.id,
            offer_id: offer.id,
            passenger_id: ride.passenger_id,
            driver_id: offer.driver_id,
            rejected_driver_ids: unique,
        }
    }
}
