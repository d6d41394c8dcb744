use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Acceptance;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    DriverAssigned,
    OfferLost,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DriverAssigned => "driver_assigned",
            Self::OfferLost => "offer_lost",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: Kind,
    pub title: String,
    pub message: String,
    pub link: String,
    pub ride_id: Uuid,
    pub offer_id: Uuid,
}

impl Notification {
    pub fn driver_assigned(acceptance: &Acceptance) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id: acceptance.passenger_id,
            kind: Kind::DriverAssigned,
            title: "Driver assigned".into(),
            message: "Your driver has been assigned and is getting ready for pickup.".into(),
            link: format!("/rides/{}", acceptance.ride_id),
            ride_id: acceptance.ride_id,
            offer_id: acceptance.offer_id,
        }
    }

    pub fn offer_lost(acceptance: &Acceptance, driver_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id: driver_id,
            kind: Kind::OfferLost,
            title: "Offer not selected".into(),
            message: "The passenger chose another driver for this ride.".into(),
            link: "/driver/offers".into(),
            ride_id: acceptance.ride_id,
            offer_id: acceptance.offer_id,
        }
    }

    /// One notification for the passenger followed by one per rejected driver.
    pub fn for_acceptance(acceptance: &Acceptance) -> Vec<Self> {
        let mut notifications = Vec::with_capacity(acceptance.rejected_driver_ids.len() + 1);
        notifications.push(Self::driver_assigned(acceptance));

        for driver_id in acceptance.rejected_driver_ids.iter() {
            notifications.push(Self::offer_lost(acceptance, *driver_id));
        }

        notifications
    }
}

/// Delivery summary of one fan-out. It is informational only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutReport {
    pub delivered: usize,
    pub failed: usize,
}
