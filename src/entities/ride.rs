use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Location, Offer};
use crate::error::{conflict_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: Status,
    pub pickup: Location,
    pub dropoff: Location,
    pub service_type: String,
    pub fare: Option<f64>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Requested,
    OfferPending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::OfferPending => "offer_pending",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// The part of a ride echoed back to the passenger after an acceptance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RideSnapshot {
    pub pickup: Location,
    pub dropoff: Location,
    pub service_type: String,
    pub fare: Option<f64>,
}

impl Ride {
    pub fn new(passenger_id: Uuid, pickup: Location, dropoff: Location, service_type: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            passenger_id,
            driver_id: None,
            status: Status::Requested,
            pickup,
            dropoff,
            service_type,
            fare: None,
            accepted_at: None,
        }
    }

    pub fn is_awaiting_assignment(&self) -> bool {
        matches!(self.status, Status::Requested | Status::OfferPending) && self.driver_id.is_none()
    }

    #[tracing::instrument(skip(self, offer), fields(ride_id = %self.id, offer_id = %offer.id))]
    pub fn assign_driver(&mut self, offer: &Offer, now: DateTime<Utc>) -> Result<(), Error> {
        if offer.ride_id != self.id {
            return Err(conflict_error("offer does not belong to this ride"));
        }

        if !self.is_awaiting_assignment() {
            return Err(conflict_error(format!(
                "ride is {} and no longer awaiting assignment",
                self.status.name()
            )));
        }

        self.status = Status::Accepted;
        self.driver_id = Some(offer.driver_id);
        self.fare = offer.fare;
        self.accepted_at = Some(now);

        Ok(())
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn cancel(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Completed | Status::Cancelled => Err(conflict_error(format!(
                "ride is already {}",
                self.status.name()
            ))),
            _ => {
                self.status = Status::Cancelled;
                Ok(())
            }
        }
    }

    pub fn snapshot(&self) -> RideSnapshot {
        RideSnapshot {
            pickup: self.pickup.clone(),
            dropoff: self.dropoff.clone(),
            service_type: self.service_type.clone(),
            fare: self.fare,
        }
    }
}

// ids are exposed to the policy as strings so that Polar compares them by value
impl PolarClass for Ride {
    fn get_polar_class_builder() -> oso::ClassBuilder<Ride> {
        oso::Class::builder()
            .name("Ride")
            .add_attribute_getter("id", |recv: &Ride| recv.id.to_string())
            .add_attribute_getter("passenger_id", |recv: &Ride| recv.passenger_id.to_string())
            .add_attribute_getter("driver_id", |recv: &Ride| {
                recv.driver_id.map(|id| id.to_string()).unwrap_or_default()
            })
            .add_attribute_getter("status", |recv: &Ride| recv.status.name().to_string())
    }

    fn get_polar_class() -> oso::Class {
        let builder = Ride::get_polar_class_builder();
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Coordinates;
    use crate::error::ErrorKind;

    fn ride() -> Ride {
        let origin = Location::new(Coordinates { latitude: 0.0, longitude: 0.0 }, "".into());
        Ride::new(Uuid::new_v4(), origin.clone(), origin, "standard".into())
    }

    #[test]
    fn requested_ride_takes_the_offer_driver_and_fare() {
        let now = Utc::now();
        let mut ride = ride();
        let offer = Offer::new(ride.id, Uuid::new_v4(), Some(18.0));

        ride.assign_driver(&offer, now).unwrap();

        assert_eq!(ride.status, Status::Accepted);
        assert_eq!(ride.driver_id, Some(offer.driver_id));
        assert_eq!(ride.fare, Some(18.0));
        assert_eq!(ride.accepted_at, Some(now));
        assert!(!ride.is_awaiting_assignment());
    }

    #[test]
    fn assigned_ride_conflicts() {
        let now = Utc::now();
        let mut ride = ride();
        let first = Offer::new(ride.id, Uuid::new_v4(), None);
        let second = Offer::new(ride.id, Uuid::new_v4(), None);

        ride.assign_driver(&first, now).unwrap();

        let err = ride.assign_driver(&second, now).unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
        assert_eq!(ride.driver_id, Some(first.driver_id));
    }

    #[test]
    fn cancelled_ride_conflicts() {
        let mut ride = ride();
        ride.cancel().unwrap();

        let offer = Offer::new(ride.id, Uuid::new_v4(), None);
        let err = ride.assign_driver(&offer, Utc::now()).unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
        assert_eq!(ride.driver_id, None);
    }

    #[test]
    fn offer_for_another_ride_conflicts() {
        let mut ride = ride();
        let offer = Offer::new(Uuid::new_v4(), Uuid::new_v4(), None);

        assert!(ride.assign_driver(&offer, Utc::now()).is_err());
        assert!(ride.is_awaiting_assignment());
    }
}
