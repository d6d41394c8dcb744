use oso::{Oso, PolarClass};

use crate::auth::User;
use crate::entities::Ride;
use crate::error::Error;

pub fn new() -> Result<Oso, Error> {
    let mut o = Oso::new();

    o.register_class(User::get_polar_class())?;
    o.register_class(Ride::get_polar_class())?;

    o.load_str(include_str!("rules.polar"))?;

    Ok(o)
}

#[cfg(test)]
fn ride_for(passenger_id: uuid::Uuid) -> Ride {
    use crate::entities::{Coordinates, Location};

    let origin = Location::new(Coordinates { latitude: 0.0, longitude: 0.0 }, "".into());
    Ride::new(passenger_id, origin.clone(), origin, "standard".into())
}

#[test]
fn passenger_accept_offer_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let passenger = User::new(Uuid::new_v4());
    let stranger = User::new(Uuid::new_v4());
    let ride = ride_for(passenger.id);

    let result = authorizor.is_allowed(passenger.clone(), "accept_offer", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(stranger.clone(), "accept_offer", ride.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(stranger.clone(), "read", ride.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn assigned_driver_read_test() {
    use crate::entities::Offer;
    use chrono::Utc;
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let driver = User::new(Uuid::new_v4());
    let mut ride = ride_for(Uuid::new_v4());

    // before assignment

    let result = authorizor.is_allowed(driver.clone(), "read", ride.clone());
    assert_eq!(result.unwrap(), false);

    let offer = Offer::new(ride.id, driver.id, None);
    ride.assign_driver(&offer, Utc::now()).unwrap();

    // after assignment

    let result = authorizor.is_allowed(driver.clone(), "read", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "accept_offer", ride.clone());
    assert_eq!(result.unwrap(), false);
}
