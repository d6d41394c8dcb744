mod acceptance;
mod location;
mod notification;
mod offer;
mod ride;

pub use acceptance::Acceptance;
pub use location::{Coordinates, Location};
pub use notification::{FanoutReport, Kind as NotificationKind, Notification};
pub use offer::{Offer, Status as OfferStatus};
pub use ride::{Ride, RideSnapshot, Status as RideStatus};
