use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{already_resolved_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub status: Status,
    pub fare: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl Offer {
    pub fn new(ride_id: Uuid, driver_id: Uuid, fare: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ride_id,
            driver_id,
            status: Status::Pending,
            fare,
            created_at: Utc::now(),
            expires_at: None,
            resolved_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// Terminal offers never change again; a second resolution is reported as
    /// `AlreadyResolved`, which is also what the loser of an acceptance race sees.
    #[tracing::instrument(skip(self), fields(offer_id = %self.id))]
    pub fn accept(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if !self.is_pending() {
            return Err(already_resolved_error(format!(
                "offer is already {}",
                self.status.name()
            )));
        }

        if self.is_expired_at(now) {
            return Err(already_resolved_error("offer has expired"));
        }

        self.resolve(Status::Accepted, now);
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(offer_id = %self.id))]
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.resolve(Status::Rejected, now);
                Ok(())
            }
            _ => Err(already_resolved_error(format!(
                "offer is already {}",
                self.status.name()
            ))),
        }
    }

    fn resolve(&mut self, status: Status, now: DateTime<Utc>) {
        self.status = status;
        self.resolved_at = Some(now);
    }
}
