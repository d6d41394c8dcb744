use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::RideAPI,
    auth::User,
    entities::Ride,
    error::{not_found_error, Error},
};

#[async_trait]
impl RideAPI for Engine {
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn find_ride(&self, user: User, id: Uuid) -> Result<Ride, Error> {
        let ride = self
            .store
            .find_ride(id)
            .await?
            .ok_or_else(|| not_found_error("ride not found"))?;

        self.authorize(user, "read", ride.clone())?;

        Ok(ride)
    }
}
