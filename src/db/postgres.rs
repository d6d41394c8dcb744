use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    types::Json,
    Executor, Pool, Postgres, Row,
};
use uuid::Uuid;

use super::{Store, Transaction};
use crate::entities::{Offer, Ride};
use crate::error::Error;

type Database = Postgres;

pub struct PgStore {
    pool: Pool<Database>,
    lock_timeout: Duration,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::new", skip(db_uri))]
    pub async fn new(
        db_uri: &str,
        max_connections: u32,
        lock_timeout: Duration,
    ) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        // TODO: move this to migrations
        pool.execute("CREATE TABLE IF NOT EXISTS rides (id UUID PRIMARY KEY, passenger_id UUID NOT NULL, driver_id UUID, status VARCHAR NOT NULL, data JSONB NOT NULL)")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS offers (id UUID PRIMARY KEY, ride_id UUID NOT NULL, driver_id UUID NOT NULL, status VARCHAR NOT NULL, data JSONB NOT NULL, CONSTRAINT fk_offer_ride FOREIGN KEY(ride_id) REFERENCES rides(id))")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS offers_ride_id_status ON offers (ride_id, status)")
            .await?;
        // storage-level backstop for the one-winner invariant
        pool.execute("CREATE UNIQUE INDEX IF NOT EXISTS offers_one_accepted_per_ride ON offers (ride_id) WHERE status = 'accepted'")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS notifications (id UUID PRIMARY KEY, recipient_id UUID NOT NULL, kind VARCHAR NOT NULL, data JSONB NOT NULL, created_at TIMESTAMPTZ NOT NULL DEFAULT now())")
            .await?;

        Ok(Self { pool, lock_timeout })
    }

    pub fn pool(&self) -> &Pool<Database> {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(skip(self))]
    async fn begin(&self) -> Result<Box<dyn Transaction>, Error> {
        let mut tx = self.pool.begin().await?;

        // a lock wait longer than this aborts the statement and, with it, the transaction
        let statement = format!("SET LOCAL lock_timeout = {}", self.lock_timeout.as_millis());
        tx.execute(statement.as_str()).await?;

        Ok(Box::new(PgTransaction { tx }))
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        self.pool
            .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1").bind(&id))
            .await?
            .map(decode)
            .transpose()
    }
}

struct PgTransaction {
    tx: sqlx::Transaction<'static, Database>,
}

fn decode<T: DeserializeOwned>(row: PgRow) -> Result<T, Error> {
    let Json(data): Json<T> = row.try_get("data")?;

    Ok(data)
}

#[async_trait]
impl Transaction for PgTransaction {
    #[tracing::instrument(skip(self))]
    async fn fetch_offer(&mut self, id: Uuid) -> Result<Option<Offer>, Error> {
        self.tx
            .fetch_optional(sqlx::query("SELECT data FROM offers WHERE id = $1").bind(&id))
            .await?
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_offer_for_update(&mut self, id: Uuid) -> Result<Option<Offer>, Error> {
        self.tx
            .fetch_optional(
                sqlx::query("SELECT data FROM offers WHERE id = $1 FOR UPDATE").bind(&id),
            )
            .await?
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_ride_for_update(&mut self, id: Uuid) -> Result<Option<Ride>, Error> {
        self.tx
            .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1 FOR UPDATE").bind(&id))
            .await?
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_pending_offers_for_update(
        &mut self,
        ride_id: Uuid,
        except: Uuid,
    ) -> Result<Vec<Offer>, Error> {
        let query = "
            SELECT
                data
            FROM
                offers
            WHERE
                ride_id = $1
                AND status = 'pending'
                AND id <> $2
            ORDER BY
                id ASC
            FOR UPDATE
        ";

        self.tx
            .fetch_all(sqlx::query(query).bind(&ride_id).bind(&except))
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    #[tracing::instrument(skip(self, offer), fields(offer_id = %offer.id))]
    async fn update_offer(&mut self, offer: &Offer) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query("UPDATE offers SET status = $2, data = $3 WHERE id = $1")
                    .bind(&offer.id)
                    .bind(offer.status.name())
                    .bind(Json(offer)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, ride), fields(ride_id = %ride.id))]
    async fn update_ride(&mut self, ride: &Ride) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query("UPDATE rides SET status = $2, driver_id = $3, data = $4 WHERE id = $1")
                    .bind(&ride.id)
                    .bind(ride.status.name())
                    .bind(&ride.driver_id)
                    .bind(Json(ride)),
            )
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let PgTransaction { tx } = *self;
        tx.commit().await?;

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), Error> {
        let PgTransaction { tx } = *self;
        tx.rollback().await?;

        Ok(())
    }
}
