use async_trait::async_trait;
use sqlx::{types::Json, Executor, Pool, Postgres};

use crate::{entities::Notification, error::Error};

/// Hands a notification over to the delivery subsystem.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), Error>;
}

/// Enqueues notifications in the `notifications` outbox table; push delivery
/// workers pick them up from there.
pub struct PgNotifier {
    pool: Pool<Postgres>,
}

impl PgNotifier {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    #[tracing::instrument(
        skip(self, notification),
        fields(recipient_id = %notification.recipient_id, kind = notification.kind.name())
    )]
    async fn notify(&self, notification: &Notification) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query(
                    "INSERT INTO notifications (id, recipient_id, kind, data) VALUES ($1, $2, $3, $4)",
                )
                .bind(&notification.id)
                .bind(&notification.recipient_id)
                .bind(notification.kind.name())
                .bind(Json(notification)),
            )
            .await?;

        Ok(())
    }
}
