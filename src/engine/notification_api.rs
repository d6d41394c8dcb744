use super::Engine;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::time;

use crate::{
    api::NotificationAPI,
    entities::{Acceptance, FanoutReport, Notification},
    error::notification_failure_error,
};

#[async_trait]
impl NotificationAPI for Engine {
    #[tracing::instrument(skip_all, fields(ride_id = %acceptance.ride_id))]
    async fn announce_acceptance(&self, acceptance: &Acceptance) -> FanoutReport {
        let notifications = Notification::for_acceptance(acceptance);

        let outcomes = join_all(notifications.iter().map(|n| self.deliver(n))).await;

        let delivered = outcomes.iter().filter(|delivered| **delivered).count();
        let report = FanoutReport {
            delivered,
            failed: outcomes.len() - delivered,
        };

        tracing::info!(
            delivered = report.delivered,
            failed = report.failed,
            "acceptance announced"
        );

        report
    }
}

impl Engine {
    async fn deliver(&self, notification: &Notification) -> bool {
        let sent = time::timeout(
            self.options.notification_timeout,
            self.notifier.notify(notification),
        )
        .await;

        let err = match sent {
            Ok(Ok(())) => return true,
            Ok(Err(err)) => notification_failure_error(err),
            Err(_) => notification_failure_error("timed out"),
        };

        tracing::warn!(
            recipient_id = %notification.recipient_id,
            kind = notification.kind.name(),
            error = %err,
            "notification not delivered"
        );

        false
    }
}
