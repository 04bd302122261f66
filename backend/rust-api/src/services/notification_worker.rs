use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    metrics::{NOTIFICATIONS_SENT_TOTAL, NOTIFICATION_WORKER_TICKS_TOTAL},
    models::notification::ScheduledTest,
    services::{email_service::EmailService, notification_service::NotificationService},
    utils::retry::retry_with_backoff,
};

pub struct NotificationWorker {
    notification_service: NotificationService,
    email_service: EmailService,
    interval: Duration,
}

impl NotificationWorker {
    pub fn new(
        notification_service: NotificationService,
        email_service: EmailService,
        interval_secs: u64,
    ) -> Self {
        Self {
            notification_service,
            email_service,
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting notification worker (interval={}s)",
            self.interval.as_secs()
        );

        loop {
            match self.process_due().await {
                Ok(_) => {
                    NOTIFICATION_WORKER_TICKS_TOTAL
                        .with_label_values(&["success"])
                        .inc();
                }
                Err(err) => {
                    NOTIFICATION_WORKER_TICKS_TOTAL
                        .with_label_values(&["error"])
                        .inc();
                    warn!(error = %err, "notification worker tick failed");
                }
            }

            sleep(self.interval).await;
        }
    }

    async fn process_due(&self) -> Result<()> {
        let due = self.notification_service.fetch_due(20).await?;
        if due.is_empty() {
            return Ok(());
        }

        info!("Processing {} due scheduled tests", due.len());

        for test in due {
            if let Err(err) = self.notify(&test).await {
                NOTIFICATIONS_SENT_TOTAL.with_label_values(&["error"]).inc();
                warn!(
                    error = %err,
                    schedule = %test.id.map(|id| id.to_hex()).unwrap_or_default(),
                    "failed to send test reminder"
                );
            }
        }

        Ok(())
    }

    async fn notify(&self, test: &ScheduledTest) -> Result<()> {
        if EmailService::sending_disabled() {
            info!("Email sending disabled, marking reminder as notified");
        } else {
            retry_with_backoff(3, Duration::from_millis(500), || {
                self.email_service.send_test_reminder(
                    &test.email,
                    &test.user_name,
                    &test.subject,
                    test.subtopic.as_deref(),
                )
            })
            .await?;
        }

        if let Some(id) = &test.id {
            self.notification_service.mark_notified(id).await?;
        }

        NOTIFICATIONS_SENT_TOTAL
            .with_label_values(&["success"])
            .inc();

        Ok(())
    }
}
