use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::models::notification::{
    CreateScheduledTestRequest, ScheduleStatus, ScheduledTest, ScheduledTestResponse,
};
use crate::utils::time::chrono_to_bson;

pub struct NotificationService {
    mongo: Database,
}

impl NotificationService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn schedule_test(
        &self,
        user_id: &str,
        user_name: &str,
        req: CreateScheduledTestRequest,
    ) -> Result<ScheduledTestResponse> {
        if req.scheduled_for <= Utc::now() {
            return Err(anyhow!("Scheduled time must be in the future"));
        }

        let mut test = ScheduledTest {
            id: None,
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            email: req.email,
            subject: req.subject,
            subtopic: req.subtopic,
            scheduled_for: req.scheduled_for,
            status: ScheduleStatus::Pending,
            created_at: Utc::now(),
            notified_at: None,
        };

        let insert_result = self
            .collection()
            .insert_one(&test)
            .await
            .context("Failed to insert scheduled test")?;
        test.id = insert_result.inserted_id.as_object_id();

        tracing::info!(
            "Scheduled test created for user {} on {}",
            user_id,
            test.scheduled_for
        );

        Ok(ScheduledTestResponse::from(test))
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<ScheduledTestResponse>> {
        let cursor = self
            .collection()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "scheduledFor": 1 })
            .await
            .context("Failed to query scheduled tests")?;

        let tests: Vec<ScheduledTest> = cursor
            .try_collect()
            .await
            .context("Scheduled tests cursor failure")?;

        Ok(tests.into_iter().map(ScheduledTestResponse::from).collect())
    }

    pub async fn cancel(&self, user_id: &str, schedule_id: &str) -> Result<()> {
        let object_id = ObjectId::parse_str(schedule_id).context("Invalid schedule id")?;

        let result = self
            .collection()
            .update_one(
                doc! {
                    "_id": object_id,
                    "user_id": user_id,
                    "status": ScheduleStatus::Pending.as_str(),
                },
                doc! { "$set": { "status": ScheduleStatus::Cancelled.as_str() } },
            )
            .await
            .context("Failed to cancel scheduled test")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Scheduled test not found or already processed"));
        }

        Ok(())
    }

    /// Pending schedules whose time has arrived, oldest first. Used by
    /// the notification worker.
    pub async fn fetch_due(&self, limit: i64) -> Result<Vec<ScheduledTest>> {
        let now = chrono_to_bson(Utc::now());

        let cursor = self
            .collection()
            .find(doc! {
                "status": ScheduleStatus::Pending.as_str(),
                "scheduledFor": { "$lte": now },
            })
            .sort(doc! { "scheduledFor": 1 })
            .limit(limit)
            .await
            .context("Failed to query due scheduled tests")?;

        cursor
            .try_collect()
            .await
            .context("Due scheduled tests cursor failure")
    }

    pub async fn mark_notified(&self, schedule_id: &ObjectId) -> Result<()> {
        self.collection()
            .update_one(
                doc! { "_id": schedule_id },
                doc! { "$set": {
                    "status": ScheduleStatus::Notified.as_str(),
                    "notifiedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await
            .context("Failed to mark scheduled test as notified")?;

        Ok(())
    }

    fn collection(&self) -> mongodb::Collection<ScheduledTest> {
        self.mongo.collection::<ScheduledTest>("scheduled_tests")
    }
}
