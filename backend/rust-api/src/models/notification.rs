use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::{bson_datetime_as_chrono, bson_datetime_as_chrono_option};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,
    Notified,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Notified => "notified",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }
}

/// Planned test with an email reminder, stored in "scheduled_tests".
/// The notification worker scans for pending entries whose time has come.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub user_name: String,
    /// Address the reminder is sent to (usually a parent's)
    pub email: String,
    pub subject: String,
    pub subtopic: Option<String>,
    #[serde(rename = "scheduledFor", with = "bson_datetime_as_chrono")]
    pub scheduled_for: DateTime<Utc>,
    pub status: ScheduleStatus,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(
        rename = "notifiedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub notified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduledTestRequest {
    #[validate(length(min = 1, max = 100, message = "Subject is required"))]
    pub subject: String,

    pub subtopic: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub scheduled_for: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ScheduledTestResponse {
    pub id: String,
    pub subject: String,
    pub subtopic: Option<String>,
    pub email: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: ScheduleStatus,
}

impl From<ScheduledTest> for ScheduledTestResponse {
    fn from(test: ScheduledTest) -> Self {
        ScheduledTestResponse {
            id: test.id.map(|id| id.to_hex()).unwrap_or_default(),
            subject: test.subject,
            subtopic: test.subtopic,
            email: test.email,
            scheduled_for: test.scheduled_for,
            status: test.status,
        }
    }
}
