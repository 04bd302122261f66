use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::bson_datetime_as_chrono;

/// Topic managed through the admin portal, stored in "topics"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Archived topics stay in place for history views but are hidden
    /// from quiz generation
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtopic {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "topicId")]
    pub topic_id: ObjectId,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTopicRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTopicRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubtopicRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SubtopicSummary {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

impl From<Subtopic> for SubtopicSummary {
    fn from(subtopic: Subtopic) -> Self {
        SubtopicSummary {
            id: subtopic.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: subtopic.name,
            is_active: subtopic.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TopicSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub subtopics: Vec<SubtopicSummary>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
