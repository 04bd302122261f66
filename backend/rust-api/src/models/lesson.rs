use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::bson_datetime_as_chrono;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSection {
    pub heading: String,
    pub body: String,
}

/// AI-generated study lesson, stored in MongoDB "lessons" collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub subject: String,
    pub subtopic: Option<String>,
    pub title: String,
    pub sections: Vec<LessonSection>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateLessonRequest {
    #[validate(length(min = 1, max = 100, message = "Subject is required"))]
    pub subject: String,

    pub subtopic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LessonResponse {
    pub lesson_id: String,
    pub subject: String,
    pub subtopic: Option<String>,
    pub title: String,
    pub sections: Vec<LessonSection>,
    pub created_at: DateTime<Utc>,
}

impl From<Lesson> for LessonResponse {
    fn from(lesson: Lesson) -> Self {
        LessonResponse {
            lesson_id: lesson.id.map(|id| id.to_hex()).unwrap_or_default(),
            subject: lesson.subject,
            subtopic: lesson.subtopic,
            title: lesson.title,
            sections: lesson.sections,
            created_at: lesson.created_at,
        }
    }
}
