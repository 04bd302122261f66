use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::bson_datetime_as_chrono;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// One multiple-choice question as produced by the generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: u32,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Generated quiz held in Redis (with TTL) while the child is taking it.
/// Never mutated after generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub subtopic: Option<String>,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Question view returned to the client: no correct answer, no explanation
#[derive(Debug, Serialize)]
pub struct QuizQuestionPublic {
    pub prompt: String,
    pub options: Vec<String>,
}

impl From<&QuizQuestion> for QuizQuestionPublic {
    fn from(question: &QuizQuestion) -> Self {
        QuizQuestionPublic {
            prompt: question.prompt.clone(),
            options: question.options.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, max = 100, message = "Subject is required"))]
    pub subject: String,

    pub subtopic: Option<String>,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[validate(range(min = 1, max = 20, message = "Question count must be 1-20"))]
    pub question_count: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub quiz_id: String,
    pub subject: String,
    pub subtopic: Option<String>,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestionPublic>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    /// Selected option index per question, in question order
    pub answers: Vec<u32>,

    #[validate(range(min = 1, message = "Time taken must be positive"))]
    pub time_taken_seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct QuestionResult {
    pub prompt: String,
    pub selected_index: u32,
    pub correct_index: u32,
    pub correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub attempt_id: String,
    pub correct_count: u32,
    pub total_questions: u32,
    pub score_percentage: f64,
    pub results: Vec<QuestionResult>,
}

/// One completed quiz submission, stored in MongoDB "quiz_attempts".
/// Created on submission and read-only thereafter; leaderboard and history
/// views aggregate these records without mutating them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub user_name: String,
    pub subject: String,
    pub subtopic: Option<String>,
    pub correct_count: u32,
    pub total_questions: u32,
    pub time_taken_seconds: u32,
    pub score_percentage: f64,
    #[serde(rename = "submittedAt", with = "bson_datetime_as_chrono")]
    pub submitted_at: DateTime<Utc>,
}

/// Query params for history listing
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub subject: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// History row returned to the client
#[derive(Debug, Serialize)]
pub struct QuizAttemptView {
    pub id: String,
    pub subject: String,
    pub subtopic: Option<String>,
    pub correct_count: u32,
    pub total_questions: u32,
    pub time_taken_seconds: u32,
    pub score_percentage: f64,
    pub submitted_at: DateTime<Utc>,
}

impl From<QuizAttempt> for QuizAttemptView {
    fn from(attempt: QuizAttempt) -> Self {
        QuizAttemptView {
            id: attempt.id.map(|id| id.to_hex()).unwrap_or_default(),
            subject: attempt.subject,
            subtopic: attempt.subtopic,
            correct_count: attempt.correct_count,
            total_questions: attempt.total_questions,
            time_taken_seconds: attempt.time_taken_seconds,
            score_percentage: attempt.score_percentage,
            submitted_at: attempt.submitted_at,
        }
    }
}
