use chrono::{DateTime, Utc};

/// Everything the certificate renderer needs. Derived from a qualifying
/// QuizAttempt; certificates are rendered on demand, never persisted.
#[derive(Debug, Clone)]
pub struct CertificateData {
    pub student_name: String,
    pub subject: String,
    pub subtopic: Option<String>,
    pub score_percentage: f64,
    pub correct_count: u32,
    pub total_questions: u32,
    pub awarded_on: DateTime<Utc>,
}
