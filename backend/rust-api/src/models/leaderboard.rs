use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sort key for leaderboard queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Composite,
    Score,
    Questions,
    Time,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Composite => "composite",
            SortKey::Score => "score",
            SortKey::Questions => "questions",
            SortKey::Time => "time",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "composite" => Ok(SortKey::Composite),
            "score" => Ok(SortKey::Score),
            "questions" => Ok(SortKey::Questions),
            "time" => Ok(SortKey::Time),
            _ => Err(format!("Invalid sort key: {}", value)),
        }
    }
}

/// Query params for the leaderboard endpoint
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub subject: Option<String>,
    pub subtopic: Option<String>,
    pub sort_by: Option<String>,
}

/// One ranked row. Derived from a QuizAttempt on every query; never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub subject: String,
    pub subtopic: Option<String>,
    pub correct_count: u32,
    pub total_questions: u32,
    pub time_taken_seconds: u32,
    /// Accuracy percentage as recorded on the attempt (0-100)
    pub score_component: f64,
    /// Questions correct ratio, percent (0-100)
    pub questions_component: f64,
    /// Inverse time measure scaled to 0-100; faster is higher
    pub time_component: f64,
    pub composite_score: f64,
    /// 1-based dense rank per sorted position
    pub rank: u32,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub sort_by: SortKey,
    pub entries: Vec<LeaderboardEntry>,
}
