use anyhow::{Context, Result};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;
use std::cmp::Ordering;

use crate::models::leaderboard::{LeaderboardEntry, SortKey};
use crate::models::quiz::QuizAttempt;

// Composite weights: accuracy carries 60%, correctness ratio and speed
// 20% each.
const WEIGHT_SCORE: f64 = 0.6;
const WEIGHT_QUESTIONS: f64 = 0.2;
const WEIGHT_TIME: f64 = 0.2;

/// Ranks quiz attempts into a leaderboard. Pure: the input is not
/// mutated and the output is fully determined by the arguments.
///
/// Attempts with `total_questions == 0` cannot be scored and are skipped
/// with a diagnostic; the query still succeeds with the rest. Ties on the
/// sort key are broken by earliest submission, ranks are 1-based and
/// dense per sorted position.
pub fn rank_attempts(
    attempts: &[QuizAttempt],
    subject: Option<&str>,
    subtopic: Option<&str>,
    sort_by: SortKey,
    reference_time_seconds: f64,
) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = attempts
        .iter()
        .filter(|attempt| {
            subject.is_none_or(|s| attempt.subject.eq_ignore_ascii_case(s))
                && subtopic.is_none_or(|s| {
                    attempt
                        .subtopic
                        .as_deref()
                        .is_some_and(|st| st.eq_ignore_ascii_case(s))
                })
        })
        .filter_map(|attempt| score_attempt(attempt, reference_time_seconds))
        .collect();

    entries.sort_by(|a, b| {
        let key_a = sort_value(a, sort_by);
        let key_b = sort_value(b, sort_by);
        key_b
            .partial_cmp(&key_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
    });

    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = position as u32 + 1;
    }

    entries
}

fn score_attempt(attempt: &QuizAttempt, reference_time_seconds: f64) -> Option<LeaderboardEntry> {
    if attempt.total_questions == 0 {
        tracing::warn!(
            user_id = %attempt.user_id,
            subject = %attempt.subject,
            "Skipping attempt with zero total questions"
        );
        return None;
    }

    let score_component = attempt.score_percentage;
    let questions_component =
        100.0 * f64::from(attempt.correct_count) / f64::from(attempt.total_questions);
    let time_component = time_component(attempt.time_taken_seconds, reference_time_seconds);
    let composite_score = WEIGHT_SCORE * score_component
        + WEIGHT_QUESTIONS * questions_component
        + WEIGHT_TIME * time_component;

    Some(LeaderboardEntry {
        user_id: attempt.user_id.clone(),
        name: attempt.user_name.clone(),
        subject: attempt.subject.clone(),
        subtopic: attempt.subtopic.clone(),
        correct_count: attempt.correct_count,
        total_questions: attempt.total_questions,
        time_taken_seconds: attempt.time_taken_seconds,
        score_component,
        questions_component,
        time_component,
        composite_score,
        rank: 0, // assigned after sorting
        submitted_at: attempt.submitted_at,
    })
}

/// Inverse time measure on a 0-100 scale: zero time scores 100, anything
/// at or past the reference scores 0.
fn time_component(time_taken_seconds: u32, reference_time_seconds: f64) -> f64 {
    if reference_time_seconds <= 0.0 {
        return 0.0;
    }
    100.0 * (1.0 - f64::from(time_taken_seconds) / reference_time_seconds).max(0.0)
}

fn sort_value(entry: &LeaderboardEntry, sort_by: SortKey) -> f64 {
    match sort_by {
        SortKey::Composite => entry.composite_score,
        SortKey::Score => entry.score_component,
        SortKey::Questions => entry.questions_component,
        SortKey::Time => entry.time_component,
    }
}

pub struct LeaderboardService {
    mongo: Database,
    reference_time_seconds: f64,
}

impl LeaderboardService {
    pub fn new(mongo: Database, reference_time_seconds: f64) -> Self {
        Self {
            mongo,
            reference_time_seconds,
        }
    }

    /// Loads all attempts and ranks them. Filtering happens in the pure
    /// scorer so the Mongo query and the ranking logic cannot disagree on
    /// matching rules.
    pub async fn leaderboard(
        &self,
        subject: Option<&str>,
        subtopic: Option<&str>,
        sort_by: SortKey,
    ) -> Result<Vec<LeaderboardEntry>> {
        let attempts = self.load_attempts().await?;
        Ok(rank_attempts(
            &attempts,
            subject,
            subtopic,
            sort_by,
            self.reference_time_seconds,
        ))
    }

    async fn load_attempts(&self) -> Result<Vec<QuizAttempt>> {
        let collection = self.mongo.collection::<QuizAttempt>("quiz_attempts");
        let cursor = collection
            .find(doc! {})
            .await
            .context("Failed to query quiz attempts")?;

        cursor
            .try_collect()
            .await
            .context("Quiz attempts cursor failure")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn attempt(
        user: &str,
        subject: &str,
        correct: u32,
        total: u32,
        time_secs: u32,
        score: f64,
        submitted_minute: u32,
    ) -> QuizAttempt {
        QuizAttempt {
            id: None,
            user_id: user.to_string(),
            user_name: user.to_uppercase(),
            subject: subject.to_string(),
            subtopic: Some("fractions".to_string()),
            correct_count: correct,
            total_questions: total,
            time_taken_seconds: time_secs,
            score_percentage: score,
            submitted_at: Utc
                .with_ymd_and_hms(2025, 3, 1, 10, submitted_minute, 0)
                .unwrap(),
        }
    }

    #[test]
    fn empty_input_yields_empty_leaderboard() {
        let entries = rank_attempts(&[], None, None, SortKey::Composite, 600.0);
        assert!(entries.is_empty());
    }

    #[test]
    fn composite_score_uses_fixed_weights() {
        let attempts = vec![attempt("a", "math", 8, 10, 60, 80.0, 0)];
        let entries = rank_attempts(&attempts, None, None, SortKey::Composite, 600.0);

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.score_component, 80.0);
        assert_eq!(entry.questions_component, 80.0);
        assert_eq!(entry.time_component, 90.0); // 100 * (1 - 60/600)
        assert_eq!(entry.composite_score, 0.6 * 80.0 + 0.2 * 80.0 + 0.2 * 90.0);
        assert_eq!(entry.rank, 1);
    }

    #[test]
    fn time_component_clamps_at_reference_time() {
        let attempts = vec![attempt("slow", "math", 5, 10, 1200, 50.0, 0)];
        let entries = rank_attempts(&attempts, None, None, SortKey::Composite, 600.0);
        assert_eq!(entries[0].time_component, 0.0);
    }

    #[test]
    fn zero_total_questions_is_excluded_not_fatal() {
        let attempts = vec![
            attempt("ok", "math", 8, 10, 60, 80.0, 0),
            attempt("broken", "math", 0, 0, 60, 0.0, 1),
        ];
        let entries = rank_attempts(&attempts, None, None, SortKey::Composite, 600.0);

        assert_eq!(entries.len(), 1);
        assert!(entries.iter().all(|e| e.user_id != "broken"));
        assert!(entries.iter().all(|e| e.total_questions > 0));
    }

    #[test]
    fn sort_by_score_matches_reference_scenario() {
        // Two attempts: 80% in 60s vs 90% in 90s. Sorting by score must
        // put the 90% attempt first regardless of its slower time.
        let attempts = vec![
            attempt("first", "math", 8, 10, 60, 80.0, 0),
            attempt("second", "math", 9, 10, 90, 90.0, 1),
        ];
        let entries = rank_attempts(&attempts, None, None, SortKey::Score, 600.0);

        assert_eq!(entries[0].user_id, "second");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].user_id, "first");
        assert_eq!(entries[1].rank, 2);
    }

    #[test]
    fn sort_by_time_prefers_faster_attempts() {
        let attempts = vec![
            attempt("slow", "math", 9, 10, 300, 90.0, 0),
            attempt("fast", "math", 7, 10, 30, 70.0, 1),
        ];
        let entries = rank_attempts(&attempts, None, None, SortKey::Time, 600.0);
        assert_eq!(entries[0].user_id, "fast");
    }

    #[test]
    fn ties_break_by_earliest_submission() {
        let attempts = vec![
            attempt("later", "math", 8, 10, 60, 80.0, 30),
            attempt("earlier", "math", 8, 10, 60, 80.0, 5),
        ];
        let entries = rank_attempts(&attempts, None, None, SortKey::Composite, 600.0);

        assert_eq!(entries[0].user_id, "earlier");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].user_id, "later");
        assert_eq!(entries[1].rank, 2);
    }

    #[test]
    fn ranks_are_dense_and_one_based() {
        let attempts: Vec<QuizAttempt> = (0u32..5)
            .map(|i| {
                attempt(
                    &format!("u{}", i),
                    "math",
                    i + 3,
                    10,
                    60 + i * 10,
                    50.0 + f64::from(i),
                    i,
                )
            })
            .collect();
        let entries = rank_attempts(&attempts, None, None, SortKey::Composite, 600.0);

        let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn subject_filter_is_case_insensitive() {
        let attempts = vec![
            attempt("math-kid", "Math", 8, 10, 60, 80.0, 0),
            attempt("science-kid", "Science", 9, 10, 60, 90.0, 1),
        ];
        let entries = rank_attempts(&attempts, Some("math"), None, SortKey::Composite, 600.0);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, "math-kid");
    }

    #[test]
    fn subtopic_filter_excludes_non_matching() {
        let mut other = attempt("other", "math", 8, 10, 60, 80.0, 0);
        other.subtopic = Some("decimals".to_string());
        let attempts = vec![attempt("match", "math", 8, 10, 60, 80.0, 1), other];

        let entries = rank_attempts(
            &attempts,
            None,
            Some("fractions"),
            SortKey::Composite,
            600.0,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, "match");
    }

    #[test]
    fn ranking_is_deterministic_across_runs() {
        let attempts: Vec<QuizAttempt> = (0u32..20)
            .map(|i| {
                attempt(
                    &format!("u{}", i),
                    "math",
                    i % 11,
                    10,
                    30 + (i * 37) % 500,
                    f64::from((i * 7) % 101),
                    i,
                )
            })
            .collect();

        let first = rank_attempts(&attempts, None, None, SortKey::Composite, 600.0);
        let second = rank_attempts(&attempts, None, None, SortKey::Composite, 600.0);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.user_id, b.user_id);
            assert_eq!(a.rank, b.rank);
            assert_eq!(a.composite_score, b.composite_score);
        }
    }

    #[test]
    fn output_never_exceeds_input_length() {
        let attempts = vec![
            attempt("a", "math", 8, 10, 60, 80.0, 0),
            attempt("b", "math", 0, 0, 60, 0.0, 1),
            attempt("c", "science", 9, 10, 60, 90.0, 2),
        ];
        let entries = rank_attempts(&attempts, None, None, SortKey::Composite, 600.0);
        assert!(entries.len() <= attempts.len());
    }
}
