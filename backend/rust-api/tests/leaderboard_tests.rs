use chrono::{TimeZone, Utc};
use sproutlearn_api::models::leaderboard::SortKey;
use sproutlearn_api::models::quiz::QuizAttempt;
use sproutlearn_api::services::leaderboard_service::rank_attempts;

const REFERENCE_TIME: f64 = 600.0;

fn attempt(
    user: &str,
    subject: &str,
    subtopic: Option<&str>,
    correct: u32,
    total: u32,
    time_secs: u32,
    score: f64,
    submitted_minute: u32,
) -> QuizAttempt {
    QuizAttempt {
        id: None,
        user_id: user.to_string(),
        user_name: user.to_string(),
        subject: subject.to_string(),
        subtopic: subtopic.map(|s| s.to_string()),
        correct_count: correct,
        total_questions: total,
        time_taken_seconds: time_secs,
        score_percentage: score,
        submitted_at: Utc
            .with_ymd_and_hms(2025, 5, 10, 9, submitted_minute, 0)
            .unwrap(),
    }
}

#[test]
fn reference_scenario_sorted_by_score() {
    // attempts = [{8/10, 60s, 80%}, {9/10, 90s, 90%}], sort_by = score
    let attempts = vec![
        attempt("alice", "math", None, 8, 10, 60, 80.0, 0),
        attempt("bob", "math", None, 9, 10, 90, 90.0, 1),
    ];

    let entries = rank_attempts(&attempts, None, None, SortKey::Score, REFERENCE_TIME);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].user_id, "bob");
    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[0].score_component, 90.0);
    assert_eq!(entries[1].user_id, "alice");
    assert_eq!(entries[1].rank, 2);
    assert_eq!(entries[1].score_component, 80.0);
}

#[test]
fn composite_combines_weighted_components() {
    let attempts = vec![attempt("kid", "math", None, 8, 10, 60, 80.0, 0)];
    let entries = rank_attempts(&attempts, None, None, SortKey::Composite, REFERENCE_TIME);

    let entry = &entries[0];
    // 0.6 * 80 + 0.2 * 80 + 0.2 * (100 * (1 - 60/600))
    assert!((entry.composite_score - 82.0).abs() < 1e-9);
}

#[test]
fn output_is_sorted_descending_with_dense_ranks() {
    let attempts: Vec<QuizAttempt> = (0u32..8)
        .map(|i| {
            attempt(
                &format!("user-{}", i),
                "math",
                None,
                i + 1,
                10,
                100 + i * 20,
                f64::from((i + 1) * 10),
                i,
            )
        })
        .collect();

    let entries = rank_attempts(&attempts, None, None, SortKey::Composite, REFERENCE_TIME);

    assert_eq!(entries.len(), 8);
    for (position, entry) in entries.iter().enumerate() {
        assert_eq!(entry.rank, position as u32 + 1);
    }
    for pair in entries.windows(2) {
        assert!(pair[0].composite_score >= pair[1].composite_score);
    }
}

#[test]
fn invalid_attempts_are_excluded_without_failing_the_query() {
    let attempts = vec![
        attempt("valid", "math", None, 8, 10, 60, 80.0, 0),
        attempt("invalid", "math", None, 0, 0, 60, 0.0, 1),
    ];

    let entries = rank_attempts(&attempts, None, None, SortKey::Composite, REFERENCE_TIME);

    assert_eq!(entries.len(), 1);
    assert!(entries.iter().all(|e| e.user_id != "invalid"));
}

#[test]
fn empty_attempt_set_is_an_empty_leaderboard() {
    let entries = rank_attempts(&[], Some("math"), None, SortKey::Composite, REFERENCE_TIME);
    assert!(entries.is_empty());
}

#[test]
fn filters_compose_subject_and_subtopic() {
    let attempts = vec![
        attempt("a", "math", Some("fractions"), 8, 10, 60, 80.0, 0),
        attempt("b", "math", Some("decimals"), 8, 10, 60, 80.0, 1),
        attempt("c", "science", Some("fractions"), 8, 10, 60, 80.0, 2),
    ];

    let entries = rank_attempts(
        &attempts,
        Some("math"),
        Some("fractions"),
        SortKey::Composite,
        REFERENCE_TIME,
    );

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_id, "a");
}

#[test]
fn equal_keys_rank_earlier_submission_first() {
    let attempts = vec![
        attempt("second", "math", None, 8, 10, 60, 80.0, 45),
        attempt("first", "math", None, 8, 10, 60, 80.0, 10),
    ];

    let entries = rank_attempts(&attempts, None, None, SortKey::Score, REFERENCE_TIME);

    assert_eq!(entries[0].user_id, "first");
    assert_eq!(entries[1].user_id, "second");
}

#[test]
fn repeated_runs_produce_identical_output() {
    let attempts: Vec<QuizAttempt> = (0u32..30)
        .map(|i| {
            attempt(
                &format!("user-{}", i),
                if i % 2 == 0 { "math" } else { "science" },
                None,
                i % 11,
                10,
                30 + (i * 53) % 700,
                f64::from((i * 13) % 101),
                i,
            )
        })
        .collect();

    let first = rank_attempts(&attempts, None, None, SortKey::Composite, REFERENCE_TIME);
    let second = rank_attempts(&attempts, None, None, SortKey::Composite, REFERENCE_TIME);

    let first_order: Vec<(&str, u32, f64)> = first
        .iter()
        .map(|e| (e.user_id.as_str(), e.rank, e.composite_score))
        .collect();
    let second_order: Vec<(&str, u32, f64)> = second
        .iter()
        .map(|e| (e.user_id.as_str(), e.rank, e.composite_score))
        .collect();

    assert_eq!(first_order, second_order);
}
