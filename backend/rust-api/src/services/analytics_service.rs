use anyhow::{Context, Result};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::leaderboard::{LeaderboardEntry, SortKey};
use crate::models::quiz::QuizAttempt;
use crate::services::leaderboard_service::rank_attempts;

#[derive(Debug, Serialize)]
pub struct SubjectStats {
    pub subject: String,
    pub attempts: u32,
    pub average_score: f64,
    pub best_score: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsOverview {
    pub total_users: u64,
    pub total_attempts: u64,
    pub total_lessons: u64,
    pub average_score: f64,
    pub subjects: Vec<SubjectStats>,
    pub top_entries: Vec<LeaderboardEntry>,
}

pub struct AnalyticsService {
    mongo: Database,
    reference_time_seconds: f64,
}

impl AnalyticsService {
    pub fn new(mongo: Database, reference_time_seconds: f64) -> Self {
        Self {
            mongo,
            reference_time_seconds,
        }
    }

    pub async fn overview(&self) -> Result<AnalyticsOverview> {
        let attempts = self.load_attempts().await?;

        let total_users = self
            .mongo
            .collection::<mongodb::bson::Document>("users")
            .estimated_document_count()
            .await
            .context("Failed to count users")?;

        let total_lessons = self
            .mongo
            .collection::<mongodb::bson::Document>("lessons")
            .estimated_document_count()
            .await
            .context("Failed to count lessons")?;

        let top_entries = rank_attempts(
            &attempts,
            None,
            None,
            SortKey::Composite,
            self.reference_time_seconds,
        )
        .into_iter()
        .take(10)
        .collect();

        Ok(AnalyticsOverview {
            total_users,
            total_attempts: attempts.len() as u64,
            total_lessons,
            average_score: average_score(&attempts),
            subjects: subject_breakdown(&attempts),
            top_entries,
        })
    }

    /// Admin spreadsheet export: overview metrics, per-subject table and
    /// the current top 10
    pub async fn export_xlsx(&self) -> Result<Vec<u8>> {
        let overview = self.overview().await?;

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_column_width(0, 28.0)?;
        worksheet.set_column_width(1, 24.0)?;
        worksheet.set_column_width(2, 18.0)?;
        worksheet.set_column_width(3, 18.0)?;

        let header_format = Format::new().set_bold();

        let mut row = 0;
        worksheet.write_string_with_format(row, 0, "Metric", &header_format)?;
        worksheet.write_string_with_format(row, 1, "Value", &header_format)?;
        row += 1;
        worksheet.write_string(row, 0, "Total users")?;
        worksheet.write_number(row, 1, overview.total_users as f64)?;
        row += 1;
        worksheet.write_string(row, 0, "Total quiz attempts")?;
        worksheet.write_number(row, 1, overview.total_attempts as f64)?;
        row += 1;
        worksheet.write_string(row, 0, "Total lessons")?;
        worksheet.write_number(row, 1, overview.total_lessons as f64)?;
        row += 1;
        worksheet.write_string(row, 0, "Average score")?;
        worksheet.write_string(row, 1, format!("{:.1}%", overview.average_score))?;
        row += 2;

        worksheet.write_string_with_format(row, 0, "Subject", &header_format)?;
        worksheet.write_string_with_format(row, 1, "Attempts", &header_format)?;
        worksheet.write_string_with_format(row, 2, "Avg score", &header_format)?;
        worksheet.write_string_with_format(row, 3, "Best score", &header_format)?;
        row += 1;

        if overview.subjects.is_empty() {
            worksheet.write_string(row, 0, "No data")?;
            row += 2;
        } else {
            for stats in &overview.subjects {
                worksheet.write_string(row, 0, &stats.subject)?;
                worksheet.write_number(row, 1, f64::from(stats.attempts))?;
                worksheet.write_number(row, 2, stats.average_score)?;
                worksheet.write_number(row, 3, stats.best_score)?;
                row += 1;
            }
            row += 1;
        }

        worksheet.write_string_with_format(row, 0, "Leaderboard", &header_format)?;
        row += 1;
        worksheet.write_string_with_format(row, 0, "Rank", &header_format)?;
        worksheet.write_string_with_format(row, 1, "Student", &header_format)?;
        worksheet.write_string_with_format(row, 2, "Composite", &header_format)?;
        row += 1;

        if overview.top_entries.is_empty() {
            worksheet.write_string(row, 0, "No data")?;
        } else {
            for entry in &overview.top_entries {
                worksheet.write_number(row, 0, f64::from(entry.rank))?;
                worksheet.write_string(row, 1, &entry.name)?;
                worksheet.write_number(row, 2, entry.composite_score)?;
                row += 1;
            }
        }

        let mut cursor = std::io::Cursor::new(Vec::new());
        workbook.save_to_writer(&mut cursor)?;
        Ok(cursor.into_inner())
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

fn average_score(attempts: &[QuizAttempt]) -> f64 {
    let scorable: Vec<&QuizAttempt> = attempts
        .iter()
        .filter(|a| a.total_questions > 0)
        .collect();
    if scorable.is_empty() {
        return 0.0;
    }
    scorable.iter().map(|a| a.score_percentage).sum::<f64>() / scorable.len() as f64
}

/// Per-subject aggregates, alphabetical by subject. Pure.
fn subject_breakdown(attempts: &[QuizAttempt]) -> Vec<SubjectStats> {
    let mut grouped: BTreeMap<String, Vec<&QuizAttempt>> = BTreeMap::new();
    for attempt in attempts.iter().filter(|a| a.total_questions > 0) {
        grouped
            .entry(attempt.subject.clone())
            .or_default()
            .push(attempt);
    }

    grouped
        .into_iter()
        .map(|(subject, group)| {
            let average = group.iter().map(|a| a.score_percentage).sum::<f64>()
                / group.len() as f64;
            let best = group
                .iter()
                .map(|a| a.score_percentage)
                .fold(f64::MIN, f64::max);
            SubjectStats {
                subject,
                attempts: group.len() as u32,
                average_score: average,
                best_score: best,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn attempt(subject: &str, score: f64, total: u32) -> QuizAttempt {
        QuizAttempt {
            id: None,
            user_id: "u".to_string(),
            user_name: "U".to_string(),
            subject: subject.to_string(),
            subtopic: None,
            correct_count: (score / 10.0) as u32,
            total_questions: total,
            time_taken_seconds: 60,
            score_percentage: score,
            submitted_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn breakdown_groups_by_subject_alphabetically() {
        let attempts = vec![
            attempt("science", 60.0, 10),
            attempt("math", 80.0, 10),
            attempt("math", 90.0, 10),
        ];
        let stats = subject_breakdown(&attempts);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].subject, "math");
        assert_eq!(stats[0].attempts, 2);
        assert_eq!(stats[0].average_score, 85.0);
        assert_eq!(stats[0].best_score, 90.0);
        assert_eq!(stats[1].subject, "science");
    }

    #[test]
    fn breakdown_skips_unscorable_attempts() {
        let attempts = vec![attempt("math", 80.0, 10), attempt("math", 0.0, 0)];
        let stats = subject_breakdown(&attempts);
        assert_eq!(stats[0].attempts, 1);
    }

    #[test]
    fn average_score_of_empty_set_is_zero() {
        assert_eq!(average_score(&[]), 0.0);
    }
}
