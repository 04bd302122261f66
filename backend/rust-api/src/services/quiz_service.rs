use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::metrics::{track_cache_operation, QUIZZES_GENERATED_TOTAL, QUIZ_ATTEMPTS_SUBMITTED_TOTAL};
use crate::models::quiz::{
    GenerateQuizRequest, HistoryQuery, Quiz, QuizAttempt, QuizQuestion, QuizQuestionPublic,
    QuizResponse, QuestionResult, SubmitQuizRequest, SubmitQuizResponse,
};
use crate::services::generator::{
    validate_questions, ContentGenerator, HttpContentGenerator, QuizGenerationRequest,
};

/// How long a generated quiz stays open for submission
const QUIZ_TTL_SECONDS: i64 = 1800;

const DEFAULT_QUESTION_COUNT: u32 = 10;

pub struct QuizService {
    mongo: Database,
    redis: ConnectionManager,
    generator: Box<dyn ContentGenerator>,
}

impl QuizService {
    pub fn new(mongo: Database, redis: ConnectionManager, generator_api_url: String) -> Self {
        Self {
            mongo,
            redis,
            generator: Box::new(HttpContentGenerator::new(generator_api_url)),
        }
    }

    /// Test seam: inject a generator implementation
    pub fn with_generator(
        mongo: Database,
        redis: ConnectionManager,
        generator: Box<dyn ContentGenerator>,
    ) -> Self {
        Self {
            mongo,
            redis,
            generator,
        }
    }

    pub async fn generate_quiz(
        &self,
        user_id: &str,
        req: GenerateQuizRequest,
    ) -> Result<QuizResponse> {
        let generation_request = QuizGenerationRequest {
            subject: req.subject.clone(),
            subtopic: req.subtopic.clone(),
            difficulty: req.difficulty,
            question_count: req.question_count.unwrap_or(DEFAULT_QUESTION_COUNT),
        };

        let generated = self.generator.generate_quiz(&generation_request).await?;
        let questions = validate_questions(generated.questions);
        if questions.is_empty() {
            return Err(anyhow!("Generator produced no usable questions"));
        }

        let now = Utc::now();
        let quiz = Quiz {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            subject: req.subject,
            subtopic: req.subtopic,
            difficulty: req.difficulty,
            questions,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(QUIZ_TTL_SECONDS),
        };

        // Hold the quiz (with answers) in Redis until submitted or expired
        let mut conn = self.redis.clone();
        let quiz_key = format!("quiz:{}", quiz.id);
        let quiz_json = serde_json::to_string(&quiz)?;

        track_cache_operation("setex", async {
            redis::cmd("SETEX")
                .arg(&quiz_key)
                .arg(QUIZ_TTL_SECONDS)
                .arg(quiz_json)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to save quiz to Redis")
        })
        .await?;

        QUIZZES_GENERATED_TOTAL
            .with_label_values(&[quiz.difficulty.as_str()])
            .inc();

        tracing::info!("Quiz generated: {} for user: {}", quiz.id, user_id);

        Ok(QuizResponse {
            quiz_id: quiz.id.clone(),
            subject: quiz.subject.clone(),
            subtopic: quiz.subtopic.clone(),
            difficulty: quiz.difficulty,
            questions: quiz.questions.iter().map(QuizQuestionPublic::from).collect(),
            expires_at: quiz.expires_at,
        })
    }

    pub async fn submit_quiz(
        &self,
        user_id: &str,
        user_name: &str,
        quiz_id: &str,
        req: SubmitQuizRequest,
    ) -> Result<SubmitQuizResponse> {
        let quiz = self.fetch_open_quiz(quiz_id).await?;

        if quiz.user_id != user_id {
            return Err(anyhow!("Quiz does not belong to this user"));
        }
        if req.answers.len() != quiz.questions.len() {
            return Err(anyhow!(
                "Expected {} answers, got {}",
                quiz.questions.len(),
                req.answers.len()
            ));
        }

        let (correct_count, results) = grade(&quiz.questions, &req.answers);
        let total_questions = quiz.questions.len() as u32;
        let score_percentage = 100.0 * f64::from(correct_count) / f64::from(total_questions);

        let attempt = QuizAttempt {
            id: None,
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            subject: quiz.subject.clone(),
            subtopic: quiz.subtopic.clone(),
            correct_count,
            total_questions,
            time_taken_seconds: req.time_taken_seconds,
            score_percentage,
            submitted_at: Utc::now(),
        };

        let collection = self.mongo.collection::<QuizAttempt>("quiz_attempts");
        let insert_result = collection
            .insert_one(&attempt)
            .await
            .context("Failed to store quiz attempt")?;

        let attempt_id = insert_result
            .inserted_id
            .as_object_id()
            .map(|id| id.to_hex())
            .ok_or_else(|| anyhow!("Failed to get inserted attempt ID"))?;

        // Quiz is spent once submitted
        let mut conn = self.redis.clone();
        let quiz_key = format!("quiz:{}", quiz_id);
        track_cache_operation("del", async {
            redis::cmd("DEL")
                .arg(&quiz_key)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to delete quiz from Redis")
        })
        .await?;

        QUIZ_ATTEMPTS_SUBMITTED_TOTAL
            .with_label_values(&[attempt.subject.as_str()])
            .inc();

        tracing::info!(
            "Quiz submitted: {} by user: {} ({}/{})",
            quiz_id,
            user_id,
            correct_count,
            total_questions
        );

        Ok(SubmitQuizResponse {
            attempt_id,
            correct_count,
            total_questions,
            score_percentage,
            results,
        })
    }

    pub async fn quiz_history(&self, user_id: &str, query: &HistoryQuery) -> Result<Vec<QuizAttempt>> {
        let collection = self.mongo.collection::<QuizAttempt>("quiz_attempts");

        let mut filter = doc! { "user_id": user_id };
        if let Some(subject) = &query.subject {
            filter.insert("subject", subject);
        }

        let limit = i64::from(query.limit.unwrap_or(20).min(100));
        let offset = u64::from(query.offset.unwrap_or(0));

        let cursor = collection
            .find(filter)
            .sort(doc! { "submittedAt": -1 })
            .skip(offset)
            .limit(limit)
            .await
            .context("Failed to query quiz history")?;

        cursor
            .try_collect()
            .await
            .context("Quiz history cursor failure")
    }

    pub async fn get_attempt(&self, attempt_id: &str) -> Result<QuizAttempt> {
        let object_id =
            ObjectId::parse_str(attempt_id).context("Invalid attempt id")?;
        let collection = self.mongo.collection::<QuizAttempt>("quiz_attempts");

        collection
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query quiz attempt")?
            .ok_or_else(|| anyhow!("Attempt not found"))
    }

    async fn fetch_open_quiz(&self, quiz_id: &str) -> Result<Quiz> {
        let mut conn = self.redis.clone();
        let quiz_key = format!("quiz:{}", quiz_id);
        let quiz_json: String = redis::cmd("GET")
            .arg(&quiz_key)
            .query_async(&mut conn)
            .await
            .context("Quiz not found or expired")?;

        let quiz: Quiz = serde_json::from_str(&quiz_json)?;
        Ok(quiz)
    }
}

/// Grades submitted answers against the stored questions. Pure.
fn grade(questions: &[QuizQuestion], answers: &[u32]) -> (u32, Vec<QuestionResult>) {
    let mut correct_count = 0;
    let results = questions
        .iter()
        .zip(answers.iter())
        .map(|(question, &selected)| {
            let correct = selected == question.correct_index;
            if correct {
                correct_count += 1;
            }
            QuestionResult {
                prompt: question.prompt.clone(),
                selected_index: selected,
                correct_index: question.correct_index,
                correct,
                explanation: question.explanation.clone(),
            }
        })
        .collect();

    (correct_count, results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct_index: u32) -> QuizQuestion {
        QuizQuestion {
            prompt: "prompt".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index,
            explanation: Some("because".to_string()),
        }
    }

    #[test]
    fn grade_counts_correct_answers() {
        let questions = vec![question(0), question(2), question(3)];
        let (correct, results) = grade(&questions, &[0, 1, 3]);

        assert_eq!(correct, 2);
        assert_eq!(results.len(), 3);
        assert!(results[0].correct);
        assert!(!results[1].correct);
        assert!(results[2].correct);
    }

    #[test]
    fn grade_keeps_explanations_for_review() {
        let questions = vec![question(1)];
        let (_, results) = grade(&questions, &[0]);
        assert_eq!(results[0].explanation.as_deref(), Some("because"));
    }

    #[test]
    fn all_wrong_scores_zero() {
        let questions = vec![question(0), question(0)];
        let (correct, _) = grade(&questions, &[1, 1]);
        assert_eq!(correct, 0);
    }
}
