use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::lesson::LessonSection;
use crate::models::quiz::{Difficulty, QuizQuestion};

lazy_static! {
    /// Model output often arrives wrapped in a markdown code fence;
    /// extract the payload before parsing.
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap();
}

#[derive(Debug, Serialize)]
pub struct QuizGenerationRequest {
    pub subject: String,
    pub subtopic: Option<String>,
    pub difficulty: Difficulty,
    pub question_count: u32,
}

#[derive(Debug, Serialize)]
pub struct LessonGenerationRequest {
    pub subject: String,
    pub subtopic: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedQuiz {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedLesson {
    pub title: String,
    pub sections: Vec<LessonSection>,
}

/// Envelope returned by the generator API: the model's raw text output
#[derive(Debug, Deserialize)]
struct GeneratorEnvelope {
    content: String,
}

/// Seam for the external AI generator so quiz/lesson flows can be
/// exercised without the network.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_quiz(&self, request: &QuizGenerationRequest) -> Result<GeneratedQuiz>;
    async fn generate_lesson(&self, request: &LessonGenerationRequest) -> Result<GeneratedLesson>;
}

pub struct HttpContentGenerator {
    http_client: Client,
    base_url: String,
}

impl HttpContentGenerator {
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
        }
    }

    async fn call<B: Serialize>(&self, path: &str, body: &B) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!("Calling generator API: {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .context("Failed to call generator API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Generator API returned error {}: {}", status, error_text));
        }

        let envelope: GeneratorEnvelope = response
            .json()
            .await
            .context("Failed to parse generator API response")?;

        Ok(envelope.content)
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate_quiz(&self, request: &QuizGenerationRequest) -> Result<GeneratedQuiz> {
        let content = self.call("/internal/generate_quiz", request).await?;
        let payload = extract_payload(&content);
        serde_json::from_str(payload).context("Generator returned malformed quiz JSON")
    }

    async fn generate_lesson(&self, request: &LessonGenerationRequest) -> Result<GeneratedLesson> {
        let content = self.call("/internal/generate_lesson", request).await?;
        let payload = extract_payload(&content);
        serde_json::from_str(payload).context("Generator returned malformed lesson JSON")
    }
}

/// Strips a surrounding markdown code fence when present
fn extract_payload(content: &str) -> &str {
    match CODE_FENCE.captures(content) {
        Some(captures) => captures.get(1).map_or(content, |m| m.as_str()),
        None => content.trim(),
    }
}

/// Drops generated questions that cannot be graded: fewer than two
/// options, or a correct index outside the option list.
pub fn validate_questions(questions: Vec<QuizQuestion>) -> Vec<QuizQuestion> {
    questions
        .into_iter()
        .filter(|question| {
            let valid = question.options.len() >= 2
                && (question.correct_index as usize) < question.options.len()
                && !question.prompt.trim().is_empty();
            if !valid {
                tracing::warn!(prompt = %question.prompt, "Dropping malformed generated question");
            }
            valid
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: usize, correct: u32) -> QuizQuestion {
        QuizQuestion {
            prompt: "What is 2 + 2?".to_string(),
            options: (0..options).map(|i| format!("{}", i + 2)).collect(),
            correct_index: correct,
            explanation: None,
        }
    }

    #[test]
    fn extracts_fenced_json() {
        let content = "```json\n{\"questions\": []}\n```";
        assert_eq!(extract_payload(content), "{\"questions\": []}");
    }

    #[test]
    fn extracts_fence_without_language_tag() {
        let content = "```\n{\"title\": \"Fractions\"}\n```";
        assert_eq!(extract_payload(content), "{\"title\": \"Fractions\"}");
    }

    #[test]
    fn passes_through_bare_json() {
        let content = "  {\"questions\": []}  ";
        assert_eq!(extract_payload(content), "{\"questions\": []}");
    }

    #[test]
    fn validate_drops_out_of_range_correct_index() {
        let questions = vec![question(4, 1), question(4, 9)];
        let valid = validate_questions(questions);
        assert_eq!(valid.len(), 1);
    }

    #[test]
    fn validate_drops_single_option_questions() {
        let questions = vec![question(1, 0), question(2, 0)];
        let valid = validate_questions(questions);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].options.len(), 2);
    }
}
