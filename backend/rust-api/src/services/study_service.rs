use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;

use crate::metrics::LESSONS_GENERATED_TOTAL;
use crate::models::lesson::{GenerateLessonRequest, Lesson, LessonResponse};
use crate::models::quiz::HistoryQuery;
use crate::services::generator::{
    ContentGenerator, HttpContentGenerator, LessonGenerationRequest,
};

pub struct StudyService {
    mongo: Database,
    generator: Box<dyn ContentGenerator>,
}

impl StudyService {
    pub fn new(mongo: Database, generator_api_url: String) -> Self {
        Self {
            mongo,
            generator: Box::new(HttpContentGenerator::new(generator_api_url)),
        }
    }

    /// Test seam: inject a generator implementation
    pub fn with_generator(mongo: Database, generator: Box<dyn ContentGenerator>) -> Self {
        Self { mongo, generator }
    }

    pub async fn generate_lesson(
        &self,
        user_id: &str,
        req: GenerateLessonRequest,
    ) -> Result<LessonResponse> {
        let generation_request = LessonGenerationRequest {
            subject: req.subject.clone(),
            subtopic: req.subtopic.clone(),
        };

        let generated = self.generator.generate_lesson(&generation_request).await?;
        if generated.sections.is_empty() {
            return Err(anyhow!("Generator produced an empty lesson"));
        }

        let lesson = Lesson {
            id: None,
            user_id: user_id.to_string(),
            subject: req.subject,
            subtopic: req.subtopic,
            title: generated.title,
            sections: generated.sections,
            created_at: Utc::now(),
        };

        let collection = self.mongo.collection::<Lesson>("lessons");
        let insert_result = collection
            .insert_one(&lesson)
            .await
            .context("Failed to store lesson")?;

        let lesson_id = insert_result
            .inserted_id
            .as_object_id()
            .map(|id| id.to_hex())
            .ok_or_else(|| anyhow!("Failed to get inserted lesson ID"))?;

        LESSONS_GENERATED_TOTAL
            .with_label_values(&[lesson.subject.as_str()])
            .inc();

        tracing::info!("Lesson generated: {} for user: {}", lesson_id, user_id);

        Ok(LessonResponse {
            lesson_id,
            subject: lesson.subject,
            subtopic: lesson.subtopic,
            title: lesson.title,
            sections: lesson.sections,
            created_at: lesson.created_at,
        })
    }

    pub async fn lesson_history(
        &self,
        user_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<Lesson>> {
        let collection = self.mongo.collection::<Lesson>("lessons");

        let mut filter = doc! { "user_id": user_id };
        if let Some(subject) = &query.subject {
            filter.insert("subject", subject);
        }

        let limit = i64::from(query.limit.unwrap_or(20).min(100));
        let offset = u64::from(query.offset.unwrap_or(0));

        let cursor = collection
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(offset)
            .limit(limit)
            .await
            .context("Failed to query lesson history")?;

        cursor
            .try_collect()
            .await
            .context("Lesson history cursor failure")
    }
}
