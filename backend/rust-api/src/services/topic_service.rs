use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;
use std::collections::HashMap;

use crate::models::topic::{
    CreateSubtopicRequest, CreateTopicRequest, Subtopic, SubtopicSummary, Topic, TopicSummary,
    UpdateTopicRequest,
};

pub struct TopicService {
    mongo: Database,
}

impl TopicService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn list_topics(&self, include_archived: bool) -> Result<Vec<TopicSummary>> {
        let topics_collection = self.mongo.collection::<Topic>("topics");

        let filter = if include_archived {
            doc! {}
        } else {
            doc! { "is_active": true }
        };

        let topics: Vec<Topic> = topics_collection
            .find(filter)
            .sort(doc! { "name": 1 })
            .await
            .context("Failed to query topics")?
            .try_collect()
            .await
            .context("Topics cursor failure")?;

        let subtopics_collection = self.mongo.collection::<Subtopic>("subtopics");
        let subtopics: Vec<Subtopic> = subtopics_collection
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await
            .context("Failed to query subtopics")?
            .try_collect()
            .await
            .context("Subtopics cursor failure")?;

        let mut by_topic: HashMap<ObjectId, Vec<SubtopicSummary>> = HashMap::new();
        for subtopic in subtopics {
            if !include_archived && !subtopic.is_active {
                continue;
            }
            by_topic
                .entry(subtopic.topic_id)
                .or_default()
                .push(SubtopicSummary::from(subtopic));
        }

        Ok(topics
            .into_iter()
            .map(|topic| {
                let subtopics = topic
                    .id
                    .and_then(|id| by_topic.remove(&id))
                    .unwrap_or_default();
                TopicSummary {
                    id: topic.id.map(|id| id.to_hex()).unwrap_or_default(),
                    name: topic.name,
                    description: topic.description,
                    is_active: topic.is_active,
                    subtopics,
                    updated_at: topic.updated_at,
                }
            })
            .collect())
    }

    pub async fn create_topic(&self, req: CreateTopicRequest) -> Result<Topic> {
        let collection = self.mongo.collection::<Topic>("topics");

        let existing = collection
            .find_one(doc! { "name": &req.name })
            .await
            .context("Failed to check existing topic")?;
        if existing.is_some() {
            return Err(anyhow!("Topic with this name already exists"));
        }

        let now = Utc::now();
        let mut topic = Topic {
            id: None,
            name: req.name,
            description: req.description,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let insert_result = collection
            .insert_one(&topic)
            .await
            .context("Failed to insert topic")?;
        topic.id = insert_result.inserted_id.as_object_id();

        tracing::info!("Topic created: {}", topic.name);
        Ok(topic)
    }

    pub async fn update_topic(&self, topic_id: &str, req: UpdateTopicRequest) -> Result<Topic> {
        let object_id = ObjectId::parse_str(topic_id).context("Invalid topic id")?;
        let collection = self.mongo.collection::<Topic>("topics");

        let mut update = doc! {
            "updatedAt": mongodb::bson::DateTime::now()
        };
        if let Some(name) = req.name {
            update.insert("name", name);
        }
        if let Some(description) = req.description {
            update.insert("description", description);
        }
        if let Some(is_active) = req.is_active {
            update.insert("is_active", is_active);
        }

        let updated = collection
            .find_one_and_update(doc! { "_id": object_id }, doc! { "$set": update })
            .return_document(mongodb::options::ReturnDocument::After)
            .await
            .context("Failed to update topic")?
            .ok_or_else(|| anyhow!("Topic not found"))?;

        Ok(updated)
    }

    /// Soft archive: the topic stays for history views but is hidden
    /// from generation
    pub async fn archive_topic(&self, topic_id: &str) -> Result<()> {
        let object_id = ObjectId::parse_str(topic_id).context("Invalid topic id")?;

        let result = self
            .mongo
            .collection::<Topic>("topics")
            .update_one(
                doc! { "_id": object_id },
                doc! { "$set": { "is_active": false, "updatedAt": mongodb::bson::DateTime::now() } },
            )
            .await
            .context("Failed to archive topic")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Topic not found"));
        }

        // Archive subtopics together with the parent
        self.mongo
            .collection::<Subtopic>("subtopics")
            .update_many(
                doc! { "topicId": object_id },
                doc! { "$set": { "is_active": false, "updatedAt": mongodb::bson::DateTime::now() } },
            )
            .await
            .context("Failed to archive subtopics")?;

        tracing::info!("Topic archived: {}", topic_id);
        Ok(())
    }

    pub async fn create_subtopic(
        &self,
        topic_id: &str,
        req: CreateSubtopicRequest,
    ) -> Result<Subtopic> {
        let parent_id = ObjectId::parse_str(topic_id).context("Invalid topic id")?;

        let parent = self
            .mongo
            .collection::<Topic>("topics")
            .find_one(doc! { "_id": parent_id })
            .await
            .context("Failed to query parent topic")?
            .ok_or_else(|| anyhow!("Topic not found"))?;

        if !parent.is_active {
            return Err(anyhow!("Cannot add subtopics to an archived topic"));
        }

        let now = Utc::now();
        let mut subtopic = Subtopic {
            id: None,
            topic_id: parent_id,
            name: req.name,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let insert_result = self
            .mongo
            .collection::<Subtopic>("subtopics")
            .insert_one(&subtopic)
            .await
            .context("Failed to insert subtopic")?;
        subtopic.id = insert_result.inserted_id.as_object_id();

        tracing::info!("Subtopic created: {} under {}", subtopic.name, parent.name);
        Ok(subtopic)
    }

    pub async fn archive_subtopic(&self, subtopic_id: &str) -> Result<()> {
        let object_id = ObjectId::parse_str(subtopic_id).context("Invalid subtopic id")?;

        let result = self
            .mongo
            .collection::<Subtopic>("subtopics")
            .update_one(
                doc! { "_id": object_id },
                doc! { "$set": { "is_active": false, "updatedAt": mongodb::bson::DateTime::now() } },
            )
            .await
            .context("Failed to archive subtopic")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Subtopic not found"));
        }

        Ok(())
    }
}
