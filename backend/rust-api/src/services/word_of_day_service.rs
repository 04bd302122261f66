use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;
use redis::aio::ConnectionManager;

use crate::metrics::{record_cache_hit, record_cache_miss, track_cache_operation};
use crate::models::vocabulary::{VocabularyList, VocabularyWord, WordOfDay};

pub struct WordOfDayService {
    mongo: Database,
    redis: ConnectionManager,
}

impl WordOfDayService {
    pub fn new(mongo: Database, redis: ConnectionManager) -> Self {
        Self { mongo, redis }
    }

    /// Word for today (UTC). Cached in Redis until the end of the day so
    /// the vocabulary collection is read at most once per day per node.
    pub async fn today(&self) -> Result<WordOfDay> {
        self.word_for(Utc::now().date_naive()).await
    }

    pub async fn word_for(&self, date: NaiveDate) -> Result<WordOfDay> {
        let cache_key = format!("word_of_day:{}", date);

        let mut conn = self.redis.clone();
        let cached: Option<String> = redis::cmd("GET")
            .arg(&cache_key)
            .query_async(&mut conn)
            .await
            .unwrap_or(None);

        if let Some(json) = cached {
            if let Ok(word) = serde_json::from_str::<WordOfDay>(&json) {
                record_cache_hit();
                return Ok(word);
            }
            // Unreadable cache entry falls through to recompute
        }
        record_cache_miss();

        let list = self.load_vocabulary().await?;
        let word = list.select(date);

        let ttl = seconds_until_end_of_day(date);
        let json = serde_json::to_string(&word)?;
        track_cache_operation("setex", async {
            redis::cmd("SETEX")
                .arg(&cache_key)
                .arg(ttl)
                .arg(json)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to cache word of day")
        })
        .await?;

        Ok(word)
    }

    async fn load_vocabulary(&self) -> Result<VocabularyList> {
        let collection = self.mongo.collection::<VocabularyWord>("vocabulary");
        let cursor = collection
            .find(doc! {})
            .sort(doc! { "position": 1 })
            .await
            .context("Failed to query vocabulary")?;

        let words: Vec<VocabularyWord> = cursor
            .try_collect()
            .await
            .context("Vocabulary cursor failure")?;

        VocabularyList::new(words).context("Vocabulary collection is empty")
    }
}

/// Whole seconds between the start of the next day and now, floored at one
/// minute so a clock skew cannot produce a zero TTL.
fn seconds_until_end_of_day(date: NaiveDate) -> i64 {
    match date.succ_opt() {
        Some(next) => {
            let next_midnight = next.and_time(chrono::NaiveTime::MIN).and_utc();
            (next_midnight - Utc::now()).num_seconds().max(60)
        }
        None => 60,
    }
}
