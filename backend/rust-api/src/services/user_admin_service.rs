use anyhow::{anyhow, Context, Result};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Regex};
use mongodb::Database;

use crate::models::user::{ListUsersQuery, UpdateUserRequest, User, UserProfile};

pub struct UserAdminService {
    mongo: Database,
}

impl UserAdminService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn list_users(&self, query: ListUsersQuery) -> Result<Vec<UserProfile>> {
        let collection = self.mongo.collection::<User>("users");

        let mut filter = doc! {};
        if let Some(role) = &query.role {
            filter.insert("role", role);
        }
        if let Some(is_blocked) = query.is_blocked {
            filter.insert("is_blocked", is_blocked);
        }
        if let Some(search) = &query.search {
            let pattern = Regex {
                pattern: regex::escape(search),
                options: "i".to_string(),
            };
            filter.insert(
                "$or",
                vec![
                    doc! { "email": pattern.clone() },
                    doc! { "name": pattern },
                ],
            );
        }

        let limit = i64::from(query.limit.unwrap_or(50).min(200));
        let offset = u64::from(query.offset.unwrap_or(0));

        let cursor = collection
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(offset)
            .limit(limit)
            .await
            .context("Failed to query users")?;

        let users: Vec<User> = cursor.try_collect().await.context("Users cursor failure")?;

        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn update_user(&self, user_id: &str, req: UpdateUserRequest) -> Result<UserProfile> {
        let object_id = ObjectId::parse_str(user_id).context("Invalid user id")?;
        let collection = self.mongo.collection::<User>("users");

        let mut update = doc! {
            "updatedAt": mongodb::bson::DateTime::now()
        };
        if let Some(name) = req.name {
            update.insert("name", name);
        }
        if let Some(role) = req.role {
            update.insert("role", role.as_str());
        }
        if let Some(is_blocked) = req.is_blocked {
            update.insert("is_blocked", is_blocked);
        }

        let updated = collection
            .find_one_and_update(doc! { "_id": object_id }, doc! { "$set": update })
            .return_document(mongodb::options::ReturnDocument::After)
            .await
            .context("Failed to update user")?
            .ok_or_else(|| anyhow!("User not found"))?;

        Ok(UserProfile::from(updated))
    }

    pub async fn set_blocked(&self, user_id: &str, blocked: bool) -> Result<()> {
        let object_id = ObjectId::parse_str(user_id).context("Invalid user id")?;

        let result = self
            .mongo
            .collection::<User>("users")
            .update_one(
                doc! { "_id": object_id },
                doc! { "$set": {
                    "is_blocked": blocked,
                    "updatedAt": mongodb::bson::DateTime::now(),
                } },
            )
            .await
            .context("Failed to update block status")?;

        if result.matched_count == 0 {
            return Err(anyhow!("User not found"));
        }

        tracing::info!(
            "User {} {}",
            user_id,
            if blocked { "blocked" } else { "unblocked" }
        );
        Ok(())
    }
}
