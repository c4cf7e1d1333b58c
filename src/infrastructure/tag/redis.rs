//! Redis tag store

use std::fmt;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::domain::DomainError;
use crate::domain::tag::{Subscription, TagStore};
use crate::infrastructure::membership::{RedisStoreConfig, connect_redis, prefixed_key};

/// Redis tag store
///
/// Layout:
/// - `tags` set of tag names
/// - `tag-triggers:{tag}` set of trigger IDs
/// - `trigger-tags:{trigger}` set of tags, used to unlink on retag
/// - `tag-subscriptions:{tag}` set of subscription IDs
/// - `subscription:{id}` string holding the subscription as JSON
#[derive(Clone)]
pub struct RedisTagStore {
    connection: ConnectionManager,
    key_prefix: Option<String>,
}

impl fmt::Debug for RedisTagStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTagStore")
            .field("key_prefix", &self.key_prefix)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

fn storage_error(action: &str, e: redis::RedisError) -> DomainError {
    DomainError::storage(format!("Failed to {}: {}", action, e))
}

impl RedisTagStore {
    /// Connects to Redis
    pub async fn new(config: RedisStoreConfig) -> Result<Self, DomainError> {
        let connection = connect_redis(&config).await?;

        Ok(Self {
            connection,
            key_prefix: config.key_prefix,
        })
    }

    fn key(&self, key: String) -> String {
        prefixed_key(&self.key_prefix, key)
    }

    fn tags_key(&self) -> String {
        self.key("tags".to_string())
    }

    fn tag_triggers_key(&self, tag: &str) -> String {
        self.key(format!("tag-triggers:{}", tag))
    }

    fn trigger_tags_key(&self, trigger_id: &str) -> String {
        self.key(format!("trigger-tags:{}", trigger_id))
    }

    fn tag_subscriptions_key(&self, tag: &str) -> String {
        self.key(format!("tag-subscriptions:{}", tag))
    }

    fn subscription_key(&self, id: &str) -> String {
        self.key(format!("subscription:{}", id))
    }

    async fn sorted_members(&self, key: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();
        let mut members: Vec<String> = conn
            .smembers(key)
            .await
            .map_err(|e| storage_error(&format!("read '{}'", key), e))?;

        members.sort();
        Ok(members)
    }

    async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>, DomainError> {
        let key = self.subscription_key(id);
        let mut conn = self.connection.clone();

        let raw: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| storage_error(&format!("get key '{}'", key), e))?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| DomainError::storage(format!("Corrupt record '{}': {}", key, e)))
        })
        .transpose()
    }
}

#[async_trait]
impl TagStore for RedisTagStore {
    async fn tag_names(&self) -> Result<Vec<String>, DomainError> {
        self.sorted_members(&self.tags_key()).await
    }

    async fn tag_trigger_ids(&self, tag: &str) -> Result<Vec<String>, DomainError> {
        self.sorted_members(&self.tag_triggers_key(tag)).await
    }

    async fn tags_subscriptions(&self, tags: &[String]) -> Result<Vec<Subscription>, DomainError> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection.clone();
        let index_keys: Vec<String> = tags.iter().map(|t| self.tag_subscriptions_key(t)).collect();

        let mut ids: Vec<String> = redis::cmd("SUNION")
            .arg(&index_keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| storage_error("read tag subscriptions", e))?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }
        ids.sort();

        let keys: Vec<String> = ids.iter().map(|id| self.subscription_key(id)).collect();
        let raw: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| storage_error("read subscriptions", e))?;

        raw.into_iter()
            .zip(keys.iter())
            .filter_map(|(json, key)| json.map(|json| (json, key)))
            .map(|(json, key)| {
                serde_json::from_str(&json)
                    .map_err(|e| DomainError::storage(format!("Corrupt record '{}': {}", key, e)))
            })
            .collect()
    }

    async fn delete_tag(&self, tag: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: () = redis::pipe()
            .atomic()
            .srem(self.tags_key(), tag)
            .ignore()
            .del(self.tag_triggers_key(tag))
            .ignore()
            .del(self.tag_subscriptions_key(tag))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| storage_error(&format!("delete tag '{}'", tag), e))?;

        Ok(())
    }

    async fn save_trigger_tags(
        &self,
        trigger_id: &str,
        tags: &[String],
    ) -> Result<(), DomainError> {
        let trigger_key = self.trigger_tags_key(trigger_id);
        let previous = self.sorted_members(&trigger_key).await?;

        let mut pipe = redis::pipe();
        pipe.atomic();

        for tag in &previous {
            pipe.srem(self.tag_triggers_key(tag), trigger_id).ignore();
        }
        pipe.del(&trigger_key).ignore();

        for tag in tags {
            pipe.sadd(self.tags_key(), tag).ignore();
            pipe.sadd(self.tag_triggers_key(tag), trigger_id).ignore();
            pipe.sadd(&trigger_key, tag).ignore();
        }

        let mut conn = self.connection.clone();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| storage_error(&format!("save tags of trigger '{}'", trigger_id), e))?;

        Ok(())
    }

    async fn save_subscription(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let key = self.subscription_key(&subscription.id);
        let json = serde_json::to_string(subscription)
            .map_err(|e| DomainError::storage(format!("Failed to encode '{}': {}", key, e)))?;
        let previous = self.get_subscription(&subscription.id).await?;

        let mut pipe = redis::pipe();
        pipe.atomic();

        if let Some(previous) = previous {
            for tag in &previous.tags {
                pipe.srem(self.tag_subscriptions_key(tag), &subscription.id)
                    .ignore();
            }
        }

        pipe.set(&key, json).ignore();

        for tag in &subscription.tags {
            pipe.sadd(self.tags_key(), tag).ignore();
            pipe.sadd(self.tag_subscriptions_key(tag), &subscription.id)
                .ignore();
        }

        let mut conn = self.connection.clone();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| storage_error(&format!("save subscription '{}'", subscription.id), e))?;

        Ok(())
    }
}
