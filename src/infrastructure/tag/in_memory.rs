//! In-memory tag store

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::tag::{Subscription, TagStore};

#[derive(Debug, Default)]
struct State {
    /// tag -> trigger IDs
    tags: BTreeMap<String, BTreeSet<String>>,
    subscriptions: HashMap<String, Subscription>,
}

/// Thread-safe in-memory tag store
#[derive(Debug, Default)]
pub struct InMemoryTagStore {
    state: RwLock<State>,
}

impl InMemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, DomainError> {
        self.state
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl TagStore for InMemoryTagStore {
    async fn tag_names(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.read()?.tags.keys().cloned().collect())
    }

    async fn tag_trigger_ids(&self, tag: &str) -> Result<Vec<String>, DomainError> {
        Ok(self
            .read()?
            .tags
            .get(tag)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn tags_subscriptions(&self, tags: &[String]) -> Result<Vec<Subscription>, DomainError> {
        let state = self.read()?;
        let mut result: Vec<Subscription> = state
            .subscriptions
            .values()
            .filter(|sub| tags.iter().any(|tag| sub.has_tag(tag)))
            .cloned()
            .collect();

        result.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(result)
    }

    async fn delete_tag(&self, tag: &str) -> Result<(), DomainError> {
        let mut state = self.write()?;
        state.tags.remove(tag);

        for sub in state.subscriptions.values_mut() {
            sub.tags.retain(|t| t != tag);
        }

        Ok(())
    }

    async fn save_trigger_tags(
        &self,
        trigger_id: &str,
        tags: &[String],
    ) -> Result<(), DomainError> {
        let mut state = self.write()?;

        for ids in state.tags.values_mut() {
            ids.remove(trigger_id);
        }

        for tag in tags {
            state
                .tags
                .entry(tag.clone())
                .or_default()
                .insert(trigger_id.to_string());
        }

        Ok(())
    }

    async fn save_subscription(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut state = self.write()?;

        for tag in &subscription.tags {
            state.tags.entry(tag.clone()).or_default();
        }

        state
            .subscriptions
            .insert(subscription.id.clone(), subscription.clone());
        Ok(())
    }
}
