//! Tag store contract

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::Subscription;
use crate::domain::DomainError;

/// Read and write access to the tag indexes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TagStore: Send + Sync + std::fmt::Debug {
    /// All known tag names
    async fn tag_names(&self) -> Result<Vec<String>, DomainError>;

    /// IDs of triggers carrying the tag
    async fn tag_trigger_ids(&self, tag: &str) -> Result<Vec<String>, DomainError>;

    /// Subscriptions matching any of the given tags, each returned once
    async fn tags_subscriptions(&self, tags: &[String]) -> Result<Vec<Subscription>, DomainError>;

    /// Remove a tag name and its indexes
    async fn delete_tag(&self, tag: &str) -> Result<(), DomainError>;

    /// Record the tags of a trigger, registering unknown tag names
    async fn save_trigger_tags(&self, trigger_id: &str, tags: &[String])
    -> Result<(), DomainError>;

    /// Insert or replace a subscription and index it by its tags
    async fn save_subscription(&self, subscription: &Subscription) -> Result<(), DomainError>;
}
