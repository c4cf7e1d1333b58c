//! Tag listing, deletion and statistics

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::domain::DomainError;
use crate::domain::tag::{TagStatistics, TagStore};

/// Tag service over a tag store
#[derive(Debug, Clone)]
pub struct TagService {
    store: Arc<dyn TagStore>,
}

impl TagService {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }

    /// All tag names
    pub async fn all_tags(&self) -> Result<Vec<String>, DomainError> {
        self.store
            .tag_names()
            .await
            .map_err(|e| e.into_internal("cannot get tag names from database"))
    }

    /// Delete a tag that no trigger uses any more
    pub async fn delete_tag(&self, tag: &str) -> Result<String, DomainError> {
        info!(tag = %tag, "Deleting tag");

        let triggers = self
            .store
            .tag_trigger_ids(tag)
            .await
            .map_err(|e| e.into_internal("cannot get tag triggers from database"))?;

        if !triggers.is_empty() {
            return Err(DomainError::invalid_request(format!(
                "This tag is assigned to {} triggers. Remove tag from triggers first",
                triggers.len()
            )));
        }

        self.store
            .delete_tag(tag)
            .await
            .map_err(|e| e.into_internal("cannot delete tag"))?;

        Ok("tag deleted".to_string())
    }

    /// Triggers and subscriptions referencing each tag, in tag order.
    ///
    /// A failed per-tag read is logged and reported as an empty list rather
    /// than failing the whole report.
    pub async fn statistics(&self) -> Result<Vec<TagStatistics>, DomainError> {
        let names = self.all_tags().await?;

        let stats = names.into_iter().map(|tag_name| async move {
            let subscriptions = self
                .store
                .tags_subscriptions(std::slice::from_ref(&tag_name))
                .await
                .unwrap_or_else(|e| {
                    warn!(tag = %tag_name, error = %e, "Failed to read tag subscriptions");
                    Vec::new()
                });

            let triggers = self
                .store
                .tag_trigger_ids(&tag_name)
                .await
                .unwrap_or_else(|e| {
                    warn!(tag = %tag_name, error = %e, "Failed to read tag triggers");
                    Vec::new()
                });

            TagStatistics {
                tag_name,
                triggers,
                subscriptions,
            }
        });

        Ok(join_all(stats).await)
    }
}
