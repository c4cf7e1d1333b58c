//! Tag aggregation types

use serde::{Deserialize, Serialize};

/// A notification subscription filtered by tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Subscription {
    pub fn new(id: impl Into<String>, user: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: id.into(),
            user: user.into(),
            tags,
            enabled: true,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Who references a single tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagStatistics {
    pub tag_name: String,
    pub triggers: Vec<String>,
    pub subscriptions: Vec<Subscription>,
}
