//! Store factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::config::StoreConfig;
use crate::domain::DomainError;
use crate::domain::membership::MembershipStore;
use crate::domain::tag::TagStore;
use crate::infrastructure::membership::{InMemoryMembershipStore, RedisMembershipStore};
use crate::infrastructure::tag::{InMemoryTagStore, RedisTagStore};

/// Supported store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory store (for testing/development)
    InMemory,
    /// Redis store
    Redis,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "redis" => Some(Self::Redis),
            _ => None,
        }
    }
}

/// The stores every service is built from
#[derive(Debug, Clone)]
pub struct Stores {
    pub membership: Arc<dyn MembershipStore>,
    pub tags: Arc<dyn TagStore>,
}

/// Factory for creating store instances
#[derive(Debug)]
pub struct StoreFactory;

impl StoreFactory {
    /// Creates the stores selected by the configuration
    pub async fn create(config: &StoreConfig) -> Result<Stores, DomainError> {
        let backend = StoreBackend::from_str(&config.backend).ok_or_else(|| {
            DomainError::configuration(format!("Unknown store backend: {}", config.backend))
        })?;

        info!(?backend, "Creating stores");

        match backend {
            StoreBackend::InMemory => Ok(Self::create_in_memory()),
            StoreBackend::Redis => {
                let membership = RedisMembershipStore::new(config.redis.clone()).await?;
                let tags = RedisTagStore::new(config.redis.clone()).await?;

                Ok(Stores {
                    membership: Arc::new(membership),
                    tags: Arc::new(tags),
                })
            }
        }
    }

    /// Creates empty in-memory stores
    pub fn create_in_memory() -> Stores {
        Stores {
            membership: Arc::new(InMemoryMembershipStore::new()),
            tags: Arc::new(InMemoryTagStore::new()),
        }
    }
}
