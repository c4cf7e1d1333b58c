//! Team membership
//!
//! Keeps two indexes over a key-value store consistent with each other:
//! - team -> ordered list of member users
//! - user -> list of teams the user belongs to
//!
//! Every mutation writes both sides in one compare-and-swap batch, so a
//! concurrent writer makes the batch fail with a conflict instead of
//! silently overwriting.

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use infrastructure::{
    membership::MembershipService,
    storage::{StoreFactory, Stores},
    tag::TagService,
    team::TeamService,
};
use tracing::info;

/// Services sharing one set of stores
#[derive(Debug, Clone)]
pub struct Services {
    pub teams: TeamService,
    pub membership: MembershipService,
    pub tags: TagService,
}

impl Services {
    pub fn new(stores: Stores) -> Self {
        Self {
            teams: TeamService::new(stores.membership.clone()),
            membership: MembershipService::new(stores.membership),
            tags: TagService::new(stores.tags),
        }
    }

    /// Services over fresh in-memory stores
    pub fn in_memory() -> Self {
        Self::new(StoreFactory::create_in_memory())
    }
}

/// Create the services with the store selected by the configuration
pub async fn create_services(config: &AppConfig) -> anyhow::Result<Services> {
    info!(backend = %config.store.backend, "Initializing services");

    let stores = StoreFactory::create(&config.store).await?;

    Ok(Services::new(stores))
}
