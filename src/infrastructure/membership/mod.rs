//! Membership store adapters and the consistency engine

mod in_memory;
mod query;
mod redis;
mod service;

pub use in_memory::InMemoryMembershipStore;
pub use query::MembershipQuery;
pub use redis::{RedisMembershipStore, RedisStoreConfig};
pub use service::MembershipService;

pub(crate) use redis::{connect as connect_redis, prefixed as prefixed_key};
