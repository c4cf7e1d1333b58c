//! Tag store adapters and service

mod in_memory;
mod redis;
mod service;

pub use in_memory::InMemoryTagStore;
pub use redis::RedisTagStore;
pub use service::TagService;
