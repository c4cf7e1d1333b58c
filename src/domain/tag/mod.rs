//! Tag domain
//!
//! Tags link triggers and subscriptions; the statistics report is a
//! read-only fan-out over these indexes.

mod entity;
mod store;

pub use entity::{Subscription, TagStatistics};
pub use store::TagStore;

#[cfg(test)]
pub use store::MockTagStore;
