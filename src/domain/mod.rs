//! Domain layer - Core entities, store contracts and errors

pub mod error;
pub mod membership;
pub mod tag;
pub mod team;
pub mod user;

pub use error::{DomainError, ErrorClass};
