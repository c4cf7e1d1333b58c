//! User domain module
//!
//! Users are owned by the authentication layer; this crate only needs their
//! identifiers to index membership.

mod entity;
mod validation;

pub use entity::UserId;
pub use validation::{UserValidationError, validate_user_id};
