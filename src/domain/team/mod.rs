//! Team domain module
//!
//! A team is a named group of users. Membership itself lives in the
//! membership module; a team record only carries identity and display data.

mod entity;
mod validation;

pub use entity::{Team, TeamId, TeamRequest};
pub use validation::{
    TeamValidationError, validate_team_description, validate_team_id, validate_team_name,
};
