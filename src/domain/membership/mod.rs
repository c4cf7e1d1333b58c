//! Membership domain
//!
//! Team membership is stored twice: team -> users (forward index) and
//! user -> teams (reverse index). A user is in a team's member list exactly
//! when the team is in that user's team list. Both lists are ordered sets and
//! every record is versioned so a mutation can detect concurrent writers.

mod invariants;
mod member_set;
mod store;
mod version;

pub use invariants::InvariantViolation;
pub use member_set::{DuplicateMember, MemberSet};
pub use store::MembershipStore;
pub use version::{MembershipBatch, TeamMembers, UserTeams, Version, Versioned};

#[cfg(test)]
pub use store::MockMembershipStore;
