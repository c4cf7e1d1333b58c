//! Membership store contract

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::version::{MembershipBatch, TeamMembers, UserTeams};
use crate::domain::DomainError;
use crate::domain::team::{Team, TeamId};
use crate::domain::user::UserId;

/// Key-value store holding team records and both membership indexes.
///
/// Reads return `Ok(None)` when the key does not exist; any other failure is
/// a `DomainError::Storage`. Implementations must apply
/// `save_teams_and_users` atomically: every record in the batch is written,
/// or none is.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MembershipStore: Send + Sync + std::fmt::Debug {
    /// Get a team record
    async fn get_team(&self, team_id: &TeamId) -> Result<Option<Team>, DomainError>;

    /// Insert or replace a team record
    async fn save_team(&self, team: &Team) -> Result<(), DomainError>;

    /// Get the ordered member list of a team (forward index)
    async fn get_team_users(&self, team_id: &TeamId) -> Result<Option<TeamMembers>, DomainError>;

    /// Get the teams a user belongs to (reverse index)
    async fn get_user_teams(&self, user_id: &UserId) -> Result<Option<UserTeams>, DomainError>;

    /// Atomically replace a team's member list and the team lists of every
    /// affected user.
    ///
    /// Fails with `DomainError::Conflict`, writing nothing, when any record's
    /// stored version differs from the version carried in the batch.
    async fn save_teams_and_users(&self, batch: MembershipBatch) -> Result<(), DomainError>;
}
