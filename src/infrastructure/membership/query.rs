//! Read helpers shared by the public read API and the mutation engine

use std::sync::Arc;

use crate::domain::DomainError;
use crate::domain::membership::{MembershipStore, TeamMembers, UserTeams};
use crate::domain::team::{Team, TeamId};
use crate::domain::user::UserId;

/// Point reads with caller-facing error messages.
///
/// A missing key becomes `NotFound` naming the requested ID; any other store
/// failure becomes `Internal`.
#[derive(Debug, Clone)]
pub struct MembershipQuery {
    store: Arc<dyn MembershipStore>,
}

impl MembershipQuery {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn MembershipStore> {
        &self.store
    }

    /// Get a team record
    pub async fn team(&self, team_id: &TeamId) -> Result<Team, DomainError> {
        self.store
            .get_team(team_id)
            .await
            .map_err(|e| e.into_internal("cannot get team from database"))?
            .ok_or_else(|| DomainError::not_found(format!("cannot find team: {}", team_id)))
    }

    /// Get a team's members; an existing team with no members yields an empty list
    pub async fn team_users(&self, team_id: &TeamId) -> Result<TeamMembers, DomainError> {
        self.store
            .get_team_users(team_id)
            .await
            .map_err(|e| e.into_internal("cannot get team users from database"))?
            .ok_or_else(|| DomainError::not_found(format!("cannot find team users: {}", team_id)))
    }

    /// Get a user's teams
    pub async fn user_teams(&self, user_id: &UserId) -> Result<UserTeams, DomainError> {
        self.find_user_teams(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("cannot find user teams: {}", user_id)))
    }

    /// Get a user's teams, keeping absence distinct from failure
    pub async fn find_user_teams(&self, user_id: &UserId) -> Result<Option<UserTeams>, DomainError> {
        self.store
            .get_user_teams(user_id)
            .await
            .map_err(|e| e.into_internal("cannot get user teams from database"))
    }
}
