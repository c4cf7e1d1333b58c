//! Team service for team records

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::DomainError;
use crate::domain::membership::{MemberSet, MembershipBatch, MembershipStore, Versioned};
use crate::domain::team::{Team, TeamId, TeamRequest};
use crate::infrastructure::membership::MembershipQuery;

/// Team service for creating, updating and reading teams
#[derive(Debug, Clone)]
pub struct TeamService {
    query: MembershipQuery,
}

impl TeamService {
    /// Create a new team service
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self {
            query: MembershipQuery::new(store),
        }
    }

    /// Create a new team under a freshly generated ID.
    ///
    /// The team starts with an empty member list so users can be added
    /// right away. The list is written before the team record: a team is
    /// never visible without its member list, and a failed create leaves at
    /// most an empty list under an ID nobody holds.
    pub async fn create(&self, request: TeamRequest) -> Result<Team, DomainError> {
        let team_id = TeamId::generate();
        info!(id = %team_id, name = %request.name, "Creating team");

        let team = Team::from_request(team_id.clone(), request)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let members = MembershipBatch::new(team_id, Versioned::absent(MemberSet::new()));
        self.query
            .store()
            .save_teams_and_users(members)
            .await
            .map_err(|e| e.into_internal(format!("cannot save users for team: {}", team.id())))?;

        self.query
            .store()
            .save_team(&team)
            .await
            .map_err(|e| e.into_internal("cannot save team"))?;

        debug!(id = %team.id(), "Team created");
        Ok(team)
    }

    /// Get a team by ID
    pub async fn get(&self, team_id: &TeamId) -> Result<Team, DomainError> {
        self.query.team(team_id).await
    }

    /// Replace the name and description of an existing team
    pub async fn update(&self, team_id: &TeamId, request: TeamRequest) -> Result<Team, DomainError> {
        info!(id = %team_id, "Updating team");

        let mut team = self.query.team(team_id).await?;

        team.apply(request)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        self.query
            .store()
            .save_team(&team)
            .await
            .map_err(|e| e.into_internal("cannot save team"))?;

        Ok(team)
    }
}
