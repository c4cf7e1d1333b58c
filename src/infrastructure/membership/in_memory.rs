//! In-memory membership store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::membership::{
    MembershipBatch, MembershipStore, TeamMembers, UserTeams, Version, Versioned,
};
use crate::domain::team::{Team, TeamId};
use crate::domain::user::UserId;

#[derive(Debug, Default)]
struct State {
    teams: HashMap<TeamId, Team>,
    team_users: HashMap<TeamId, TeamMembers>,
    user_teams: HashMap<UserId, UserTeams>,
}

/// Thread-safe in-memory membership store
///
/// All records sit behind one lock, so a batch is checked and applied under a
/// single write guard. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    state: RwLock<State>,
}

impl InMemoryMembershipStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a team with members, writing both indexes directly.
    /// Skips every consistency check.
    #[cfg(test)]
    pub fn with_team(self, team: Team, members: &[UserId]) -> Self {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            let team_id = team.id().clone();

            for user_id in members {
                let entry = state
                    .user_teams
                    .entry(user_id.clone())
                    .or_insert_with(|| Versioned::new(Default::default(), Version::new(1)));
                entry.value.insert(team_id.clone());
            }

            state.team_users.insert(
                team_id.clone(),
                Versioned::new(members.iter().cloned().collect(), Version::new(1)),
            );
            state.teams.insert(team_id, team);
        }
        self
    }

    /// Overwrite a user's team list directly.
    #[cfg(test)]
    pub fn with_user_teams(self, user_id: UserId, teams: &[TeamId]) -> Self {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            let version = state
                .user_teams
                .get(&user_id)
                .map(|record| record.version.next())
                .unwrap_or(Version::new(1));

            state.user_teams.insert(
                user_id,
                Versioned::new(teams.iter().cloned().collect(), version),
            );
        }
        self
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, DomainError> {
        self.state
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

fn stored_version<K, V>(records: &HashMap<K, Versioned<V>>, key: &K) -> Version
where
    K: std::hash::Hash + Eq,
{
    records
        .get(key)
        .map(|record| record.version)
        .unwrap_or(Version::ABSENT)
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn get_team(&self, team_id: &TeamId) -> Result<Option<Team>, DomainError> {
        Ok(self.read()?.teams.get(team_id).cloned())
    }

    async fn save_team(&self, team: &Team) -> Result<(), DomainError> {
        self.write()?.teams.insert(team.id().clone(), team.clone());
        Ok(())
    }

    async fn get_team_users(&self, team_id: &TeamId) -> Result<Option<TeamMembers>, DomainError> {
        Ok(self.read()?.team_users.get(team_id).cloned())
    }

    async fn get_user_teams(&self, user_id: &UserId) -> Result<Option<UserTeams>, DomainError> {
        Ok(self.read()?.user_teams.get(user_id).cloned())
    }

    async fn save_teams_and_users(&self, batch: MembershipBatch) -> Result<(), DomainError> {
        let mut state = self.write()?;

        let current = stored_version(&state.team_users, &batch.team_id);
        if current != batch.members.version {
            return Err(DomainError::conflict(format!(
                "team users {} changed since read ({} != {})",
                batch.team_id, current, batch.members.version
            )));
        }

        for (user_id, teams) in &batch.user_teams {
            let current = stored_version(&state.user_teams, user_id);
            if current != teams.version {
                return Err(DomainError::conflict(format!(
                    "user teams {} changed since read ({} != {})",
                    user_id, current, teams.version
                )));
            }
        }

        let MembershipBatch {
            team_id,
            members,
            user_teams,
        } = batch;

        state.team_users.insert(
            team_id,
            Versioned::new(members.value, members.version.next()),
        );

        for (user_id, teams) in user_teams {
            state
                .user_teams
                .insert(user_id, Versioned::new(teams.value, teams.version.next()));
        }

        Ok(())
    }
}
