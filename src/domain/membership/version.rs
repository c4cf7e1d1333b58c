//! Record versions for optimistic concurrency

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::member_set::MemberSet;
use crate::domain::team::TeamId;
use crate::domain::user::UserId;

/// Monotonic per-record version. Zero means the record does not exist yet.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub const ABSENT: Version = Version(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_absent(self) -> bool {
        self.0 == 0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A value together with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Version,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: Version) -> Self {
        Self { value, version }
    }

    /// A value for a record that has not been written yet
    pub fn absent(value: T) -> Self {
        Self {
            value,
            version: Version::ABSENT,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Forward index record: team -> members
pub type TeamMembers = Versioned<MemberSet<UserId>>;

/// Reverse index record: user -> teams
pub type UserTeams = Versioned<MemberSet<TeamId>>;

/// Every record touched by one membership mutation.
///
/// Each version is the one observed when the record was read; the store
/// applies the batch only if none of them moved in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipBatch {
    pub team_id: TeamId,
    pub members: TeamMembers,
    pub user_teams: HashMap<UserId, UserTeams>,
}

impl MembershipBatch {
    pub fn new(team_id: TeamId, members: TeamMembers) -> Self {
        Self {
            team_id,
            members,
            user_teams: HashMap::new(),
        }
    }

    pub fn with_user_teams(mut self, user_teams: HashMap<UserId, UserTeams>) -> Self {
        self.user_teams = user_teams;
        self
    }
}
