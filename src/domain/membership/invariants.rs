//! Bidirectional membership checks

use serde::Serialize;

use crate::domain::team::TeamId;
use crate::domain::user::UserId;

/// A broken link between the forward and reverse index of one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    /// The member has no team list at all
    MissingTeamList { team_id: TeamId, user_id: UserId },
    /// The member's team list does not name the team
    MissingReverseEntry { team_id: TeamId, user_id: UserId },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTeamList { team_id, user_id } => {
                write!(f, "member {} of team {} has no team list", user_id, team_id)
            }
            Self::MissingReverseEntry { team_id, user_id } => {
                write!(
                    f,
                    "member {} of team {} does not list the team",
                    user_id, team_id
                )
            }
        }
    }
}
