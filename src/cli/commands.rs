//! Subcommand dispatch

use serde::Serialize;
use tracing::error;

use super::Command;
use crate::Services;
use crate::domain::DomainError;
use crate::domain::team::{TeamId, TeamRequest};
use crate::domain::user::UserId;

/// Execute a subcommand and print its result
pub async fn run(command: Command, services: &Services) -> anyhow::Result<()> {
    match execute(command, services).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!(class = ?e.class(), "{}", e);
            Err(e.into())
        }
    }
}

async fn execute(command: Command, services: &Services) -> Result<String, DomainError> {
    match command {
        Command::CreateTeam { name, description } => {
            let team = services
                .teams
                .create(TeamRequest::new(name, description))
                .await?;
            to_json(&team)
        }
        Command::UpdateTeam {
            team_id,
            name,
            description,
        } => {
            let team = services
                .teams
                .update(&team_id_arg(team_id)?, TeamRequest::new(name, description))
                .await?;
            to_json(&team)
        }
        Command::GetTeam { team_id } => {
            let team = services.teams.get(&team_id_arg(team_id)?).await?;
            to_json(&team)
        }
        Command::TeamUsers { team_id } => {
            let users = services
                .membership
                .query()
                .team_users(&team_id_arg(team_id)?)
                .await?;
            to_json(&users.value)
        }
        Command::UserTeams { user_id } => {
            let teams = services
                .membership
                .query()
                .user_teams(&user_id_arg(user_id)?)
                .await?;
            to_json(&teams.value)
        }
        Command::AddUsers { team_id, user_ids } => {
            let user_ids = user_ids
                .into_iter()
                .map(user_id_arg)
                .collect::<Result<Vec<_>, _>>()?;
            let members = services
                .membership
                .add_team_users(&team_id_arg(team_id)?, &user_ids)
                .await?;
            to_json(&members)
        }
        Command::RemoveUser { team_id, user_id } => {
            let members = services
                .membership
                .remove_team_user(&team_id_arg(team_id)?, &user_id_arg(user_id)?)
                .await?;
            to_json(&members)
        }
        Command::VerifyTeam { team_id } => {
            let violations = services
                .membership
                .verify_team(&team_id_arg(team_id)?)
                .await?;
            to_json(&violations)
        }
        Command::Tags => to_json(&services.tags.all_tags().await?),
        Command::TagStats => to_json(&services.tags.statistics().await?),
        Command::DeleteTag { tag } => to_json(&services.tags.delete_tag(&tag).await?),
    }
}

fn team_id_arg(id: String) -> Result<TeamId, DomainError> {
    TeamId::new(id).map_err(|e| DomainError::invalid_request(e.to_string()))
}

fn user_id_arg(id: String) -> Result<UserId, DomainError> {
    UserId::new(id).map_err(|e| DomainError::invalid_request(e.to_string()))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DomainError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DomainError::internal(format!("cannot encode output: {}", e)))
}
