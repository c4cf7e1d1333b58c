//! CLI module for team membership
//!
//! Every subcommand runs one operation against the configured store and
//! prints the result as JSON on stdout.

mod commands;

pub use commands::run;

use clap::{Parser, Subcommand};

/// Team membership - keep team and user indexes consistent
#[derive(Parser)]
#[command(name = "team-membership")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a team under a generated ID
    CreateTeam {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Replace a team's name and description
    UpdateTeam {
        team_id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show a team record
    GetTeam { team_id: String },

    /// List the members of a team
    TeamUsers { team_id: String },

    /// List the teams of a user
    UserTeams { user_id: String },

    /// Add users to a team
    AddUsers {
        team_id: String,
        #[arg(required = true)]
        user_ids: Vec<String>,
    },

    /// Remove a user from a team
    RemoveUser { team_id: String, user_id: String },

    /// Report members whose team list does not mention the team
    VerifyTeam { team_id: String },

    /// List all tag names
    Tags,

    /// Show trigger and subscription usage per tag
    TagStats,

    /// Delete a tag that no trigger uses
    DeleteTag { tag: String },
}
