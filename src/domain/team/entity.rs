//! Team entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{
    TeamValidationError, validate_team_description, validate_team_id, validate_team_name,
};

/// Team identifier - alphanumeric + hyphens, max 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    /// Create a new TeamId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, TeamValidationError> {
        let id = id.into();
        validate_team_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random identifier. Uniqueness is left to the UUID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamId {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(id: TeamId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload for creating or updating a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl TeamRequest {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Team entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier
    id: TeamId,
    /// Display name
    name: String,
    /// Description
    #[serde(default)]
    description: String,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team
    pub fn new(id: TeamId, name: impl Into<String>) -> Result<Self, TeamValidationError> {
        let name = name.into();
        validate_team_name(&name)?;
        let now = Utc::now();

        Ok(Self {
            id,
            name,
            description: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Build a team from a request payload
    pub fn from_request(id: TeamId, request: TeamRequest) -> Result<Self, TeamValidationError> {
        let mut team = Self::new(id, request.name)?;
        team.set_description(request.description)?;
        Ok(team)
    }

    // Getters

    pub fn id(&self) -> &TeamId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Replace name and description from a request, keeping identity and creation time
    pub fn apply(&mut self, request: TeamRequest) -> Result<(), TeamValidationError> {
        validate_team_name(&request.name)?;
        validate_team_description(&request.description)?;
        self.name = request.name;
        self.description = request.description;
        self.touch();
        Ok(())
    }

    /// Update the description
    pub fn set_description(
        &mut self,
        description: impl Into<String>,
    ) -> Result<(), TeamValidationError> {
        let description = description.into();
        validate_team_description(&description)?;
        self.description = description;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
