//! Redis membership store

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::membership::{
    MemberSet, MembershipBatch, MembershipStore, TeamMembers, UserTeams, Version, Versioned,
};
use crate::domain::team::{Team, TeamId};
use crate::domain::user::UserId;

/// Checks every record version, then writes every record.
///
/// KEYS: list records. ARGV: expected version and JSON items per key, in
/// key order. Returns 0 on success or the 1-based index of the first stale
/// key. A script runs without interleaving, which makes the batch atomic.
const SAVE_BATCH_SCRIPT: &str = r"
for i = 1, #KEYS do
  local current = tonumber(redis.call('HGET', KEYS[i], 'version') or '0')
  if current ~= tonumber(ARGV[i * 2 - 1]) then
    return i
  end
end
for i = 1, #KEYS do
  local current = tonumber(redis.call('HGET', KEYS[i], 'version') or '0')
  redis.call('HSET', KEYS[i], 'items', ARGV[i * 2], 'version', current + 1)
end
return 0
";

/// Configuration for the Redis store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout_secs: 5,
        }
    }
}

impl RedisStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

/// Opens a managed connection with the configured timeout
pub(crate) async fn connect(config: &RedisStoreConfig) -> Result<ConnectionManager, DomainError> {
    let client = Client::open(config.url.as_str())
        .map_err(|e| DomainError::storage(format!("Failed to create Redis client: {}", e)))?;

    tokio::time::timeout(config.connection_timeout(), ConnectionManager::new(client))
        .await
        .map_err(|_| {
            DomainError::storage(format!(
                "Timed out connecting to Redis after {}s",
                config.connection_timeout_secs
            ))
        })?
        .map_err(|e| DomainError::storage(format!("Failed to connect to Redis: {}", e)))
}

pub(crate) fn prefixed(prefix: &Option<String>, key: String) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, key),
        None => key,
    }
}

/// Redis membership store
///
/// Layout:
/// - `team:{id}` string holding the team record as JSON
/// - `team-users:{id}` hash `{items, version}`, items a JSON list of user IDs
/// - `user-teams:{id}` hash `{items, version}`, items a JSON list of team IDs
#[derive(Clone)]
pub struct RedisMembershipStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
    save_script: Script,
}

impl fmt::Debug for RedisMembershipStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisMembershipStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisMembershipStore {
    /// Connects to Redis
    pub async fn new(config: RedisStoreConfig) -> Result<Self, DomainError> {
        let connection = connect(&config).await?;

        Ok(Self {
            connection,
            config,
            save_script: Script::new(SAVE_BATCH_SCRIPT),
        })
    }

    fn team_key(&self, team_id: &TeamId) -> String {
        prefixed(&self.config.key_prefix, format!("team:{}", team_id))
    }

    fn team_users_key(&self, team_id: &TeamId) -> String {
        prefixed(&self.config.key_prefix, format!("team-users:{}", team_id))
    }

    fn user_teams_key(&self, user_id: &UserId) -> String {
        prefixed(&self.config.key_prefix, format!("user-teams:{}", user_id))
    }

    async fn read_list<T>(&self, key: &str) -> Result<Option<Versioned<MemberSet<T>>>, DomainError>
    where
        T: DeserializeOwned + Eq + std::hash::Hash + Clone + fmt::Display,
    {
        let mut conn = self.connection.clone();

        let (items, version): (Option<String>, Option<u64>) = redis::cmd("HMGET")
            .arg(key)
            .arg("items")
            .arg("version")
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read '{}': {}", key, e)))?;

        let Some(items) = items else {
            return Ok(None);
        };

        let set: MemberSet<T> = serde_json::from_str(&items)
            .map_err(|e| DomainError::storage(format!("Corrupt record '{}': {}", key, e)))?;

        Ok(Some(Versioned::new(
            set,
            Version::new(version.unwrap_or_default()),
        )))
    }
}

fn encode<T: serde::Serialize>(key: &str, value: &T) -> Result<String, DomainError> {
    serde_json::to_string(value)
        .map_err(|e| DomainError::storage(format!("Failed to encode '{}': {}", key, e)))
}

#[async_trait]
impl MembershipStore for RedisMembershipStore {
    async fn get_team(&self, team_id: &TeamId) -> Result<Option<Team>, DomainError> {
        let key = self.team_key(team_id);
        let mut conn = self.connection.clone();

        let raw: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get key '{}': {}", key, e)))?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| DomainError::storage(format!("Corrupt record '{}': {}", key, e)))
        })
        .transpose()
    }

    async fn save_team(&self, team: &Team) -> Result<(), DomainError> {
        let key = self.team_key(team.id());
        let json = encode(&key, team)?;
        let mut conn = self.connection.clone();

        let _: () = conn
            .set(&key, json)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to set key '{}': {}", key, e)))?;

        Ok(())
    }

    async fn get_team_users(&self, team_id: &TeamId) -> Result<Option<TeamMembers>, DomainError> {
        self.read_list(&self.team_users_key(team_id)).await
    }

    async fn get_user_teams(&self, user_id: &UserId) -> Result<Option<UserTeams>, DomainError> {
        self.read_list(&self.user_teams_key(user_id)).await
    }

    async fn save_teams_and_users(&self, batch: MembershipBatch) -> Result<(), DomainError> {
        let mut keys = Vec::with_capacity(batch.user_teams.len() + 1);
        let mut invocation = self.save_script.prepare_invoke();

        let team_key = self.team_users_key(&batch.team_id);
        invocation
            .key(&team_key)
            .arg(batch.members.version.get())
            .arg(encode(&team_key, &batch.members.value)?);
        keys.push(team_key);

        for (user_id, teams) in &batch.user_teams {
            let key = self.user_teams_key(user_id);
            invocation
                .key(&key)
                .arg(teams.version.get())
                .arg(encode(&key, &teams.value)?);
            keys.push(key);
        }

        let mut conn = self.connection.clone();
        let stale: usize = invocation.invoke_async(&mut conn).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to save users for team '{}': {}",
                batch.team_id, e
            ))
        })?;

        if stale > 0 {
            let key = keys.get(stale - 1).map(String::as_str).unwrap_or("<unknown>");
            return Err(DomainError::conflict(format!(
                "record '{}' changed since read",
                key
            )));
        }

        debug!(team_id = %batch.team_id, records = keys.len(), "Saved membership batch");
        Ok(())
    }
}
