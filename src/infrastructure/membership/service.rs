//! Membership consistency engine
//!
//! Every mutation reads the current forward and reverse records, stages the
//! full new state in memory, validates it, and hands it to the store as one
//! atomic batch guarded by the versions it read. Nothing is written unless
//! the whole mutation is valid.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::query::MembershipQuery;
use crate::domain::DomainError;
use crate::domain::membership::{
    InvariantViolation, MemberSet, MembershipBatch, MembershipStore, UserTeams, Versioned,
};
use crate::domain::team::TeamId;
use crate::domain::user::UserId;

/// Adds and removes users from teams while keeping both indexes in step
#[derive(Debug, Clone)]
pub struct MembershipService {
    query: MembershipQuery,
}

impl MembershipService {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self {
            query: MembershipQuery::new(store),
        }
    }

    /// Read helpers backed by the same store
    pub fn query(&self) -> &MembershipQuery {
        &self.query
    }

    /// Add users to a team.
    ///
    /// Existing members keep their order and new users follow in input order.
    /// Returns the final member list.
    pub async fn add_team_users(
        &self,
        team_id: &TeamId,
        new_users: &[UserId],
    ) -> Result<Vec<UserId>, DomainError> {
        info!(team_id = %team_id, count = new_users.len(), "Adding users to team");

        self.query.team(team_id).await?;
        let existing = self.query.team_users(team_id).await?;
        let mut teams_map = self.load_member_teams(&existing.value).await?;

        let mut members = existing.value.clone();

        for user_id in new_users {
            if teams_map.contains_key(user_id) {
                return Err(DomainError::invalid_request(format!(
                    "one or many users you specified already exist in this team: {}",
                    user_id
                )));
            }

            let mut user_teams = self
                .query
                .find_user_teams(user_id)
                .await?
                .unwrap_or_else(|| Versioned::absent(MemberSet::new()));

            if !user_teams.value.insert(team_id.clone()) {
                return Err(DomainError::invalid_request(format!(
                    "cannot save new team for user: {}, team already exists in user teams: {}",
                    user_id, team_id
                )));
            }

            teams_map.insert(user_id.clone(), user_teams);
            members.insert(user_id.clone());
        }

        let batch = MembershipBatch::new(team_id.clone(), Versioned::new(members, existing.version))
            .with_user_teams(teams_map);
        let result = batch.members.value.as_slice().to_vec();

        self.save(batch).await?;

        debug!(team_id = %team_id, members = result.len(), "Team users added");
        Ok(result)
    }

    /// Remove a user from a team.
    ///
    /// Remaining members keep their relative order; the user's own team list
    /// may be reordered. Returns the final member list.
    pub async fn remove_team_user(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> Result<Vec<UserId>, DomainError> {
        info!(team_id = %team_id, user_id = %user_id, "Removing user from team");

        self.query.team(team_id).await?;
        let existing = self.query.team_users(team_id).await?;

        if !existing.value.contains(user_id) {
            return Err(DomainError::not_found(format!(
                "user that you specified not found in this team: {}",
                user_id
            )));
        }

        let mut teams_map = self.load_member_teams(&existing.value).await?;

        let removed = teams_map
            .get_mut(user_id)
            .map(|user_teams| user_teams.value.swap_remove(team_id))
            .unwrap_or(false);

        if !removed {
            return Err(DomainError::internal(format!(
                "cannot remove team from user: cannot find team in user teams: {}",
                team_id
            )));
        }

        let mut members = existing.value.clone();
        members.shift_remove(user_id);

        let batch = MembershipBatch::new(team_id.clone(), Versioned::new(members, existing.version))
            .with_user_teams(teams_map);
        let result = batch.members.value.as_slice().to_vec();

        self.save(batch).await?;

        debug!(team_id = %team_id, members = result.len(), "Team user removed");
        Ok(result)
    }

    /// Check that every member of a team lists the team in its own team list.
    ///
    /// Read-only. Returns the violations found, empty when consistent.
    pub async fn verify_team(
        &self,
        team_id: &TeamId,
    ) -> Result<Vec<InvariantViolation>, DomainError> {
        self.query.team(team_id).await?;
        let members = self.query.team_users(team_id).await?;
        let mut violations = Vec::new();

        for user_id in &members.value {
            match self.query.find_user_teams(user_id).await? {
                None => violations.push(InvariantViolation::MissingTeamList {
                    team_id: team_id.clone(),
                    user_id: user_id.clone(),
                }),
                Some(teams) if !teams.value.contains(team_id) => {
                    violations.push(InvariantViolation::MissingReverseEntry {
                        team_id: team_id.clone(),
                        user_id: user_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        if !violations.is_empty() {
            warn!(team_id = %team_id, violations = violations.len(), "Team membership is inconsistent");
        }

        Ok(violations)
    }

    /// Load the team list of every current member.
    /// A member without a team list means the indexes are already broken.
    async fn load_member_teams(
        &self,
        members: &MemberSet<UserId>,
    ) -> Result<HashMap<UserId, UserTeams>, DomainError> {
        let mut teams_map = HashMap::with_capacity(members.len());

        for user_id in members {
            let user_teams = self.query.find_user_teams(user_id).await?.ok_or_else(|| {
                DomainError::internal(format!("cannot find user teams: {}", user_id))
            })?;
            teams_map.insert(user_id.clone(), user_teams);
        }

        Ok(teams_map)
    }

    async fn save(&self, batch: MembershipBatch) -> Result<(), DomainError> {
        let team_id = batch.team_id.clone();

        self.query
            .store()
            .save_teams_and_users(batch)
            .await
            .map_err(|e| e.into_internal(format!("cannot save users for team: {}", team_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::membership::{MockMembershipStore, Version};
    use crate::domain::team::Team;
    use crate::infrastructure::membership::InMemoryMembershipStore;
    use mockall::{Sequence, predicate::eq};

    const TEAM: &str = "testTeam";

    fn team_id(id: &str) -> TeamId {
        TeamId::new(id).unwrap()
    }

    fn user_id(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn users(ids: &[&str]) -> Vec<UserId> {
        ids.iter().map(|id| user_id(id)).collect()
    }

    fn teams(ids: &[&str]) -> MemberSet<TeamId> {
        ids.iter().map(|id| team_id(id)).collect()
    }

    fn team() -> Team {
        Team::new(team_id(TEAM), "Test Team").unwrap()
    }

    fn expect_team(store: &mut MockMembershipStore, seq: &mut Sequence) {
        store
            .expect_get_team()
            .with(eq(team_id(TEAM)))
            .times(1)
            .in_sequence(seq)
            .returning(|_| Ok(Some(team())));
    }

    fn expect_team_users(store: &mut MockMembershipStore, seq: &mut Sequence, ids: &[&str]) {
        let members: MemberSet<UserId> = users(ids).into_iter().collect();
        store
            .expect_get_team_users()
            .with(eq(team_id(TEAM)))
            .times(1)
            .in_sequence(seq)
            .returning(move |_| Ok(Some(Versioned::new(members.clone(), Version::new(3)))));
    }

    fn expect_user_teams(
        store: &mut MockMembershipStore,
        seq: &mut Sequence,
        user: &str,
        result: Result<Option<UserTeams>, DomainError>,
    ) {
        store
            .expect_get_user_teams()
            .with(eq(user_id(user)))
            .times(1)
            .in_sequence(seq)
            .returning(move |_| result.clone());
    }

    fn on_team(version: u64) -> Result<Option<UserTeams>, DomainError> {
        Ok(Some(Versioned::new(teams(&[TEAM]), Version::new(version))))
    }

    fn seeded_store() -> Arc<InMemoryMembershipStore> {
        Arc::new(InMemoryMembershipStore::new().with_team(team(), &users(&["a", "b"])))
    }

    #[tokio::test]
    async fn test_add_successfully() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();

        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &["userID", "userID2"]);
        expect_user_teams(&mut store, &mut seq, "userID", on_team(1));
        expect_user_teams(&mut store, &mut seq, "userID2", on_team(2));
        expect_user_teams(&mut store, &mut seq, "userID3", Ok(None));

        let mut expected_map = HashMap::new();
        expected_map.insert(
            user_id("userID"),
            Versioned::new(teams(&[TEAM]), Version::new(1)),
        );
        expected_map.insert(
            user_id("userID2"),
            Versioned::new(teams(&[TEAM]), Version::new(2)),
        );
        expected_map.insert(user_id("userID3"), Versioned::absent(teams(&[TEAM])));
        let expected = MembershipBatch::new(
            team_id(TEAM),
            Versioned::new(
                users(&["userID", "userID2", "userID3"]).into_iter().collect(),
                Version::new(3),
            ),
        )
        .with_user_teams(expected_map);

        store
            .expect_save_teams_and_users()
            .with(eq(expected))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let service = MembershipService::new(Arc::new(store));
        let result = service
            .add_team_users(&team_id(TEAM), &users(&["userID3"]))
            .await
            .unwrap();

        assert_eq!(result, users(&["userID", "userID2", "userID3"]));
    }

    #[tokio::test]
    async fn test_add_team_not_found() {
        let mut store = MockMembershipStore::new();
        store.expect_get_team().times(1).returning(|_| Ok(None));
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .add_team_users(&team_id(TEAM), &users(&["userID3"]))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::not_found("cannot find team: testTeam"));
    }

    #[tokio::test]
    async fn test_add_team_users_not_found() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        store
            .expect_get_team_users()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .add_team_users(&team_id(TEAM), &users(&["userID3"]))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::not_found("cannot find team users: testTeam"));
    }

    #[tokio::test]
    async fn test_add_existing_member_without_team_list_is_internal() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &["userID", "userID2"]);
        expect_user_teams(&mut store, &mut seq, "userID", Ok(None));
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .add_team_users(&team_id(TEAM), &users(&["userID3"]))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::internal("cannot find user teams: userID"));
    }

    #[tokio::test]
    async fn test_add_user_teams_read_error_is_internal() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &["userID"]);
        expect_user_teams(&mut store, &mut seq, "userID", on_team(1));
        expect_user_teams(
            &mut store,
            &mut seq,
            "userID3",
            Err(DomainError::storage("unexpected error")),
        );
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .add_team_users(&team_id(TEAM), &users(&["userID3"]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::internal(
                "cannot get user teams from database: Storage error: unexpected error"
            )
        );
    }

    #[tokio::test]
    async fn test_add_user_already_exists_writes_nothing() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &["userID", "userID2", "userID3"]);
        expect_user_teams(&mut store, &mut seq, "userID", on_team(1));
        expect_user_teams(&mut store, &mut seq, "userID2", on_team(1));
        expect_user_teams(&mut store, &mut seq, "userID3", on_team(1));
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .add_team_users(&team_id(TEAM), &users(&["userID3"]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::invalid_request(
                "one or many users you specified already exist in this team: userID3"
            )
        );
    }

    #[tokio::test]
    async fn test_add_team_already_in_user_list_is_invalid() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &[]);
        expect_user_teams(&mut store, &mut seq, "userID", on_team(1));
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .add_team_users(&team_id(TEAM), &users(&["userID"]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::invalid_request(
                "cannot save new team for user: userID, team already exists in user teams: testTeam"
            )
        );
    }

    #[tokio::test]
    async fn test_add_save_error_is_propagated() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &[]);
        expect_user_teams(&mut store, &mut seq, "userID", Ok(None));
        store
            .expect_save_teams_and_users()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DomainError::storage("write failed")));

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .add_team_users(&team_id(TEAM), &users(&["userID"]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::internal("cannot save users for team: testTeam: Storage error: write failed")
        );
    }

    #[tokio::test]
    async fn test_add_conflict_is_propagated_as_conflict() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &[]);
        expect_user_teams(&mut store, &mut seq, "userID", Ok(None));
        store
            .expect_save_teams_and_users()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DomainError::conflict("stale")));

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .add_team_users(&team_id(TEAM), &users(&["userID"]))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::conflict("stale"));
    }

    #[tokio::test]
    async fn test_remove_successfully() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &["userID", "userID2", "userID3"]);
        expect_user_teams(&mut store, &mut seq, "userID", on_team(1));
        expect_user_teams(&mut store, &mut seq, "userID2", on_team(1));
        expect_user_teams(&mut store, &mut seq, "userID3", on_team(1));

        let mut expected_map = HashMap::new();
        expected_map.insert(
            user_id("userID"),
            Versioned::new(MemberSet::new(), Version::new(1)),
        );
        expected_map.insert(
            user_id("userID2"),
            Versioned::new(teams(&[TEAM]), Version::new(1)),
        );
        expected_map.insert(
            user_id("userID3"),
            Versioned::new(teams(&[TEAM]), Version::new(1)),
        );
        let expected = MembershipBatch::new(
            team_id(TEAM),
            Versioned::new(
                users(&["userID2", "userID3"]).into_iter().collect(),
                Version::new(3),
            ),
        )
        .with_user_teams(expected_map);

        store
            .expect_save_teams_and_users()
            .with(eq(expected))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let service = MembershipService::new(Arc::new(store));
        let result = service
            .remove_team_user(&team_id(TEAM), &user_id("userID"))
            .await
            .unwrap();

        assert_eq!(result, users(&["userID2", "userID3"]));
    }

    #[tokio::test]
    async fn test_remove_team_not_found() {
        let mut store = MockMembershipStore::new();
        store.expect_get_team().times(1).returning(|_| Ok(None));
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .remove_team_user(&team_id(TEAM), &user_id("userID"))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::not_found("cannot find team: testTeam"));
    }

    #[tokio::test]
    async fn test_remove_team_without_users() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        store
            .expect_get_team_users()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .remove_team_user(&team_id(TEAM), &user_id("userID"))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::not_found("cannot find team users: testTeam"));
    }

    #[tokio::test]
    async fn test_remove_user_not_in_team_names_user() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &["userID2", "userID3"]);
        store.expect_get_user_teams().times(0);
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .remove_team_user(&team_id(TEAM), &user_id("userID"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::not_found("user that you specified not found in this team: userID")
        );
    }

    #[tokio::test]
    async fn test_remove_member_without_team_list_is_internal() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &["userID", "userID2", "userID3"]);
        expect_user_teams(&mut store, &mut seq, "userID", Ok(None));
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .remove_team_user(&team_id(TEAM), &user_id("userID"))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::internal("cannot find user teams: userID"));
    }

    #[tokio::test]
    async fn test_remove_team_missing_from_user_list_is_internal() {
        let mut store = MockMembershipStore::new();
        let mut seq = Sequence::new();
        expect_team(&mut store, &mut seq);
        expect_team_users(&mut store, &mut seq, &["userID"]);
        expect_user_teams(
            &mut store,
            &mut seq,
            "userID",
            Ok(Some(Versioned::new(teams(&["otherTeam"]), Version::new(1)))),
        );
        store.expect_save_teams_and_users().times(0);

        let service = MembershipService::new(Arc::new(store));
        let err = service
            .remove_team_user(&team_id(TEAM), &user_id("userID"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::internal(
                "cannot remove team from user: cannot find team in user teams: testTeam"
            )
        );
    }

    #[tokio::test]
    async fn test_scenario_add_new_user() {
        let store = seeded_store();
        let service = MembershipService::new(store.clone());

        let result = service
            .add_team_users(&team_id(TEAM), &users(&["c"]))
            .await
            .unwrap();

        assert_eq!(result, users(&["a", "b", "c"]));
        for id in ["a", "b", "c"] {
            let user_teams = service.query().user_teams(&user_id(id)).await.unwrap();
            assert_eq!(user_teams.value.as_slice(), &[team_id(TEAM)]);
        }
        assert!(service.verify_team(&team_id(TEAM)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_duplicate_add_leaves_store_untouched() {
        let store = seeded_store();
        let service = MembershipService::new(store.clone());

        let err = service
            .add_team_users(&team_id(TEAM), &users(&["a"]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::invalid_request(
                "one or many users you specified already exist in this team: a"
            )
        );
        let members = service.query().team_users(&team_id(TEAM)).await.unwrap();
        assert_eq!(members.version, Version::new(1));
        assert_eq!(members.value.into_vec(), users(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_repeat_within_request_rejects_whole_batch() {
        let store = seeded_store();
        let service = MembershipService::new(store.clone());

        let err = service
            .add_team_users(&team_id(TEAM), &users(&["c", "d", "c"]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::invalid_request(
                "one or many users you specified already exist in this team: c"
            )
        );
        assert!(service.query().find_user_teams(&user_id("c")).await.unwrap().is_none());
        assert!(service.query().find_user_teams(&user_id("d")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_users_follow_input_order() {
        let store = seeded_store();
        let service = MembershipService::new(store);

        let result = service
            .add_team_users(&team_id(TEAM), &users(&["z", "c", "m"]))
            .await
            .unwrap();

        assert_eq!(result, users(&["a", "b", "z", "c", "m"]));
    }

    #[tokio::test]
    async fn test_remove_keeps_remaining_members() {
        let store = Arc::new(
            InMemoryMembershipStore::new().with_team(team(), &users(&["u1", "u2", "u3"])),
        );
        let service = MembershipService::new(store);

        let result = service
            .remove_team_user(&team_id(TEAM), &user_id("u1"))
            .await
            .unwrap();

        let mut remaining = result.clone();
        remaining.sort();
        assert_eq!(remaining, users(&["u2", "u3"]));

        let u1_teams = service.query().user_teams(&user_id("u1")).await.unwrap();
        assert!(u1_teams.value.is_empty());
    }

    #[tokio::test]
    async fn test_invariant_holds_across_teams() {
        let other = Team::new(team_id("otherTeam"), "Other").unwrap();
        let store = Arc::new(
            InMemoryMembershipStore::new()
                .with_team(team(), &users(&["a"]))
                .with_team(other, &[]),
        );
        let service = MembershipService::new(store);
        let other_id = team_id("otherTeam");

        service.add_team_users(&other_id, &users(&["a", "b"])).await.unwrap();
        service.add_team_users(&team_id(TEAM), &users(&["b"])).await.unwrap();
        service.remove_team_user(&team_id(TEAM), &user_id("a")).await.unwrap();
        service.remove_team_user(&other_id, &user_id("b")).await.unwrap();

        for id in [team_id(TEAM), other_id.clone()] {
            assert!(service.verify_team(&id).await.unwrap().is_empty());
        }

        let a_teams = service.query().user_teams(&user_id("a")).await.unwrap();
        let b_teams = service.query().user_teams(&user_id("b")).await.unwrap();
        assert_eq!(a_teams.value.as_slice(), &[other_id.clone()]);
        assert_eq!(b_teams.value.as_slice(), &[team_id(TEAM)]);
    }

    #[tokio::test]
    async fn test_verify_reports_broken_links() {
        let store = Arc::new(
            InMemoryMembershipStore::new()
                .with_team(team(), &users(&["a", "b"]))
                .with_user_teams(user_id("b"), &[]),
        );
        let service = MembershipService::new(store);

        let violations = service.verify_team(&team_id(TEAM)).await.unwrap();

        assert_eq!(
            violations,
            vec![InvariantViolation::MissingReverseEntry {
                team_id: team_id(TEAM),
                user_id: user_id("b"),
            }]
        );
    }

    #[tokio::test]
    async fn test_stale_read_loses_to_concurrent_writer() {
        let store = seeded_store();
        let service = MembershipService::new(store.clone());

        let existing = service.query().team_users(&team_id(TEAM)).await.unwrap();
        service.add_team_users(&team_id(TEAM), &users(&["c"])).await.unwrap();

        // A second writer still holding the old read must not overwrite c
        let mut members = existing.value.clone();
        members.insert(user_id("d"));
        let mut user_teams = HashMap::new();
        user_teams.insert(user_id("d"), Versioned::absent(teams(&[TEAM])));
        let stale = MembershipBatch::new(team_id(TEAM), Versioned::new(members, existing.version))
            .with_user_teams(user_teams);

        let err = store.save_teams_and_users(stale).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));

        let members = service.query().team_users(&team_id(TEAM)).await.unwrap();
        assert_eq!(members.value.into_vec(), users(&["a", "b", "c"]));
    }
}
