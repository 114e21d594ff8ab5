//! Friendship state machine over the `friends` and `friendRequests` sets.
//!
//! Per ordered pair the states are none, pending in one direction, or friends;
//! requests are directional (only the recipient holds the pending entry) while
//! the friends relation is symmetric in steady state. Accept and remove touch
//! two user aggregates without a cross-aggregate transaction: the first party
//! is persisted before the second, and both operations converge when re-invoked
//! after a crash between the writes.

use crate::db::{DbConnection, USERS};
use crate::domain::errors::CoreError;
use chrono::Utc;
use shared::{
    ActivityFeedResponse, ActivityItem, FriendListResponse, FriendRequestListResponse, User,
    UserSummary,
};
use tracing::info;

pub const MAX_FRIENDS: usize = 500;
pub const MAX_FRIEND_REQUESTS: usize = 100;

#[derive(Clone)]
pub struct FriendshipService {
    db: DbConnection,
}

impl FriendshipService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Record a pending request on the recipient. Check-then-append, never a
    /// blind push.
    pub async fn send_request(&self, from_id: &str, to_id: &str) -> Result<(), CoreError> {
        if from_id == to_id {
            return Err(CoreError::conflict(
                "You cannot send a friend request to yourself",
            ));
        }

        let from = self.db.load_user(from_id).await?;
        let mut to = self
            .db
            .get::<User>(USERS, to_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Friend"))?;

        if from.is_friend(to_id) || to.is_friend(from_id) {
            return Err(CoreError::conflict("You are already friends with this user"));
        }
        if to.has_friend_request_from(from_id) {
            return Err(CoreError::conflict("Friend request already sent"));
        }
        // Mutual pending is not a state: the reverse request must be accepted,
        // not duplicated.
        if from.has_friend_request_from(to_id) {
            return Err(CoreError::conflict(
                "This user has already sent you a friend request",
            ));
        }
        if to.friend_requests.len() >= MAX_FRIEND_REQUESTS {
            return Err(CoreError::conflict("Friend requests limit exceeded"));
        }

        to.friend_requests.push(from_id.to_string());
        to.updated_at = Utc::now();
        self.db.save_user(&to).await?;

        info!("Friend request sent from {} to {}", from_id, to_id);
        Ok(())
    }

    /// Accept a pending request: both friends sets gain the other user and the
    /// pending entry disappears. The acceptor is persisted first; if the
    /// requester write then fails, re-invoking converges on the fully-friended
    /// state instead of reporting a misleading error.
    pub async fn accept_request(&self, user_id: &str, requester_id: &str) -> Result<(), CoreError> {
        let mut user = self.db.load_user(user_id).await?;
        let mut requester = self
            .db
            .get::<User>(USERS, requester_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Friend"))?;

        if !user.has_friend_request_from(requester_id) {
            // Retry path: the first write landed but the second did not.
            if user.is_friend(requester_id) && !requester.is_friend(user_id) {
                requester.add_friend(user_id);
                requester.updated_at = Utc::now();
                self.db.save_user(&requester).await?;
                info!("Friend request reconciled: {} and {}", user_id, requester_id);
                return Ok(());
            }
            return Err(CoreError::invalid_state("No friend request from this user"));
        }

        if user.friends.len() >= MAX_FRIENDS || requester.friends.len() >= MAX_FRIENDS {
            return Err(CoreError::conflict("Friends list limit exceeded"));
        }

        let now = Utc::now();
        user.add_friend(requester_id);
        user.friend_requests.retain(|id| id != requester_id);
        user.updated_at = now;
        self.db.save_user(&user).await?;

        requester.add_friend(user_id);
        requester.updated_at = now;
        self.db.save_user(&requester).await?;

        info!("Friend request accepted: {} and {}", user_id, requester_id);
        Ok(())
    }

    /// Drop a pending request without touching either friends set.
    pub async fn reject_request(&self, user_id: &str, requester_id: &str) -> Result<(), CoreError> {
        let mut user = self.db.load_user(user_id).await?;

        if !user.has_friend_request_from(requester_id) {
            return Err(CoreError::invalid_state("No friend request from this user"));
        }

        user.friend_requests.retain(|id| id != requester_id);
        user.updated_at = Utc::now();
        self.db.save_user(&user).await?;

        info!("Friend request rejected by user {}", user_id);
        Ok(())
    }

    /// Symmetric removal from both friends sets. Converges when retried after
    /// a partial write; only a pair with no link on either side is an error.
    pub async fn remove_friend(&self, user_id: &str, other_id: &str) -> Result<(), CoreError> {
        let mut user = self.db.load_user(user_id).await?;
        let mut other = self
            .db
            .get::<User>(USERS, other_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Friend"))?;

        if !user.is_friend(other_id) && !other.is_friend(user_id) {
            return Err(CoreError::invalid_state(
                "This user is not in your friends list",
            ));
        }

        let now = Utc::now();
        if user.is_friend(other_id) {
            user.remove_friend(other_id);
            user.updated_at = now;
            self.db.save_user(&user).await?;
        }
        if other.is_friend(user_id) {
            other.remove_friend(user_id);
            other.updated_at = now;
            self.db.save_user(&other).await?;
        }

        info!("Friend removed: {} removed {}", user_id, other_id);
        Ok(())
    }

    pub async fn list_friends(&self, user_id: &str) -> Result<FriendListResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let friends = self.summaries(&user.friends).await?;
        Ok(FriendListResponse {
            count: friends.len(),
            friends,
        })
    }

    pub async fn list_requests(
        &self,
        user_id: &str,
    ) -> Result<FriendRequestListResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let friend_requests = self.summaries(&user.friend_requests).await?;
        Ok(FriendRequestListResponse {
            count: friend_requests.len(),
            friend_requests,
        })
    }

    /// Recent workouts of the user's friends, newest first.
    pub async fn activity_feed(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<ActivityFeedResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;

        let mut activities: Vec<ActivityItem> = Vec::new();
        for friend_id in &user.friends {
            let Some(friend) = self.db.get::<User>(USERS, friend_id).await? else {
                continue;
            };
            let summary = UserSummary::from(&friend);
            let skip = friend.workout_history.len().saturating_sub(10);
            for workout in &friend.workout_history[skip..] {
                activities.push(ActivityItem {
                    user: summary.clone(),
                    workout: workout.clone(),
                });
            }
        }

        activities.sort_by(|a, b| b.workout.date.cmp(&a.workout.date));
        activities.truncate(limit);

        Ok(ActivityFeedResponse {
            count: activities.len(),
            activities,
        })
    }

    /// Cascade hook for account deletion: strips the user from every other
    /// user's friends and pending-request sets.
    pub async fn remove_user_references(&self, user_id: &str) -> Result<(), CoreError> {
        let users: Vec<User> = self.db.list_all(USERS).await?;
        let now = Utc::now();
        for mut other in users {
            if other.id == user_id {
                continue;
            }
            let had_link = other.is_friend(user_id) || other.has_friend_request_from(user_id);
            if had_link {
                other.remove_friend(user_id);
                other.friend_requests.retain(|id| id != user_id);
                other.updated_at = now;
                self.db.save_user(&other).await?;
            }
        }
        Ok(())
    }

    async fn summaries(&self, ids: &[String]) -> Result<Vec<UserSummary>, CoreError> {
        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            // Dangling ids (deleted accounts) are skipped, not errors.
            if let Some(user) = self.db.get::<User>(USERS, id).await? {
                summaries.push(UserSummary::from(&user));
            }
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (FriendshipService, DbConnection, User, User) {
        let db = DbConnection::init_test().await.unwrap();
        let a = User::new("ana@example.com".to_string(), "Ana".to_string(), Utc::now());
        let b = User::new("ben@example.com".to_string(), "Ben".to_string(), Utc::now());
        db.save_user(&a).await.unwrap();
        db.save_user(&b).await.unwrap();
        (FriendshipService::new(db.clone()), db, a, b)
    }

    #[tokio::test]
    async fn test_request_then_accept_is_symmetric() {
        let (service, db, a, b) = setup().await;

        service.send_request(&a.id, &b.id).await.unwrap();
        let b_loaded = db.load_user(&b.id).await.unwrap();
        assert!(b_loaded.has_friend_request_from(&a.id));
        // Requests are directional: the sender holds nothing.
        let a_loaded = db.load_user(&a.id).await.unwrap();
        assert!(a_loaded.friend_requests.is_empty());

        service.accept_request(&b.id, &a.id).await.unwrap();

        let a_loaded = db.load_user(&a.id).await.unwrap();
        let b_loaded = db.load_user(&b.id).await.unwrap();
        assert!(a_loaded.is_friend(&b.id));
        assert!(b_loaded.is_friend(&a.id));
        assert!(!b_loaded.has_friend_request_from(&a.id));

        // Accepting again is an error, not a duplicate friend entry.
        let err = service.accept_request(&b.id, &a.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        let b_loaded = db.load_user(&b.id).await.unwrap();
        assert_eq!(b_loaded.friends.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_and_self_requests_conflict() {
        let (service, _db, a, b) = setup().await;

        let err = service.send_request(&a.id, &a.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        service.send_request(&a.id, &b.id).await.unwrap();
        let err = service.send_request(&a.id, &b.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        // The reverse request is rejected rather than creating mutual pending.
        let err = service.send_request(&b.id, &a.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_request_to_existing_friend_conflicts() {
        let (service, _db, a, b) = setup().await;

        service.send_request(&a.id, &b.id).await.unwrap();
        service.accept_request(&b.id, &a.id).await.unwrap();

        let err = service.send_request(&a.id, &b.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        let err = service.send_request(&b.id, &a.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reject_leaves_friends_untouched() {
        let (service, db, a, b) = setup().await;

        service.send_request(&a.id, &b.id).await.unwrap();
        service.reject_request(&b.id, &a.id).await.unwrap();

        let a_loaded = db.load_user(&a.id).await.unwrap();
        let b_loaded = db.load_user(&b.id).await.unwrap();
        assert!(a_loaded.friends.is_empty());
        assert!(b_loaded.friends.is_empty());
        assert!(b_loaded.friend_requests.is_empty());

        let err = service.reject_request(&b.id, &a.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_remove_friend_symmetric_and_guarded() {
        let (service, db, a, b) = setup().await;

        // Not friends yet: 400-class error.
        let err = service.remove_friend(&a.id, &b.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));

        service.send_request(&a.id, &b.id).await.unwrap();
        service.accept_request(&b.id, &a.id).await.unwrap();

        service.remove_friend(&a.id, &b.id).await.unwrap();
        let a_loaded = db.load_user(&a.id).await.unwrap();
        let b_loaded = db.load_user(&b.id).await.unwrap();
        assert!(a_loaded.friends.is_empty());
        assert!(b_loaded.friends.is_empty());
    }

    #[tokio::test]
    async fn test_accept_retry_converges_after_partial_write() {
        let (service, db, a, b) = setup().await;

        service.send_request(&a.id, &b.id).await.unwrap();
        service.accept_request(&b.id, &a.id).await.unwrap();

        // Simulate the crash window: the second write (requester side) is
        // rolled back by hand, leaving the asymmetric state.
        let mut a_loaded = db.load_user(&a.id).await.unwrap();
        a_loaded.remove_friend(&b.id);
        db.save_user(&a_loaded).await.unwrap();

        // Re-invocation completes the pair instead of erroring.
        service.accept_request(&b.id, &a.id).await.unwrap();
        let a_loaded = db.load_user(&a.id).await.unwrap();
        let b_loaded = db.load_user(&b.id).await.unwrap();
        assert!(a_loaded.is_friend(&b.id));
        assert!(b_loaded.is_friend(&a.id));
    }

    #[tokio::test]
    async fn test_remove_retry_converges_after_partial_write() {
        let (service, db, a, b) = setup().await;

        service.send_request(&a.id, &b.id).await.unwrap();
        service.accept_request(&b.id, &a.id).await.unwrap();

        // First party persisted, second party write lost.
        let mut a_loaded = db.load_user(&a.id).await.unwrap();
        a_loaded.remove_friend(&b.id);
        db.save_user(&a_loaded).await.unwrap();

        service.remove_friend(&a.id, &b.id).await.unwrap();
        let b_loaded = db.load_user(&b.id).await.unwrap();
        assert!(b_loaded.friends.is_empty());
    }

    #[tokio::test]
    async fn test_cascade_strips_references() {
        let (service, db, a, b) = setup().await;
        let c = User::new("cleo@example.com".to_string(), "Cleo".to_string(), Utc::now());
        db.save_user(&c).await.unwrap();

        service.send_request(&a.id, &b.id).await.unwrap();
        service.accept_request(&b.id, &a.id).await.unwrap();
        service.send_request(&a.id, &c.id).await.unwrap();

        service.remove_user_references(&a.id).await.unwrap();

        let b_loaded = db.load_user(&b.id).await.unwrap();
        let c_loaded = db.load_user(&c.id).await.unwrap();
        assert!(!b_loaded.is_friend(&a.id));
        assert!(!c_loaded.has_friend_request_from(&a.id));
    }

    #[tokio::test]
    async fn test_listings_and_feed() {
        let (service, db, a, b) = setup().await;

        service.send_request(&a.id, &b.id).await.unwrap();
        let requests = service.list_requests(&b.id).await.unwrap();
        assert_eq!(requests.count, 1);
        assert_eq!(requests.friend_requests[0].name, "Ana");

        service.accept_request(&b.id, &a.id).await.unwrap();
        let friends = service.list_friends(&a.id).await.unwrap();
        assert_eq!(friends.count, 1);
        assert_eq!(friends.friends[0].name, "Ben");

        // Give Ben a workout so Ana's feed has something to show.
        let mut b_loaded = db.load_user(&b.id).await.unwrap();
        b_loaded.workout_history.push(shared::WorkoutEntry {
            id: "w1".to_string(),
            exercise_id: "exercise::x".to_string(),
            date: Utc::now(),
            completed: true,
            duration: Some(20),
            notes: None,
        });
        db.save_user(&b_loaded).await.unwrap();

        let feed = service.activity_feed(&a.id, 20).await.unwrap();
        assert_eq!(feed.count, 1);
        assert_eq!(feed.activities[0].user.name, "Ben");
    }
}
