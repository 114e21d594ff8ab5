//! User account lifecycle: registration, profile reads, search, and account
//! deletion with its cross-aggregate cascades.

use crate::db::{DbConnection, USERS};
use crate::domain::challenges::ChallengeService;
use crate::domain::collections::contains_ci;
use crate::domain::errors::CoreError;
use crate::domain::friendship::FriendshipService;
use chrono::Utc;
use shared::{
    CreateUserRequest, MessageResponse, User, UserProfile, UserResponse, UserSearchResponse,
    UserSummary,
};
use tracing::info;

const SEARCH_RESULT_LIMIT: usize = 20;

#[derive(Clone)]
pub struct UserService {
    db: DbConnection,
    friendship: FriendshipService,
    challenges: ChallengeService,
}

impl UserService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            friendship: FriendshipService::new(db.clone()),
            challenges: ChallengeService::new(db.clone()),
            db,
        }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserResponse, CoreError> {
        let email = request.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(CoreError::validation("A valid email address is required"));
        }
        let name = request.name.trim().to_string();
        if name.chars().count() < 2 || name.chars().count() > 50 {
            return Err(CoreError::validation(
                "Name must be between 2 and 50 characters",
            ));
        }

        let existing: Vec<User> = self.db.list_all(USERS).await?;
        if existing.iter().any(|u| u.email == email) {
            return Err(CoreError::conflict("Email already registered"));
        }

        let user = User::new(email, name, Utc::now());
        self.db.save_user(&user).await?;

        info!("User registered: {}", user.id);
        Ok(UserResponse {
            message: "User created successfully".to_string(),
            user: UserProfile::from(&user),
        })
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, CoreError> {
        let user = self.db.load_user(user_id).await?;
        Ok(UserProfile::from(&user))
    }

    /// Case-insensitive name/email search, excluding the caller.
    pub async fn search_users(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<UserSearchResponse, CoreError> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Err(CoreError::validation(
                "Search query must be at least 2 characters",
            ));
        }

        let users: Vec<User> = self.db.list_all(USERS).await?;
        let mut matches: Vec<UserSummary> = users
            .iter()
            .filter(|u| u.id != user_id)
            .filter(|u| contains_ci(&u.name, query) || contains_ci(&u.email, query))
            .map(UserSummary::from)
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches.truncate(SEARCH_RESULT_LIMIT);

        Ok(UserSearchResponse {
            query: query.to_string(),
            count: matches.len(),
            users: matches,
        })
    }

    /// Delete the account and every reference to it. The cascades run before
    /// the aggregate is removed so a failure leaves the account intact and the
    /// operation retryable.
    pub async fn delete_account(&self, user_id: &str) -> Result<MessageResponse, CoreError> {
        self.db.load_user(user_id).await?;

        self.friendship.remove_user_references(user_id).await?;
        self.challenges.remove_user_references(user_id).await?;
        self.db.delete(USERS, user_id).await?;

        info!("User account deleted: {}", user_id);
        Ok(MessageResponse {
            message: "Account deleted successfully".to_string(),
        })
    }
}

/// Just enough structure to reject obvious garbage: one `@` with a non-empty
/// local part and a dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !domain.contains('@')
}
