//! Challenge participation engine.
//!
//! Challenges are their own aggregate root: `participants` and `progress` are
//! kept in lockstep, and the time-window fields (ongoing, upcoming, expired)
//! are derived from the clock on every read rather than stored.

use crate::db::{DbConnection, CHALLENGES};
use crate::domain::errors::CoreError;
use crate::domain::pagination::{paginate, pagination_meta, parse_pagination, PageQuery};
use chrono::Utc;
use serde::Deserialize;
use shared::{
    Challenge, ChallengeListResponse, ChallengeResponse, ChallengeStatsResponse, ChallengeStatus,
    ChallengeView, CreateChallengeRequest, LeaderboardResponse, UpdateProgressRequest,
};
use tracing::info;

pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeListQuery {
    pub status: Option<ChallengeStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Clone)]
pub struct ChallengeService {
    db: DbConnection,
}

impl ChallengeService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create_challenge(
        &self,
        creator_id: &str,
        request: CreateChallengeRequest,
    ) -> Result<ChallengeResponse, CoreError> {
        let creator = self.db.load_user(creator_id).await?;
        let now = Utc::now();

        let title = request.title.trim().to_string();
        if title.chars().count() < 5 || title.chars().count() > 100 {
            return Err(CoreError::validation(
                "Challenge title must be between 5 and 100 characters",
            ));
        }
        let description = request.description.trim().to_string();
        if description.is_empty() || description.chars().count() > 1000 {
            return Err(CoreError::validation(
                "Challenge description must be between 1 and 1000 characters",
            ));
        }
        if request.goal == 0 {
            return Err(CoreError::validation("Challenge goal must be at least 1"));
        }
        if request.start_date >= request.end_date {
            return Err(CoreError::validation("Start date must be before end date"));
        }

        let challenge = Challenge {
            id: Challenge::generate_id(),
            title,
            description,
            goal: request.goal,
            start_date: request.start_date,
            end_date: request.end_date,
            participants: Vec::new(),
            progress: Vec::new(),
            created_by: creator.id,
            is_active: true,
            created_at: now,
        };
        self.db.save_challenge(&challenge).await?;

        info!("Challenge created: {} by user {}", challenge.title, creator_id);
        Ok(ChallengeResponse {
            message: "Challenge created successfully".to_string(),
            challenge: ChallengeView::new(challenge, now),
        })
    }

    pub async fn get_challenge(&self, challenge_id: &str) -> Result<ChallengeView, CoreError> {
        let challenge = self.db.load_challenge(challenge_id).await?;
        Ok(ChallengeView::new(challenge, Utc::now()))
    }

    pub async fn list_challenges(
        &self,
        query: ChallengeListQuery,
    ) -> Result<ChallengeListResponse, CoreError> {
        let now = Utc::now();
        let params = parse_pagination(&PageQuery {
            page: query.page,
            limit: query.limit,
        });

        let mut challenges: Vec<Challenge> = self
            .db
            .list_all::<Challenge>(CHALLENGES)
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .filter(|c| match query.status {
                Some(ChallengeStatus::Active) => c.is_ongoing(now),
                Some(ChallengeStatus::Upcoming) => c.is_upcoming(now),
                Some(ChallengeStatus::Expired) => c.is_expired(now),
                None => true,
            })
            .collect();
        challenges.sort_by(|a, b| a.start_date.cmp(&b.start_date));

        let meta = pagination_meta(params, challenges.len() as u64);
        let page = paginate(&challenges, params)
            .into_iter()
            .map(|c| ChallengeView::new(c, now))
            .collect();

        Ok(ChallengeListResponse {
            challenges: page,
            pagination: meta,
        })
    }

    /// Join an ongoing challenge. The window is checked before membership, so
    /// an expired challenge reports the window error even for a participant.
    pub async fn join_challenge(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<ChallengeResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let mut challenge = self.db.load_challenge(challenge_id).await?;
        let now = Utc::now();

        if challenge.is_expired(now) {
            return Err(CoreError::invalid_state("Challenge has already ended"));
        }
        if challenge.is_upcoming(now) {
            return Err(CoreError::invalid_state("Challenge has not started yet"));
        }
        if challenge.is_participating(&user.id) {
            return Err(CoreError::conflict(
                "You are already participating in this challenge",
            ));
        }

        challenge.add_participant(&user.id, now);
        self.db.save_challenge(&challenge).await?;

        info!("User {} joined challenge {}", user_id, challenge.title);
        Ok(ChallengeResponse {
            message: "Joined challenge successfully".to_string(),
            challenge: ChallengeView::new(challenge, now),
        })
    }

    pub async fn leave_challenge(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<ChallengeResponse, CoreError> {
        let mut challenge = self.db.load_challenge(challenge_id).await?;
        let now = Utc::now();

        if !challenge.is_participating(user_id) {
            return Err(CoreError::invalid_state(
                "You are not participating in this challenge",
            ));
        }

        challenge.remove_participant(user_id);
        self.db.save_challenge(&challenge).await?;

        info!("User {} left challenge {}", user_id, challenge.title);
        Ok(ChallengeResponse {
            message: "Left challenge successfully".to_string(),
            challenge: ChallengeView::new(challenge, now),
        })
    }

    /// Set the caller's absolute progress value. Only participants may report
    /// progress, and only while the window is open.
    pub async fn update_progress(
        &self,
        challenge_id: &str,
        user_id: &str,
        request: UpdateProgressRequest,
    ) -> Result<ChallengeResponse, CoreError> {
        let mut challenge = self.db.load_challenge(challenge_id).await?;
        let now = Utc::now();

        if !challenge.is_participating(user_id) {
            return Err(CoreError::forbidden(
                "You are not participating in this challenge",
            ));
        }
        if challenge.is_expired(now) {
            return Err(CoreError::invalid_state("Challenge has already ended"));
        }
        if challenge.is_upcoming(now) {
            return Err(CoreError::invalid_state("Challenge has not started yet"));
        }

        challenge.upsert_progress(user_id, request.value, now);
        self.db.save_challenge(&challenge).await?;

        Ok(ChallengeResponse {
            message: "Progress updated successfully".to_string(),
            challenge: ChallengeView::new(challenge, now),
        })
    }

    pub async fn leaderboard(&self, challenge_id: &str) -> Result<LeaderboardResponse, CoreError> {
        let challenge = self.db.load_challenge(challenge_id).await?;
        Ok(LeaderboardResponse {
            challenge_title: challenge.title.clone(),
            goal: challenge.goal,
            leaderboard: challenge.leaderboard(LEADERBOARD_SIZE),
        })
    }

    /// Only the creator may delete a challenge.
    pub async fn delete_challenge(
        &self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<(), CoreError> {
        let challenge = self.db.load_challenge(challenge_id).await?;
        if challenge.created_by != user_id {
            return Err(CoreError::forbidden(
                "Only the challenge creator can delete it",
            ));
        }
        self.db.delete(CHALLENGES, challenge_id).await?;
        info!("Challenge deleted: {}", challenge.title);
        Ok(())
    }

    /// Counts over the active catalogue. A participation counts as
    /// "participating" only while its window is open; once the window closes
    /// it counts as "completed" regardless of the progress value.
    pub async fn challenge_stats(&self, user_id: &str) -> Result<ChallengeStatsResponse, CoreError> {
        let challenges: Vec<Challenge> = self
            .db
            .list_all::<Challenge>(CHALLENGES)
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        let now = Utc::now();

        let joined: Vec<&Challenge> = challenges
            .iter()
            .filter(|c| c.is_participating(user_id))
            .collect();

        Ok(ChallengeStatsResponse {
            total_challenges: challenges.len(),
            active_challenges: challenges.iter().filter(|c| c.is_ongoing(now)).count(),
            upcoming_challenges: challenges.iter().filter(|c| c.is_upcoming(now)).count(),
            user_participating: joined.iter().filter(|c| c.is_ongoing(now)).count(),
            user_completed: joined.iter().filter(|c| c.is_expired(now)).count(),
        })
    }

    /// Cascade hook for account deletion: drops the user from every
    /// challenge's participant and progress lists.
    pub async fn remove_user_references(&self, user_id: &str) -> Result<(), CoreError> {
        let challenges: Vec<Challenge> = self.db.list_all(CHALLENGES).await?;
        for mut challenge in challenges {
            if challenge.is_participating(user_id)
                || challenge.progress.iter().any(|p| p.user_id == user_id)
            {
                challenge.remove_participant(user_id);
                self.db.save_challenge(&challenge).await?;
            }
        }
        Ok(())
    }
}
