//! Workout history operations over the embedded `workoutHistory` collection,
//! plus streak maintenance.

use crate::db::DbConnection;
use crate::domain::collections::{self, in_date_range, EmbeddedItem, SortOrder};
use crate::domain::errors::CoreError;
use crate::domain::pagination::{parse_pagination, PageQuery};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use shared::{
    LogWorkoutRequest, WorkoutEntry, WorkoutListResponse, WorkoutResponse, WorkoutStatsResponse,
};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutListQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Clone)]
pub struct WorkoutService {
    db: DbConnection,
}

impl WorkoutService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Log a completed workout against a catalogue exercise. The first workout
    /// of a calendar day advances the streak; further workouts that day leave
    /// it untouched. The exercise's completion counter is bumped after the
    /// user write; a crash in between is reconciled by the next log, not
    /// rolled back.
    pub async fn log_workout(
        &self,
        user_id: &str,
        request: LogWorkoutRequest,
    ) -> Result<WorkoutResponse, CoreError> {
        let now = Utc::now();
        let mut exercise = self.db.load_exercise(&request.exercise_id).await?;
        let mut user = self.db.load_user(user_id).await?;

        if user.workout_history.len() >= WorkoutEntry::CAP {
            return Err(CoreError::validation("Workout history limit exceeded"));
        }

        if !user.worked_out_today(now) {
            user.update_streak(now);
            user.last_workout_date = Some(now);
        }

        let entry = WorkoutEntry {
            id: Uuid::new_v4().to_string(),
            exercise_id: request.exercise_id.clone(),
            date: now,
            completed: true,
            duration: request.duration.or(Some(exercise.duration)),
            notes: request.notes,
        };
        entry.validate(now)?;
        user.workout_history.push(entry.clone());
        user.updated_at = now;
        self.db.save_user(&user).await?;

        exercise.completion_count += 1;
        self.db.save_exercise(&exercise).await?;

        info!("Workout logged: {} by user {}", exercise.name, user_id);
        Ok(WorkoutResponse {
            message: "Workout logged successfully".to_string(),
            workout: entry,
            streak_count: user.streak_count,
            worked_out_today: true,
        })
    }

    pub async fn list_history(
        &self,
        user_id: &str,
        query: WorkoutListQuery,
    ) -> Result<WorkoutListResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let params = parse_pagination(&PageQuery {
            page: query.page,
            limit: query.limit,
        });

        let (workouts, pagination) = collections::list_page(
            &user.workout_history,
            |entry: &WorkoutEntry| in_date_range(entry.date, query.start_date, query.end_date),
            SortOrder::NewestFirst,
            params,
        );

        Ok(WorkoutListResponse {
            workouts,
            pagination,
        })
    }

    pub async fn get_workout(&self, user_id: &str, workout_id: &str) -> Result<WorkoutEntry, CoreError> {
        collections::get_by_id(&self.db, user_id, workout_id).await
    }

    pub async fn delete_workout(&self, user_id: &str, workout_id: &str) -> Result<(), CoreError> {
        collections::remove::<WorkoutEntry>(&self.db, user_id, workout_id, Utc::now()).await
    }

    pub async fn workout_stats(&self, user_id: &str) -> Result<WorkoutStatsResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let now = Utc::now();
        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);

        let total_minutes: u64 = user
            .workout_history
            .iter()
            .map(|w| w.duration.unwrap_or(0) as u64)
            .sum();

        Ok(WorkoutStatsResponse {
            total_workouts: user.workout_history.len(),
            streak_count: user.streak_count,
            last_workout_date: user.last_workout_date,
            this_week: user
                .workout_history
                .iter()
                .filter(|w| w.date > week_ago)
                .count(),
            this_month: user
                .workout_history
                .iter()
                .filter(|w| w.date > month_ago)
                .count(),
            total_minutes,
            total_hours: (total_minutes as f64 / 60.0).round() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Difficulty, ExerciseCard, ExerciseCategory, User};

    async fn setup() -> (WorkoutService, DbConnection, User, ExerciseCard) {
        let db = DbConnection::init_test().await.unwrap();
        let user = User::new("ana@example.com".to_string(), "Ana".to_string(), Utc::now());
        db.save_user(&user).await.unwrap();

        let exercise = ExerciseCard {
            id: ExerciseCard::generate_id(),
            name: "Rowing".to_string(),
            description: None,
            difficulty: Difficulty::Intermediate,
            category: ExerciseCategory::Cardio,
            duration: 30,
            calories_burned: Some(260),
            completion_count: 0,
            is_active: true,
            created_at: Utc::now(),
        };
        db.save_exercise(&exercise).await.unwrap();

        (WorkoutService::new(db.clone()), db, user, exercise)
    }

    #[tokio::test]
    async fn test_log_workout_starts_streak_and_bumps_counter() {
        let (service, db, user, exercise) = setup().await;

        let logged = service
            .log_workout(
                &user.id,
                LogWorkoutRequest {
                    exercise_id: exercise.id.clone(),
                    duration: None,
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(logged.streak_count, 1);
        assert!(logged.worked_out_today);
        // Falls back to the exercise's default duration.
        assert_eq!(logged.workout.duration, Some(30));

        let stored_exercise = db.load_exercise(&exercise.id).await.unwrap();
        assert_eq!(stored_exercise.completion_count, 1);

        let stored_user = db.load_user(&user.id).await.unwrap();
        assert!(stored_user.last_workout_date.is_some());
        assert_eq!(stored_user.workout_history.len(), 1);
    }

    #[tokio::test]
    async fn test_second_workout_same_day_keeps_streak() {
        let (service, db, user, exercise) = setup().await;

        for _ in 0..2 {
            service
                .log_workout(
                    &user.id,
                    LogWorkoutRequest {
                        exercise_id: exercise.id.clone(),
                        duration: Some(20),
                        notes: None,
                    },
                )
                .await
                .unwrap();
        }

        let stored_user = db.load_user(&user.id).await.unwrap();
        assert_eq!(stored_user.streak_count, 1);
        assert_eq!(stored_user.workout_history.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_exercise_is_not_found_and_mutates_nothing() {
        let (service, db, user, _) = setup().await;

        let err = service
            .log_workout(
                &user.id,
                LogWorkoutRequest {
                    exercise_id: "exercise::missing".to_string(),
                    duration: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let stored_user = db.load_user(&user.id).await.unwrap();
        assert!(stored_user.workout_history.is_empty());
        assert_eq!(stored_user.streak_count, 0);
    }

    #[tokio::test]
    async fn test_history_pagination_and_stats() {
        let (service, _db, user, exercise) = setup().await;

        for i in 0..5 {
            service
                .log_workout(
                    &user.id,
                    LogWorkoutRequest {
                        exercise_id: exercise.id.clone(),
                        duration: Some(10 + i),
                        notes: None,
                    },
                )
                .await
                .unwrap();
        }

        let page = service
            .list_history(
                &user.id,
                WorkoutListQuery {
                    page: Some(1),
                    limit: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.workouts.len(), 2);
        assert_eq!(page.pagination.total_items, 5);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next_page);

        let stats = service.workout_stats(&user.id).await.unwrap();
        assert_eq!(stats.total_workouts, 5);
        assert_eq!(stats.total_minutes, 10 + 11 + 12 + 13 + 14);
        assert_eq!(stats.this_week, 5);
    }

    #[tokio::test]
    async fn test_delete_workout() {
        let (service, _db, user, exercise) = setup().await;

        let logged = service
            .log_workout(
                &user.id,
                LogWorkoutRequest {
                    exercise_id: exercise.id.clone(),
                    duration: None,
                    notes: None,
                },
            )
            .await
            .unwrap();

        service.delete_workout(&user.id, &logged.workout.id).await.unwrap();
        let err = service
            .get_workout(&user.id, &logged.workout.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
