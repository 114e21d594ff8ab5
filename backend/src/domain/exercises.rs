//! Exercise catalogue: a flat collection of cards referenced from workout
//! history by id.

use crate::db::{DbConnection, EXERCISES};
use crate::domain::collections::contains_ci;
use crate::domain::errors::CoreError;
use crate::domain::pagination::{paginate, pagination_meta, parse_pagination, PageQuery};
use chrono::Utc;
use serde::Deserialize;
use shared::{
    CreateExerciseRequest, Difficulty, ExerciseCard, ExerciseCategory, ExerciseListResponse,
};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseListQuery {
    pub category: Option<ExerciseCategory>,
    pub difficulty: Option<Difficulty>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Clone)]
pub struct ExerciseService {
    db: DbConnection,
}

impl ExerciseService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create_exercise(
        &self,
        request: CreateExerciseRequest,
    ) -> Result<ExerciseCard, CoreError> {
        let name = request.name.trim().to_string();
        if name.chars().count() < 3 || name.chars().count() > 100 {
            return Err(CoreError::validation(
                "Exercise name must be between 3 and 100 characters",
            ));
        }
        if request.duration == 0 || request.duration > 120 {
            return Err(CoreError::validation(
                "Duration must be between 1 and 120 minutes",
            ));
        }

        let existing: Vec<ExerciseCard> = self.db.list_all(EXERCISES).await?;
        if existing.iter().any(|e| e.name.eq_ignore_ascii_case(&name)) {
            return Err(CoreError::conflict("An exercise with this name already exists"));
        }

        let exercise = ExerciseCard {
            id: ExerciseCard::generate_id(),
            name,
            description: request.description,
            difficulty: request.difficulty,
            category: request.category,
            duration: request.duration,
            calories_burned: request.calories_burned,
            completion_count: 0,
            is_active: true,
            created_at: Utc::now(),
        };
        self.db.save_exercise(&exercise).await?;

        info!("Exercise created: {}", exercise.name);
        Ok(exercise)
    }

    pub async fn get_exercise(&self, exercise_id: &str) -> Result<ExerciseCard, CoreError> {
        self.db.load_exercise(exercise_id).await
    }

    /// Active cards filtered by category, difficulty and name search, sorted
    /// alphabetically.
    pub async fn list_exercises(
        &self,
        query: ExerciseListQuery,
    ) -> Result<ExerciseListResponse, CoreError> {
        let params = parse_pagination(&PageQuery {
            page: query.page,
            limit: query.limit,
        });

        let mut exercises: Vec<ExerciseCard> = self
            .db
            .list_all::<ExerciseCard>(EXERCISES)
            .await?
            .into_iter()
            .filter(|e| e.is_active)
            .filter(|e| query.category.map(|c| e.category == c).unwrap_or(true))
            .filter(|e| query.difficulty.map(|d| e.difficulty == d).unwrap_or(true))
            .filter(|e| {
                query
                    .search
                    .as_deref()
                    .map(|s| contains_ci(&e.name, s))
                    .unwrap_or(true)
            })
            .collect();
        exercises.sort_by(|a, b| a.name.cmp(&b.name));

        let meta = pagination_meta(params, exercises.len() as u64);
        Ok(ExerciseListResponse {
            exercises: paginate(&exercises, params),
            pagination: meta,
        })
    }

    /// Populate the catalogue with a starter set on first boot. A non-empty
    /// catalogue is left alone.
    pub async fn seed_defaults(&self) -> Result<(), CoreError> {
        if self.db.count(EXERCISES).await? > 0 {
            return Ok(());
        }

        let defaults = [
            ("Brisk walking", ExerciseCategory::Cardio, Difficulty::Beginner, 30, Some(150)),
            ("Running", ExerciseCategory::Cardio, Difficulty::Intermediate, 30, Some(300)),
            ("Bodyweight squats", ExerciseCategory::Strength, Difficulty::Beginner, 15, Some(90)),
            ("Deadlifts", ExerciseCategory::Strength, Difficulty::Advanced, 45, Some(270)),
            ("Sun salutations", ExerciseCategory::Yoga, Difficulty::Beginner, 20, Some(80)),
            ("Interval sprints", ExerciseCategory::Hiit, Difficulty::Advanced, 20, Some(250)),
        ];
        let now = Utc::now();
        for (name, category, difficulty, duration, calories) in defaults {
            let exercise = ExerciseCard {
                id: ExerciseCard::generate_id(),
                name: name.to_string(),
                description: None,
                difficulty,
                category,
                duration,
                calories_burned: calories,
                completion_count: 0,
                is_active: true,
                created_at: now,
            };
            self.db.save_exercise(&exercise).await?;
        }
        info!("Seeded exercise catalogue with {} entries", defaults.len());
        Ok(())
    }
}
