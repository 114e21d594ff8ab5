//! HTTP surface. Handlers stay thin: extract, delegate to a service, wrap the
//! result. All domain decisions live in `crate::domain`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use shared::{
    CreateChallengeRequest, CreateExerciseRequest, CreateFoodLogRequest,
    CreateJournalEntryRequest, CreateTaskRequest, CreateTriggerRequest, CreateUserRequest,
    JournalSearchResponse, LogWorkoutRequest, MessageResponse, UpdateFoodLogRequest,
    UpdateJournalEntryRequest, UpdateProgressRequest, UpdateTaskRequest, UpdateTriggerRequest,
};
use tracing::info;

use crate::db::DbConnection;
use crate::domain::challenges::ChallengeListQuery;
use crate::domain::exercises::ExerciseListQuery;
use crate::domain::journal::{JournalListQuery, TrendQuery};
use crate::domain::nutrition::{FoodLogListQuery, StatsQuery};
use crate::domain::tasks::TaskListQuery;
use crate::domain::triggers::TriggerListQuery;
use crate::domain::workouts::WorkoutListQuery;
use crate::domain::{
    ChallengeService, CoreError, ExerciseService, FriendshipService, JournalService,
    NutritionService, TaskService, TriggerService, UserService, WorkoutService,
};

/// Application state shared across handlers; each service owns a clone of the
/// connection.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub tasks: TaskService,
    pub journal: JournalService,
    pub nutrition: NutritionService,
    pub triggers: TriggerService,
    pub workouts: WorkoutService,
    pub friendship: FriendshipService,
    pub challenges: ChallengeService,
    pub exercises: ExerciseService,
}

impl AppState {
    pub fn new(db: DbConnection) -> Self {
        Self {
            users: UserService::new(db.clone()),
            tasks: TaskService::new(db.clone()),
            journal: JournalService::new(db.clone()),
            nutrition: NutritionService::new(db.clone()),
            triggers: TriggerService::new(db.clone()),
            workouts: WorkoutService::new(db.clone()),
            friendship: FriendshipService::new(db.clone()),
            challenges: ChallengeService::new(db.clone()),
            exercises: ExerciseService::new(db),
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Validation(_) | CoreError::InvalidState(_) => StatusCode::BAD_REQUEST,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::Storage(_) | CoreError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {:?}", self);
            return (status, Json(json!({ "error": "Internal server error" }))).into_response();
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
}

/// Full route table, nested under `/api` by the caller.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Accounts
        .route("/users", post(create_user))
        .route("/users/:user_id", get(get_profile).delete(delete_account))
        .route("/users/:user_id/search", get(search_users))
        // Tasks
        .route("/users/:user_id/tasks", post(create_task).get(list_tasks))
        .route("/users/:user_id/tasks/stats", get(task_stats))
        .route("/users/:user_id/tasks/complete-all", post(complete_all_tasks))
        .route("/users/:user_id/tasks/completed", delete(delete_completed_tasks))
        .route(
            "/users/:user_id/tasks/:task_id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/users/:user_id/tasks/:task_id/toggle", post(toggle_task))
        // Journal
        .route("/users/:user_id/journal", post(create_journal_entry).get(list_journal_entries))
        .route("/users/:user_id/journal/search", get(search_journal))
        .route("/users/:user_id/journal/stats", get(journal_stats))
        .route("/users/:user_id/journal/trends", get(mood_trends))
        .route(
            "/users/:user_id/journal/:entry_id",
            get(get_journal_entry).put(update_journal_entry).delete(delete_journal_entry),
        )
        // Food logs
        .route("/users/:user_id/food-logs", post(create_food_log).get(list_food_logs))
        .route("/users/:user_id/food-logs/stats", get(nutrition_stats))
        .route(
            "/users/:user_id/food-logs/:log_id",
            get(get_food_log).put(update_food_log).delete(delete_food_log),
        )
        // Triggers
        .route("/users/:user_id/triggers", post(log_trigger).get(list_triggers))
        .route("/users/:user_id/triggers/stats", get(trigger_stats))
        .route(
            "/users/:user_id/triggers/:trigger_id",
            get(get_trigger).put(update_trigger).delete(delete_trigger),
        )
        // Workouts
        .route("/users/:user_id/workouts", post(log_workout).get(list_workouts))
        .route("/users/:user_id/workouts/stats", get(workout_stats))
        .route(
            "/users/:user_id/workouts/:workout_id",
            get(get_workout).delete(delete_workout),
        )
        // Friends
        .route("/users/:user_id/friends", get(list_friends))
        .route("/users/:user_id/friends/requests", get(list_friend_requests))
        .route("/users/:user_id/friends/request/:friend_id", post(send_friend_request))
        .route("/users/:user_id/friends/accept/:friend_id", post(accept_friend_request))
        .route("/users/:user_id/friends/reject/:friend_id", post(reject_friend_request))
        .route("/users/:user_id/friends/activity", get(activity_feed))
        .route("/users/:user_id/friends/:friend_id", delete(remove_friend))
        // Challenges
        .route("/challenges", get(list_challenges))
        .route("/challenges/:challenge_id", get(get_challenge))
        .route("/challenges/:challenge_id/leaderboard", get(challenge_leaderboard))
        .route("/users/:user_id/challenges", post(create_challenge))
        .route("/users/:user_id/challenges/stats", get(challenge_stats))
        .route("/users/:user_id/challenges/:challenge_id", delete(delete_challenge))
        .route("/users/:user_id/challenges/:challenge_id/join", post(join_challenge))
        .route("/users/:user_id/challenges/:challenge_id/leave", post(leave_challenge))
        .route("/users/:user_id/challenges/:challenge_id/progress", put(update_progress))
        // Exercise catalogue
        .route("/exercises", post(create_exercise).get(list_exercises))
        .route("/exercises/:exercise_id", get(get_exercise))
        .with_state(state)
}

// --- Accounts ---------------------------------------------------------------

async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/users");
    let response = state.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.users.get_profile(&user_id).await?))
}

async fn delete_account(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    info!("DELETE /api/users/{}", user_id);
    Ok(Json(state.users.delete_account(&user_id).await?))
}

async fn search_users(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.users.search_users(&user_id, &query.q).await?))
}

// --- Tasks ------------------------------------------------------------------

async fn create_task(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/users/{}/tasks", user_id);
    let response = state.tasks.create_task(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<TaskListQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.tasks.list_tasks(&user_id, query).await?))
}

async fn get_task(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.tasks.get_task(&user_id, &task_id).await?))
}

async fn update_task(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(String, String)>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.tasks.update_task(&user_id, &task_id, request).await?))
}

async fn toggle_task(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.tasks.toggle_task(&user_id, &task_id).await?))
}

async fn delete_task(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    state.tasks.delete_task(&user_id, &task_id).await?;
    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

async fn complete_all_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.tasks.complete_all(&user_id).await?))
}

async fn delete_completed_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.tasks.delete_completed(&user_id).await?))
}

async fn task_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.tasks.task_stats(&user_id).await?))
}

// --- Journal ----------------------------------------------------------------

async fn create_journal_entry(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CreateJournalEntryRequest>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/users/{}/journal", user_id);
    let response = state.journal.create_entry(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_journal_entries(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<JournalListQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.journal.list_entries(&user_id, query).await?))
}

async fn search_journal(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let entries = state.journal.search_entries(&user_id, &query.q).await?;
    Ok(Json(JournalSearchResponse {
        query: query.q,
        count: entries.len(),
        entries,
    }))
}

async fn get_journal_entry(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.journal.get_entry(&user_id, &entry_id).await?))
}

async fn update_journal_entry(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(String, String)>,
    Json(request): Json<UpdateJournalEntryRequest>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.journal.update_entry(&user_id, &entry_id, request).await?))
}

async fn delete_journal_entry(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    state.journal.delete_entry(&user_id, &entry_id).await?;
    Ok(Json(MessageResponse {
        message: "Journal entry deleted successfully".to_string(),
    }))
}

async fn journal_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.journal.journal_stats(&user_id).await?))
}

async fn mood_trends(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<TrendQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.journal.mood_trends(&user_id, query).await?))
}

// --- Food logs --------------------------------------------------------------

async fn create_food_log(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CreateFoodLogRequest>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/users/{}/food-logs", user_id);
    let response = state.nutrition.log_food(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_food_logs(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FoodLogListQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.nutrition.list_logs(&user_id, query).await?))
}

async fn get_food_log(
    State(state): State<AppState>,
    Path((user_id, log_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.nutrition.get_log(&user_id, &log_id).await?))
}

async fn update_food_log(
    State(state): State<AppState>,
    Path((user_id, log_id)): Path<(String, String)>,
    Json(request): Json<UpdateFoodLogRequest>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.nutrition.update_log(&user_id, &log_id, request).await?))
}

async fn delete_food_log(
    State(state): State<AppState>,
    Path((user_id, log_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    state.nutrition.delete_log(&user_id, &log_id).await?;
    Ok(Json(MessageResponse {
        message: "Food log deleted successfully".to_string(),
    }))
}

async fn nutrition_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.nutrition.nutrition_stats(&user_id, query).await?))
}

// --- Triggers ---------------------------------------------------------------

async fn log_trigger(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CreateTriggerRequest>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/users/{}/triggers", user_id);
    let response = state.triggers.log_trigger(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_triggers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<TriggerListQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.triggers.list_triggers(&user_id, query).await?))
}

async fn get_trigger(
    State(state): State<AppState>,
    Path((user_id, trigger_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.triggers.get_trigger(&user_id, &trigger_id).await?))
}

async fn update_trigger(
    State(state): State<AppState>,
    Path((user_id, trigger_id)): Path<(String, String)>,
    Json(request): Json<UpdateTriggerRequest>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.triggers.update_trigger(&user_id, &trigger_id, request).await?))
}

async fn delete_trigger(
    State(state): State<AppState>,
    Path((user_id, trigger_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    state.triggers.delete_trigger(&user_id, &trigger_id).await?;
    Ok(Json(MessageResponse {
        message: "Trigger deleted successfully".to_string(),
    }))
}

async fn trigger_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.triggers.trigger_stats(&user_id).await?))
}

// --- Workouts ---------------------------------------------------------------

async fn log_workout(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<LogWorkoutRequest>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/users/{}/workouts", user_id);
    let response = state.workouts.log_workout(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_workouts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<WorkoutListQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.workouts.list_history(&user_id, query).await?))
}

async fn get_workout(
    State(state): State<AppState>,
    Path((user_id, workout_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.workouts.get_workout(&user_id, &workout_id).await?))
}

async fn delete_workout(
    State(state): State<AppState>,
    Path((user_id, workout_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    state.workouts.delete_workout(&user_id, &workout_id).await?;
    Ok(Json(MessageResponse {
        message: "Workout deleted successfully".to_string(),
    }))
}

async fn workout_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.workouts.workout_stats(&user_id).await?))
}

// --- Friends ----------------------------------------------------------------

async fn send_friend_request(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/users/{}/friends/request/{}", user_id, friend_id);
    state.friendship.send_request(&user_id, &friend_id).await?;
    Ok(Json(MessageResponse {
        message: "Friend request sent".to_string(),
    }))
}

async fn accept_friend_request(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    state.friendship.accept_request(&user_id, &friend_id).await?;
    Ok(Json(MessageResponse {
        message: "Friend request accepted".to_string(),
    }))
}

async fn reject_friend_request(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    state.friendship.reject_request(&user_id, &friend_id).await?;
    Ok(Json(MessageResponse {
        message: "Friend request rejected".to_string(),
    }))
}

async fn remove_friend(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    state.friendship.remove_friend(&user_id, &friend_id).await?;
    Ok(Json(MessageResponse {
        message: "Friend removed".to_string(),
    }))
}

async fn list_friends(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.friendship.list_friends(&user_id).await?))
}

async fn list_friend_requests(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.friendship.list_requests(&user_id).await?))
}

async fn activity_feed(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let limit = query.limit.unwrap_or(20);
    Ok(Json(state.friendship.activity_feed(&user_id, limit).await?))
}

// --- Challenges -------------------------------------------------------------

async fn create_challenge(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CreateChallengeRequest>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/users/{}/challenges", user_id);
    let response = state.challenges.create_challenge(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_challenges(
    State(state): State<AppState>,
    Query(query): Query<ChallengeListQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.challenges.list_challenges(query).await?))
}

async fn get_challenge(
    State(state): State<AppState>,
    Path(challenge_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.challenges.get_challenge(&challenge_id).await?))
}

async fn challenge_leaderboard(
    State(state): State<AppState>,
    Path(challenge_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.challenges.leaderboard(&challenge_id).await?))
}

async fn join_challenge(
    State(state): State<AppState>,
    Path((user_id, challenge_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/users/{}/challenges/{}/join", user_id, challenge_id);
    Ok(Json(state.challenges.join_challenge(&challenge_id, &user_id).await?))
}

async fn leave_challenge(
    State(state): State<AppState>,
    Path((user_id, challenge_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.challenges.leave_challenge(&challenge_id, &user_id).await?))
}

async fn update_progress(
    State(state): State<AppState>,
    Path((user_id, challenge_id)): Path<(String, String)>,
    Json(request): Json<UpdateProgressRequest>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.challenges.update_progress(&challenge_id, &user_id, request).await?))
}

async fn delete_challenge(
    State(state): State<AppState>,
    Path((user_id, challenge_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CoreError> {
    state.challenges.delete_challenge(&challenge_id, &user_id).await?;
    Ok(Json(MessageResponse {
        message: "Challenge deleted successfully".to_string(),
    }))
}

async fn challenge_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.challenges.challenge_stats(&user_id).await?))
}

// --- Exercise catalogue -----------------------------------------------------

async fn create_exercise(
    State(state): State<AppState>,
    Json(request): Json<CreateExerciseRequest>,
) -> Result<impl IntoResponse, CoreError> {
    info!("POST /api/exercises");
    let exercise = state.exercises.create_exercise(request).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

async fn list_exercises(
    State(state): State<AppState>,
    Query(query): Query<ExerciseListQuery>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.exercises.list_exercises(query).await?))
}

async fn get_exercise(
    State(state): State<AppState>,
    Path(exercise_id): Path<String>,
) -> Result<impl IntoResponse, CoreError> {
    Ok(Json(state.exercises.get_exercise(&exercise_id).await?))
}
