use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mood recorded on a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Bad,
    Terrible,
}

impl Mood {
    /// Numeric score used for mood trend averaging (1 = terrible .. 5 = great).
    pub fn score(&self) -> u8 {
        match self {
            Mood::Terrible => 1,
            Mood::Bad => 2,
            Mood::Okay => 3,
            Mood::Good => 4,
            Mood::Great => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Okay => "okay",
            Mood::Bad => "bad",
            Mood::Terrible => "terrible",
        }
    }

    pub fn all() -> [Mood; 5] {
        [Mood::Great, Mood::Good, Mood::Okay, Mood::Bad, Mood::Terrible]
    }
}

/// Exercise difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// Exercise category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
    Cardio,
    Strength,
    Flexibility,
    Balance,
    Hiit,
    Yoga,
    Pilates,
}

/// Time-window status used when filtering challenge listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Active,
    Upcoming,
    Expired,
}

/// A to-do item embedded in the user aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// Server-assigned at creation, immutable thereafter.
    pub created_at: DateTime<Utc>,
}

/// A journal entry embedded in the user aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub mood: Option<Mood>,
    /// Server-assigned at creation, immutable thereafter.
    pub date: DateTime<Utc>,
}

/// A daily food log embedded in the user aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLog {
    pub id: String,
    /// Caller-supplied; must not be in the future.
    pub date: DateTime<Utc>,
    pub meals: Vec<String>,
    pub notes: Option<String>,
}

/// A craving/trigger log embedded in the user aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerLog {
    pub id: String,
    pub trigger: String,
    pub notes: Option<String>,
    /// Server-assigned at creation, immutable thereafter.
    pub date: DateTime<Utc>,
}

/// A completed (or abandoned) workout embedded in the user aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutEntry {
    pub id: String,
    pub exercise_id: String,
    pub date: DateTime<Utc>,
    pub completed: bool,
    /// Duration in minutes.
    pub duration: Option<u32>,
    pub notes: Option<String>,
}

/// User aggregate root. Embedded collections are mini-resources addressed by
/// sub-document id, never by array index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub streak_count: u32,
    pub last_workout_date: Option<DateTime<Utc>>,
    pub tasks: Vec<Task>,
    pub journal: Vec<JournalEntry>,
    pub food_logs: Vec<FoodLog>,
    pub triggers: Vec<TriggerLog>,
    pub workout_history: Vec<WorkoutEntry>,
    pub friends: Vec<String>,
    pub friend_requests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn generate_id() -> String {
        format!("user::{}", Uuid::new_v4())
    }

    pub fn new(email: String, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::generate_id(),
            email,
            name,
            streak_count: 0,
            last_workout_date: None,
            tasks: Vec::new(),
            journal: Vec::new(),
            food_logs: Vec::new(),
            triggers: Vec::new(),
            workout_history: Vec::new(),
            friends: Vec::new(),
            friend_requests: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Idempotent: a friend id is never pushed twice.
    pub fn add_friend(&mut self, friend_id: &str) {
        if !self.friends.iter().any(|id| id == friend_id) {
            self.friends.push(friend_id.to_string());
        }
    }

    pub fn remove_friend(&mut self, friend_id: &str) {
        self.friends.retain(|id| id != friend_id);
    }

    pub fn is_friend(&self, friend_id: &str) -> bool {
        self.friends.iter().any(|id| id == friend_id)
    }

    pub fn has_friend_request_from(&self, requester_id: &str) -> bool {
        self.friend_requests.iter().any(|id| id == requester_id)
    }

    /// Whether the user has already logged a workout on the same calendar day
    /// (UTC) as `now`.
    pub fn worked_out_today(&self, now: DateTime<Utc>) -> bool {
        match self.last_workout_date {
            Some(last) => same_day(last, now),
            None => false,
        }
    }

    /// Advance the streak for a workout logged at `now`: +1 if the previous
    /// workout was yesterday, otherwise the streak restarts at 1. Callers guard
    /// the same-day case with `worked_out_today`.
    pub fn update_streak(&mut self, now: DateTime<Utc>) {
        match self.last_workout_date {
            Some(last) if same_day(last, now - Duration::days(1)) => {
                self.streak_count += 1;
            }
            _ => {
                self.streak_count = 1;
            }
        }
    }

    pub fn friend_count(&self) -> usize {
        self.friends.len()
    }
}

/// Public subset of a user returned in friend listings and search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// Profile view of a user without the embedded collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub streak_count: u32,
    pub last_workout_date: Option<DateTime<Utc>>,
    pub friend_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            streak_count: user.streak_count,
            last_workout_date: user.last_workout_date,
            friend_count: user.friend_count(),
            created_at: user.created_at,
        }
    }
}

/// One participant's progress inside a challenge. Kept in lockstep with the
/// `participants` list: exactly one entry per participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub user_id: String,
    pub value: u32,
    pub updated_at: DateTime<Utc>,
}

/// Challenge aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub goal: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub participants: Vec<String>,
    pub progress: Vec<ProgressEntry>,
    pub created_by: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn generate_id() -> String {
        format!("challenge::{}", Uuid::new_v4())
    }

    /// Derived time-window state. Recomputed on every read, never stored.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.end_date
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        now < self.start_date
    }

    pub fn is_ongoing(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_date && now <= self.end_date
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.end_date - now).num_milliseconds();
        let days = (millis as f64 / 86_400_000.0).ceil() as i64;
        days.max(0)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_participating(&self, user_id: &str) -> bool {
        self.participants.iter().any(|id| id == user_id)
    }

    /// Idempotent: joining a second time leaves both lists untouched.
    pub fn add_participant(&mut self, user_id: &str, now: DateTime<Utc>) {
        if !self.is_participating(user_id) {
            self.participants.push(user_id.to_string());
            self.progress.push(ProgressEntry {
                user_id: user_id.to_string(),
                value: 0,
                updated_at: now,
            });
        }
    }

    /// Removes the user from `participants` and `progress` together so the two
    /// lists never diverge.
    pub fn remove_participant(&mut self, user_id: &str) {
        self.participants.retain(|id| id != user_id);
        self.progress.retain(|p| p.user_id != user_id);
    }

    /// Upsert the user's progress value. The insert arm restores the lockstep
    /// invariant if a progress entry went missing.
    pub fn upsert_progress(&mut self, user_id: &str, value: u32, now: DateTime<Utc>) {
        match self.progress.iter_mut().find(|p| p.user_id == user_id) {
            Some(entry) => {
                entry.value = value;
                entry.updated_at = now;
            }
            None => self.progress.push(ProgressEntry {
                user_id: user_id.to_string(),
                value,
                updated_at: now,
            }),
        }
    }

    pub fn progress_for(&self, user_id: &str) -> u32 {
        self.progress
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.value)
            .unwrap_or(0)
    }

    /// Top entries sorted descending by value. The sort is stable, so ties keep
    /// insertion order.
    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut ranked = self.progress.clone();
        ranked.sort_by(|a, b| b.value.cmp(&a.value));
        ranked
            .into_iter()
            .take(limit)
            .map(|p| LeaderboardEntry {
                percentage: percentage_of(p.value, self.goal),
                user_id: p.user_id,
                progress: p.value,
            })
            .collect()
    }
}

/// Whole percentage of `value` against `goal`, rounded half-up like the UI
/// expects.
pub fn percentage_of(value: u32, goal: u32) -> u32 {
    if goal == 0 {
        return 0;
    }
    ((value as f64 / goal as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub progress: u32,
    pub percentage: u32,
}

/// Exercise catalogue entry; a top-level aggregate referenced from workout
/// history by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCard {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub category: ExerciseCategory,
    /// Duration in minutes, 1..=120.
    pub duration: u32,
    pub calories_burned: Option<u32>,
    pub completion_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ExerciseCard {
    pub fn generate_id() -> String {
        format!("exercise::{}", Uuid::new_v4())
    }

    /// Derived field, computed on read.
    pub fn calories_per_minute(&self) -> u32 {
        match self.calories_burned {
            Some(calories) if self.duration > 0 => {
                (calories as f64 / self.duration as f64).round() as u32
            }
            _ => 0,
        }
    }
}

fn same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

// ---------------------------------------------------------------------------
// Pagination envelope
// ---------------------------------------------------------------------------

/// Pagination block attached to every list response. Field names are the wire
/// contract consumed by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJournalEntryRequest {
    pub title: Option<String>,
    pub content: String,
    pub mood: Option<Mood>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateJournalEntryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<Mood>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFoodLogRequest {
    pub date: DateTime<Utc>,
    pub meals: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFoodLogRequest {
    pub date: Option<DateTime<Utc>>,
    pub meals: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTriggerRequest {
    pub trigger: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTriggerRequest {
    pub trigger: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogWorkoutRequest {
    pub exercise_id: String,
    pub duration: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeRequest {
    pub title: String,
    pub description: String,
    pub goal: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProgressRequest {
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExerciseRequest {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub category: ExerciseCategory,
    pub duration: u32,
    pub calories_burned: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub pagination: PaginationMeta,
    pub summary: TaskSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTaskResponse {
    pub message: String,
    pub affected_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatsResponse {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub completion_rate: u32,
    pub tasks_this_week: usize,
    pub completed_this_week: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntryResponse {
    pub message: String,
    pub entry: JournalEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSummary {
    pub total_entries: usize,
    pub filtered_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalListResponse {
    pub entries: Vec<JournalEntry>,
    pub pagination: PaginationMeta,
    pub summary: JournalSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalSearchResponse {
    pub query: String,
    pub entries: Vec<JournalEntry>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodCounts {
    pub great: usize,
    pub good: usize,
    pub okay: usize,
    pub bad: usize,
    pub terrible: usize,
    pub unspecified: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalStatsResponse {
    pub total_entries: usize,
    pub entries_this_week: usize,
    pub entries_this_month: usize,
    pub mood_counts: MoodCounts,
    pub most_common_mood: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodTrendPoint {
    pub date: String,
    pub average_mood: f64,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodTrendsResponse {
    pub trends: Vec<MoodTrendPoint>,
    pub period: String,
    pub total_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLogResponse {
    pub message: String,
    pub food_log: FoodLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLogListResponse {
    pub food_logs: Vec<FoodLog>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionStatsResponse {
    pub total_logs: usize,
    pub logs_in_period: usize,
    pub period: String,
    pub total_meals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub message: String,
    pub trigger: TriggerLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerListResponse {
    pub triggers: Vec<TriggerLog>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCount {
    pub trigger: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerStatsResponse {
    pub total_triggers: usize,
    pub triggers_this_week: usize,
    pub triggers_this_month: usize,
    pub common_triggers: Vec<TriggerCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutResponse {
    pub message: String,
    pub workout: WorkoutEntry,
    pub streak_count: u32,
    pub worked_out_today: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutListResponse {
    pub workouts: Vec<WorkoutEntry>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStatsResponse {
    pub total_workouts: usize,
    pub streak_count: u32,
    pub last_workout_date: Option<DateTime<Utc>>,
    pub this_week: usize,
    pub this_month: usize,
    pub total_minutes: u64,
    pub total_hours: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendListResponse {
    pub friends: Vec<UserSummary>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestListResponse {
    pub friend_requests: Vec<UserSummary>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub user: UserSummary,
    pub workout: WorkoutEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFeedResponse {
    pub activities: Vec<ActivityItem>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSearchResponse {
    pub query: String,
    pub users: Vec<UserSummary>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub message: String,
    pub challenge: ChallengeView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeListResponse {
    pub challenges: Vec<ChallengeView>,
    pub pagination: PaginationMeta,
}

/// Challenge plus its derived time-window fields, recomputed at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeView {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub participant_count: usize,
    pub days_remaining: i64,
    pub is_expired: bool,
    pub is_upcoming: bool,
    pub is_ongoing: bool,
}

impl ChallengeView {
    pub fn new(challenge: Challenge, now: DateTime<Utc>) -> Self {
        Self {
            participant_count: challenge.participant_count(),
            days_remaining: challenge.days_remaining(now),
            is_expired: challenge.is_expired(now),
            is_upcoming: challenge.is_upcoming(now),
            is_ongoing: challenge.is_ongoing(now),
            challenge,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub challenge_title: String,
    pub goal: u32,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeStatsResponse {
    pub total_challenges: usize,
    pub active_challenges: usize,
    pub upcoming_challenges: usize,
    pub user_participating: usize,
    pub user_completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseListResponse {
    pub exercises: Vec<ExerciseCard>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_mood_scores() {
        assert_eq!(Mood::Terrible.score(), 1);
        assert_eq!(Mood::Bad.score(), 2);
        assert_eq!(Mood::Okay.score(), 3);
        assert_eq!(Mood::Good.score(), 4);
        assert_eq!(Mood::Great.score(), 5);
    }

    #[test]
    fn test_challenge_time_windows() {
        let challenge = Challenge {
            id: Challenge::generate_id(),
            title: "March push-ups".to_string(),
            description: "Push-ups every day".to_string(),
            goal: 100,
            start_date: at(2025, 3, 1, 0),
            end_date: at(2025, 3, 31, 0),
            participants: vec![],
            progress: vec![],
            created_by: "user::creator".to_string(),
            is_active: true,
            created_at: at(2025, 2, 1, 0),
        };

        assert!(challenge.is_upcoming(at(2025, 2, 15, 0)));
        assert!(!challenge.is_ongoing(at(2025, 2, 15, 0)));

        assert!(challenge.is_ongoing(at(2025, 3, 15, 0)));
        assert!(!challenge.is_upcoming(at(2025, 3, 15, 0)));
        assert!(!challenge.is_expired(at(2025, 3, 15, 0)));

        assert!(challenge.is_expired(at(2025, 4, 1, 0)));
        assert!(!challenge.is_ongoing(at(2025, 4, 1, 0)));

        // Boundaries are inclusive for ongoing.
        assert!(challenge.is_ongoing(at(2025, 3, 1, 0)));
        assert!(challenge.is_ongoing(at(2025, 3, 31, 0)));
    }

    #[test]
    fn test_days_remaining_rounds_up_and_floors_at_zero() {
        let challenge = Challenge {
            id: Challenge::generate_id(),
            title: "Short one".to_string(),
            description: "A short challenge".to_string(),
            goal: 10,
            start_date: at(2025, 3, 1, 0),
            end_date: at(2025, 3, 10, 12),
            participants: vec![],
            progress: vec![],
            created_by: "user::creator".to_string(),
            is_active: true,
            created_at: at(2025, 2, 1, 0),
        };

        // 2.5 days out rounds up to 3.
        assert_eq!(challenge.days_remaining(at(2025, 3, 8, 0)), 3);
        // Already over: clamped at 0.
        assert_eq!(challenge.days_remaining(at(2025, 4, 1, 0)), 0);
    }

    #[test]
    fn test_participant_and_progress_stay_in_lockstep() {
        let mut challenge = Challenge {
            id: Challenge::generate_id(),
            title: "Lockstep".to_string(),
            description: "Membership test".to_string(),
            goal: 50,
            start_date: at(2025, 3, 1, 0),
            end_date: at(2025, 3, 31, 0),
            participants: vec![],
            progress: vec![],
            created_by: "user::creator".to_string(),
            is_active: true,
            created_at: at(2025, 2, 1, 0),
        };
        let now = at(2025, 3, 2, 0);

        challenge.add_participant("user::a", now);
        assert_eq!(challenge.participants.len(), 1);
        assert_eq!(challenge.progress.len(), 1);
        assert_eq!(challenge.progress_for("user::a"), 0);

        // Joining again is a no-op.
        challenge.add_participant("user::a", now);
        assert_eq!(challenge.participants.len(), 1);
        assert_eq!(challenge.progress.len(), 1);

        challenge.remove_participant("user::a");
        assert!(challenge.participants.is_empty());
        assert!(challenge.progress.is_empty());
    }

    #[test]
    fn test_upsert_progress_restores_missing_entry() {
        let mut challenge = Challenge {
            id: Challenge::generate_id(),
            title: "Upsert".to_string(),
            description: "Progress test".to_string(),
            goal: 50,
            start_date: at(2025, 3, 1, 0),
            end_date: at(2025, 3, 31, 0),
            participants: vec!["user::a".to_string()],
            // Progress entry missing: lockstep violated upstream.
            progress: vec![],
            created_by: "user::creator".to_string(),
            is_active: true,
            created_at: at(2025, 2, 1, 0),
        };

        challenge.upsert_progress("user::a", 7, at(2025, 3, 5, 0));
        assert_eq!(challenge.progress_for("user::a"), 7);

        challenge.upsert_progress("user::a", 12, at(2025, 3, 6, 0));
        assert_eq!(challenge.progress.len(), 1);
        assert_eq!(challenge.progress_for("user::a"), 12);
    }

    #[test]
    fn test_leaderboard_sorted_descending_with_stable_ties() {
        let now = at(2025, 3, 5, 0);
        let mut challenge = Challenge {
            id: Challenge::generate_id(),
            title: "Ranking".to_string(),
            description: "Leaderboard test".to_string(),
            goal: 50,
            start_date: at(2025, 3, 1, 0),
            end_date: at(2025, 3, 31, 0),
            participants: vec![],
            progress: vec![],
            created_by: "user::creator".to_string(),
            is_active: true,
            created_at: at(2025, 2, 1, 0),
        };
        for (user, value) in [("user::a", 10), ("user::b", 42), ("user::c", 10)] {
            challenge.add_participant(user, now);
            challenge.upsert_progress(user, value, now);
        }

        let board = challenge.leaderboard(10);
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].user_id, "user::b");
        assert_eq!(board[0].percentage, 84);
        // Tie between a and c keeps insertion order.
        assert_eq!(board[1].user_id, "user::a");
        assert_eq!(board[2].user_id, "user::c");
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage_of(42, 50), 84);
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(5, 0), 0);
    }

    #[test]
    fn test_add_friend_is_idempotent() {
        let now = at(2025, 3, 1, 0);
        let mut user = User::new("a@example.com".to_string(), "Ana".to_string(), now);
        user.add_friend("user::b");
        user.add_friend("user::b");
        assert_eq!(user.friends.len(), 1);
        assert!(user.is_friend("user::b"));

        user.remove_friend("user::b");
        assert!(user.friends.is_empty());
    }

    #[test]
    fn test_streak_advances_on_consecutive_days() {
        let mut user = User::new("a@example.com".to_string(), "Ana".to_string(), at(2025, 3, 1, 8));

        // First ever workout starts the streak at 1.
        user.update_streak(at(2025, 3, 1, 9));
        user.last_workout_date = Some(at(2025, 3, 1, 9));
        assert_eq!(user.streak_count, 1);

        // Next-day workout extends it.
        assert!(!user.worked_out_today(at(2025, 3, 2, 9)));
        user.update_streak(at(2025, 3, 2, 9));
        user.last_workout_date = Some(at(2025, 3, 2, 9));
        assert_eq!(user.streak_count, 2);

        // Same day again: guard fires, streak untouched.
        assert!(user.worked_out_today(at(2025, 3, 2, 20)));

        // A gap resets the streak to 1.
        user.update_streak(at(2025, 3, 5, 9));
        assert_eq!(user.streak_count, 1);
    }

    #[test]
    fn test_calories_per_minute() {
        let card = ExerciseCard {
            id: ExerciseCard::generate_id(),
            name: "Rowing".to_string(),
            description: None,
            difficulty: Difficulty::Intermediate,
            category: ExerciseCategory::Cardio,
            duration: 30,
            calories_burned: Some(260),
            completion_count: 0,
            is_active: true,
            created_at: at(2025, 1, 1, 0),
        };
        assert_eq!(card.calories_per_minute(), 9);

        let no_calories = ExerciseCard {
            calories_burned: None,
            ..card
        };
        assert_eq!(no_calories.calories_per_minute(), 0);
    }
}
