//! Core services. Each sub-module owns one slice of the API surface and talks
//! to the document store through `DbConnection`; the REST layer stays thin.

pub mod challenges;
pub mod collections;
pub mod errors;
pub mod exercises;
pub mod friendship;
pub mod journal;
pub mod nutrition;
pub mod pagination;
pub mod tasks;
pub mod triggers;
pub mod users;
pub mod workouts;

pub use challenges::ChallengeService;
pub use errors::CoreError;
pub use exercises::ExerciseService;
pub use friendship::FriendshipService;
pub use journal::JournalService;
pub use nutrition::NutritionService;
pub use tasks::TaskService;
pub use triggers::TriggerService;
pub use users::UserService;
pub use workouts::WorkoutService;
