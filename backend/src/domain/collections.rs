//! Embedded collection manager.
//!
//! Tasks, journal entries, food logs, triggers, and workout history all live as
//! arrays embedded in the `User` aggregate. This module gives them one shared
//! set of operations: append with cap and schema checks, lookup/update/remove
//! by sub-document id (never by array index), and in-memory
//! filter/sort/paginate. Per-kind rules live in the `EmbeddedItem`
//! implementations below rather than in duplicated code paths.

use crate::db::DbConnection;
use crate::domain::errors::CoreError;
use crate::domain::pagination::{paginate, pagination_meta, PageParams};
use chrono::{DateTime, Utc};
use shared::{FoodLog, JournalEntry, PaginationMeta, Task, TriggerLog, User, WorkoutEntry};
use tracing::info;

/// A sub-document type embedded in the user aggregate.
pub trait EmbeddedItem: Clone {
    /// Resource name used in errors and logs ("Task", "Journal entry", ...).
    const RESOURCE: &'static str;
    /// Maximum number of items the parent array may hold.
    const CAP: usize;

    fn id(&self) -> &str;
    /// The field used for default newest-first ordering and date filters.
    fn sort_date(&self) -> DateTime<Utc>;
    fn items(user: &User) -> &Vec<Self>;
    fn items_mut(user: &mut User) -> &mut Vec<Self>;
    /// Schema validation for a fully merged item.
    fn validate(&self, now: DateTime<Utc>) -> Result<(), CoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Validate and append one item, persisting the whole aggregate. Returns the
/// stored item.
pub async fn append<T: EmbeddedItem>(
    db: &DbConnection,
    user_id: &str,
    item: T,
    now: DateTime<Utc>,
) -> Result<T, CoreError> {
    item.validate(now)?;

    let mut user = db.load_user(user_id).await?;
    let items = T::items_mut(&mut user);
    if items.len() >= T::CAP {
        return Err(CoreError::validation(format!(
            "{} limit exceeded",
            T::RESOURCE
        )));
    }
    items.push(item.clone());
    user.updated_at = now;
    db.save_user(&user).await?;

    info!("{} created for user {}", T::RESOURCE, user_id);
    Ok(item)
}

/// Linear scan by sub-document id.
pub async fn get_by_id<T: EmbeddedItem>(
    db: &DbConnection,
    user_id: &str,
    item_id: &str,
) -> Result<T, CoreError> {
    let user = db.load_user(user_id).await?;
    T::items(&user)
        .iter()
        .find(|item| item.id() == item_id)
        .cloned()
        .ok_or_else(|| CoreError::not_found(T::RESOURCE))
}

/// Partial update: `patch` mutates only the provided fields on the existing
/// item, the merged result is re-validated, then the aggregate is persisted.
pub async fn update<T, F>(
    db: &DbConnection,
    user_id: &str,
    item_id: &str,
    now: DateTime<Utc>,
    patch: F,
) -> Result<T, CoreError>
where
    T: EmbeddedItem,
    F: FnOnce(&mut T),
{
    let mut user = db.load_user(user_id).await?;
    let item = T::items_mut(&mut user)
        .iter_mut()
        .find(|item| item.id() == item_id)
        .ok_or_else(|| CoreError::not_found(T::RESOURCE))?;

    patch(item);
    item.validate(now)?;
    let updated = item.clone();

    user.updated_at = now;
    db.save_user(&user).await?;

    info!("{} updated: {} for user {}", T::RESOURCE, item_id, user_id);
    Ok(updated)
}

/// Remove by sub-document id. Removing an id that is already gone reports
/// `NotFound`, never silent success.
pub async fn remove<T: EmbeddedItem>(
    db: &DbConnection,
    user_id: &str,
    item_id: &str,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    let mut user = db.load_user(user_id).await?;
    let items = T::items_mut(&mut user);
    let before = items.len();
    items.retain(|item| item.id() != item_id);
    if items.len() == before {
        return Err(CoreError::not_found(T::RESOURCE));
    }
    user.updated_at = now;
    db.save_user(&user).await?;

    info!("{} deleted: {} for user {}", T::RESOURCE, item_id, user_id);
    Ok(())
}

/// Filter, sort by the item's date field, and slice one page. The sort is
/// stable, so items sharing a timestamp keep their insertion order.
pub fn list_page<T, P>(
    items: &[T],
    filter: P,
    order: SortOrder,
    params: PageParams,
) -> (Vec<T>, PaginationMeta)
where
    T: EmbeddedItem,
    P: Fn(&T) -> bool,
{
    let mut matched: Vec<T> = items.iter().filter(|item| filter(item)).cloned().collect();
    match order {
        SortOrder::NewestFirst => matched.sort_by(|a, b| b.sort_date().cmp(&a.sort_date())),
        SortOrder::OldestFirst => matched.sort_by(|a, b| a.sort_date().cmp(&b.sort_date())),
    }

    let total = matched.len() as u64;
    let page = paginate(&matched, params);
    (page, pagination_meta(params, total))
}

/// Case-insensitive substring match used by `search` filters.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Inclusive date-range check; open bounds match everything on that side.
pub fn in_date_range(
    date: DateTime<Utc>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    if let Some(start) = start {
        if date < start {
            return false;
        }
    }
    if let Some(end) = end {
        if date > end {
            return false;
        }
    }
    true
}

fn check_len(
    resource: &str,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), CoreError> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(CoreError::validation(format!(
            "{} {} cannot be empty",
            resource, field
        )));
    }
    if len > max {
        return Err(CoreError::validation(format!(
            "{} {} cannot exceed {} characters",
            resource, field, max
        )));
    }
    Ok(())
}

fn check_optional_len(
    resource: &str,
    field: &str,
    value: &Option<String>,
    max: usize,
) -> Result<(), CoreError> {
    if let Some(value) = value {
        if value.chars().count() > max {
            return Err(CoreError::validation(format!(
                "{} {} cannot exceed {} characters",
                resource, field, max
            )));
        }
    }
    Ok(())
}

impl EmbeddedItem for Task {
    const RESOURCE: &'static str = "Task";
    const CAP: usize = 1000;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_date(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn items(user: &User) -> &Vec<Self> {
        &user.tasks
    }

    fn items_mut(user: &mut User) -> &mut Vec<Self> {
        &mut user.tasks
    }

    fn validate(&self, _now: DateTime<Utc>) -> Result<(), CoreError> {
        check_len("Task", "title", &self.title, 1, 200)
    }
}

impl EmbeddedItem for JournalEntry {
    const RESOURCE: &'static str = "Journal entry";
    const CAP: usize = 5000;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_date(&self) -> DateTime<Utc> {
        self.date
    }

    fn items(user: &User) -> &Vec<Self> {
        &user.journal
    }

    fn items_mut(user: &mut User) -> &mut Vec<Self> {
        &mut user.journal
    }

    fn validate(&self, _now: DateTime<Utc>) -> Result<(), CoreError> {
        check_optional_len("Journal entry", "title", &self.title, 200)?;
        check_len("Journal entry", "content", &self.content, 1, 10_000)
    }
}

impl EmbeddedItem for FoodLog {
    const RESOURCE: &'static str = "Food log";
    const CAP: usize = 5000;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_date(&self) -> DateTime<Utc> {
        self.date
    }

    fn items(user: &User) -> &Vec<Self> {
        &user.food_logs
    }

    fn items_mut(user: &mut User) -> &mut Vec<Self> {
        &mut user.food_logs
    }

    fn validate(&self, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.date > now {
            return Err(CoreError::validation("Food log date cannot be in the future"));
        }
        if self.meals.is_empty() || self.meals.len() > 10 {
            return Err(CoreError::validation(
                "Must have between 1 and 10 meals logged per day",
            ));
        }
        check_optional_len("Food log", "notes", &self.notes, 500)
    }
}

impl EmbeddedItem for TriggerLog {
    const RESOURCE: &'static str = "Trigger";
    const CAP: usize = 2000;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_date(&self) -> DateTime<Utc> {
        self.date
    }

    fn items(user: &User) -> &Vec<Self> {
        &user.triggers
    }

    fn items_mut(user: &mut User) -> &mut Vec<Self> {
        &mut user.triggers
    }

    fn validate(&self, _now: DateTime<Utc>) -> Result<(), CoreError> {
        check_len("Trigger", "description", &self.trigger, 1, 300)?;
        check_optional_len("Trigger", "notes", &self.notes, 1000)
    }
}

impl EmbeddedItem for WorkoutEntry {
    const RESOURCE: &'static str = "Workout";
    const CAP: usize = 10_000;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_date(&self) -> DateTime<Utc> {
        self.date
    }

    fn items(user: &User) -> &Vec<Self> {
        &user.workout_history
    }

    fn items_mut(user: &mut User) -> &mut Vec<Self> {
        &mut user.workout_history
    }

    fn validate(&self, _now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.exercise_id.is_empty() {
            return Err(CoreError::validation("Exercise ID is required"));
        }
        check_optional_len("Workout", "notes", &self.notes, 500)
    }
}
