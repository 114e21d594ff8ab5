//! Task list operations over the embedded `tasks` collection.

use crate::db::DbConnection;
use crate::domain::collections::{self, contains_ci, SortOrder};
use crate::domain::errors::CoreError;
use crate::domain::pagination::{parse_pagination, PageQuery};
use chrono::{Duration, Utc};
use serde::Deserialize;
use shared::{
    BulkTaskResponse, CreateTaskRequest, Task, TaskListResponse, TaskResponse, TaskStatsResponse,
    TaskSummary, UpdateTaskRequest,
};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListQuery {
    pub completed: Option<bool>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Clone)]
pub struct TaskService {
    db: DbConnection,
}

impl TaskService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Create a task. `createdAt` is server-assigned; any client-supplied
    /// timestamp has no field to land in.
    pub async fn create_task(
        &self,
        user_id: &str,
        request: CreateTaskRequest,
    ) -> Result<TaskResponse, CoreError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: request.title.trim().to_string(),
            completed: false,
            created_at: now,
        };
        let task = collections::append(&self.db, user_id, task, now).await?;

        Ok(TaskResponse {
            message: "Task created successfully".to_string(),
            task,
        })
    }

    pub async fn list_tasks(
        &self,
        user_id: &str,
        query: TaskListQuery,
    ) -> Result<TaskListResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let params = parse_pagination(&PageQuery {
            page: query.page,
            limit: query.limit,
        });

        let (tasks, pagination) = collections::list_page(
            &user.tasks,
            |task: &Task| {
                if let Some(completed) = query.completed {
                    if task.completed != completed {
                        return false;
                    }
                }
                if let Some(search) = &query.search {
                    if !contains_ci(&task.title, search) {
                        return false;
                    }
                }
                true
            },
            SortOrder::NewestFirst,
            params,
        );

        let completed = user.tasks.iter().filter(|t| t.completed).count();
        Ok(TaskListResponse {
            tasks,
            pagination,
            summary: TaskSummary {
                total: user.tasks.len(),
                completed,
                pending: user.tasks.len() - completed,
            },
        })
    }

    pub async fn get_task(&self, user_id: &str, task_id: &str) -> Result<Task, CoreError> {
        collections::get_by_id(&self.db, user_id, task_id).await
    }

    /// Partial update: only the provided fields change; `createdAt` is
    /// immutable.
    pub async fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        request: UpdateTaskRequest,
    ) -> Result<TaskResponse, CoreError> {
        let task = collections::update(&self.db, user_id, task_id, Utc::now(), |task: &mut Task| {
            if let Some(title) = request.title {
                task.title = title.trim().to_string();
            }
            if let Some(completed) = request.completed {
                task.completed = completed;
            }
        })
        .await?;

        Ok(TaskResponse {
            message: "Task updated successfully".to_string(),
            task,
        })
    }

    pub async fn toggle_task(&self, user_id: &str, task_id: &str) -> Result<TaskResponse, CoreError> {
        let task = collections::update(&self.db, user_id, task_id, Utc::now(), |task: &mut Task| {
            task.completed = !task.completed;
        })
        .await?;

        Ok(TaskResponse {
            message: if task.completed {
                "Task marked as completed".to_string()
            } else {
                "Task marked as pending".to_string()
            },
            task,
        })
    }

    pub async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<(), CoreError> {
        collections::remove::<Task>(&self.db, user_id, task_id, Utc::now()).await
    }

    /// Mark every pending task completed. Returns how many flipped.
    pub async fn complete_all(&self, user_id: &str) -> Result<BulkTaskResponse, CoreError> {
        let now = Utc::now();
        let mut user = self.db.load_user(user_id).await?;
        let mut updated = 0;
        for task in user.tasks.iter_mut().filter(|t| !t.completed) {
            task.completed = true;
            updated += 1;
        }
        user.updated_at = now;
        self.db.save_user(&user).await?;

        info!("Marked {} tasks as completed for user {}", updated, user_id);
        Ok(BulkTaskResponse {
            message: format!("{} task(s) marked as completed", updated),
            affected_count: updated,
        })
    }

    /// Remove every completed task. Returns how many were deleted.
    pub async fn delete_completed(&self, user_id: &str) -> Result<BulkTaskResponse, CoreError> {
        let now = Utc::now();
        let mut user = self.db.load_user(user_id).await?;
        let before = user.tasks.len();
        user.tasks.retain(|t| !t.completed);
        let deleted = before - user.tasks.len();
        user.updated_at = now;
        self.db.save_user(&user).await?;

        info!("Deleted {} completed tasks for user {}", deleted, user_id);
        Ok(BulkTaskResponse {
            message: format!("{} completed task(s) deleted successfully", deleted),
            affected_count: deleted,
        })
    }

    pub async fn task_stats(&self, user_id: &str) -> Result<TaskStatsResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let now = Utc::now();
        let week_ago = now - Duration::days(7);

        let total = user.tasks.len();
        let completed = user.tasks.iter().filter(|t| t.completed).count();
        let completion_rate = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };

        Ok(TaskStatsResponse {
            total_tasks: total,
            completed_tasks: completed,
            pending_tasks: total - completed,
            completion_rate,
            tasks_this_week: user.tasks.iter().filter(|t| t.created_at > week_ago).count(),
            completed_this_week: user
                .tasks
                .iter()
                .filter(|t| t.completed && t.created_at > week_ago)
                .count(),
        })
    }
}
