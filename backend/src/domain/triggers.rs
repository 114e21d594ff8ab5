//! Trigger log operations over the embedded `triggers` collection.

use crate::db::DbConnection;
use crate::domain::collections::{self, contains_ci, in_date_range, SortOrder};
use crate::domain::errors::CoreError;
use crate::domain::pagination::{parse_pagination, PageQuery};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use shared::{
    CreateTriggerRequest, TriggerCount, TriggerListResponse, TriggerLog, TriggerResponse,
    TriggerStatsResponse, UpdateTriggerRequest,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerListQuery {
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Clone)]
pub struct TriggerService {
    db: DbConnection,
}

impl TriggerService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Log a trigger. The timestamp is server-assigned and immutable.
    pub async fn log_trigger(
        &self,
        user_id: &str,
        request: CreateTriggerRequest,
    ) -> Result<TriggerResponse, CoreError> {
        let now = Utc::now();
        let log = TriggerLog {
            id: Uuid::new_v4().to_string(),
            trigger: request.trigger.trim().to_string(),
            notes: request.notes,
            date: now,
        };
        let trigger = collections::append(&self.db, user_id, log, now).await?;

        Ok(TriggerResponse {
            message: "Trigger logged successfully".to_string(),
            trigger,
        })
    }

    pub async fn list_triggers(
        &self,
        user_id: &str,
        query: TriggerListQuery,
    ) -> Result<TriggerListResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let params = parse_pagination(&PageQuery {
            page: query.page,
            limit: query.limit,
        });

        let (triggers, pagination) = collections::list_page(
            &user.triggers,
            |log: &TriggerLog| {
                if let Some(search) = &query.search {
                    let notes_hit = log
                        .notes
                        .as_deref()
                        .map(|n| contains_ci(n, search))
                        .unwrap_or(false);
                    if !contains_ci(&log.trigger, search) && !notes_hit {
                        return false;
                    }
                }
                in_date_range(log.date, query.start_date, query.end_date)
            },
            SortOrder::NewestFirst,
            params,
        );

        Ok(TriggerListResponse {
            triggers,
            pagination,
        })
    }

    pub async fn get_trigger(&self, user_id: &str, trigger_id: &str) -> Result<TriggerLog, CoreError> {
        collections::get_by_id(&self.db, user_id, trigger_id).await
    }

    pub async fn update_trigger(
        &self,
        user_id: &str,
        trigger_id: &str,
        request: UpdateTriggerRequest,
    ) -> Result<TriggerResponse, CoreError> {
        let trigger =
            collections::update(&self.db, user_id, trigger_id, Utc::now(), |log: &mut TriggerLog| {
                if let Some(description) = request.trigger {
                    log.trigger = description.trim().to_string();
                }
                if let Some(notes) = request.notes {
                    log.notes = Some(notes);
                }
            })
            .await?;

        Ok(TriggerResponse {
            message: "Trigger updated successfully".to_string(),
            trigger,
        })
    }

    pub async fn delete_trigger(&self, user_id: &str, trigger_id: &str) -> Result<(), CoreError> {
        collections::remove::<TriggerLog>(&self.db, user_id, trigger_id, Utc::now()).await
    }

    /// Counts plus the five most frequent trigger descriptions
    /// (case-insensitive).
    pub async fn trigger_stats(&self, user_id: &str) -> Result<TriggerStatsResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let now = Utc::now();
        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for log in &user.triggers {
            *counts.entry(log.trigger.to_lowercase()).or_insert(0) += 1;
        }
        let mut common: Vec<TriggerCount> = counts
            .into_iter()
            .map(|(trigger, count)| TriggerCount { trigger, count })
            .collect();
        common.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.trigger.cmp(&b.trigger)));
        common.truncate(5);

        Ok(TriggerStatsResponse {
            total_triggers: user.triggers.len(),
            triggers_this_week: user.triggers.iter().filter(|t| t.date > week_ago).count(),
            triggers_this_month: user.triggers.iter().filter(|t| t.date > month_ago).count(),
            common_triggers: common,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::User;

    async fn setup() -> (TriggerService, User) {
        let db = DbConnection::init_test().await.unwrap();
        let user = User::new("ana@example.com".to_string(), "Ana".to_string(), Utc::now());
        db.save_user(&user).await.unwrap();
        (TriggerService::new(db), user)
    }

    #[tokio::test]
    async fn test_log_update_delete_roundtrip() {
        let (service, user) = setup().await;

        let created = service
            .log_trigger(
                &user.id,
                CreateTriggerRequest {
                    trigger: "Late-night snacking".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();

        let updated = service
            .update_trigger(
                &user.id,
                &created.trigger.id,
                UpdateTriggerRequest {
                    trigger: None,
                    notes: Some("Usually after skipping dinner".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.trigger.trigger, "Late-night snacking");
        assert_eq!(updated.trigger.date, created.trigger.date);

        service.delete_trigger(&user.id, &created.trigger.id).await.unwrap();
        let err = service
            .get_trigger(&user.id, &created.trigger.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_validation_bounds() {
        let (service, user) = setup().await;

        let err = service
            .log_trigger(
                &user.id,
                CreateTriggerRequest {
                    trigger: "   ".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = service
            .log_trigger(
                &user.id,
                CreateTriggerRequest {
                    trigger: "x".repeat(301),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_spans_description_and_notes() {
        let (service, user) = setup().await;

        service
            .log_trigger(
                &user.id,
                CreateTriggerRequest {
                    trigger: "Stress at work".to_string(),
                    notes: Some("Deadline week".to_string()),
                },
            )
            .await
            .unwrap();
        service
            .log_trigger(
                &user.id,
                CreateTriggerRequest {
                    trigger: "Boredom".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();

        let hits = service
            .list_triggers(
                &user.id,
                TriggerListQuery {
                    search: Some("deadline".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(hits.triggers.len(), 1);
        assert_eq!(hits.triggers[0].trigger, "Stress at work");
    }

    #[tokio::test]
    async fn test_common_triggers_ranked() {
        let (service, user) = setup().await;

        for trigger in ["Stress", "stress", "Boredom", "STRESS", "Boredom", "Fatigue"] {
            service
                .log_trigger(
                    &user.id,
                    CreateTriggerRequest {
                        trigger: trigger.to_string(),
                        notes: None,
                    },
                )
                .await
                .unwrap();
        }

        let stats = service.trigger_stats(&user.id).await.unwrap();
        assert_eq!(stats.total_triggers, 6);
        assert_eq!(stats.common_triggers[0].trigger, "stress");
        assert_eq!(stats.common_triggers[0].count, 3);
        assert_eq!(stats.common_triggers[1].trigger, "boredom");
        assert_eq!(stats.common_triggers[1].count, 2);
    }
}
