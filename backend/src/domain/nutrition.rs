//! Food log operations over the embedded `foodLogs` collection.

use crate::db::DbConnection;
use crate::domain::collections::{self, in_date_range, SortOrder};
use crate::domain::errors::CoreError;
use crate::domain::pagination::{parse_pagination, PageQuery};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use shared::{
    CreateFoodLogRequest, FoodLog, FoodLogListResponse, FoodLogResponse, NutritionStatsResponse,
    UpdateFoodLogRequest,
};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLogListQuery {
    /// Exact-day filter; takes precedence over the range bounds.
    pub date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsQuery {
    pub days: Option<u32>,
}

#[derive(Clone)]
pub struct NutritionService {
    db: DbConnection,
}

impl NutritionService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Log a day of meals. The date is caller-supplied and validated against
    /// the server clock; future dates are rejected.
    pub async fn log_food(
        &self,
        user_id: &str,
        request: CreateFoodLogRequest,
    ) -> Result<FoodLogResponse, CoreError> {
        let now = Utc::now();
        let log = FoodLog {
            id: Uuid::new_v4().to_string(),
            date: request.date,
            meals: request.meals,
            notes: request.notes,
        };
        let food_log = collections::append(&self.db, user_id, log, now).await?;

        Ok(FoodLogResponse {
            message: "Food log created successfully".to_string(),
            food_log,
        })
    }

    pub async fn list_logs(
        &self,
        user_id: &str,
        query: FoodLogListQuery,
    ) -> Result<FoodLogListResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let params = parse_pagination(&PageQuery {
            page: query.page,
            limit: query.limit,
        });

        let target_day = query.date.map(|d| d.format("%Y-%m-%d").to_string());
        let (food_logs, pagination) = collections::list_page(
            &user.food_logs,
            |log: &FoodLog| match &target_day {
                Some(day) => log.date.format("%Y-%m-%d").to_string() == *day,
                None => in_date_range(log.date, query.start_date, query.end_date),
            },
            SortOrder::NewestFirst,
            params,
        );

        Ok(FoodLogListResponse {
            food_logs,
            pagination,
        })
    }

    pub async fn get_log(&self, user_id: &str, log_id: &str) -> Result<FoodLog, CoreError> {
        collections::get_by_id(&self.db, user_id, log_id).await
    }

    pub async fn update_log(
        &self,
        user_id: &str,
        log_id: &str,
        request: UpdateFoodLogRequest,
    ) -> Result<FoodLogResponse, CoreError> {
        let food_log =
            collections::update(&self.db, user_id, log_id, Utc::now(), |log: &mut FoodLog| {
                if let Some(date) = request.date {
                    log.date = date;
                }
                if let Some(meals) = request.meals {
                    log.meals = meals;
                }
                if let Some(notes) = request.notes {
                    log.notes = Some(notes);
                }
            })
            .await?;

        Ok(FoodLogResponse {
            message: "Food log updated successfully".to_string(),
            food_log,
        })
    }

    pub async fn delete_log(&self, user_id: &str, log_id: &str) -> Result<(), CoreError> {
        collections::remove::<FoodLog>(&self.db, user_id, log_id, Utc::now()).await
    }

    pub async fn nutrition_stats(
        &self,
        user_id: &str,
        query: StatsQuery,
    ) -> Result<NutritionStatsResponse, CoreError> {
        let days = query.days.unwrap_or(7);
        let user = self.db.load_user(user_id).await?;
        let cutoff = Utc::now() - Duration::days(days as i64);

        let recent: Vec<&FoodLog> = user.food_logs.iter().filter(|l| l.date > cutoff).collect();
        let total_meals = recent.iter().map(|l| l.meals.len()).sum();

        Ok(NutritionStatsResponse {
            total_logs: user.food_logs.len(),
            logs_in_period: recent.len(),
            period: format!("Last {} days", days),
            total_meals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::User;

    async fn setup() -> (NutritionService, User) {
        let db = DbConnection::init_test().await.unwrap();
        let user = User::new("ana@example.com".to_string(), "Ana".to_string(), Utc::now());
        db.save_user(&user).await.unwrap();
        (NutritionService::new(db), user)
    }

    fn log_request(date: DateTime<Utc>, meals: &[&str]) -> CreateFoodLogRequest {
        CreateFoodLogRequest {
            date,
            meals: meals.iter().map(|m| m.to_string()).collect(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_log_and_fetch() {
        let (service, user) = setup().await;
        let yesterday = Utc::now() - Duration::days(1);

        let created = service
            .log_food(&user.id, log_request(yesterday, &["Oatmeal", "Salad"]))
            .await
            .unwrap();

        let fetched = service.get_log(&user.id, &created.food_log.id).await.unwrap();
        assert_eq!(fetched.meals.len(), 2);
    }

    #[tokio::test]
    async fn test_future_date_rejected_on_create_and_update() {
        let (service, user) = setup().await;
        let tomorrow = Utc::now() + Duration::days(1);

        let err = service
            .log_food(&user.id, log_request(tomorrow, &["Oatmeal"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let created = service
            .log_food(&user.id, log_request(Utc::now() - Duration::days(1), &["Oatmeal"]))
            .await
            .unwrap();
        let err = service
            .update_log(
                &user.id,
                &created.food_log.id,
                UpdateFoodLogRequest {
                    date: Some(tomorrow),
                    meals: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_meal_count_bounds() {
        let (service, user) = setup().await;
        let yesterday = Utc::now() - Duration::days(1);

        let err = service
            .log_food(&user.id, log_request(yesterday, &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let eleven: Vec<&str> = std::iter::repeat("Snack").take(11).collect();
        let err = service
            .log_food(&user.id, log_request(yesterday, &eleven))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_exact_day_filter_wins_over_range() {
        let (service, user) = setup().await;
        let now = Utc::now();

        for days_back in 1..=3 {
            service
                .log_food(&user.id, log_request(now - Duration::days(days_back), &["Meal"]))
                .await
                .unwrap();
        }

        let day = service
            .list_logs(
                &user.id,
                FoodLogListQuery {
                    date: Some(now - Duration::days(2)),
                    start_date: Some(now - Duration::days(30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(day.food_logs.len(), 1);

        let range = service
            .list_logs(
                &user.id,
                FoodLogListQuery {
                    start_date: Some(now - Duration::days(2) - Duration::hours(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(range.food_logs.len(), 2);

        let stats = service
            .nutrition_stats(&user.id, StatsQuery { days: Some(7) })
            .await
            .unwrap();
        assert_eq!(stats.total_logs, 3);
        assert_eq!(stats.total_meals, 3);
    }
}
