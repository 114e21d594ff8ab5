//! Journal operations over the embedded `journal` collection, including mood
//! statistics and trends.

use crate::db::DbConnection;
use crate::domain::collections::{self, contains_ci, in_date_range, SortOrder};
use crate::domain::errors::CoreError;
use crate::domain::pagination::{parse_pagination, PageQuery};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use shared::{
    CreateJournalEntryRequest, JournalEntry, JournalEntryResponse, JournalListResponse,
    JournalStatsResponse, JournalSummary, Mood, MoodCounts, MoodTrendPoint, MoodTrendsResponse,
    UpdateJournalEntryRequest,
};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalListQuery {
    pub mood: Option<Mood>,
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// "date" (default, newest first) or "oldest".
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendQuery {
    pub days: Option<u32>,
}

#[derive(Clone)]
pub struct JournalService {
    db: DbConnection,
}

impl JournalService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Create an entry. The entry date is server-assigned and immutable; the
    /// request has no date field for the client to influence.
    pub async fn create_entry(
        &self,
        user_id: &str,
        request: CreateJournalEntryRequest,
    ) -> Result<JournalEntryResponse, CoreError> {
        let now = Utc::now();
        let entry = JournalEntry {
            id: Uuid::new_v4().to_string(),
            title: request.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            content: request.content.trim().to_string(),
            mood: request.mood,
            date: now,
        };
        let entry = collections::append(&self.db, user_id, entry, now).await?;

        Ok(JournalEntryResponse {
            message: "Journal entry created successfully".to_string(),
            entry,
        })
    }

    pub async fn list_entries(
        &self,
        user_id: &str,
        query: JournalListQuery,
    ) -> Result<JournalListResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let params = parse_pagination(&PageQuery {
            page: query.page,
            limit: query.limit,
        });
        let order = match query.sort_by.as_deref() {
            Some("oldest") => SortOrder::OldestFirst,
            _ => SortOrder::NewestFirst,
        };

        let (entries, pagination) = collections::list_page(
            &user.journal,
            |entry: &JournalEntry| {
                if let Some(mood) = query.mood {
                    if entry.mood != Some(mood) {
                        return false;
                    }
                }
                if let Some(search) = &query.search {
                    let title_hit = entry
                        .title
                        .as_deref()
                        .map(|t| contains_ci(t, search))
                        .unwrap_or(false);
                    if !title_hit && !contains_ci(&entry.content, search) {
                        return false;
                    }
                }
                in_date_range(entry.date, query.start_date, query.end_date)
            },
            order,
            params,
        );

        let filtered = pagination.total_items as usize;
        Ok(JournalListResponse {
            entries,
            pagination,
            summary: JournalSummary {
                total_entries: user.journal.len(),
                filtered_entries: filtered,
            },
        })
    }

    pub async fn get_entry(&self, user_id: &str, entry_id: &str) -> Result<JournalEntry, CoreError> {
        collections::get_by_id(&self.db, user_id, entry_id).await
    }

    pub async fn update_entry(
        &self,
        user_id: &str,
        entry_id: &str,
        request: UpdateJournalEntryRequest,
    ) -> Result<JournalEntryResponse, CoreError> {
        let entry =
            collections::update(&self.db, user_id, entry_id, Utc::now(), |entry: &mut JournalEntry| {
                if let Some(title) = request.title {
                    entry.title = Some(title.trim().to_string()).filter(|t| !t.is_empty());
                }
                if let Some(content) = request.content {
                    entry.content = content.trim().to_string();
                }
                if let Some(mood) = request.mood {
                    entry.mood = Some(mood);
                }
            })
            .await?;

        Ok(JournalEntryResponse {
            message: "Journal entry updated successfully".to_string(),
            entry,
        })
    }

    pub async fn delete_entry(&self, user_id: &str, entry_id: &str) -> Result<(), CoreError> {
        collections::remove::<JournalEntry>(&self.db, user_id, entry_id, Utc::now()).await
    }

    /// Full-text search across titles and content. Queries shorter than two
    /// characters are rejected before the scan.
    pub async fn search_entries(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<JournalEntry>, CoreError> {
        if query.trim().chars().count() < 2 {
            return Err(CoreError::validation(
                "Search query must be at least 2 characters",
            ));
        }

        let user = self.db.load_user(user_id).await?;
        let mut results: Vec<JournalEntry> = user
            .journal
            .into_iter()
            .filter(|entry| {
                entry
                    .title
                    .as_deref()
                    .map(|t| contains_ci(t, query))
                    .unwrap_or(false)
                    || contains_ci(&entry.content, query)
            })
            .collect();
        results.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(results)
    }

    pub async fn journal_stats(&self, user_id: &str) -> Result<JournalStatsResponse, CoreError> {
        let user = self.db.load_user(user_id).await?;
        let now = Utc::now();
        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);

        let mut counts = MoodCounts {
            great: 0,
            good: 0,
            okay: 0,
            bad: 0,
            terrible: 0,
            unspecified: 0,
        };
        for entry in &user.journal {
            match entry.mood {
                Some(Mood::Great) => counts.great += 1,
                Some(Mood::Good) => counts.good += 1,
                Some(Mood::Okay) => counts.okay += 1,
                Some(Mood::Bad) => counts.bad += 1,
                Some(Mood::Terrible) => counts.terrible += 1,
                None => counts.unspecified += 1,
            }
        }

        let mut most_common = "None".to_string();
        let mut max_count = 0;
        for mood in Mood::all() {
            let count = match mood {
                Mood::Great => counts.great,
                Mood::Good => counts.good,
                Mood::Okay => counts.okay,
                Mood::Bad => counts.bad,
                Mood::Terrible => counts.terrible,
            };
            if count > max_count {
                max_count = count;
                let name = mood.as_str();
                most_common = format!("{}{}", name[..1].to_uppercase(), &name[1..]);
            }
        }

        Ok(JournalStatsResponse {
            total_entries: user.journal.len(),
            entries_this_week: user.journal.iter().filter(|e| e.date > week_ago).count(),
            entries_this_month: user.journal.iter().filter(|e| e.date > month_ago).count(),
            mood_counts: counts,
            most_common_mood: most_common,
        })
    }

    /// Average mood score per calendar day over the last `days` days.
    pub async fn mood_trends(
        &self,
        user_id: &str,
        query: TrendQuery,
    ) -> Result<MoodTrendsResponse, CoreError> {
        let days = query.days.unwrap_or(30);
        let user = self.db.load_user(user_id).await?;
        let cutoff = Utc::now() - Duration::days(days as i64);

        let recent: Vec<&JournalEntry> =
            user.journal.iter().filter(|e| e.date > cutoff).collect();

        let mut by_date: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for entry in &recent {
            if let Some(mood) = entry.mood {
                by_date
                    .entry(entry.date.format("%Y-%m-%d").to_string())
                    .or_default()
                    .push(mood.score());
            }
        }

        let trends = by_date
            .into_iter()
            .map(|(date, scores)| {
                let avg = scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64;
                MoodTrendPoint {
                    date,
                    average_mood: (avg * 10.0).round() / 10.0,
                    entries: scores.len(),
                }
            })
            .collect();

        Ok(MoodTrendsResponse {
            trends,
            period: format!("Last {} days", days),
            total_entries: recent.len(),
        })
    }
}
