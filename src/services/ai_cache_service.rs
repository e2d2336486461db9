use chrono::{Duration as ChronoDuration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::entities::{ai_cache, ai_responses};

/// How long a primed payload preempts the persisted response rows.
pub const PREEMPT_WINDOW: Duration = Duration::from_secs(300);

/// Generated-content storage: append-only response rows (the synced audit
/// trail) plus a local single-use latch that bridges the gap between a
/// webhook returning and the synced row being visible.
#[derive(Clone)]
pub struct AiCacheService {
    db: DatabaseConnection,
}

impl AiCacheService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persist a freshly generated payload. The response row is best
    /// effort (on failure the latch alone carries the payload until the
    /// next webhook run), and the latch is always primed so the next
    /// assembly shows the new content immediately.
    pub async fn store_response(&self, report_id: &str, payload: &Value) {
        let response_json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(err) => {
                warn!("generated payload for {report_id} is not serializable: {err}");
                return;
            }
        };

        let insert = ai_responses::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            report_id: Set(report_id.to_string()),
            response_json: Set(response_json),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;
        if let Err(err) = insert {
            warn!("storing generated response for {report_id} failed, keeping local copy only: {err}");
        }

        if let Err(err) = self.prime(report_id, payload).await {
            warn!("priming generated-content latch for {report_id} failed: {err}");
        }
    }

    /// Newest persisted payload for a report, if any.
    pub async fn latest(&self, report_id: &str) -> Option<Value> {
        let row = ai_responses::Entity::find()
            .filter(ai_responses::Column::ReportId.eq(report_id))
            .order_by_desc(ai_responses::Column::CreatedAt)
            .limit(1)
            .one(&self.db)
            .await
            .unwrap_or_else(|err| {
                warn!("generated-response lookup for {report_id} failed: {err}");
                None
            })?;
        serde_json::from_str(&row.response_json).ok()
    }

    /// Write or refresh the preemption latch.
    pub async fn prime(&self, report_id: &str, payload: &Value) -> Result<(), DbErr> {
        let payload_json = serde_json::to_string(payload).unwrap_or_else(|_| "null".to_string());
        let existing = ai_cache::Entity::find_by_id(report_id).one(&self.db).await?;
        match existing {
            Some(row) => {
                let mut active: ai_cache::ActiveModel = row.into();
                active.payload_json = Set(payload_json);
                active.cached_at = Set(Utc::now());
                active.update(&self.db).await?;
            }
            None => {
                ai_cache::ActiveModel {
                    report_id: Set(report_id.to_string()),
                    payload_json: Set(payload_json),
                    cached_at: Set(Utc::now()),
                }
                .insert(&self.db)
                .await?;
            }
        }
        Ok(())
    }

    /// Consume the latch: the entry is deleted on read whether or not it is
    /// still fresh, and returned only when younger than `max_age`.
    pub async fn take_fresh(&self, report_id: &str, max_age: Duration) -> Option<Value> {
        let row = match ai_cache::Entity::find_by_id(report_id).one(&self.db).await {
            Ok(row) => row?,
            Err(err) => {
                warn!("latch lookup for {report_id} failed: {err}");
                return None;
            }
        };

        if let Err(err) = ai_cache::Entity::delete_by_id(report_id).exec(&self.db).await {
            warn!("consuming latch for {report_id} failed: {err}");
        }

        let age = Utc::now().signed_duration_since(row.cached_at);
        let budget = ChronoDuration::from_std(max_age).unwrap_or_else(|_| ChronoDuration::seconds(300));
        if age > budget {
            debug!("latch for {report_id} expired ({age})");
            return None;
        }
        serde_json::from_str(&row.payload_json).ok()
    }

    /// Drop the latch without reading it (post-submission cleanup).
    pub async fn clear(&self, report_id: &str) -> Result<(), DbErr> {
        ai_cache::Entity::delete_by_id(report_id).exec(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::services::report_service::tests::seed_report_header;
    use serde_json::json;

    #[tokio::test]
    async fn store_keeps_newest_response_visible() {
        let db = setup_test_db().await;
        seed_report_header(&db, "p1", "r1", "2026-03-02").await;
        let cache = AiCacheService::new(db);

        cache.store_response("r1", &json!({"rev": 1})).await;
        cache.store_response("r1", &json!({"rev": 2})).await;

        assert_eq!(cache.latest("r1").await, Some(json!({"rev": 2})));
        assert_eq!(cache.latest("r2").await, None);
    }

    #[tokio::test]
    async fn latch_is_single_use() {
        let db = setup_test_db().await;
        seed_report_header(&db, "p1", "r1", "2026-03-02").await;
        let cache = AiCacheService::new(db);

        cache.prime("r1", &json!({"fresh": true})).await.unwrap();
        let first = cache.take_fresh("r1", PREEMPT_WINDOW).await;
        assert_eq!(first, Some(json!({"fresh": true})));
        // Consumed on first read
        assert_eq!(cache.take_fresh("r1", PREEMPT_WINDOW).await, None);
    }

    #[tokio::test]
    async fn stale_latch_is_discarded() {
        let db = setup_test_db().await;
        seed_report_header(&db, "p1", "r1", "2026-03-02").await;
        let cache = AiCacheService::new(db);

        cache.prime("r1", &json!({"fresh": true})).await.unwrap();
        assert_eq!(cache.take_fresh("r1", Duration::from_secs(0)).await, None);
    }
}
