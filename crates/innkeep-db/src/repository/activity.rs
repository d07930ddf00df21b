//! # Activity Log Repository
//!
//! Append-only event rows, written in the same transaction as the
//! state-machine mutation that emits them.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use innkeep_core::ActivityEvent;

use crate::error::DbResult;
use crate::repository::new_id;

/// A persisted activity-log row. The payload is stored as JSON text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityLogEntry {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub kind: String,
    pub payload: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for the activity log.
#[derive(Debug, Clone)]
pub struct ActivityLogRepository {
    pool: SqlitePool,
}

impl ActivityLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityLogRepository { pool }
    }

    /// Appends an event inside the caller's transaction.
    pub async fn append_in(conn: &mut SqliteConnection, event: &ActivityEvent) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (id, entity_type, entity_id, kind, payload, actor, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_id())
        .bind(&event.entity_type)
        .bind(&event.entity_id)
        .bind(&event.kind)
        .bind(event.payload.to_string())
        .bind(&event.actor)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Events for one entity, oldest first.
    pub async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> DbResult<Vec<ActivityLogEntry>> {
        let entries = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            SELECT * FROM activity_log
            WHERE entity_type = ? AND entity_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Most recent events of a given kind, newest first.
    pub async fn list_by_kind(&self, kind: &str, limit: u32) -> DbResult<Vec<ActivityLogEntry>> {
        let entries = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            SELECT * FROM activity_log
            WHERE kind = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(kind)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
