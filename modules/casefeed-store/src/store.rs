// SQLite persistence for observed snapshots. One uniform table for all
// entities, keyed by entity_id; rows are appended, never updated or deleted.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use casefeed_common::{MetricCounts, Snapshot};

use crate::error::Result;
use crate::migrate;

/// Append-only snapshot history. Answers the two baseline lookups the change
/// detector needs: latest snapshot observed on a date, and latest observed
/// strictly before a date. Both operate on `last_update`'s calendar date (the
/// observed stamp in canonical wall-clock form), not on `published`.
#[derive(Clone)]
pub struct SnapshotStore {
    pool: SqlitePool,
}

/// A row from the snapshots table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredSnapshot {
    pub id: i64,
    pub entity_id: String,
    pub confirmed: i64,
    pub active: i64,
    pub recovered: i64,
    pub deaths: i64,
    pub last_update: NaiveDateTime,
    pub published: NaiveDateTime,
}

impl StoredSnapshot {
    /// Metric view of the row.
    pub fn metrics(&self) -> MetricCounts {
        MetricCounts {
            confirmed: self.confirmed,
            active: self.active,
            recovered: self.recovered,
            deaths: self.deaths,
        }
    }

    /// Convert into the domain snapshot type.
    pub fn into_snapshot(self) -> Snapshot {
        Snapshot {
            metrics: self.metrics(),
            entity_id: self.entity_id,
            observed_at: self.last_update,
            recorded_at: self.published,
        }
    }
}

impl SnapshotStore {
    /// Open (creating if missing) the database file and build the pool.
    /// WAL mode plus a busy timeout keep concurrent appends bounded.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self { pool })
    }

    /// In-memory store for tests and broker-less development. Single
    /// connection — every handle sees the same database.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true).foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Run the idempotent schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        migrate::run(&self.pool).await
    }

    /// Register an entity. Idempotent; safe to call every cycle.
    pub async fn ensure_entity(&self, entity_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO entities (entity_id, created_at) VALUES (?1, ?2)")
            .bind(entity_id)
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append a snapshot to the entity's history and return its row id.
    /// A single INSERT — concurrent readers never observe a partial row.
    pub async fn append(&self, snapshot: &Snapshot) -> Result<i64> {
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO snapshots
                (entity_id, confirmed, active, recovered, deaths, last_update, published)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id
            "#,
        )
        .bind(&snapshot.entity_id)
        .bind(snapshot.metrics.confirmed)
        .bind(snapshot.metrics.active)
        .bind(snapshot.metrics.recovered)
        .bind(snapshot.metrics.deaths)
        .bind(snapshot.observed_at)
        .bind(snapshot.recorded_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Most recently recorded snapshot whose observed date equals `date`.
    /// Tie-break: greatest observed stamp, then last inserted.
    pub async fn latest_on_date(
        &self,
        entity_id: &str,
        date: NaiveDate,
    ) -> Result<Option<StoredSnapshot>> {
        let row = sqlx::query_as::<_, StoredSnapshot>(
            r#"
            SELECT id, entity_id, confirmed, active, recovered, deaths, last_update, published
            FROM snapshots
            WHERE entity_id = ?1 AND date(last_update) = ?2
            ORDER BY last_update DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(entity_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Most recent snapshot observed strictly before `date`, same tie-break.
    pub async fn latest_before_date(
        &self,
        entity_id: &str,
        date: NaiveDate,
    ) -> Result<Option<StoredSnapshot>> {
        let row = sqlx::query_as::<_, StoredSnapshot>(
            r#"
            SELECT id, entity_id, confirmed, active, recovered, deaths, last_update, published
            FROM snapshots
            WHERE entity_id = ?1 AND date(last_update) < ?2
            ORDER BY last_update DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(entity_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
