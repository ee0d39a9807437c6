use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;

/// Idempotent schema setup: create-if-absent DDL, executed statement by
/// statement. One uniform `snapshots` table keyed by `entity_id` — never one
/// table per entity, so no dynamic identifier construction anywhere.
pub(crate) async fn run(pool: &SqlitePool) -> Result<()> {
    info!("Running snapshot store migrations...");

    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS entities (
            entity_id  TEXT PRIMARY KEY,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS snapshots (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_id   TEXT NOT NULL REFERENCES entities(entity_id),
            confirmed   INTEGER NOT NULL,
            active      INTEGER NOT NULL,
            recovered   INTEGER NOT NULL,
            deaths      INTEGER NOT NULL,
            last_update TEXT NOT NULL,
            published   TEXT NOT NULL
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_snapshots_entity_observed
            ON snapshots(entity_id, last_update)
        "#,
    ];

    for statement in &statements {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Snapshot store schema ready");
    Ok(())
}
