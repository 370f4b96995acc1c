use sqlx::SqlitePool;

use voiceprint_core::{Error, Result};

/// Create the `records` table and its indexes. Idempotent.
///
/// `seq` preserves insertion order; an upsert keeps the original `seq`
/// so a replaced record stays in its slot.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            text TEXT NOT NULL,
            metadata_json TEXT NOT NULL,
            embedding BLOB NOT NULL,
            dims INTEGER NOT NULL,
            UNIQUE(collection, id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| Error::storage_with("failed to create records table", e))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection, seq)")
        .execute(pool)
        .await
        .map_err(|e| Error::storage_with("failed to create records index", e))?;

    Ok(())
}
