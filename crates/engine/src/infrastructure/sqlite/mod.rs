//! SQLite-backed storage.
//!
//! Rows carry the columns queries filter on plus the full entity as JSON.
//! Schema is created on connect.

use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

mod audit;
mod catalog;
mod characters;
mod downtime;
mod events;
mod items;
mod research;
mod unit_of_work;

pub use audit::SqliteAuditRepo;
pub use catalog::SqliteCatalogRepo;
pub use characters::{SqliteCharacterRepo, SqliteGroupRepo};
pub use downtime::SqliteDowntimeRepo;
pub use events::SqliteEventRepo;
pub use items::SqliteItemRepo;
pub use research::SqliteResearchRepo;
pub use unit_of_work::SqliteUnitOfWork;

/// Open (or create) the database and ensure the schema exists.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    let pool = SqlitePool::connect(&format!("sqlite:{db_path}?mode=rwc"))
        .await
        .map_err(|e| RepoError::database("connect", e))?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS characters (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            player_reference TEXT NOT NULL UNIQUE,
            group_id TEXT,
            data_json TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS groups (
            id TEXT PRIMARY KEY,
            data_json TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            event_number INTEGER NOT NULL UNIQUE,
            data_json TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS event_tickets (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            character_id TEXT NOT NULL,
            data_json TEXT NOT NULL,
            UNIQUE (event_id, character_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS catalog_entries (
            kind TEXT NOT NULL,
            id TEXT NOT NULL,
            science_type TEXT,
            data_json TEXT NOT NULL,
            PRIMARY KEY (kind, id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            blueprint_id TEXT NOT NULL,
            owner TEXT,
            serial INTEGER NOT NULL,
            data_json TEXT NOT NULL,
            UNIQUE (blueprint_id, serial)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS research (
            id TEXT PRIMARY KEY,
            public_id TEXT NOT NULL UNIQUE,
            data_json TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS research_enrollments (
            id TEXT PRIMARY KEY,
            character_id TEXT NOT NULL,
            research_id TEXT NOT NULL,
            data_json TEXT NOT NULL,
            UNIQUE (character_id, research_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS downtime_periods (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            status TEXT NOT NULL,
            data_json TEXT NOT NULL
        )
        "#,
        // At most one pending period at a time.
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS one_pending_period
            ON downtime_periods (status) WHERE status = 'pending'
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS downtime_packs (
            id TEXT PRIMARY KEY,
            period_id TEXT NOT NULL,
            character_id TEXT NOT NULL,
            phase TEXT NOT NULL,
            data_json TEXT NOT NULL,
            UNIQUE (period_id, character_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS audit_entries (
            id TEXT PRIMARY KEY,
            subject_type TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            data_json TEXT NOT NULL
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS audit_by_subject
            ON audit_entries (subject_type, subject_id)
        "#,
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("schema", e))?;
    }

    Ok(())
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, RepoError> {
    serde_json::from_str(json).map_err(|e| RepoError::Serialization(e.to_string()))
}

pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<String, RepoError> {
    serde_json::to_string(value).map_err(|e| RepoError::Serialization(e.to_string()))
}
