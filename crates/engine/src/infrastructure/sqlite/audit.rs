//! SQLite adapter for the audit trail.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use interlude_domain::{AuditEntry, AuditSubject};

use super::{decode, encode};
use crate::infrastructure::ports::{AuditRepo, RepoError};

pub struct SqliteAuditRepo {
    pool: SqlitePool,
}

impl SqliteAuditRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn subject_columns(subject: AuditSubject) -> (&'static str, String) {
    match subject {
        AuditSubject::Character(id) => ("character", id.to_string()),
        AuditSubject::Group(id) => ("group", id.to_string()),
    }
}

pub(super) async fn insert_entry<'e, E>(executor: E, entry: &AuditEntry) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let (subject_type, subject_id) = subject_columns(entry.subject);
    let json = encode(entry)?;
    sqlx::query(
        r#"
        INSERT INTO audit_entries (id, subject_type, subject_id, created_at, data_json)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(subject_type)
    .bind(subject_id)
    .bind(entry.at.to_rfc3339())
    .bind(json)
    .execute(executor)
    .await
    .map_err(|e| RepoError::database("audit.append", e))?;
    Ok(())
}

#[async_trait]
impl AuditRepo for SqliteAuditRepo {
    async fn append(&self, entry: &AuditEntry) -> Result<(), RepoError> {
        insert_entry(&self.pool, entry).await
    }

    async fn list_for_subject(&self, subject: AuditSubject) -> Result<Vec<AuditEntry>, RepoError> {
        let (subject_type, subject_id) = subject_columns(subject);
        let rows = sqlx::query(
            r#"
            SELECT data_json FROM audit_entries
            WHERE subject_type = ? AND subject_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(subject_type)
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("audit.list_for_subject", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }
}
