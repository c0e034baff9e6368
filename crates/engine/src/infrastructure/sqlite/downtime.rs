//! SQLite adapter for downtime periods and packs.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use interlude_domain::{CharacterId, DowntimePack, DowntimePeriod, PackId, PeriodId};

use super::{decode, encode};
use crate::infrastructure::ports::{DowntimeRepo, RepoError};

pub(super) async fn upsert_period<'e, E>(
    executor: E,
    period: &DowntimePeriod,
) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let json = encode(period)?;
    let result = sqlx::query(
        r#"
        INSERT INTO downtime_periods (id, event_id, status, data_json)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            data_json = excluded.data_json
        "#,
    )
    .bind(period.id.to_string())
    .bind(period.event_id.to_string())
    .bind(period.status.to_string())
    .bind(json)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        // The partial unique index rejects a second pending row.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(RepoError::constraint(
            "A downtime period is already pending",
        )),
        Err(e) => Err(RepoError::database("downtime.save_period", e)),
    }
}

pub(super) async fn upsert_pack<'e, E>(executor: E, pack: &DowntimePack) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let json = encode(pack)?;
    sqlx::query(
        r#"
        INSERT INTO downtime_packs (id, period_id, character_id, phase, data_json)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            phase = excluded.phase,
            data_json = excluded.data_json
        "#,
    )
    .bind(pack.id.to_string())
    .bind(pack.period_id.to_string())
    .bind(pack.character_id.to_string())
    .bind(pack.phase.to_string())
    .bind(json)
    .execute(executor)
    .await
    .map_err(|e| RepoError::database("downtime.save_pack", e))?;
    Ok(())
}

pub struct SqliteDowntimeRepo {
    pool: SqlitePool,
}

impl SqliteDowntimeRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DowntimeRepo for SqliteDowntimeRepo {
    async fn pending_period(&self) -> Result<Option<DowntimePeriod>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM downtime_periods WHERE status = 'pending'")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("downtime.pending_period", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn get_period(&self, id: PeriodId) -> Result<Option<DowntimePeriod>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM downtime_periods WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("downtime.get_period", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn save_period(&self, period: &DowntimePeriod) -> Result<(), RepoError> {
        upsert_period(&self.pool, period).await
    }

    async fn get_pack(&self, id: PackId) -> Result<Option<DowntimePack>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM downtime_packs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("downtime.get_pack", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn save_pack(&self, pack: &DowntimePack) -> Result<(), RepoError> {
        upsert_pack(&self.pool, pack).await
    }

    async fn find_pack(
        &self,
        period_id: PeriodId,
        character_id: CharacterId,
    ) -> Result<Option<DowntimePack>, RepoError> {
        let row = sqlx::query(
            "SELECT data_json FROM downtime_packs WHERE period_id = ? AND character_id = ?",
        )
        .bind(period_id.to_string())
        .bind(character_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("downtime.find_pack", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn list_packs(&self, period_id: PeriodId) -> Result<Vec<DowntimePack>, RepoError> {
        let rows = sqlx::query("SELECT data_json FROM downtime_packs WHERE period_id = ?")
            .bind(period_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("downtime.list_packs", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interlude_domain::EventId;

    async fn repo() -> (SqliteDowntimeRepo, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("test.db");
        let pool = crate::infrastructure::sqlite::connect(path.to_str().expect("utf8 path"))
            .await
            .expect("connect");
        (SqliteDowntimeRepo::new(pool), dir)
    }

    #[tokio::test]
    async fn only_one_pending_period_allowed() {
        let (repo, _dir) = repo().await;

        let first = DowntimePeriod::open(EventId::new());
        repo.save_period(&first).await.expect("first period");

        let second = DowntimePeriod::open(EventId::new());
        let err = repo.save_period(&second).await.expect_err("second pending");
        assert!(matches!(err, RepoError::ConstraintViolation(_)));

        // Completing the first frees the slot.
        let mut first = first;
        first.complete().expect("complete");
        repo.save_period(&first).await.expect("update");
        repo.save_period(&second).await.expect("new pending");
    }

    #[tokio::test]
    async fn pack_round_trip_preserves_phase() {
        let (repo, _dir) = repo().await;

        let period = DowntimePeriod::open(EventId::new());
        repo.save_period(&period).await.expect("period");

        let mut pack = DowntimePack::open(period.id, CharacterId::new());
        pack.enter_contents(Default::default(), true).expect("contents");
        repo.save_pack(&pack).await.expect("save");

        let loaded = repo
            .find_pack(period.id, pack.character_id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(loaded.id, pack.id);
        assert_eq!(loaded.phase, pack.phase);
    }
}
