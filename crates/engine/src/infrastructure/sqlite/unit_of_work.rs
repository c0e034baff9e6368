//! Transactional writes spanning several tables.
//!
//! Reuses the per-table upsert statements from the sibling adapters so the
//! SQL stays in one place; only the executor differs.

use async_trait::async_trait;
use sqlx::SqlitePool;

use interlude_domain::{AuditEntry, Character, DowntimePack, Group};

use super::{audit, catalog, characters, downtime, items, research};
use crate::infrastructure::ports::{BatchWrite, RepoError, UnitOfWork};

pub struct SqliteUnitOfWork {
    pool: SqlitePool,
}

impl SqliteUnitOfWork {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Sqlite>, RepoError> {
        self.pool
            .begin()
            .await
            .map_err(|e| RepoError::database("tx.begin", e))
    }
}

async fn commit(tx: sqlx::Transaction<'_, sqlx::Sqlite>) -> Result<(), RepoError> {
    tx.commit()
        .await
        .map_err(|e| RepoError::database("tx.commit", e))
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn commit_funds(
        &self,
        character: &Character,
        group: Option<Group>,
        entry: &AuditEntry,
    ) -> Result<(), RepoError> {
        let mut tx = self.begin().await?;
        characters::upsert_character(&mut *tx, character).await?;
        if let Some(group) = &group {
            characters::upsert_group(&mut *tx, group).await?;
        }
        audit::insert_entry(&mut *tx, entry).await?;
        commit(tx).await
    }

    async fn commit_pack_contents(
        &self,
        pack: &DowntimePack,
        character: &Character,
        group: Option<Group>,
        entries: &[AuditEntry],
    ) -> Result<(), RepoError> {
        let mut tx = self.begin().await?;
        downtime::upsert_pack(&mut *tx, pack).await?;
        characters::upsert_character(&mut *tx, character).await?;
        if let Some(group) = &group {
            characters::upsert_group(&mut *tx, group).await?;
        }
        for entry in entries {
            audit::insert_entry(&mut *tx, entry).await?;
        }
        commit(tx).await
    }

    async fn commit_batch(&self, batch: &BatchWrite) -> Result<(), RepoError> {
        let mut tx = self.begin().await?;
        downtime::upsert_period(&mut *tx, &batch.period).await?;
        for pack in &batch.packs {
            downtime::upsert_pack(&mut *tx, pack).await?;
        }
        for character in &batch.characters {
            characters::upsert_character(&mut *tx, character).await?;
        }
        for group in &batch.groups {
            characters::upsert_group(&mut *tx, group).await?;
        }
        for item in &batch.items {
            items::upsert_item(&mut *tx, item).await?;
        }
        for sample in &batch.samples {
            catalog::upsert_sample(&mut *tx, sample).await?;
        }
        for project in &batch.research {
            research::upsert_research(&mut *tx, project).await?;
        }
        for enrollment in &batch.enrollments {
            research::upsert_enrollment(&mut *tx, enrollment).await?;
        }
        commit(tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{AuditRepo, CharacterRepo, DowntimeRepo};
    use crate::infrastructure::sqlite::{SqliteAuditRepo, SqliteCharacterRepo, SqliteDowntimeRepo};
    use chrono::TimeZone;
    use interlude_domain::{
        AuditAction, AuditSubject, DowntimePeriod, EventId, PackPhase, UserId,
    };

    async fn pool() -> (SqlitePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("test.db");
        let pool = crate::infrastructure::sqlite::connect(path.to_str().expect("utf8 path"))
            .await
            .expect("connect");
        (pool, dir)
    }

    fn entry_for(character: &Character, details: &str) -> AuditEntry {
        AuditEntry::new(
            AuditSubject::Character(character.id),
            UserId::new(),
            AuditAction::FundsRemoved,
            details.into(),
            chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn funds_commit_writes_character_group_and_audit_together() {
        let (pool, _dir) = pool().await;
        let repo = SqliteCharacterRepo::new(pool.clone());
        let audit = SqliteAuditRepo::new(pool.clone());
        let uow = SqliteUnitOfWork::new(pool);

        let mut group = Group::new("Free Traders".into());
        group.bank_account = 15;
        let mut character = Character::new(UserId::new(), "Vex".into(), "12.3".into());
        character.group_id = Some(group.id);
        character.bank_account = 0;
        let entry = entry_for(&character, "Removed 15 for fine (Character: 10, Group: 5)");

        uow.commit_funds(&character, Some(group.clone()), &entry)
            .await
            .expect("commit");

        let loaded = repo.get(character.id).await.expect("get").expect("present");
        assert_eq!(loaded.bank_account, 0);
        let trail = audit
            .list_for_subject(AuditSubject::Character(character.id))
            .await
            .expect("trail");
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].details, "Removed 15 for fine (Character: 10, Group: 5)");
    }

    #[tokio::test]
    async fn funds_commit_rolls_back_when_the_audit_row_is_rejected() {
        let (pool, _dir) = pool().await;
        let repo = SqliteCharacterRepo::new(pool.clone());
        let audit = SqliteAuditRepo::new(pool.clone());
        let uow = SqliteUnitOfWork::new(pool);

        let mut character = Character::new(UserId::new(), "Vex".into(), "12.3".into());
        character.bank_account = 10;
        repo.save(&character).await.expect("seed");

        let first = entry_for(&character, "Added 10: prize");
        audit.append(&first).await.expect("existing entry");

        // Reusing the entry id collides with the audit primary key, so the
        // debit written earlier in the same transaction must not survive.
        let mut debited = character.clone();
        debited.bank_account = 0;
        let mut colliding = first.clone();
        colliding.details = "Removed 10 for fine (Character: 10, Group: 0)".into();
        let err = uow
            .commit_funds(&debited, None, &colliding)
            .await
            .expect_err("audit rejected");
        assert!(matches!(err, RepoError::Database { .. }));

        let loaded = repo.get(character.id).await.expect("get").expect("present");
        assert_eq!(loaded.bank_account, 10);
    }

    #[tokio::test]
    async fn batch_commit_lands_the_whole_working_set() {
        let (pool, _dir) = pool().await;
        let repo = SqliteCharacterRepo::new(pool.clone());
        let downtime = SqliteDowntimeRepo::new(pool.clone());
        let uow = SqliteUnitOfWork::new(pool);

        let mut period = DowntimePeriod::open(EventId::new());
        period.complete().expect("complete");
        let mut character = Character::new(UserId::new(), "Orn".into(), "44.1".into());
        character.bank_account = 15;
        let mut pack = DowntimePack::open(period.id, character.id);
        pack.phase = PackPhase::Completed;

        let batch = BatchWrite {
            period: period.clone(),
            packs: vec![pack.clone()],
            characters: vec![character.clone()],
            groups: vec![],
            items: vec![],
            samples: vec![],
            research: vec![],
            enrollments: vec![],
        };
        uow.commit_batch(&batch).await.expect("commit");

        let loaded_period = downtime
            .get_period(period.id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(loaded_period.status, period.status);
        let loaded_pack = downtime
            .find_pack(period.id, character.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(loaded_pack.phase, PackPhase::Completed);
        let loaded_character = repo.get(character.id).await.expect("get").expect("present");
        assert_eq!(loaded_character.bank_account, 15);
    }
}
