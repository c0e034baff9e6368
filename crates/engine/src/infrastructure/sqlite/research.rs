//! SQLite adapter for research projects and enrollments.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use interlude_domain::{CharacterId, CharacterResearch, Research, ResearchId};

use super::{decode, encode};
use crate::infrastructure::ports::{RepoError, ResearchRepo};

pub(super) async fn upsert_research<'e, E>(executor: E, research: &Research) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let json = encode(research)?;
    sqlx::query(
        r#"
        INSERT INTO research (id, public_id, data_json) VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            public_id = excluded.public_id,
            data_json = excluded.data_json
        "#,
    )
    .bind(research.id.to_string())
    .bind(&research.public_id)
    .bind(json)
    .execute(executor)
    .await
    .map_err(|e| RepoError::database("research.save", e))?;
    Ok(())
}

pub(super) async fn upsert_enrollment<'e, E>(
    executor: E,
    enrollment: &CharacterResearch,
) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let json = encode(enrollment)?;
    sqlx::query(
        r#"
        INSERT INTO research_enrollments (id, character_id, research_id, data_json)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET data_json = excluded.data_json
        "#,
    )
    .bind(enrollment.id.to_string())
    .bind(enrollment.character_id.to_string())
    .bind(enrollment.research_id.to_string())
    .bind(json)
    .execute(executor)
    .await
    .map_err(|e| RepoError::database("research.save_enrollment", e))?;
    Ok(())
}

pub struct SqliteResearchRepo {
    pool: SqlitePool,
}

impl SqliteResearchRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResearchRepo for SqliteResearchRepo {
    async fn get(&self, id: ResearchId) -> Result<Option<Research>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM research WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("research.get", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Research>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM research WHERE public_id = ?")
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("research.find_by_public_id", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn save(&self, research: &Research) -> Result<(), RepoError> {
        upsert_research(&self.pool, research).await
    }

    async fn list(&self) -> Result<Vec<Research>, RepoError> {
        let rows = sqlx::query("SELECT data_json FROM research ORDER BY public_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("research.list", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }

    async fn get_enrollment(
        &self,
        character_id: CharacterId,
        research_id: ResearchId,
    ) -> Result<Option<CharacterResearch>, RepoError> {
        let row = sqlx::query(
            "SELECT data_json FROM research_enrollments WHERE character_id = ? AND research_id = ?",
        )
        .bind(character_id.to_string())
        .bind(research_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("research.get_enrollment", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn save_enrollment(&self, enrollment: &CharacterResearch) -> Result<(), RepoError> {
        upsert_enrollment(&self.pool, enrollment).await
    }

    async fn list_enrollments_for_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<CharacterResearch>, RepoError> {
        let rows = sqlx::query("SELECT data_json FROM research_enrollments WHERE character_id = ?")
            .bind(character_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("research.list_enrollments_for_character", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }
}
