//! SQLite adapters for characters and groups.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use interlude_domain::{Character, CharacterId, Group, GroupId};

use super::{decode, encode};
use crate::infrastructure::ports::{CharacterRepo, GroupRepo, RepoError};

pub(super) async fn upsert_character<'e, E>(
    executor: E,
    character: &Character,
) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let json = encode(character)?;
    sqlx::query(
        r#"
        INSERT INTO characters (id, user_id, player_reference, group_id, data_json)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            user_id = excluded.user_id,
            player_reference = excluded.player_reference,
            group_id = excluded.group_id,
            data_json = excluded.data_json
        "#,
    )
    .bind(character.id.to_string())
    .bind(character.user_id.to_string())
    .bind(&character.player_reference)
    .bind(character.group_id.map(|g| g.to_string()))
    .bind(json)
    .execute(executor)
    .await
    .map_err(|e| RepoError::database("characters.save", e))?;
    Ok(())
}

pub(super) async fn upsert_group<'e, E>(executor: E, group: &Group) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let json = encode(group)?;
    sqlx::query(
        r#"
        INSERT INTO groups (id, data_json) VALUES (?, ?)
        ON CONFLICT(id) DO UPDATE SET data_json = excluded.data_json
        "#,
    )
    .bind(group.id.to_string())
    .bind(json)
    .execute(executor)
    .await
    .map_err(|e| RepoError::database("groups.save", e))?;
    Ok(())
}

pub struct SqliteCharacterRepo {
    pool: SqlitePool,
}

impl SqliteCharacterRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CharacterRepo for SqliteCharacterRepo {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("characters.get", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn save(&self, character: &Character) -> Result<(), RepoError> {
        upsert_character(&self.pool, character).await
    }

    async fn list(&self) -> Result<Vec<Character>, RepoError> {
        let rows = sqlx::query("SELECT data_json FROM characters ORDER BY player_reference")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("characters.list", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }

    async fn find_by_player_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Character>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM characters WHERE player_reference = ?")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("characters.find_by_player_reference", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn list_by_group(&self, group_id: GroupId) -> Result<Vec<Character>, RepoError> {
        let rows = sqlx::query("SELECT data_json FROM characters WHERE group_id = ?")
            .bind(group_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("characters.list_by_group", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }
}

pub struct SqliteGroupRepo {
    pool: SqlitePool,
}

impl SqliteGroupRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepo for SqliteGroupRepo {
    async fn get(&self, id: GroupId) -> Result<Option<Group>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM groups WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("groups.get", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn save(&self, group: &Group) -> Result<(), RepoError> {
        upsert_group(&self.pool, group).await
    }
}
