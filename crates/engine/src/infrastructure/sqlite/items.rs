//! SQLite adapter for physical items.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use interlude_domain::{BlueprintId, CharacterId, Item, ItemId};

use super::{decode, encode};
use crate::infrastructure::ports::{ItemRepo, RepoError};

pub(super) async fn upsert_item<'e, E>(executor: E, item: &Item) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let json = encode(item)?;
    sqlx::query(
        r#"
        INSERT INTO items (id, blueprint_id, owner, serial, data_json)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            blueprint_id = excluded.blueprint_id,
            owner = excluded.owner,
            serial = excluded.serial,
            data_json = excluded.data_json
        "#,
    )
    .bind(item.id.to_string())
    .bind(item.blueprint_id.to_string())
    .bind(item.owner.map(|o| o.to_string()))
    .bind(item.serial)
    .bind(json)
    .execute(executor)
    .await
    .map_err(|e| RepoError::database("items.save", e))?;
    Ok(())
}

pub struct SqliteItemRepo {
    pool: SqlitePool,
}

impl SqliteItemRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepo for SqliteItemRepo {
    async fn get(&self, id: ItemId) -> Result<Option<Item>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("items.get", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn save(&self, item: &Item) -> Result<(), RepoError> {
        upsert_item(&self.pool, item).await
    }

    async fn list_owned_by(&self, owner: CharacterId) -> Result<Vec<Item>, RepoError> {
        let rows = sqlx::query("SELECT data_json FROM items WHERE owner = ?")
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("items.list_owned_by", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }

    async fn next_serial(&self, blueprint_id: BlueprintId) -> Result<u32, RepoError> {
        let row = sqlx::query("SELECT COALESCE(MAX(serial), 0) AS top FROM items WHERE blueprint_id = ?")
            .bind(blueprint_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::database("items.next_serial", e))?;
        let top: i64 = row.get("top");
        Ok(top as u32 + 1)
    }
}
