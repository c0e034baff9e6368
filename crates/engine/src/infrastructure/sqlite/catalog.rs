//! SQLite adapter for the rules-reference catalog.
//!
//! All catalog kinds share one table keyed by (kind, id); exotics also
//! carry their science type in a column so synthesis can filter in SQL.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use interlude_domain::{
    BlueprintId, Condition, ConditionId, Cybernetic, CyberneticId, ExoticId, ExoticSubstance,
    Faction, FactionId, ItemBlueprint, ItemType, ItemTypeId, Mod, ModId, Sample, SampleId,
    ScienceType, Skill, SkillId,
};

use super::{decode, encode};
use crate::infrastructure::ports::{CatalogRepo, RepoError};

pub(super) async fn upsert_sample<'e, E>(executor: E, sample: &Sample) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let json = encode(sample)?;
    sqlx::query(
        r#"
        INSERT INTO catalog_entries (kind, id, science_type, data_json)
        VALUES ('sample', ?, NULL, ?)
        ON CONFLICT(kind, id) DO UPDATE SET data_json = excluded.data_json
        "#,
    )
    .bind(sample.id.to_string())
    .bind(json)
    .execute(executor)
    .await
    .map_err(|e| RepoError::database("catalog.save", e))?;
    Ok(())
}

pub struct SqliteCatalogRepo {
    pool: SqlitePool,
}

impl SqliteCatalogRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_entry<T: serde::de::DeserializeOwned>(
        &self,
        kind: &'static str,
        id: String,
    ) -> Result<Option<T>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM catalog_entries WHERE kind = ? AND id = ?")
            .bind(kind)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("catalog.get", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn save_entry<T: serde::Serialize>(
        &self,
        kind: &'static str,
        id: String,
        science_type: Option<String>,
        value: &T,
    ) -> Result<(), RepoError> {
        let json = encode(value)?;
        sqlx::query(
            r#"
            INSERT INTO catalog_entries (kind, id, science_type, data_json)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(kind, id) DO UPDATE SET
                science_type = excluded.science_type,
                data_json = excluded.data_json
            "#,
        )
        .bind(kind)
        .bind(id)
        .bind(science_type)
        .bind(json)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("catalog.save", e))?;
        Ok(())
    }

    /// Seed helper used by deployments and tests.
    pub async fn save_item_type(&self, item_type: &ItemType) -> Result<(), RepoError> {
        self.save_entry("item_type", item_type.id.to_string(), None, item_type)
            .await
    }

    pub async fn save_blueprint(&self, blueprint: &ItemBlueprint) -> Result<(), RepoError> {
        self.save_entry("blueprint", blueprint.id.to_string(), None, blueprint)
            .await
    }

    pub async fn save_mod(&self, modification: &Mod) -> Result<(), RepoError> {
        self.save_entry("mod", modification.id.to_string(), None, modification)
            .await
    }

    pub async fn save_exotic(&self, exotic: &ExoticSubstance) -> Result<(), RepoError> {
        self.save_entry(
            "exotic",
            exotic.id.to_string(),
            Some(exotic.science_type.to_string()),
            exotic,
        )
        .await
    }

    pub async fn save_condition(&self, condition: &Condition) -> Result<(), RepoError> {
        self.save_entry("condition", condition.id.to_string(), None, condition)
            .await
    }

    pub async fn save_cybernetic(&self, cybernetic: &Cybernetic) -> Result<(), RepoError> {
        self.save_entry("cybernetic", cybernetic.id.to_string(), None, cybernetic)
            .await
    }

    pub async fn save_skill(&self, skill: &Skill) -> Result<(), RepoError> {
        self.save_entry("skill", skill.id.to_string(), None, skill).await
    }

    pub async fn save_faction(&self, faction: &Faction) -> Result<(), RepoError> {
        self.save_entry("faction", faction.id.to_string(), None, faction)
            .await
    }
}

#[async_trait]
impl CatalogRepo for SqliteCatalogRepo {
    async fn get_item_type(&self, id: ItemTypeId) -> Result<Option<ItemType>, RepoError> {
        self.get_entry("item_type", id.to_string()).await
    }

    async fn get_blueprint(&self, id: BlueprintId) -> Result<Option<ItemBlueprint>, RepoError> {
        self.get_entry("blueprint", id.to_string()).await
    }

    async fn list_blueprints(&self) -> Result<Vec<ItemBlueprint>, RepoError> {
        let rows = sqlx::query("SELECT data_json FROM catalog_entries WHERE kind = 'blueprint'")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("catalog.list_blueprints", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }

    async fn get_mod(&self, id: ModId) -> Result<Option<Mod>, RepoError> {
        self.get_entry("mod", id.to_string()).await
    }

    async fn get_exotic(&self, id: ExoticId) -> Result<Option<ExoticSubstance>, RepoError> {
        self.get_entry("exotic", id.to_string()).await
    }

    async fn list_exotics_by_type(
        &self,
        science_type: ScienceType,
    ) -> Result<Vec<ExoticSubstance>, RepoError> {
        let rows = sqlx::query(
            "SELECT data_json FROM catalog_entries WHERE kind = 'exotic' AND science_type = ?",
        )
        .bind(science_type.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("catalog.list_exotics_by_type", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }

    async fn get_sample(&self, id: SampleId) -> Result<Option<Sample>, RepoError> {
        self.get_entry("sample", id.to_string()).await
    }

    async fn save_sample(&self, sample: &Sample) -> Result<(), RepoError> {
        upsert_sample(&self.pool, sample).await
    }

    async fn get_condition(&self, id: ConditionId) -> Result<Option<Condition>, RepoError> {
        self.get_entry("condition", id.to_string()).await
    }

    async fn get_cybernetic(&self, id: CyberneticId) -> Result<Option<Cybernetic>, RepoError> {
        self.get_entry("cybernetic", id.to_string()).await
    }

    async fn get_skill(&self, id: SkillId) -> Result<Option<Skill>, RepoError> {
        self.get_entry("skill", id.to_string()).await
    }

    async fn get_faction(&self, id: FactionId) -> Result<Option<Faction>, RepoError> {
        self.get_entry("faction", id.to_string()).await
    }
}
