use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{NewPerk, Perk, PerkChanges, PerkRow};
use crate::error::AppResult;

const PERK_COLUMNS: &str = "id, title, description, category, discount_percent, merchant, \
                            created_by, created_at, updated_at";

#[async_trait]
pub trait PerkStore: Send + Sync {
    /// All perks, newest first.
    async fn list(&self) -> AppResult<Vec<Perk>>;
    async fn list_by_owner(&self, owner: Uuid) -> AppResult<Vec<Perk>>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Perk>>;
    async fn create(&self, new: NewPerk) -> AppResult<Perk>;
    async fn update(&self, id: Uuid, changes: PerkChanges) -> AppResult<Option<Perk>>;
    /// Returns whether a perk was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

pub struct PgPerkStore {
    db: PgPool,
}

impl PgPerkStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PerkStore for PgPerkStore {
    async fn list(&self) -> AppResult<Vec<Perk>> {
        let rows = sqlx::query_as::<_, PerkRow>(&format!(
            "SELECT {PERK_COLUMNS} FROM perks ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Perk::from).collect())
    }

    async fn list_by_owner(&self, owner: Uuid) -> AppResult<Vec<Perk>> {
        let rows = sqlx::query_as::<_, PerkRow>(&format!(
            "SELECT {PERK_COLUMNS} FROM perks WHERE created_by = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Perk::from).collect())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Perk>> {
        let row = sqlx::query_as::<_, PerkRow>(&format!(
            "SELECT {PERK_COLUMNS} FROM perks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Perk::from))
    }

    async fn create(&self, new: NewPerk) -> AppResult<Perk> {
        let row = sqlx::query_as::<_, PerkRow>(&format!(
            r#"
            INSERT INTO perks (title, description, category, discount_percent, merchant, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PERK_COLUMNS}
            "#
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.category.as_str())
        .bind(i32::from(new.discount_percent))
        .bind(&new.merchant)
        .bind(new.created_by)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, changes: PerkChanges) -> AppResult<Option<Perk>> {
        let row = sqlx::query_as::<_, PerkRow>(&format!(
            r#"
            UPDATE perks
               SET title            = COALESCE($2, title),
                   description      = COALESCE($3, description),
                   category         = COALESCE($4, category),
                   discount_percent = COALESCE($5, discount_percent),
                   merchant         = COALESCE($6, merchant),
                   updated_at       = now()
             WHERE id = $1
            RETURNING {PERK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.category.map(|c| c.as_str()))
        .bind(changes.discount_percent.map(i32::from))
        .bind(changes.merchant)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Perk::from))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM perks WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

/// Process-local store used when no database is configured.
/// Perks are kept in insertion order.
#[derive(Default)]
pub struct MemoryPerkStore {
    perks: RwLock<Vec<Perk>>,
}

impl MemoryPerkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PerkStore for MemoryPerkStore {
    async fn list(&self) -> AppResult<Vec<Perk>> {
        Ok(self.perks.read().await.iter().rev().cloned().collect())
    }

    async fn list_by_owner(&self, owner: Uuid) -> AppResult<Vec<Perk>> {
        let perks = self.perks.read().await;
        Ok(perks
            .iter()
            .rev()
            .filter(|p| p.created_by == owner)
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Perk>> {
        let perks = self.perks.read().await;
        Ok(perks.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, new: NewPerk) -> AppResult<Perk> {
        let now = OffsetDateTime::now_utc();
        let perk = Perk {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            category: new.category,
            discount_percent: new.discount_percent,
            merchant: new.merchant,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        self.perks.write().await.push(perk.clone());
        Ok(perk)
    }

    async fn update(&self, id: Uuid, changes: PerkChanges) -> AppResult<Option<Perk>> {
        let mut perks = self.perks.write().await;
        let Some(perk) = perks.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        changes.apply_to(perk);
        perk.updated_at = OffsetDateTime::now_utc();
        Ok(Some(perk.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut perks = self.perks.write().await;
        let before = perks.len();
        perks.retain(|p| p.id != id);
        Ok(perks.len() != before)
    }
}
