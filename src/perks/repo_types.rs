use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Tech,
    Travel,
    Fitness,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Tech => "tech",
            Category::Travel => "travel",
            Category::Fitness => "fitness",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "food" => Ok(Category::Food),
            "tech" => Ok(Category::Tech),
            "travel" => Ok(Category::Travel),
            "fitness" => Ok(Category::Fitness),
            "other" => Ok(Category::Other),
            other => Err(format!("Unknown category: {other}")),
        }
    }
}

/// Row as stored in the `perks` table.
#[derive(Debug, FromRow)]
pub struct PerkRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub discount_percent: i32,
    pub merchant: String,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A merchant offer as exposed over the API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Perk {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub discount_percent: u8,
    pub merchant: String,
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<PerkRow> for Perk {
    fn from(r: PerkRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            // the table CHECK constraint keeps this parseable
            category: r.category.parse().unwrap_or_default(),
            discount_percent: r.discount_percent.clamp(0, 100) as u8,
            merchant: r.merchant,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Validated input for a new perk.
#[derive(Debug, Clone)]
pub struct NewPerk {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub discount_percent: u8,
    pub merchant: String,
    pub created_by: Uuid,
}

/// Validated partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PerkChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub discount_percent: Option<u8>,
    pub merchant: Option<String>,
}

impl PerkChanges {
    pub fn apply_to(self, perk: &mut Perk) {
        if let Some(v) = self.title {
            perk.title = v;
        }
        if let Some(v) = self.description {
            perk.description = v;
        }
        if let Some(v) = self.category {
            perk.category = v;
        }
        if let Some(v) = self.discount_percent {
            perk.discount_percent = v;
        }
        if let Some(v) = self.merchant {
            perk.merchant = v;
        }
    }
}
