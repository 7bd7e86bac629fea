use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{Category, NewPerk, Perk, PerkChanges};
use crate::error::{AppError, AppResult};

const MAX_TITLE_LEN: usize = 120;
const MAX_MERCHANT_LEN: usize = 120;
const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePerkRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub discount_percent: Option<i64>,
    pub merchant: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePerkRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub discount_percent: Option<i64>,
    pub merchant: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PerkResponse {
    pub perk: Perk,
}

#[derive(Debug, Serialize)]
pub struct PerkListResponse {
    pub perks: Vec<Perk>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl CreatePerkRequest {
    pub fn validate(self, owner: Uuid) -> AppResult<NewPerk> {
        Ok(NewPerk {
            title: title(&self.title)?,
            description: description(self.description.as_deref().unwrap_or_default())?,
            category: self.category.as_deref().map(category).transpose()?.unwrap_or_default(),
            discount_percent: self.discount_percent.map(discount).transpose()?.unwrap_or(0),
            merchant: merchant(self.merchant.as_deref().unwrap_or_default())?,
            created_by: owner,
        })
    }
}

impl UpdatePerkRequest {
    pub fn validate(self) -> AppResult<PerkChanges> {
        Ok(PerkChanges {
            title: self.title.as_deref().map(title).transpose()?,
            description: self.description.as_deref().map(description).transpose()?,
            category: self.category.as_deref().map(category).transpose()?,
            discount_percent: self.discount_percent.map(discount).transpose()?,
            merchant: self.merchant.as_deref().map(merchant).transpose()?,
        })
    }
}

fn title(raw: &str) -> AppResult<String> {
    let v = raw.trim();
    if v.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    bounded("Title", v, MAX_TITLE_LEN)
}

fn description(raw: &str) -> AppResult<String> {
    bounded("Description", raw.trim(), MAX_DESCRIPTION_LEN)
}

fn merchant(raw: &str) -> AppResult<String> {
    bounded("Merchant", raw.trim(), MAX_MERCHANT_LEN)
}

fn category(raw: &str) -> AppResult<Category> {
    raw.parse::<Category>().map_err(AppError::Validation)
}

fn discount(raw: i64) -> AppResult<u8> {
    if !(0..=100).contains(&raw) {
        return Err(AppError::Validation(
            "Discount percent must be between 0 and 100".into(),
        ));
    }
    Ok(raw as u8)
}

fn bounded(field: &str, v: &str, max: usize) -> AppResult<String> {
    if v.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(v.to_string())
}
