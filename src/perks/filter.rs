//! Directory filtering: narrows the public perk list by name and merchant
//! and summarises what is visible.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::repo_types::Perk;

/// Merchant option that disables the merchant filter.
pub const ALL_MERCHANTS: &str = "All Merchants";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryFilter {
    /// Case-insensitive substring of the perk title; read from `?search=`.
    #[serde(default, rename = "search", alias = "name")]
    pub name: Option<String>,
    /// Exact merchant name, or [`ALL_MERCHANTS`].
    #[serde(default)]
    pub merchant: Option<String>,
}

impl DirectoryFilter {
    fn needle(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn merchant(&self) -> Option<&str> {
        self.merchant
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty() && *m != ALL_MERCHANTS)
    }

    pub fn is_empty(&self) -> bool {
        self.needle().is_none() && self.merchant().is_none()
    }

    pub fn matches(&self, perk: &Perk) -> bool {
        let name_ok = self
            .needle()
            .map_or(true, |n| perk.title.to_lowercase().contains(&n));
        let merchant_ok = self.merchant().map_or(true, |m| perk.merchant == m);
        name_ok && merchant_ok
    }

    pub fn apply(&self, perks: Vec<Perk>) -> Vec<Perk> {
        if self.is_empty() {
            return perks;
        }
        perks.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// `"All Merchants"` followed by the distinct non-empty merchants, sorted.
pub fn merchant_options(perks: &[Perk]) -> Vec<String> {
    let distinct: BTreeSet<&str> = perks
        .iter()
        .map(|p| p.merchant.as_str())
        .filter(|m| !m.is_empty())
        .collect();
    std::iter::once(ALL_MERCHANTS)
        .chain(distinct)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Serialize)]
pub struct DirectoryView {
    pub perks: Vec<Perk>,
    pub total: usize,
    pub showing: usize,
    pub merchants: Vec<String>,
    pub summary: String,
}

impl DirectoryView {
    pub fn build(all: Vec<Perk>, filter: &DirectoryFilter) -> Self {
        let total = all.len();
        let merchants = merchant_options(&all);
        let perks = filter.apply(all);
        let showing = perks.len();
        Self {
            summary: format!("Showing {showing} of {total} perks"),
            perks,
            total,
            showing,
            merchants,
        }
    }
}
