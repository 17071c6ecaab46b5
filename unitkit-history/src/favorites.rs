//! Favorite conversions
//!
//! A favorite remembers a category and unit pair, not a value. Two
//! favorites with the same category, source and target unit are the same
//! favorite.

use serde::{Deserialize, Serialize};
use unitkit_units::{CategoryId, ConversionResult, Unit};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: String,
    pub category: CategoryId,
    pub from_unit: String,
    pub to_unit: String,
    pub from_unit_name: String,
    pub to_unit_name: String,
}

impl Favorite {
    pub fn new(category: CategoryId, from: &Unit, to: &Unit) -> Self {
        Self {
            id: format!("fav-{}", Uuid::new_v4().simple()),
            category,
            from_unit: from.code.to_string(),
            to_unit: to.code.to_string(),
            from_unit_name: from.name.to_string(),
            to_unit_name: to.name.to_string(),
        }
    }

    pub fn from_result(result: &ConversionResult) -> Self {
        Self {
            id: format!("fav-{}", Uuid::new_v4().simple()),
            category: result.category,
            from_unit: result.from_unit.clone(),
            to_unit: result.to_unit.clone(),
            from_unit_name: result.from_unit_name.clone(),
            to_unit_name: result.to_unit_name.clone(),
        }
    }

    fn same_pair(&self, other: &Favorite) -> bool {
        self.category == other.category
            && self.from_unit == other.from_unit
            && self.to_unit == other.to_unit
    }
}

/// Favorites in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Favorites {
    entries: Vec<Favorite>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Favorite>) -> Self {
        Self { entries }
    }

    /// Add the unit pair of `result`. Returns false if it is already present.
    pub fn add(&mut self, result: &ConversionResult) -> bool {
        self.insert(Favorite::from_result(result))
    }

    pub fn insert(&mut self, favorite: Favorite) -> bool {
        if self.entries.iter().any(|f| f.same_pair(&favorite)) {
            return false;
        }
        self.entries.push(favorite);
        true
    }

    /// Remove by id. Returns false if no favorite had that id.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|f| f.id != id);
        self.entries.len() != before
    }

    pub fn find(&self, id: &str) -> Option<&Favorite> {
        self.entries.iter().find(|f| f.id == id)
    }

    pub fn list(&self) -> &[Favorite] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
