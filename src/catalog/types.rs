//! Catalog record types.
//!
//! Defines [`Source`] (a stored candidate place or activity), [`NewSource`]
//! (the add/import input) and the category label lookup used wherever a
//! category is shown to a person.

use serde::{Deserialize, Serialize};

/// Priority assumed when a source declares none.
pub const DEFAULT_PRIORITY: i64 = 3;

/// Duration reported for a suggestion whose source declares none.
pub const DEFAULT_DURATION_MIN: u32 = 30;

/// A catalogued candidate place or activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Stable, unique identifier. Never changes once stored.
    pub id: String,
    pub name: String,
    /// Free-form category tag (e.g. `"cafe"`). Unknown tags are legal.
    pub category: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    /// Opaque locality tag compared for equality only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// `"place"` or `"activity"`; informational only.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Source {
    /// Declared duration, treating `0` as undeclared.
    pub fn declared_duration(&self) -> Option<u32> {
        self.duration_min.filter(|d| *d > 0)
    }

    /// Declared priority, treating `0` as undeclared.
    pub fn declared_priority(&self) -> Option<i64> {
        self.priority.filter(|p| *p != 0)
    }

    /// Priority with the default applied.
    pub fn effective_priority(&self) -> i64 {
        self.declared_priority().unwrap_or(DEFAULT_PRIORITY)
    }
}

/// Input for adding a source. `id` is generated when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSource {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub duration_min: Option<u32>,
    #[serde(default)]
    pub anchor_id: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl NewSource {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Default::default()
        }
    }
}

const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("cafe", "Cafe"),
    ("museum", "Museum"),
    ("market", "Market"),
    ("viewpoint", "Viewpoint"),
    ("park", "Park"),
    ("bookstore", "Bookstore"),
    ("neighborhood_walk", "Neighborhood walk"),
    ("food", "Food"),
    ("shop", "Shop"),
    ("other", "Other"),
];

/// Human label for a category. Unknown categories fall back to the raw tag.
pub fn category_label(category: &str) -> &str {
    CATEGORY_LABELS
        .iter()
        .find(|(key, _)| *key == category)
        .map(|(_, label)| *label)
        .unwrap_or(category)
}
