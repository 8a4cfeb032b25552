//! Category catalog and the initial term pool.
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::POOL_DOMAIN;
use crate::seed::rng_for;
use crate::settings::{Difficulty, Settings};
use crate::term::Term;

const DEFAULT_CATALOG_DATA: &str = include_str!("../data/categories.json");

/// Supplies the starting pool for a game.
/// Platform-specific hosts may provide their own content source.
pub trait ContentProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build the start-card pool for `settings`, shuffled by `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested content cannot be produced.
    fn load_terms(&self, settings: &Settings, seed: u64) -> Result<Vec<Term>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("category data could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("no terms match the selected categories at {difficulty:?} difficulty")]
    EmptySelection { difficulty: Difficulty },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTerm {
    pub text: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub english: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub terms: Vec<CatalogTerm>,
}

/// Container for every category a game may draw from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CategoryCatalog {
    pub categories: Vec<Category>,
}

impl CategoryCatalog {
    /// Load the catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON is malformed.
    pub fn load_from_static() -> Result<Self, ContentError> {
        Self::from_json(DEFAULT_CATALOG_DATA)
    }

    /// Load catalog data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalog.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn from_categories(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.id.as_str())
    }

    /// Pick up to `settings.word_count` distinct terms from the selected
    /// categories at or below the configured difficulty.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown category or an empty selection.
    pub fn build_pool(&self, settings: &Settings, seed: u64) -> Result<Vec<Term>, ContentError> {
        let mut seen = HashSet::new();
        let mut picked = Vec::new();
        for id in &settings.categories {
            let category = self
                .get(id)
                .ok_or_else(|| ContentError::UnknownCategory(id.clone()))?;
            for entry in &category.terms {
                if !settings.difficulty.admits(entry.difficulty) {
                    continue;
                }
                if !seen.insert(entry.text.trim().to_lowercase()) {
                    continue;
                }
                let term = Term::new(entry.text.trim());
                picked.push(match &entry.english {
                    Some(english) => term.with_translation(english.clone()),
                    None => term,
                });
            }
        }
        if picked.is_empty() {
            return Err(ContentError::EmptySelection {
                difficulty: settings.difficulty,
            });
        }
        picked.shuffle(&mut rng_for(seed, POOL_DOMAIN, 0));
        picked.truncate(settings.word_count);
        log::debug!(
            "pool built with {} terms from {} categories",
            picked.len(),
            settings.categories.len()
        );
        Ok(picked)
    }
}

impl ContentProvider for CategoryCatalog {
    type Error = ContentError;

    fn load_terms(&self, settings: &Settings, seed: u64) -> Result<Vec<Term>, Self::Error> {
        self.build_pool(settings, seed)
    }
}
