//! Enumerations and field types for task listing.
//!
//! This module defines the structured filter types used to narrow task
//! listings, shared by the CLI, the controller and the TUI.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Tri-state favorite filter: every task, favorites only, or non-favorites only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FavoriteFilter {
    #[default]
    All,
    Favorite,
    NotFavorite,
}

impl FavoriteFilter {
    /// The exact `is_favorite` value a row must carry, or `None` for no constraint.
    pub fn as_option(self) -> Option<bool> {
        match self {
            FavoriteFilter::All => None,
            FavoriteFilter::Favorite => Some(true),
            FavoriteFilter::NotFavorite => Some(false),
        }
    }

    /// Advance to the next filter (All -> Favorite -> Not Favorite -> All).
    pub fn cycle(self) -> Self {
        match self {
            FavoriteFilter::All => FavoriteFilter::Favorite,
            FavoriteFilter::Favorite => FavoriteFilter::NotFavorite,
            FavoriteFilter::NotFavorite => FavoriteFilter::All,
        }
    }

    /// Human-readable label, as shown in the filter selector.
    pub fn label(self) -> &'static str {
        match self {
            FavoriteFilter::All => "All",
            FavoriteFilter::Favorite => "Favorite",
            FavoriteFilter::NotFavorite => "Not Favorite",
        }
    }
}

impl From<Option<bool>> for FavoriteFilter {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => FavoriteFilter::All,
            Some(true) => FavoriteFilter::Favorite,
            Some(false) => FavoriteFilter::NotFavorite,
        }
    }
}

/// Search and favorite constraints applied to a task listing.
///
/// Both constraints compose with logical AND. An empty search string is
/// treated the same as no search at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub favorite: FavoriteFilter,
}

impl ListQuery {
    /// A query that matches every task.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_favorite(mut self, favorite: FavoriteFilter) -> Self {
        self.favorite = favorite;
        self
    }

    /// The search text if it would actually constrain the listing.
    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_filter_maps_to_exact_value() {
        assert_eq!(FavoriteFilter::All.as_option(), None);
        assert_eq!(FavoriteFilter::Favorite.as_option(), Some(true));
        assert_eq!(FavoriteFilter::NotFavorite.as_option(), Some(false));
        for f in [FavoriteFilter::All, FavoriteFilter::Favorite, FavoriteFilter::NotFavorite] {
            assert_eq!(FavoriteFilter::from(f.as_option()), f);
        }
    }

    #[test]
    fn test_favorite_filter_cycle_wraps() {
        let f = FavoriteFilter::default();
        assert_eq!(f, FavoriteFilter::All);
        assert_eq!(f.cycle().cycle().cycle(), FavoriteFilter::All);
        assert_eq!(f.cycle().label(), "Favorite");
    }

    #[test]
    fn test_empty_search_is_no_search() {
        assert_eq!(ListQuery::all().search_text(), None);
        assert_eq!(ListQuery::all().with_search("").search_text(), None);
        assert_eq!(ListQuery::all().with_search("sql").search_text(), Some("sql"));
    }
}
