use crate::error::StorageError;
use crate::storage::Storage;
use shared::models::{DEMO_PATTERNS, Pattern};
use std::collections::BTreeSet;

pub const FAVORITES_KEY: &str = "fabric.favorites";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternState {
    pub catalog: Vec<Pattern>,
    pub favorites: BTreeSet<String>,
    pub selected: Option<String>,
    pub query: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternAction {
    SetCatalog(Vec<Pattern>),
    /// Ignored when the name is not in the catalog.
    Select(String),
    ClearSelection,
    ToggleFavorite(String),
    SetQuery(String),
}

impl PatternState {
    pub fn reduce(&self, action: PatternAction) -> Self {
        let mut next = self.clone();
        match action {
            PatternAction::SetCatalog(catalog) => {
                next.catalog = catalog;
                if let Some(selected) = &next.selected
                    && !next.contains(selected)
                {
                    next.selected = None;
                }
            }
            PatternAction::Select(name) => {
                if next.contains(&name) {
                    next.selected = Some(name);
                }
            }
            PatternAction::ClearSelection => next.selected = None,
            PatternAction::ToggleFavorite(name) => {
                if !next.favorites.remove(&name) {
                    next.favorites.insert(name);
                }
            }
            PatternAction::SetQuery(query) => next.query = query,
        }
        next
    }

    pub fn contains(&self, name: &str) -> bool {
        self.catalog.iter().any(|p| p.name == name)
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.favorites.contains(name)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Favorites first, then everything else, each in catalog order and
    /// filtered by a case-insensitive substring match on the query.
    pub fn visible(&self) -> Vec<&Pattern> {
        let query = self.query.trim().to_lowercase();
        let matches = |p: &&Pattern| query.is_empty() || p.name.to_lowercase().contains(&query);

        let (favorites, rest): (Vec<&Pattern>, Vec<&Pattern>) = self
            .catalog
            .iter()
            .filter(matches)
            .partition(|p| self.is_favorite(&p.name));
        favorites.into_iter().chain(rest).collect()
    }
}

pub fn demo_catalog() -> Vec<Pattern> {
    DEMO_PATTERNS.iter().map(|name| Pattern::new(*name)).collect()
}

/// Pattern state whose favorites live in storage.
pub struct PatternStore<S: Storage> {
    storage: S,
    state: PatternState,
}

impl<S: Storage> PatternStore<S> {
    pub fn load(storage: S) -> Self {
        let favorites: Vec<String> = storage.get(FAVORITES_KEY).unwrap_or_default();
        let state = PatternState {
            favorites: favorites.into_iter().collect(),
            ..PatternState::default()
        };
        Self { storage, state }
    }

    pub fn state(&self) -> &PatternState {
        &self.state
    }

    pub fn dispatch(&mut self, action: PatternAction) -> Result<(), StorageError> {
        let persist = matches!(action, PatternAction::ToggleFavorite(_));
        self.state = self.state.reduce(action);
        if persist {
            let favorites: Vec<&String> = self.state.favorites.iter().collect();
            self.storage.set(FAVORITES_KEY, &favorites)?;
        }
        Ok(())
    }

    /// Install the catalog, or the demo list when it could not be loaded.
    /// The load error is handed back so the caller can report it.
    pub fn load_catalog<E>(&mut self, result: Result<Vec<Pattern>, E>) -> Result<(), E> {
        match result {
            Ok(catalog) => {
                self.state = self.state.reduce(PatternAction::SetCatalog(catalog));
                Ok(())
            }
            Err(e) => {
                self.state = self.state.reduce(PatternAction::SetCatalog(demo_catalog()));
                Err(e)
            }
        }
    }
}
