//! The game library: an in-memory map of entries keyed by title, persisted
//! as a single JSON document.
//!
//! The map sits behind a [`parking_lot::RwLock`] so UI reads can proceed
//! while a background refresh pass mutates entries. Every mutating
//! operation rewrites the whole file; the `silent` save variant is used
//! inside per-item enrichment loops where a log line per save is noise.

mod types;

pub use types::*;

use crate::metadata::{EnrichmentRecord, PROVIDER_KEY};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read library file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not parse. Deliberately fatal: a corrupt
    /// library must not silently become an empty one.
    #[error("library file {path:?} is corrupt")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write library file {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize library")]
    Encode(#[source] serde_json::Error),
}

pub struct GameLibrary {
    games: RwLock<HashMap<String, GameEntry>>,
    path: PathBuf,
}

impl GameLibrary {
    /// Load the library from `path`. A missing file starts an empty
    /// library and persists it immediately so the file exists from then
    /// on; an unparseable file is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let path = path.into();

        if !path.exists() {
            info!("No library file at {:?}, starting empty", path);
            let library = Self {
                games: RwLock::new(HashMap::new()),
                path,
            };
            library.save()?;
            return Ok(library);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| LibraryError::Read {
            path: path.clone(),
            source,
        })?;
        let games: HashMap<String, GameEntry> =
            serde_json::from_str(&content).map_err(|source| LibraryError::Corrupt {
                path: path.clone(),
                source,
            })?;

        info!("Loaded {} games from {:?}", games.len(), path);

        Ok(Self {
            games: RwLock::new(games),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.games.read().contains_key(title)
    }

    pub fn get(&self, title: &str) -> Option<GameEntry> {
        self.games.read().get(title).cloned()
    }

    /// Snapshot of the whole map, for views and refresh passes that must
    /// not hold the lock across I/O.
    pub fn entries(&self) -> Vec<(String, GameEntry)> {
        self.games
            .read()
            .iter()
            .map(|(t, e)| (t.clone(), e.clone()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Serialize the whole map to the library file.
    pub fn save(&self) -> Result<(), LibraryError> {
        self.persist(false)
    }

    /// Like [`save`](Self::save) but without the completion log line, for
    /// use inside tight per-item loops.
    pub fn save_silent(&self) -> Result<(), LibraryError> {
        self.persist(true)
    }

    fn persist(&self, silent: bool) -> Result<(), LibraryError> {
        let json = {
            let games = self.games.read();
            serde_json::to_string(&*games).map_err(LibraryError::Encode)?
        };
        std::fs::write(&self.path, json).map_err(|source| LibraryError::Write {
            path: self.path.clone(),
            source,
        })?;

        if !silent {
            info!("Saved {} games to {:?}", self.len(), self.path);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Bulk mutation primitives (no save), used by source reconciliation,
    // which saves once after the whole diff.
    // -----------------------------------------------------------------------

    /// Insert an entry for a freshly discovered shortcut. No-op when the
    /// title already exists.
    pub fn insert_discovered(
        &self,
        title: &str,
        shortcut: PathBuf,
        added: DateTime<Utc>,
    ) -> bool {
        let mut games = self.games.write();
        if games.contains_key(title) {
            return false;
        }
        games.insert(title.to_string(), GameEntry::discovered(shortcut, added));
        true
    }

    /// Point an entry at a new shortcut path (or at none, marking it
    /// removed). Returns whether the stored value changed. Play history is
    /// untouched either way.
    pub fn set_shortcut(&self, title: &str, shortcut: Option<PathBuf>) -> bool {
        let mut games = self.games.write();
        match games.get_mut(title) {
            Some(entry) if entry.shortcut != shortcut => {
                entry.shortcut = shortcut;
                true
            }
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Entry operations (each persists on success)
    // -----------------------------------------------------------------------

    /// Append a play timestamp to an entry.
    pub fn record_play(&self, title: &str) -> Result<bool, LibraryError> {
        {
            let mut games = self.games.write();
            match games.get_mut(title) {
                Some(entry) => entry.played.push(Utc::now()),
                None => return Ok(false),
            }
        }
        self.save()?;
        Ok(true)
    }

    /// Stamp an entry as completed. No-op if already completed.
    pub fn mark_completed(&self, title: &str) -> Result<bool, LibraryError> {
        {
            let mut games = self.games.write();
            match games.get_mut(title) {
                Some(entry) if entry.completed.is_none() => entry.completed = Some(Utc::now()),
                _ => return Ok(false),
            }
        }
        self.save()?;
        Ok(true)
    }

    /// Re-key an entry under a new title. Rejected (returns `false`) when
    /// the source is missing, the trimmed new title is empty or unchanged,
    /// or an entry with the new title already exists.
    pub fn rename(&self, title: &str, new_title: &str) -> Result<bool, LibraryError> {
        let new_title = new_title.trim();
        {
            let mut games = self.games.write();
            if new_title.is_empty() || new_title == title || games.contains_key(new_title) {
                return Ok(false);
            }
            let Some(entry) = games.remove(title) else {
                return Ok(false);
            };
            games.insert(new_title.to_string(), entry);
        }
        self.save()?;
        Ok(true)
    }

    /// Delete an entry and its history from the library.
    pub fn remove(&self, title: &str) -> Result<bool, LibraryError> {
        {
            let mut games = self.games.write();
            if games.remove(title).is_none() {
                return Ok(false);
            }
        }
        self.save()?;
        Ok(true)
    }

    /// Clear an entry's shortcut, marking it removed while keeping its
    /// history.
    pub fn unlink_shortcut(&self, title: &str) -> Result<bool, LibraryError> {
        if !self.set_shortcut(title, None) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Attach a cached cover image to an entry that has none.
    pub fn set_image_path(&self, title: &str, image_path: PathBuf) -> Result<bool, LibraryError> {
        {
            let mut games = self.games.write();
            match games.get_mut(title) {
                Some(entry) if entry.image_path.is_none() => {
                    entry.image_path = Some(image_path)
                }
                _ => return Ok(false),
            }
        }
        self.save_silent()?;
        Ok(true)
    }

    /// Merge provider data into an entry. Every field is write-once:
    /// values already present (manual edits included) are never
    /// overwritten. Inserting the provider id into `extensions` is what
    /// marks the entry as enriched, so the next metadata pass skips it.
    pub fn update_from_enrichment(
        &self,
        title: &str,
        record: &EnrichmentRecord,
    ) -> Result<bool, LibraryError> {
        {
            let mut games = self.games.write();
            let Some(entry) = games.get_mut(title) else {
                return Ok(false);
            };

            if entry.summary.is_none() {
                entry.summary = record.summary.clone();
            }
            if entry.rating.is_none() {
                entry.rating = record.rating;
            }
            if entry.developer.is_none() {
                entry.developer = record.developer.clone();
            }
            if entry.genres.is_empty() {
                entry.genres = record.genres.clone();
            }
            if entry.image_path.is_none() {
                entry.image_path = record.image_path.clone();
            }
            entry
                .extensions
                .entry(PROVIDER_KEY.to_string())
                .or_insert_with(|| record.id.clone());
        }
        self.save_silent()?;
        debug!("Enriched '{}' from provider record {}", title, record.id);
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Derived views (computed on demand, never stored)
    // -----------------------------------------------------------------------

    /// Installed games that were never played, newest first.
    pub fn new_games(&self) -> Vec<String> {
        let games = self.games.read();
        let mut rows: Vec<_> = games
            .iter()
            .filter(|(_, e)| e.installed() && e.not_played())
            .collect();
        rows.sort_by(|(ta, a), (tb, b)| b.added.cmp(&a.added).then_with(|| ta.cmp(tb)));
        rows.into_iter().map(|(t, _)| t.clone()).collect()
    }

    /// Games played at least once, most recently played first.
    pub fn recent_games(&self) -> Vec<String> {
        let games = self.games.read();
        let mut rows: Vec<_> = games.iter().filter(|(_, e)| !e.not_played()).collect();
        rows.sort_by(|(ta, a), (tb, b)| {
            b.last_played()
                .cmp(&a.last_played())
                .then_with(|| ta.cmp(tb))
        });
        rows.into_iter().map(|(t, _)| t.clone()).collect()
    }

    /// Installed games ordered by title.
    pub fn installed(&self) -> Vec<String> {
        let games = self.games.read();
        let mut rows: Vec<_> = games
            .iter()
            .filter(|(_, e)| e.installed())
            .map(|(t, _)| t.clone())
            .collect();
        rows.sort();
        rows
    }

    /// Arbitrary filter/sort combination. Ordering is deterministic: ties
    /// on the sort key fall back to title order.
    pub fn query(&self, query: &GameQuery) -> Vec<String> {
        let games = self.games.read();

        let needle = query.title_contains.as_deref().map(str::to_lowercase);
        let mut rows: Vec<_> = games
            .iter()
            .filter(|(_, e)| match query.filter {
                GameFilter::Installed => e.installed(),
                GameFilter::Removed => e.removed(),
                GameFilter::Completed => e.completed.is_some(),
                GameFilter::All => true,
            })
            .filter(|(t, _)| match &needle {
                Some(n) => t.to_lowercase().contains(n),
                None => true,
            })
            .collect();

        rows.sort_by(|(ta, _), (tb, _)| ta.cmp(tb));
        match query.sort {
            SortKey::Title => {}
            SortKey::Added => rows.sort_by_key(|(_, e)| e.added),
            SortKey::Completed => rows.sort_by_key(|(_, e)| e.completed),
            SortKey::Played => rows.sort_by_key(|(_, e)| e.played.len()),
            SortKey::Rating => rows.sort_by_key(|(_, e)| e.rating),
        }
        if query.descending {
            rows.reverse();
        }

        rows.into_iter().map(|(t, _)| t.clone()).collect()
    }
}
