use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One tracked game. The library map key is the title; the entry itself
/// never stores it, so renaming is a re-keying operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEntry {
    /// When the game first appeared in a source scan. Set once.
    pub added: DateTime<Utc>,

    /// Path to the runnable launcher. Presence means "installed";
    /// `None` means the game was seen before but its shortcut is gone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<PathBuf>,

    /// Completion timestamp; presence means "finished".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Utc>>,

    /// Play timestamps, append-only. The last entry is the most recent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub played: Vec<DateTime<Utc>>,

    /// Locally cached cover image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Aggregate provider rating, 0–100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,

    /// Provider-specific identifiers, e.g. the IGDB catalog id. An entry
    /// carrying the provider key is considered already enriched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

impl GameEntry {
    /// Entry for a freshly discovered shortcut.
    pub fn discovered(shortcut: PathBuf, added: DateTime<Utc>) -> Self {
        Self {
            added,
            shortcut: Some(shortcut),
            completed: None,
            played: Vec::new(),
            image_path: None,
            summary: None,
            rating: None,
            developer: None,
            genres: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }

    pub fn installed(&self) -> bool {
        self.shortcut.is_some()
    }

    /// Previously installed, shortcut no longer present.
    pub fn removed(&self) -> bool {
        self.shortcut.is_none()
    }

    pub fn not_played(&self) -> bool {
        self.played.is_empty()
    }

    pub fn last_played(&self) -> Option<DateTime<Utc>> {
        self.played.last().copied()
    }
}

/// Install/completion filter for library queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameFilter {
    #[default]
    Installed,
    Removed,
    Completed,
    All,
}

/// Sort key for library queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Title,
    Added,
    Completed,
    /// Number of recorded plays.
    Played,
    Rating,
}

/// A filter/sort combination over the library.
#[derive(Debug, Clone, Default)]
pub struct GameQuery {
    pub filter: GameFilter,
    /// Case-insensitive title substring.
    pub title_contains: Option<String>,
    pub sort: SortKey,
    pub descending: bool,
}
