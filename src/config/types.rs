use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub twitch: TwitchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// JSON file holding the game map.
    #[serde(default = "default_library_path")]
    pub path: PathBuf,
}

fn default_library_path() -> PathBuf {
    PathBuf::from("library.json")
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: default_library_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Directories scanned recursively for game shortcuts.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImagesConfig {
    /// Root of the cover image cache. Unset disables cover downloads.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

/// Twitch developer credentials for the IGDB API.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TwitchConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,
}

impl TwitchConfig {
    /// Both halves of the credential pair, when configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id, secret))
            }
            _ => None,
        }
    }
}
