//! IGDB metadata enrichment.
//!
//! Fetching metadata for a local title is a multi-step pipeline: a fuzzy
//! title search against the IGDB catalog, a detail fetch for the best
//! match, genre and developer sub-lookups against process-lifetime caches,
//! and a cover download. Every request is signed by the Twitch
//! client-credentials auth layer.
//!
//! # Module layout
//!
//! - [`auth`] -- Twitch OAuth token exchange and request signing.
//! - [`igdb`] -- The IGDB API client and match selection.

mod auth;
mod igdb;

pub use auth::TwitchAuth;
pub use igdb::IgdbClient;

use std::path::PathBuf;

/// Key under which the provider's catalog id is stored in a game entry's
/// `extensions` map. Its presence marks the entry as enriched.
pub const PROVIDER_KEY: &str = "igdb";

/// Assembled provider data for one game, ready to merge into the library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentRecord {
    /// IGDB catalog id of the matched game.
    pub id: String,
    pub summary: Option<String>,
    /// Aggregate rating truncated toward zero, 0–100.
    pub rating: Option<u8>,
    pub developer: Option<String>,
    pub genres: Vec<String>,
    /// Locally cached cover, when one was downloaded.
    pub image_path: Option<PathBuf>,
}
