//! The sync engine: the refresh operations a frontend triggers.
//!
//! Three independently invocable, idempotent operations, each a logged
//! no-op when its precondition (sources, cache root, credentials) is
//! unmet. Work inside a pass is strictly sequential and the library is
//! persisted after every unit of progress, so an interrupted pass loses
//! at most the item in flight; the next scheduled pass is the retry
//! mechanism. There is no per-item retry and no "permanently failed"
//! state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::images::CoverStore;
use crate::library::GameLibrary;
use crate::metadata::{IgdbClient, TwitchAuth, PROVIDER_KEY};
use crate::scanner;

pub struct SyncEngine {
    library: Arc<GameLibrary>,
    sources: Vec<PathBuf>,
    covers: CoverStore,
    metadata: Option<IgdbClient>,
}

impl SyncEngine {
    pub fn new(
        library: Arc<GameLibrary>,
        sources: Vec<PathBuf>,
        covers: CoverStore,
        metadata: Option<IgdbClient>,
    ) -> Self {
        Self {
            library,
            sources,
            covers,
            metadata,
        }
    }

    /// Wire up the engine from configuration. The metadata client only
    /// exists when both credential halves are present.
    pub fn from_config(library: Arc<GameLibrary>, config: &Config) -> Self {
        let covers = CoverStore::new(config.images.cache_dir.clone());
        let metadata = config.twitch.credentials().map(|(id, secret)| {
            IgdbClient::new(TwitchAuth::new(id, secret), covers.clone())
        });
        Self::new(library, config.scan.sources.clone(), covers, metadata)
    }

    pub fn library(&self) -> &Arc<GameLibrary> {
        &self.library
    }

    /// Rescan the source directories and reconcile the library against
    /// what is on disk. Returns whether anything changed.
    pub fn refresh_sources(&self) -> Result<bool> {
        if self.sources.is_empty() {
            info!("No source directories configured, skipping source refresh");
            return Ok(false);
        }
        scanner::reconcile(&self.library, &self.sources)
    }

    /// Attach pre-existing cached covers to entries that have none.
    /// Persists after each attachment, not in one batch, so partial
    /// progress survives a crash or cancellation. Returns the number of
    /// covers attached.
    pub fn refresh_missing_images(&self) -> Result<usize> {
        if !self.covers.configured() {
            info!("Image cache directory not configured, skipping image refresh");
            return Ok(0);
        }

        let mut entries = self.library.entries();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut attached = 0;
        for (title, entry) in entries {
            if entry.image_path.is_some() {
                continue;
            }
            if let Some(path) = self.covers.find_cached(&title) {
                if self.library.set_image_path(&title, path.clone())? {
                    debug!("Attached cached cover {:?} to '{}'", path, title);
                    attached += 1;
                }
            }
        }

        if attached > 0 {
            info!("Attached {} cached cover(s)", attached);
        }
        Ok(attached)
    }

    /// Enrich every entry that does not carry the provider id yet, one at
    /// a time, persisting after each success. Entries the provider finds
    /// nothing for stay unmarked and are simply retried on the next pass.
    /// Returns the number of entries enriched.
    pub async fn refresh_missing_metadata(&self) -> Result<usize> {
        let Some(client) = &self.metadata else {
            info!("Provider credentials not configured, skipping metadata refresh");
            return Ok(0);
        };

        let mut entries = self.library.entries();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut enriched = 0;
        for (title, entry) in entries {
            if entry.extensions.contains_key(PROVIDER_KEY) {
                continue;
            }
            match client.fetch_game_data(&title).await {
                Some(record) => {
                    if self.library.update_from_enrichment(&title, &record)? {
                        enriched += 1;
                    }
                }
                None => debug!("No metadata for '{}' this pass", title),
            }
        }

        if enriched > 0 {
            info!("Enriched {} game(s)", enriched);
        }
        Ok(enriched)
    }
}
