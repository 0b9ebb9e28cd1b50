//! IGDB API client.
//!
//! IGDB queries are an Apicalypse expression POSTed against fixed resource
//! paths (`games`, `genres`, `companies`, `involved_companies`, `covers`);
//! responses are JSON arrays of flat records. The client keeps two
//! process-lifetime caches, genre id to name (reference data, fetched
//! once) and involved-company id to developer name (filled as lookups
//! happen), and funnels every request through [`TwitchAuth`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::auth::TwitchAuth;
use super::EnrichmentRecord;
use crate::images::CoverStore;
use crate::matching::{edit_distance, normalize};

const IGDB_API_BASE: &str = "https://api.igdb.com/v4";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// IGDB API response types (private)
// ---------------------------------------------------------------------------

/// Minimal `id` + `name` shape shared by games, genres, and companies.
#[derive(Debug, Deserialize)]
struct NamedRecord {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GameDetail {
    summary: Option<String>,
    total_rating: Option<f64>,
    cover: Option<u64>,
    genres: Option<Vec<u64>>,
    involved_companies: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct InvolvedCompany {
    company: u64,
    #[serde(default)]
    developer: bool,
}

#[derive(Debug, Deserialize)]
struct CoverImage {
    url: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the IGDB game catalog.
///
/// `fetch_game_data` is best-effort by contract: any network, decode, or
/// not-found condition inside the pipeline is logged and collapses to
/// `None`, leaving the entry unmarked so a later refresh pass retries it.
pub struct IgdbClient {
    client: reqwest::Client,
    api_base: String,
    auth: TwitchAuth,
    covers: CoverStore,
    genre_cache: Mutex<HashMap<u64, String>>,
    developer_cache: Mutex<HashMap<u64, String>>,
}

impl IgdbClient {
    pub fn new(auth: TwitchAuth, covers: CoverStore) -> Self {
        Self::with_api_base(auth, covers, IGDB_API_BASE)
    }

    /// Point the client at a non-default API base URL (tests).
    pub fn with_api_base(
        auth: TwitchAuth,
        covers: CoverStore,
        api_base: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            api_base: api_base.into(),
            auth,
            covers,
            genre_cache: Mutex::new(HashMap::new()),
            developer_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Look `title` up in the catalog and assemble an enrichment record.
    ///
    /// Pipeline: genre cache → title search → fuzzy match selection →
    /// detail fetch → developer sub-lookup → cover download. `None` means
    /// "nothing usable this time", never "permanently unmatched".
    pub async fn fetch_game_data(&self, title: &str) -> Option<EnrichmentRecord> {
        match self.try_fetch(title).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Metadata lookup for '{}' failed: {:#}", title, e);
                None
            }
        }
    }

    async fn try_fetch(&self, title: &str) -> Result<Option<EnrichmentRecord>> {
        self.ensure_genre_cache().await?;

        // Search restricted to base entries; editions and ports carry a
        // version_parent and would crowd out the game itself.
        let candidates: Vec<NamedRecord> = self
            .post(
                "games",
                &format!(
                    "fields name; search \"{}\"; where version_parent = null;",
                    title.to_lowercase()
                ),
            )
            .await?;

        if candidates.is_empty() {
            debug!("No IGDB search results for '{}'", title);
            return Ok(None);
        }

        let normalized = normalize(title);
        let Some(best) = select_best_match(&normalized, &candidates) else {
            debug!(
                "No IGDB candidate for '{}' within edit distance {}",
                title,
                normalized.chars().count()
            );
            return Ok(None);
        };
        debug!("Matched '{}' to IGDB #{} '{}'", title, best.id, best.name);

        let detail: Option<GameDetail> = self
            .post(
                "games",
                &format!(
                    "fields name, artworks, cover, genres, total_rating, summary, involved_companies; where id = {};",
                    best.id
                ),
            )
            .await?
            .into_iter()
            .next();
        let Some(detail) = detail else {
            return Ok(None);
        };

        let image_path = match detail.cover {
            Some(cover_id) => self.fetch_cover(title, cover_id).await,
            None => None,
        };

        let genres = {
            let cache = self.genre_cache.lock().await;
            detail
                .genres
                .unwrap_or_default()
                .iter()
                .filter_map(|id| cache.get(id).cloned())
                .collect()
        };

        let developer = self
            .resolve_developer(detail.involved_companies.as_deref().unwrap_or(&[]))
            .await;

        Ok(Some(EnrichmentRecord {
            id: best.id.to_string(),
            summary: detail.summary,
            rating: detail.total_rating.map(|r| r.trunc() as u8),
            developer,
            genres,
            image_path,
        }))
    }

    /// Resolve a developer name from the involved-company list: first
    /// cached id wins, otherwise the first id flagged `developer` whose
    /// company record resolves. Publishers, porters, and co-developers
    /// after the first are ignored.
    async fn resolve_developer(&self, involved_companies: &[u64]) -> Option<String> {
        for &involved_id in involved_companies {
            {
                let cache = self.developer_cache.lock().await;
                if let Some(name) = cache.get(&involved_id) {
                    return Some(name.clone());
                }
            }

            let involvement: Option<InvolvedCompany> = match self
                .post(
                    "involved_companies",
                    &format!("fields company, developer; where id = {};", involved_id),
                )
                .await
            {
                Ok(records) => records.into_iter().next(),
                Err(e) => {
                    debug!("Involved-company lookup {} failed: {:#}", involved_id, e);
                    continue;
                }
            };
            let Some(involvement) = involvement else {
                continue;
            };
            if !involvement.developer {
                continue;
            }

            let company: Option<NamedRecord> = match self
                .post(
                    "companies",
                    &format!("fields name; where id = {};", involvement.company),
                )
                .await
            {
                Ok(records) => records.into_iter().next(),
                Err(e) => {
                    debug!("Company lookup {} failed: {:#}", involvement.company, e);
                    continue;
                }
            };
            let Some(company) = company else {
                continue;
            };

            self.developer_cache
                .lock()
                .await
                .insert(involved_id, company.name.clone());
            return Some(company.name);
        }

        None
    }

    /// Resolve a cover id to its image URL and hand it to the cover store.
    async fn fetch_cover(&self, title: &str, cover_id: u64) -> Option<PathBuf> {
        let records: Vec<CoverImage> = match self
            .post(
                "covers",
                &format!("fields id, url, width, height; where id = {};", cover_id),
            )
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!("Cover lookup for '{}' failed: {:#}", title, e);
                return None;
            }
        };
        let cover = records.into_iter().next()?;

        self.covers.fetch(title, &cover.url).await
    }

    /// The genre catalog is small reference data; one page of 100 covers
    /// it, fetched once per client lifetime.
    async fn ensure_genre_cache(&self) -> Result<()> {
        let mut cache = self.genre_cache.lock().await;
        if !cache.is_empty() {
            return Ok(());
        }

        let genres: Vec<NamedRecord> = self.post("genres", "fields name; limit 100;").await?;
        *cache = genres.into_iter().map(|g| (g.id, g.name)).collect();
        info!("Cached {} IGDB genres", cache.len());
        Ok(())
    }

    /// POST an Apicalypse query to an IGDB resource and decode the JSON
    /// array response.
    async fn post<T: DeserializeOwned>(&self, resource: &str, body: &str) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.api_base, resource);

        let request = self.auth.authorize(self.client.post(&url)).await?;
        let response = request
            .body(body.to_string())
            .send()
            .await
            .with_context(|| format!("IGDB {} request failed", resource))?
            .error_for_status()
            .with_context(|| format!("IGDB {} request rejected", resource))?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse IGDB {} response", resource))
    }
}

/// Rank candidates by edit distance against the normalized local title and
/// pick the closest one inside the acceptance window. A candidate is only
/// usable when its distance is strictly below the normalized title's
/// length, so short titles tolerate less absolute drift; provider order
/// breaks ties. `None` when nothing lands inside the window.
fn select_best_match<'a>(
    normalized_title: &str,
    candidates: &'a [NamedRecord],
) -> Option<&'a NamedRecord> {
    let threshold = normalized_title.chars().count();

    let mut scored: Vec<(usize, &NamedRecord)> = candidates
        .iter()
        .map(|c| (edit_distance(normalized_title, &normalize(&c.name)), c))
        .collect();
    // Stable sort: first-seen wins among equal distances.
    scored.sort_by_key(|(distance, _)| *distance);

    scored
        .into_iter()
        .find(|(distance, _)| *distance < threshold)
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(names: &[&str]) -> Vec<NamedRecord> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| NamedRecord {
                id: i as u64 + 1,
                name: (*name).to_string(),
            })
            .collect()
    }

    #[test]
    fn exact_match_wins() {
        let games = candidates(&["Doom Eternal", "Doom (1993)", "Doom 3"]);
        let best = select_best_match(&normalize("DOOM (1993)"), &games).unwrap();
        assert_eq!(best.name, "Doom (1993)");
    }

    #[test]
    fn closest_candidate_is_selected() {
        let games = candidates(&["Portal 2", "Portal"]);
        let best = select_best_match(&normalize("portal"), &games).unwrap();
        assert_eq!(best.name, "Portal");
    }

    #[test]
    fn candidate_at_threshold_is_rejected() {
        // Normalized length 4; every candidate sits at distance >= 4.
        let games = candidates(&["Civilization", "Borderlands"]);
        assert!(select_best_match(&normalize("Myst"), &games).is_none());
    }

    #[test]
    fn ties_break_by_provider_order() {
        // Both are distance 1 from "halo"; the first in provider order
        // must win.
        let games = candidates(&["Hala", "Halp"]);
        let best = select_best_match("halo", &games).unwrap();
        assert_eq!(best.name, "Hala");
    }

    #[test]
    fn empty_candidate_list_matches_nothing() {
        assert!(select_best_match("doom", &[]).is_none());
    }
}
