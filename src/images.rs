//! Cover image acquisition and caching.
//!
//! Covers are stored as `<sanitized title>.<ext>` under an `igdb/`
//! subdirectory of the configured image-cache root. The store is
//! idempotent: a file whose stem matches the title (any extension,
//! anywhere under the root) suppresses the download, and existing files
//! are never overwritten or re-validated.

use std::path::PathBuf;
use std::time::Duration;

use image::ImageFormat;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Subdirectory of the cache root that downloaded covers land in.
const IGDB_IMAGES_SUBDIR: &str = "igdb";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads provider cover images into the local cache. Cheap to clone;
/// clones share the underlying HTTP connection pool.
#[derive(Clone)]
pub struct CoverStore {
    client: reqwest::Client,
    cache_dir: Option<PathBuf>,
}

impl CoverStore {
    /// Create a cover store rooted at `cache_dir`. `None` disables
    /// downloads entirely; every fetch becomes a logged skip.
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        Self { client, cache_dir }
    }

    pub fn configured(&self) -> bool {
        self.cache_dir.is_some()
    }

    /// Look for an already-cached cover whose file stem matches `title`,
    /// case-insensitively, anywhere under the cache root.
    pub fn find_cached(&self, title: &str) -> Option<PathBuf> {
        let root = self.cache_dir.as_ref()?;
        let want = sanitize_file_name(title).to_lowercase();

        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| {
                e.file_type().is_file()
                    && e.path()
                        .file_stem()
                        .is_some_and(|s| s.to_string_lossy().to_lowercase() == want)
            })
            .map(|e| e.into_path())
    }

    /// Download the cover at `provider_url` (a thumbnail-sized IGDB image
    /// URL) and persist it under the cache root.
    ///
    /// Returns the written path, or `None` when the cache root is not
    /// configured, a matching file already exists (the missing-images
    /// refresh attaches those), or anything about the download fails.
    /// Never returns an error: cover trouble must not sink the enclosing
    /// enrichment.
    pub async fn fetch(&self, title: &str, provider_url: &str) -> Option<PathBuf> {
        let Some(root) = &self.cache_dir else {
            warn!("Image cache directory not configured, skipping cover for '{}'", title);
            return None;
        };

        if let Some(existing) = self.find_cached(title) {
            debug!(
                "Cover for '{}' already cached at {:?}, skipping download",
                title, existing
            );
            return None;
        }

        let url = original_resolution_url(provider_url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Cover download for '{}' failed: {}", title, e);
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(
                "Cover download for '{}' returned {}",
                title,
                response.status()
            );
            return None;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or_default().trim().to_string());

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Reading cover bytes for '{}' failed: {}", title, e);
                return None;
            }
        };

        let extension = extension_for(content_type.as_deref(), &bytes);

        let dir = root.join(IGDB_IMAGES_SUBDIR);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("Failed to create image directory {:?}: {}", dir, e);
            return None;
        }

        let target = dir.join(format!("{}.{}", sanitize_file_name(title), extension));

        // Re-check right before the write: another pass may have produced
        // the file since the lookup above.
        if target.exists() {
            debug!("Cover for '{}' appeared at {:?}, keeping it", title, target);
            return Some(target);
        }

        if let Err(e) = std::fs::write(&target, &bytes) {
            warn!("Failed to write cover file {:?}: {}", target, e);
            return None;
        }

        info!("Saved cover for '{}' to {:?}", title, target);
        Some(target)
    }
}

/// Rewrite an IGDB image URL to the original resolution. The API hands
/// out protocol-relative thumbnail URLs
/// (`//images.igdb.com/.../t_thumb/abc.jpg`); those are pinned to HTTPS.
pub fn original_resolution_url(url: &str) -> String {
    let url = url.replace("t_thumb", "t_original");
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url,
    }
}

/// Replace characters that cannot appear in a file name with `_`.
fn sanitize_file_name(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Pick the output extension from the response content type, sniffing the
/// bytes when the header is missing. Unknown formats default to JPEG.
fn extension_for(content_type: Option<&str>, bytes: &[u8]) -> &'static str {
    match content_type {
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/bmp") => "bmp",
        Some(_) => "jpg",
        None => match image::guess_format(bytes) {
            Ok(ImageFormat::Png) => "png",
            Ok(ImageFormat::Gif) => "gif",
            Ok(ImageFormat::Bmp) => "bmp",
            _ => "jpg",
        },
    }
}
