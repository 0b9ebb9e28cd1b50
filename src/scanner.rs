//! Shortcut discovery and library reconciliation.
//!
//! Source directories are scanned recursively for runnable launcher files;
//! the file stem is the game title. The discovered set is then diffed
//! against the library in four passes (add, drop-from-source, re-path,
//! stale sweep) over one scan snapshot, and the library is saved once
//! when anything changed. Entries are never deleted here: a game whose
//! shortcut disappears keeps its play history and is merely marked
//! removed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::library::GameLibrary;

/// File extensions treated as runnable game launchers.
const LAUNCHER_EXTENSIONS: &[&str] = &["lnk", "exe", "url", "cmd", "bat"];

fn is_launcher_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            LAUNCHER_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Recursively enumerate launcher files under the source directories,
/// keyed by file stem. The first occurrence of a stem wins.
pub fn scan_sources(sources: &[PathBuf]) -> HashMap<String, PathBuf> {
    let mut discovered = HashMap::new();

    for source in sources {
        if !source.exists() {
            warn!("Source directory does not exist: {:?}", source);
            continue;
        }

        for entry in WalkDir::new(source)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_dir() || !is_launcher_file(path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            discovered
                .entry(stem.to_string())
                .or_insert_with(|| path.to_path_buf());
        }
    }

    discovered
}

/// Diff the discovered shortcuts against the library. Returns whether
/// anything changed; saves the library once at the end iff it did.
pub fn reconcile(library: &GameLibrary, sources: &[PathBuf]) -> Result<bool> {
    let discovered = scan_sources(sources);
    debug!(
        "Discovered {} launcher(s) across {} source(s)",
        discovered.len(),
        sources.len()
    );

    let mut changed = false;

    // Add: discovered titles the library has never seen.
    for (title, path) in &discovered {
        if !library.contains(title) {
            library.insert_discovered(title, path.clone(), creation_time(path));
            info!("Added '{}' from {:?}", title, path);
            changed = true;
        }
    }

    // Drop-from-source: installed entries no longer discovered anywhere.
    for (title, entry) in library.entries() {
        if entry.installed() && !discovered.contains_key(&title)
            && library.set_shortcut(&title, None)
        {
            info!("'{}' no longer found in sources, marking removed", title);
            changed = true;
        }
    }

    // Re-path: discovered path differs from the stored one. Also
    // re-attaches a shortcut to previously removed entries that showed up
    // again, without touching their history.
    for (title, entry) in library.entries() {
        if let Some(path) = discovered.get(&title) {
            if entry.shortcut.as_deref() != Some(path.as_path())
                && library.set_shortcut(&title, Some(path.clone()))
            {
                info!("Updated shortcut for '{}' to {:?}", title, path);
                changed = true;
            }
        }
    }

    // Stale sweep: installed entries whose launcher file is gone from
    // disk, which the directory diff alone cannot see.
    for (title, entry) in library.entries() {
        if let Some(shortcut) = &entry.shortcut {
            if !shortcut.exists() && library.set_shortcut(&title, None) {
                info!("Shortcut for '{}' is gone from disk, marking removed", title);
                changed = true;
            }
        }
    }

    if changed {
        library.save()?;
    }
    Ok(changed)
}

/// File creation time for the `added` stamp. Platforms without birth
/// times fall back to the modification time, then to now.
fn creation_time(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launcher_extensions_match_case_insensitively() {
        assert!(is_launcher_file(Path::new("Doom.lnk")));
        assert!(is_launcher_file(Path::new("Doom.LNK")));
        assert!(is_launcher_file(Path::new("quake.exe")));
        assert!(is_launcher_file(Path::new("gog.url")));
        assert!(is_launcher_file(Path::new("run.cmd")));
        assert!(is_launcher_file(Path::new("run.bat")));
        assert!(!is_launcher_file(Path::new("readme.txt")));
        assert!(!is_launcher_file(Path::new("noextension")));
    }

    #[test]
    fn scan_finds_launchers_recursively_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("steam");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("DOOM (1993).lnk"), b"").unwrap();
        std::fs::write(nested.join("Portal 2.url"), b"").unwrap();
        std::fs::write(nested.join("notes.txt"), b"").unwrap();

        let discovered = scan_sources(&[dir.path().to_path_buf()]);
        assert_eq!(discovered.len(), 2);
        assert!(discovered.contains_key("DOOM (1993)"));
        assert_eq!(
            discovered.get("Portal 2"),
            Some(&nested.join("Portal 2.url"))
        );
    }

    #[test]
    fn missing_source_directory_is_skipped() {
        let discovered = scan_sources(&[PathBuf::from("/definitely/not/here")]);
        assert!(discovered.is_empty());
    }
}
