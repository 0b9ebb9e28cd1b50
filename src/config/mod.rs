//! TOML configuration: library file location, shortcut source directories,
//! image-cache root, and IGDB provider credentials.
//!
//! The engine treats the loaded [`Config`] as read-only input; nothing in
//! this crate writes it back.

mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return the default config.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./gameshelf.toml",
        "~/.config/gameshelf/config.toml",
        "/etc/gameshelf/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration.
fn validate_config(config: &Config) -> Result<()> {
    // A half-configured credential pair is a mistake, not a disabled
    // provider.
    match (&config.twitch.client_id, &config.twitch.client_secret) {
        (Some(_), None) => {
            anyhow::bail!("twitch.client_id is set but twitch.client_secret is missing")
        }
        (None, Some(_)) => {
            anyhow::bail!("twitch.client_secret is set but twitch.client_id is missing")
        }
        _ => {}
    }

    for source in &config.scan.sources {
        if !source.exists() {
            tracing::warn!("Source directory does not exist: {:?}", source);
        }
    }

    Ok(())
}
