mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, FilterArg, SortArg};
use std::path::Path;
use std::sync::Arc;

use gameshelf::config;
use gameshelf::library::{GameLibrary, GameQuery};
use gameshelf::sync::SyncEngine;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise use defaults based on the
    // verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "gameshelf=debug".to_string()
        } else {
            "gameshelf=info".to_string()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Sync => {
            let engine = build_engine(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let changed = engine.refresh_sources()?;
                let attached = engine.refresh_missing_images()?;
                let enriched = engine.refresh_missing_metadata().await?;
                println!(
                    "Sources {}, {} cover(s) attached, {} game(s) enriched",
                    if changed { "changed" } else { "unchanged" },
                    attached,
                    enriched
                );
                anyhow::Ok(())
            })
        }
        Commands::RefreshSources => {
            let engine = build_engine(cli.config.as_deref())?;
            let changed = engine.refresh_sources()?;
            if changed {
                println!("Library updated from sources");
            } else {
                println!("No changes");
            }
            Ok(())
        }
        Commands::RefreshImages => {
            let engine = build_engine(cli.config.as_deref())?;
            let attached = engine.refresh_missing_images()?;
            println!("Attached {} cover(s)", attached);
            Ok(())
        }
        Commands::RefreshMetadata => {
            let engine = build_engine(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            let enriched = rt.block_on(engine.refresh_missing_metadata())?;
            println!("Enriched {} game(s)", enriched);
            Ok(())
        }
        Commands::List {
            filter,
            sort,
            descending,
            title,
        } => list_games(cli.config.as_deref(), filter, sort, descending, title),
        Commands::MarkPlayed { title } => {
            mutate_library(cli.config.as_deref(), &title, "not found", |library, title| {
                library.record_play(title)
            })
        }
        Commands::MarkCompleted { title } => mutate_library(
            cli.config.as_deref(),
            &title,
            "not found or already completed",
            |library, title| library.mark_completed(title),
        ),
        Commands::Rename { title, new_title } => mutate_library(
            cli.config.as_deref(),
            &title,
            "not found, or the new title is taken",
            |library, title| library.rename(title, &new_title),
        ),
        Commands::Remove { title } => {
            mutate_library(cli.config.as_deref(), &title, "not found", |library, title| {
                library.remove(title)
            })
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("gameshelf {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn build_engine(config_path: Option<&Path>) -> Result<SyncEngine> {
    let config = config::load_config_or_default(config_path)?;
    let library = Arc::new(GameLibrary::load(&config.library.path)?);
    Ok(SyncEngine::from_config(library, &config))
}

fn mutate_library(
    config_path: Option<&Path>,
    title: &str,
    rejection: &str,
    op: impl FnOnce(&GameLibrary, &str) -> Result<bool, gameshelf::library::LibraryError>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let library = GameLibrary::load(&config.library.path)?;
    if op(&library, title)? {
        println!("Done");
    } else {
        println!("'{}' {}", title, rejection);
    }
    Ok(())
}

fn list_games(
    config_path: Option<&Path>,
    filter: FilterArg,
    sort: SortArg,
    descending: bool,
    title: Option<String>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let library = GameLibrary::load(&config.library.path)?;

    let query = GameQuery {
        filter: filter.into(),
        title_contains: title,
        sort: sort.into(),
        descending,
    };
    let titles = library.query(&query);

    for title in &titles {
        let Some(entry) = library.get(title) else {
            continue;
        };

        let mut line = format!(
            "{} [{}]",
            title,
            if entry.installed() { "installed" } else { "removed" }
        );
        if entry.completed.is_some() {
            line.push_str(" [completed]");
        }
        if !entry.played.is_empty() {
            line.push_str(&format!(" ({} plays)", entry.played.len()));
        }
        if let Some(rating) = entry.rating {
            line.push_str(&format!(" {}%", rating));
        }
        println!("{line}");
    }

    println!("\n{} game(s)", titles.len());
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Library: {:?}", config.library.path);
            println!("  Sources: {}", config.scan.sources.len());
            println!(
                "  Image cache: {}",
                config
                    .images
                    .cache_dir
                    .as_ref()
                    .map(|p| format!("{:?}", p))
                    .unwrap_or_else(|| "not configured".to_string())
            );
            println!(
                "  Provider credentials: {}",
                if config.twitch.credentials().is_some() {
                    "configured"
                } else {
                    "not configured"
                }
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Library: {:?}", config.library.path);
        }
    }

    Ok(())
}
