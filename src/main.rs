use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use staplay::backup::BackupData;
use staplay::config::{self, LoggingConfig};
use staplay::storage::{Collection, GAME_KEY};
use staplay::store::SessionStore;

#[derive(Parser)]
#[command(
    name = "staplay",
    version = env!("STAPLAY_VERSION"),
    about = "Session store and .staplay backups for Star Trek Adventures"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the stored game to a .staplay archive.
    Export {
        /// Name of the stored game.
        #[arg(long)]
        game: String,
        /// Output file. Defaults to `<game>.staplay` in the current directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace the stored session with the contents of an archive.
    Import { path: PathBuf },
    /// Summarize an archive without touching the store.
    Inspect { path: PathBuf },
    /// Summarize the stored session.
    Show {
        /// Look the game up by name instead of taking the stored one.
        #[arg(long)]
        game: Option<String>,
    },
    /// Roll one of the stored game's roll tables.
    Roll { table: String },
    /// Destroy the session store.
    Reset {
        /// Confirm the irreversible reset.
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = config::try_load_config();
    let config = loaded.as_ref().cloned().unwrap_or_default();
    let _guard = init_logging(&config.logging);
    if let Err(e) = &loaded {
        tracing::warn!("{e}; using defaults");
    }

    let store_config = config
        .store_config()
        .context("Cannot determine a data directory; set storage.directory in config.toml")?;
    let store = SessionStore::new(store_config);

    match cli.command {
        Commands::Export { game, out } => export(&store, &game, out),
        Commands::Import { path } => import(&store, &path),
        Commands::Inspect { path } => {
            let data = BackupData::read_from(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            print_summary(&data);
            Ok(())
        }
        Commands::Show { game } => show(&store, game.as_deref()),
        Commands::Roll { table } => roll(&store, &table),
        Commands::Reset { yes } => {
            if !yes {
                let path = store.config().database_path();
                bail!("Refusing to destroy {} without --yes", path.display());
            }
            store.clear()?;
            println!("Session store removed");
            Ok(())
        }
    }
}

/// Log to stderr, plus a daily file in the log directory when enabled.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let mut guard = None;
    let file_layer = staplay::paths::log_directory()
        .filter(|_| config.file)
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .map(|dir| {
            let appender = tracing_appender::rolling::daily(dir, "staplay.log");
            let (writer, worker) = tracing_appender::non_blocking(appender);
            guard = Some(worker);
            fmt::layer().with_writer(writer).with_ansi(false).with_target(true)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn export(store: &SessionStore, game: &str, out: Option<PathBuf>) -> Result<()> {
    let path = match out {
        Some(path) => path,
        None => PathBuf::from(store.snapshot(game, None)?.suggested_file_name()),
    };
    let data = store
        .export_to_file(game, &path, None)
        .with_context(|| format!("Failed to export {game:?}"))?;
    println!(
        "Wrote {} ({} players, {} scenes)",
        path.display(),
        data.players.len(),
        data.scenes.len()
    );
    Ok(())
}

fn import(store: &SessionStore, path: &Path) -> Result<()> {
    let summary = store
        .import_file(path, None)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    println!(
        "Imported {} scenes, {} players, {} trackers, {} traits, {} roll tables",
        summary.scenes, summary.players, summary.trackers, summary.traits, summary.roll_tables
    );
    if summary.rejected > 0 {
        println!("{} invalid records were skipped", summary.rejected);
    }
    Ok(())
}

fn show(store: &SessionStore, name: Option<&str>) -> Result<()> {
    let db = store.open()?;
    let Some(game) = store.get_game_info(name, Some(&db))? else {
        println!("No stored game");
        return Ok(());
    };
    let data = store.snapshot(&game.name, Some(&db))?;
    let players = store.count(Collection::Players, Some(&db))?;
    store.close(db)?;

    print_summary(&data);
    if players as usize != data.players.len() {
        println!("({players} player rows stored in total)");
    }
    Ok(())
}

fn roll(store: &SessionStore, table: &str) -> Result<()> {
    let tables = store.get_roll_tables(GAME_KEY, None)?;
    let Some(found) = tables.iter().find(|t| t.name == table) else {
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        bail!("No roll table named {table:?} (available: {})", names.join(", "));
    };
    println!("{}", found.roll());
    Ok(())
}

fn print_summary(data: &BackupData) {
    let game = &data.game_info;
    println!("{} ({}), edition {}", game.name, game.ship_name, game.edition);
    println!("  momentum {}, threat {}", game.momentum, game.threat);
    if !game.active_alert.is_empty() {
        println!("  {} alert", game.active_alert);
    }
    if let Some(model) = &game.ship_model {
        println!("  ship model: {} ({} bytes)", model.name, model.size());
    }

    println!("Players:");
    for player in &data.players {
        println!(
            "  {}. {} stress {}/{}",
            player.player_number + 1,
            player.name,
            player.current_stress,
            player.max_stress
        );
    }

    println!("Scenes:");
    for scene in &data.scenes {
        let traits = scene
            .id
            .and_then(|id| data.traits.get(&id))
            .map(|names| names.join(", "))
            .unwrap_or_default();
        println!("  {} [{traits}]", scene.name);
    }

    println!("Trackers:");
    for tracker in &data.trackers {
        println!(
            "  {} {}/{} ({} + {})",
            tracker.name,
            tracker.progress_track,
            tracker.max_progress_track,
            tracker.attribute,
            tracker.department
        );
    }

    println!("Roll tables:");
    for table in &data.roll_tables {
        println!("  {} ({} entries)", table.name, table.entries.len());
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_export() {
        let cli = Cli::try_parse_from(["staplay", "export", "--game", "Voyage Home"]).unwrap();
        match cli.command {
            Commands::Export { game, out } => {
                assert_eq!(game, "Voyage Home");
                assert!(out.is_none());
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn reset_requires_flag_value() {
        let cli = Cli::try_parse_from(["staplay", "reset"]).unwrap();
        assert!(matches!(cli.command, Commands::Reset { yes: false }));
    }

    #[test]
    fn missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["staplay"]).is_err());
    }
}
