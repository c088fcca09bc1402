//! lavactl - Test-lab device controller
//!
//! Drives a device under test through its lifecycle from the command line:
//! flash an image set, boot it, run shell commands on it, copy test data
//! into its partitions and switch the accessory modules wired to it.
//!
//! Boards are described in a board database (RON or TOML files). Every
//! command that touches a device names its board with `--board`.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use lavactl_core::{BoardConfig, BoardDatabase};

use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let db = match load_board_database(cli.board_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load board database: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded {} board definitions", db.len());

    match cli.command {
        Commands::Deploy {
            board,
            images,
            power_on,
            run,
        } => commands::run_deploy(find_board(&db, &board)?, &images, power_on, &run),
        Commands::Push {
            board,
            images,
            partition,
            dest,
            input,
        } => commands::run_push(find_board(&db, &board)?, &images, &partition, &dest, &input),
        Commands::Version { board } => commands::run_version(find_board(&db, &board)?),
        Commands::Signal {
            board,
            module,
            command,
            name,
        } => commands::run_signal(&*find_board(&db, &board)?, &module, &command, name.as_deref()),
        Commands::ListBoards => {
            commands::list_boards(&db);
            Ok(())
        }
        Commands::ListModules => {
            commands::list_modules();
            Ok(())
        }
    }
}

fn find_board(db: &BoardDatabase, name: &str) -> Result<Arc<BoardConfig>, Box<dyn std::error::Error>> {
    match db.get(name) {
        Some(board) => Ok(Arc::new(board.clone())),
        None => Err(format!("Unknown board '{}' (see list-boards)", name).into()),
    }
}

/// Load the board database from the specified path or default locations
fn load_board_database(path: Option<&Path>) -> Result<BoardDatabase, Box<dyn std::error::Error>> {
    let mut db = BoardDatabase::new();

    if let Some(path) = path {
        if path.is_dir() {
            db.load_dir(path)?;
        } else if path.is_file() {
            db.load_file(path)?;
        } else {
            return Err(format!("Board database path not found: {}", path.display()).into());
        }
    } else {
        let default_paths = [
            PathBuf::from("boards"),
            PathBuf::from("/usr/share/lavactl/boards"),
            PathBuf::from("/usr/local/share/lavactl/boards"),
        ];

        let mut loaded = false;
        for dir in &default_paths {
            if dir.is_dir() {
                match db.load_dir(dir) {
                    Ok(count) => {
                        log::debug!("Loaded {} boards from {}", count, dir.display());
                        loaded = true;
                    }
                    Err(e) => {
                        log::warn!("Failed to load boards from {}: {}", dir.display(), e);
                    }
                }
            }
        }

        if !loaded {
            log::warn!("No board database found in default locations");
        }
    }

    Ok(db)
}
