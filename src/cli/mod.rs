use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config;
use crate::storage::operations::Storage;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(version = "0.1")]
#[command(about = "REST catalog of artists, albums and songs")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run http server hosting the catalog API
    Serve,
    /// Show how many rows each table holds
    Status,
    /// Print catalog entries
    List {
        #[arg(value_enum)]
        entity: Entity,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Entity {
    Artists,
    Albums,
    Songs,
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = config::Config::load(&cli.config)?;
    log::debug!("loaded config version {}", cfg.version);

    let mut storage = Storage::new(&cfg.database).context("Failed to initialize storage")?;

    match &cli.command {
        Commands::Serve => {
            let http_server = crate::http::server::HttpServer::new(storage, cfg.http);

            log::info!(
                "HTTP server running at http://{}:{}{}",
                http_server.config.bind_addr,
                http_server.config.port,
                http_server.config.path_prefix.as_deref().unwrap_or("")
            );
            http_server.run();
        }

        Commands::Status => {
            let counts = storage.counts()?;
            println!("Artists: {}", counts.artists);
            println!("Albums:  {}", counts.albums);
            println!("Songs:   {} ({} album tracks)", counts.songs, counts.tracks);
        }

        Commands::List { entity } => match entity {
            Entity::Artists => {
                for entry in storage.list_artists()? {
                    println!("[{}] {}", entry.artist.id, entry.artist.name);
                    for album in &entry.albums {
                        println!("    - [{}] {} ({})", album.id, album.title, album.release_year);
                    }
                }
            }
            Entity::Albums => {
                for entry in storage.list_albums()? {
                    println!(
                        "[{}] {} ({}) by {}",
                        entry.album.id, entry.album.title, entry.album.release_year, entry.artist.name
                    );
                }
            }
            Entity::Songs => {
                for entry in storage.list_songs()? {
                    println!("[{}] {}", entry.song.id, entry.song.title);
                    for appearance in &entry.albums {
                        println!(
                            "    - #{} on [{}] {}",
                            appearance.pivot.track_number, appearance.album.id, appearance.album.title
                        );
                    }
                }
            }
        },
    }

    Ok(())
}
