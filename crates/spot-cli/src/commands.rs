use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use spot_server::{ServerConfig, SpotServer, StoreConfig};
use spot_store::{GarageStore, JsonFileStore};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Config(args) => cmd_config(args),
        Command::Check(args) => cmd_check(args).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.memory {
        config.store = StoreConfig::Memory;
    }

    let server = SpotServer::bootstrap(config)
        .await
        .context("starting server")?;
    let garages = server.registry().garages().await.len();
    println!(
        "{} Spot server on {} ({} garages loaded)",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold(),
        garages
    );
    server.serve().await?;
    println!("{} Server stopped.", "✓".green());
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}

async fn cmd_check(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let path = match &config.store {
        StoreConfig::File { path } => path.clone(),
        StoreConfig::Memory => {
            println!("{} Store is in-memory; nothing to check.", "!".yellow().bold());
            return Ok(());
        }
    };

    let store = JsonFileStore::open(&path)
        .await
        .with_context(|| format!("opening store {}", path.display()))?;
    let mut garages: Vec<_> = store.find_all_garages().await?.into_values().collect();
    garages.sort_by(|a, b| a.id.cmp(&b.id));

    println!("Store {}: {} garages", path.display().to_string().bold(), garages.len());
    for garage in &garages {
        println!("  {} {} ({})", garage.id.as_str().yellow(), garage.name, garage.city.dimmed());
        for section in &garage.sections {
            println!("    {} {} spots", section.name.cyan(), section.total_spots);
        }
    }
    Ok(())
}
