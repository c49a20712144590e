use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use spdlog::{info, warn};

use telepost::logger::configure_logger;

use crate::commands::App;
use crate::config::{generate_cfg, open_config};

mod commands;
mod config;
mod config_data;

const CFG_FILE_NAME: &str = "telepost.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path. If empty, telepost.toml is looked up next to the executable,
    /// in the current dir and in the user config dir
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publishes a post right away
    Publish {
        /// Markdown document, relative to the vault if not found
        file: PathBuf,
    },
    /// Stores a post to be published at a given time
    Schedule {
        file: PathBuf,
        /// RFC 3339, or YYYY-MM-DD HH:MM[:SS] in local time
        time: String,
    },
    /// Parses and validates a post without sending it
    Check {
        file: PathBuf,
    },
    /// Lists the scheduled posts
    List,
    /// Publishes the scheduled posts that are due
    Sweep,
    /// Publishes scheduled posts as they come due, until Ctrl-C
    Run,
    /// Writes a sample configuration file
    InitConfig {
        /// Defaults to the user config dir
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::InitConfig { ref path } = args.command {
        let path = generate_cfg(path.clone().or(args.config))?;
        println!("Edit {} and set your bot token and channel", path.display());
        return Ok(());
    }

    let config = open_config(args.config, |key| env::var(key).ok())?;

    if let Err(err) = configure_logger(config.log.as_ref()) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    info!("Starting Telepost =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");
    let app = App::new(config)?;

    match args.command {
        Command::Publish { file } => app.publish(&file).await,
        Command::Schedule { file, time } => app.schedule(&file, &time).await,
        Command::Check { file } => app.check(&file).await,
        Command::List => app.list().await,
        Command::Sweep => app.sweep().await,
        Command::Run => app.run().await,
        Command::InitConfig { .. } => Ok(()),
    }
}
