//! pomodash library root.
//! Exposes the CLI parser, the high-level `run()` function and the modules
//! behind them.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::commands;
use cli::parser::{Cli, Commands};
use config::Config;
use core::identity::StaticIdentity;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let identity = StaticIdentity::from_sources(cli.user.as_deref(), cfg);

    match &cli.command {
        Commands::Init => commands::init::handle(cli),
        Commands::Config { .. } => commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => commands::log::handle(&cli.command, cfg),
        Commands::Login { .. } => commands::login::handle(cli, cfg),
        Commands::Logout { .. } => commands::logout::handle(cli, cfg, &identity),
        Commands::Start { .. } => commands::start::handle(&cli.command, cfg, &identity),
        Commands::Status => commands::status::handle(cfg, &identity),
        Commands::Stop => commands::stop::handle(cfg, &identity),
        Commands::Skip => commands::skip::handle(cfg, &identity),
        Commands::Watch => commands::watch::handle(cfg, &identity),
        Commands::Reset => commands::reset::handle(cfg, &identity),
        Commands::List { .. } => commands::list::handle(&cli.command, cfg, &identity),
        Commands::Stats { .. } => commands::stats::handle(&cli.command, cfg, &identity),
        Commands::Backup { .. } => commands::backup::handle(&cli.command, cfg),
        Commands::Export { .. } => commands::export::handle(&cli.command, cfg, &identity),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // the config file is read once per invocation
    let mut cfg = Config::load()?;

    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    cfg.database = utils::path::expand_tilde(&cfg.database)
        .to_string_lossy()
        .to_string();

    dispatch(&cli, &cfg)
}
