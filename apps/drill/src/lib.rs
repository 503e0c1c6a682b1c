//! Drill: spaced-repetition questions kept in a local SQLite database.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::Config;
use crate::db::SqliteRepository;

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.database.clone(), cli.user.clone());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut repo = SqliteRepository::open(&config.database_path).with_context(|| {
        format!("failed to open database at {}", config.database_path.display())
    })?;

    tracing::debug!(user = %config.user, "Running command");
    let output = commands::execute(&mut repo, &config.user, cli.command, Utc::now())?;
    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}
