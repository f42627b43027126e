// src/main.rs

use clap::{CommandFactory, Parser};
use mussels::cli::{Cli, Commands};
use mussels::commands;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mussels")
}

fn init_logging(verbosity: u8, data_dir: &std::path::Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let log_dir = data_dir.join("log");
    let guard = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::never(&log_dir, "mussels.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
            None
        }
    };
    guard
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = data_dir();
    let _guard = init_logging(cli.verbose, &data_dir);
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    match cli.command {
        Some(Commands::Cookbook { action }) => commands::cookbook(action, &data_dir, &cwd)?,
        Some(Commands::Recipe { action }) => commands::recipe(action, &data_dir, &cwd)?,
        Some(Commands::Clean { action }) => commands::clean(action, &data_dir)?,
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
        None => {
            Cli::command().print_help().ok();
        }
    }

    Ok(())
}
