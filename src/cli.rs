// src/cli.rs

//! Command-line surface, mirroring the `Command` tree in `build.rs` used to
//! generate the man page.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "mussels", author, version, about = "Dependency-aware, multi-cookbook build orchestrator for native software", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (repeatable: -V, -VV, -VVV)
    #[arg(short = 'V', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage cookbooks
    Cookbook {
        #[command(subcommand)]
        action: CookbookCommand,
    },
    /// Inspect and build recipes
    Recipe {
        #[command(subcommand)]
        action: RecipeCommand,
    },
    /// Purge on-disk state
    Clean {
        #[command(subcommand)]
        action: CleanCommand,
    },
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CookbookCommand {
    /// List known cookbooks
    List,
    /// Show a cookbook's recipes and tools
    Show { name: String },
    /// Refresh cookbooks from their URLs
    Update,
    /// Mark a cookbook as trusted
    Trust { name: String },
    /// Register a new cookbook by URL (implies trust)
    Add {
        name: String,
        #[arg(long)]
        url: String,
    },
    /// Drop a cookbook from the registry
    Remove { name: String },
}

#[derive(Subcommand)]
pub enum RecipeCommand {
    /// List recipes, optionally restricted to one cookbook
    List {
        #[arg(short = 'c', long = "cookbook")]
        cookbook: Option<String>,
    },
    /// Show a recipe's metadata
    Show { name: String },
    /// Copy a recipe definition and its source into the local overlay
    Clone {
        name: String,
        #[arg(short = 'c', long = "cookbook")]
        cookbook: Option<String>,
    },
    /// Resolve, plan, and build a recipe's dependency closure
    Build {
        name: String,
        #[arg(short = 'c', long = "cookbook")]
        cookbook: Option<String>,
        #[arg(short = 't', long = "target")]
        target: Option<String>,
        #[arg(short = 'd', long = "dry-run", action = clap::ArgAction::SetTrue)]
        dry_run: bool,
        #[arg(long, action = clap::ArgAction::SetTrue)]
        clean: bool,
    },
}

#[derive(Subcommand)]
pub enum CleanCommand {
    /// Purge downloaded/extracted sources
    Cache,
    /// Purge built install trees
    Install,
    /// Purge log files
    Logs,
    /// Purge cache, install, and logs
    All,
}
