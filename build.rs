// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn cookbook_arg() -> Arg {
    Arg::new("cookbook")
        .short('c')
        .long("cookbook")
        .help("Restrict to a specific cookbook")
}

fn target_arg() -> Arg {
    Arg::new("target")
        .short('t')
        .long("target")
        .help("Target architecture")
}

fn build_cli() -> Command {
    Command::new("mussels")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mussels Contributors")
        .about("Dependency-aware, multi-cookbook build orchestrator for native software")
        .subcommand_required(false)
        .arg(
            Arg::new("verbose")
                .short('V')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (repeatable)"),
        )
        .subcommand(
            Command::new("cookbook")
                .about("Manage cookbooks")
                .subcommand(Command::new("list").about("List known cookbooks"))
                .subcommand(Command::new("show").arg(Arg::new("name").required(true)))
                .subcommand(Command::new("update").about("Refresh cookbooks from their URLs"))
                .subcommand(Command::new("trust").arg(Arg::new("name").required(true)))
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("url").long("url").required(true)),
                )
                .subcommand(Command::new("remove").arg(Arg::new("name").required(true))),
        )
        .subcommand(
            Command::new("recipe")
                .about("Inspect and build recipes")
                .subcommand(Command::new("list").arg(cookbook_arg()))
                .subcommand(Command::new("show").arg(Arg::new("name").required(true)))
                .subcommand(
                    Command::new("clone")
                        .arg(Arg::new("name").required(true))
                        .arg(cookbook_arg()),
                )
                .subcommand(
                    Command::new("build")
                        .arg(Arg::new("name").required(true))
                        .arg(cookbook_arg())
                        .arg(target_arg())
                        .arg(
                            Arg::new("dry_run")
                                .short('d')
                                .long("dry-run")
                                .action(clap::ArgAction::SetTrue),
                        )
                        .arg(Arg::new("clean").long("clean").action(clap::ArgAction::SetTrue)),
                ),
        )
        .subcommand(
            Command::new("clean")
                .about("Purge on-disk state")
                .subcommand(Command::new("cache"))
                .subcommand(Command::new("install"))
                .subcommand(Command::new("logs"))
                .subcommand(Command::new("all")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell"]),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("mussels.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
        return;
    }

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
