// src/commands.rs

//! Command dispatch: wires parsed CLI arguments into the catalog, index,
//! resolver, planner, toolchain, and driver calls, and formats user-facing
//! output. This is the only layer that talks to `anyhow`/`std::process::exit`.

use crate::catalog::{self, Catalog, Reference, LOCAL_COOKBOOK};
use crate::cli::{CleanCommand, CookbookCommand, RecipeCommand};
use crate::config::{default_bookshelf, ConfigStore};
use crate::driver::{BuildDriver, DriverConfig};
use crate::error::Error;
use crate::index::VersionIndex;
use crate::sync::{sync_all, GitSync};
use crate::{planner, resolver, toolchain};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

fn host_platform() -> String {
    std::env::consts::OS.to_string()
}

pub fn cookbook(action: CookbookCommand, data_dir: &Path, cwd: &Path) -> Result<()> {
    let config = ConfigStore::new(data_dir.to_path_buf());

    match action {
        CookbookCommand::List => {
            let registry = config.load_cookbooks()?;
            let mut names: Vec<&String> = registry.cookbooks.keys().collect();
            names.sort();
            for name in names {
                let entry = &registry.cookbooks[name];
                let trust = if entry.trusted { "trusted" } else { "untrusted" };
                println!("{name} ({trust}) {}", entry.url);
            }
        }
        CookbookCommand::Show { name } => {
            let catalog = catalog::load(data_dir, cwd, &config).context("loading catalog")?;
            let book = catalog
                .cookbooks
                .get(&name)
                .ok_or_else(|| Error::NotFound(name.clone()))?;
            println!("{} ({})", book.name, if book.trusted { "trusted" } else { "untrusted" });
            println!("  url: {}", book.url);
            println!("  recipes:");
            for r in &book.recipes {
                println!("    {} {}", r.name, r.version);
            }
            println!("  tools:");
            for t in &book.tools {
                println!("    {} {}", t.name, t.version);
            }
        }
        CookbookCommand::Update => {
            let registry = config.load_cookbooks()?;
            if registry.cookbooks.is_empty() {
                config.merge_bookshelf(&default_bookshelf())?;
            }
            let registry = config.load_cookbooks()?;
            let targets: Vec<(String, String, PathBuf)> = registry
                .cookbooks
                .values()
                .map(|e| (e.name.clone(), e.url.clone(), data_dir.join("cookbooks").join(&e.name)))
                .collect();
            sync_all(&GitSync, &targets);
        }
        CookbookCommand::Trust { name } => {
            config.trust_cookbook(&name)?;
            println!("trusted cookbook '{name}'");
        }
        CookbookCommand::Add { name, url } => {
            config.add_cookbook(&name, &url)?;
            sync_all(&GitSync, &[(name.clone(), url, data_dir.join("cookbooks").join(&name))]);
            println!("added and trusted cookbook '{name}'");
        }
        CookbookCommand::Remove { name } => {
            config.remove_cookbook(&name)?;
            println!("removed cookbook '{name}'");
        }
    }
    Ok(())
}

pub fn recipe(action: RecipeCommand, data_dir: &Path, cwd: &Path) -> Result<()> {
    let config = ConfigStore::new(data_dir.to_path_buf());
    let catalog = catalog::load(data_dir, cwd, &config).context("loading catalog")?;

    match action {
        RecipeCommand::List { cookbook } => {
            let mut names: Vec<(&String, &String, &String)> = catalog
                .recipes_by_name
                .iter()
                .flat_map(|(name, versions)| {
                    versions.iter().flat_map(move |(version, by_cookbook)| {
                        by_cookbook.iter().map(move |(book, _)| (name, version, book))
                    })
                })
                .filter(|(_, _, book)| cookbook.as_deref().map(|c| c == book.as_str()).unwrap_or(true))
                .collect();
            names.sort();
            for (name, version, book) in names {
                println!("{book}:{name}=={version}");
            }
        }
        RecipeCommand::Show { name } => {
            let reference = Reference::parse(&name)?.qualify(LOCAL_COOKBOOK);
            let mut index = VersionIndex::build(&catalog)?;
            let selection = index.select_recipe(&reference)?;
            let found = catalog
                .recipe(&selection.name, &selection.version, &selection.cookbook)
                .ok_or_else(|| Error::NotFound(name.clone()))?;
            println!("{} {} ({})", found.name, found.version, found.cookbook);
            if let Some(summary) = &found.summary {
                println!("  {summary}");
            }
            println!("  dependencies: {}", found.dependencies.join(", "));
            println!("  required tools: {}", found.required_tools.join(", "));
        }
        RecipeCommand::Clone { name, cookbook } => {
            clone_recipe(&name, cookbook.as_deref(), &catalog, data_dir, cwd)?
        }
        RecipeCommand::Build {
            name,
            cookbook,
            target,
            dry_run,
            clean,
        } => build_recipe(&name, cookbook.as_deref(), target, dry_run, clean, data_dir, &catalog)?,
    }
    Ok(())
}

fn clone_recipe(name: &str, cookbook: Option<&str>, catalog: &Catalog, data_dir: &Path, cwd: &Path) -> Result<()> {
    let qualifier = cookbook.unwrap_or(LOCAL_COOKBOOK);
    let mut index = VersionIndex::build(catalog)?;
    let reference = Reference {
        cookbook: Some(qualifier.to_string()),
        name: name.to_string(),
        version: None,
    };
    let selection = index.select_recipe(&reference)?;
    let found = catalog
        .recipe(&selection.name, &selection.version, &selection.cookbook)
        .ok_or_else(|| Error::NotFound(name.to_string()))?;

    let local_dir = cwd.join("mussels").join("recipes");
    std::fs::create_dir_all(&local_dir)?;
    let doc = toml::to_string_pretty(&recipe_to_document(found))?;
    std::fs::write(local_dir.join(format!("{}.toml", found.name)), doc)?;

    clone_cached_archive(found, data_dir, &local_dir);

    println!("cloned '{}' into the local overlay", found.name);
    Ok(())
}

/// Best-effort: carry over an already-downloaded source archive from the
/// cache, matching the original tool's clone behavior of copying the
/// recipe alongside whatever it had already fetched.
fn clone_cached_archive(recipe: &crate::catalog::Recipe, data_dir: &Path, local_dir: &Path) {
    let pattern = data_dir
        .join("cache")
        .join(format!("{}-{}", recipe.name, recipe.version))
        .join("*.tar.*");
    let Some(pattern_str) = pattern.to_str() else {
        return;
    };
    let Ok(matches) = glob::glob(pattern_str) else {
        return;
    };
    for path in matches.filter_map(|r| r.ok()) {
        if let Some(filename) = path.file_name() {
            let _ = std::fs::copy(&path, local_dir.join(filename));
        }
    }
}

fn recipe_to_document(recipe: &crate::catalog::Recipe) -> toml::Value {
    let mut package = toml::map::Map::new();
    package.insert("name".into(), toml::Value::String(recipe.name.clone()));
    package.insert("version".into(), toml::Value::String(recipe.version.as_str().to_string()));

    let mut root = toml::map::Map::new();
    root.insert("package".into(), toml::Value::Table(package));

    if let Some(url) = &recipe.source_url {
        let mut source = toml::map::Map::new();
        source.insert("url".into(), toml::Value::String(url.clone()));
        if let Some(checksum) = &recipe.checksum {
            source.insert("checksum".into(), toml::Value::String(checksum.clone()));
        }
        root.insert("source".into(), toml::Value::Table(source));
    }

    root.insert(
        "dependencies".into(),
        toml::Value::Array(recipe.dependencies.iter().map(|d| toml::Value::String(d.clone())).collect()),
    );
    root.insert(
        "required_tools".into(),
        toml::Value::Array(recipe.required_tools.iter().map(|t| toml::Value::String(t.clone())).collect()),
    );

    toml::Value::Table(root)
}

fn build_recipe(
    name: &str,
    cookbook: Option<&str>,
    target: Option<String>,
    dry_run: bool,
    clean: bool,
    data_dir: &Path,
    catalog: &Catalog,
) -> Result<()> {
    let host = host_platform();
    let mut reference = Reference::parse(name)?;
    if let Some(book) = cookbook {
        reference.cookbook = Some(book.to_string());
    }

    let mut index = VersionIndex::build(catalog)?;
    let plan = resolver::resolve(&reference, catalog, &mut index, &host)
        .with_context(|| format!("resolving dependencies for '{name}'"))?;
    let batches = planner::plan_batches(&plan).context("planning build batches")?;
    let probe = toolchain::probe(&plan, catalog, &mut index).context("probing required tools")?;

    let driver = BuildDriver::new(
        data_dir.to_path_buf(),
        DriverConfig {
            dry_run,
            clean,
            target: target.unwrap_or_else(|| "host".to_string()),
            ..DriverConfig::default()
        },
    );
    let report = driver.run(&batches, &plan, catalog, &probe.toolchain).context("running build driver")?;

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}

pub fn clean(action: CleanCommand, data_dir: &Path) -> Result<()> {
    let remove = |sub: &str| -> Result<()> {
        let path = data_dir.join(sub);
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
            println!("removed {}", path.display());
        }
        Ok(())
    };

    match action {
        CleanCommand::Cache => remove("cache")?,
        CleanCommand::Install => remove("install")?,
        CleanCommand::Logs => remove("log")?,
        CleanCommand::All => {
            remove("cache")?;
            remove("install")?;
            remove("log")?;
        }
    }
    Ok(())
}
