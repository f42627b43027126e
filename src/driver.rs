// src/driver.rs

//! Build Driver (C6): executes a batched plan against a validated
//! toolchain, honoring trust, dry-run, and clean flags, and collecting
//! per-recipe outcomes.

use crate::archive;
use crate::catalog::{Catalog, Recipe};
use crate::error::{Error, Result};
use crate::resolver::PinnedRecipe;
use crate::toolchain::Toolchain;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub workers: usize,
    pub dry_run: bool,
    pub clean: bool,
    pub target: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            dry_run: false,
            clean: false,
            target: "host".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecipeOutcome {
    pub name: String,
    pub version: String,
    pub success: bool,
    pub skipped: bool,
    pub elapsed: Duration,
    pub message: Option<String>,
}

#[derive(Debug)]
pub struct DriverReport {
    pub outcomes: Vec<RecipeOutcome>,
    pub success: bool,
}

pub struct BuildDriver {
    config: DriverConfig,
    data_dir: PathBuf,
}

impl BuildDriver {
    pub fn new(data_dir: PathBuf, config: DriverConfig) -> Self {
        BuildDriver { config, data_dir }
    }

    pub fn run(
        &self,
        batches: &[Vec<String>],
        plan: &[PinnedRecipe],
        catalog: &Catalog,
        toolchain: &Toolchain,
    ) -> Result<DriverReport> {
        let by_name: HashMap<&str, &PinnedRecipe> =
            plan.iter().map(|p| (p.name.as_str(), p)).collect();

        if self.config.dry_run {
            return Ok(self.run_dry(batches, &by_name));
        }

        let failed = AtomicBool::new(false);
        let mut outcomes: Vec<RecipeOutcome> = Vec::new();
        let mut batch_of: HashMap<String, usize> = HashMap::new();
        for (i, batch) in batches.iter().enumerate() {
            for name in batch {
                batch_of.insert(name.clone(), i);
            }
        }

        for batch in batches {
            if failed.load(Ordering::SeqCst) {
                break;
            }

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers.max(1))
                .build()
                .map_err(|e| Error::BuildStepFailed {
                    name: batch.join(", "),
                    reason: format!("failed to build worker pool: {e}"),
                })?;

            let results: Vec<RecipeOutcome> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|name| {
                        let pin = by_name[name.as_str()];
                        self.execute_one(pin, catalog, toolchain, &failed)
                    })
                    .collect()
            });

            for r in &results {
                if !r.success && !r.skipped {
                    failed.store(true, Ordering::SeqCst);
                }
            }
            outcomes.extend(results);
        }

        if failed.load(Ordering::SeqCst) {
            let executed: HashSet<String> = outcomes.iter().map(|o| o.name.clone()).collect();
            for batch in batches {
                for name in batch {
                    if !executed.contains(name) {
                        let pin = by_name[name.as_str()];
                        outcomes.push(RecipeOutcome {
                            name: pin.name.clone(),
                            version: pin.version.clone(),
                            success: false,
                            skipped: true,
                            elapsed: Duration::ZERO,
                            message: Some("skipped: an earlier recipe in this plan failed".to_string()),
                        });
                    }
                }
            }
        }

        outcomes.sort_by(|a, b| {
            batch_of
                .get(&a.name)
                .cmp(&batch_of.get(&b.name))
                .then_with(|| a.name.cmp(&b.name))
        });

        let success = outcomes.iter().all(|o| o.success && !o.skipped);

        let finished_at = chrono::Local::now();
        for outcome in &outcomes {
            let status = if outcome.success {
                "OK"
            } else if outcome.skipped {
                "SKIPPED"
            } else {
                "FAILED"
            };
            println!(
                "[{}] {}-{}: {} ({:.1}s)",
                finished_at.format("%H:%M:%S"),
                outcome.name,
                outcome.version,
                status,
                outcome.elapsed.as_secs_f64()
            );
        }

        Ok(DriverReport { outcomes, success })
    }

    fn run_dry(&self, batches: &[Vec<String>], by_name: &HashMap<&str, &PinnedRecipe>) -> DriverReport {
        let mut position = 1;
        for (batch_index, batch) in batches.iter().enumerate() {
            for (intra_index, name) in batch.iter().enumerate() {
                let pin = by_name[name.as_str()];
                println!(
                    " {position} [{batch_index}: {intra_index}]: {}-{}",
                    pin.name, pin.version
                );
                for tool in &pin.tools {
                    println!("    tool {}-{} ({})", tool.name, tool.version, tool.cookbook);
                }
                position += 1;
            }
        }
        DriverReport {
            outcomes: Vec::new(),
            success: true,
        }
    }

    fn execute_one(
        &self,
        pin: &PinnedRecipe,
        catalog: &Catalog,
        toolchain: &Toolchain,
        failed: &AtomicBool,
    ) -> RecipeOutcome {
        let start = Instant::now();
        let skip = |message: &str| RecipeOutcome {
            name: pin.name.clone(),
            version: pin.version.clone(),
            success: false,
            skipped: true,
            elapsed: start.elapsed(),
            message: Some(message.to_string()),
        };

        if failed.load(Ordering::SeqCst) {
            return skip("skipped: an earlier recipe in this plan failed");
        }

        let trusted = catalog
            .cookbooks
            .get(&pin.cookbook)
            .map(|c| c.trusted)
            .unwrap_or(false);

        if !trusted {
            let err = Error::UntrustedCookbook {
                name: pin.name.clone(),
                cookbook: pin.cookbook.clone(),
            };
            error!("{}", err);
            failed.store(true, Ordering::SeqCst);
            return RecipeOutcome {
                name: pin.name.clone(),
                version: pin.version.clone(),
                success: false,
                skipped: false,
                elapsed: start.elapsed(),
                message: Some(err.to_string()),
            };
        }

        let recipe = match catalog.recipe(&pin.name, &pin.version, &pin.cookbook) {
            Some(r) => r.clone(),
            None => {
                failed.store(true, Ordering::SeqCst);
                return RecipeOutcome {
                    name: pin.name.clone(),
                    version: pin.version.clone(),
                    success: false,
                    skipped: false,
                    elapsed: start.elapsed(),
                    message: Some(format!("recipe '{}' disappeared from catalog", pin.name)),
                };
            }
        };

        if recipe.is_collection {
            return RecipeOutcome {
                name: pin.name.clone(),
                version: pin.version.clone(),
                success: true,
                skipped: false,
                elapsed: start.elapsed(),
                message: None,
            };
        }

        match self.build(&recipe, pin, toolchain) {
            Ok(()) => RecipeOutcome {
                name: pin.name.clone(),
                version: pin.version.clone(),
                success: true,
                skipped: false,
                elapsed: start.elapsed(),
                message: None,
            },
            Err(e) => {
                error!("build of {} failed: {}", recipe.name, e);
                failed.store(true, Ordering::SeqCst);
                RecipeOutcome {
                    name: pin.name.clone(),
                    version: pin.version.clone(),
                    success: false,
                    skipped: false,
                    elapsed: start.elapsed(),
                    message: Some(e.to_string()),
                }
            }
        }
    }

    fn build(&self, recipe: &Recipe, pin: &PinnedRecipe, toolchain: &Toolchain) -> Result<()> {
        let build_target = recipe
            .build
            .get(&self.config.target)
            .or_else(|| recipe.build.get("host"))
            .ok_or_else(|| Error::MissingPlatformVariant {
                name: recipe.name.clone(),
                platform: self.config.target.clone(),
            })?;

        let install_dir = self.data_dir.join("install").join(&recipe.name);
        if self.config.clean && install_dir.exists() {
            std::fs::remove_dir_all(&install_dir)?;
        }
        std::fs::create_dir_all(&install_dir)?;

        let cache_dir = self
            .data_dir
            .join("cache")
            .join(format!("{}-{}", recipe.name, recipe.version));
        std::fs::create_dir_all(&cache_dir)?;

        let source_dir = self.fetch_source(recipe, &cache_dir)?;

        let includes = self.dependency_role_paths(pin, "include");
        let libs = self.dependency_role_paths(pin, "lib");

        for line in &build_target.script {
            let substituted = substitute(line, &includes, &libs, toolchain);
            info!("{}: {}", recipe.name, substituted);
            let status = Command::new("sh")
                .arg("-c")
                .arg(&substituted)
                .current_dir(&source_dir)
                .status()
                .map_err(|e| Error::BuildStepFailed {
                    name: recipe.name.clone(),
                    reason: format!("failed to spawn shell: {e}"),
                })?;
            if !status.success() {
                return Err(Error::BuildStepFailed {
                    name: recipe.name.clone(),
                    reason: format!("`{substituted}` exited with {status}"),
                });
            }
        }

        for (role, rel_path) in &build_target.install_paths {
            let src = source_dir.join(rel_path);
            let dest = install_dir.join(role).join(
                Path::new(rel_path)
                    .file_name()
                    .unwrap_or_else(|| std::ffi::OsStr::new(rel_path)),
            );
            copy_path(&src, &dest)?;
        }

        Ok(())
    }

    fn fetch_source(&self, recipe: &Recipe, cache_dir: &Path) -> Result<PathBuf> {
        let Some(url) = &recipe.source_url else {
            return Ok(cache_dir.to_path_buf());
        };

        let filename = recipe
            .rename
            .clone()
            .unwrap_or_else(|| url.rsplit('/').next().unwrap_or("source.tar.gz").to_string());
        let archive_path = cache_dir.join(&filename);

        archive::download(url, &archive_path)?;
        if let Some(checksum) = &recipe.checksum {
            archive::verify_checksum(&archive_path, checksum)?;
        }

        for extra in &recipe.additional_sources {
            let extra_name = extra.url.rsplit('/').next().unwrap_or("extra-source").to_string();
            let extra_path = cache_dir.join(&extra_name);
            archive::download(&extra.url, &extra_path)?;
            if let Some(checksum) = &extra.checksum {
                archive::verify_checksum(&extra_path, checksum)?;
            }
        }

        let extract_dir = cache_dir.join("src");
        archive::extract(&archive_path, &extract_dir)?;
        Ok(archive::single_subdir(&extract_dir).unwrap_or(extract_dir))
    }

    /// Conventional `include`/`lib` subdirectories under each direct
    /// dependency's already-installed prefix, used to populate the
    /// `{includes}`/`{libs}` build-script placeholders.
    fn dependency_role_paths(&self, pin: &PinnedRecipe, role: &str) -> Vec<String> {
        pin.dependencies
            .iter()
            .map(|dep| self.data_dir.join("install").join(dep).join(role))
            .filter(|p| p.exists())
            .map(|p| p.to_string_lossy().to_string())
            .collect()
    }
}

fn substitute(line: &str, includes: &[String], libs: &[String], toolchain: &Toolchain) -> String {
    let mut out = line
        .replace(
            "{includes}",
            &includes.iter().map(|p| format!("-I{p}")).collect::<Vec<_>>().join(" "),
        )
        .replace(
            "{libs}",
            &libs.iter().map(|p| format!("-L{p}")).collect::<Vec<_>>().join(" "),
        );
    for (name, entry) in toolchain {
        out = out.replace(&format!("{{{name}}}"), &entry.command);
    }
    out
}

fn copy_path(src: &Path, dest: &Path) -> Result<()> {
    if src.is_dir() {
        std::fs::create_dir_all(dest)?;
        for entry in walkdir::WalkDir::new(src).into_iter().filter_map(|e| e.ok()) {
            let rel = entry.path().strip_prefix(src).unwrap();
            let target = dest.join(rel);
            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(entry.path(), &target)?;
            }
        }
    } else if src.is_file() {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(src, dest)?;
    }
    Ok(())
}
