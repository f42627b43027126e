// src/sync.rs

//! Cookbook Sync (C8): an external collaborator behind a trait so the
//! driver and tests can substitute a fake. The reference implementation
//! shells out to the system `git` binary, matching the original tool's own
//! reliance on an external VCS client.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

pub trait CookbookSync {
    /// Produce a directory at `target_path` reflecting the latest upstream
    /// for `url`. Must update in place if the directory exists, create it
    /// otherwise. Failure of one cookbook must not prevent others from
    /// loading — callers are expected to warn and continue, not propagate.
    fn sync(&self, name: &str, url: &str, target_path: &Path) -> Result<()>;
}

pub struct GitSync;

impl CookbookSync for GitSync {
    fn sync(&self, name: &str, url: &str, target_path: &Path) -> Result<()> {
        if url.is_empty() {
            return Ok(());
        }

        let status = if target_path.join(".git").is_dir() {
            info!("updating cookbook '{}' at {}", name, target_path.display());
            Command::new("git")
                .arg("-C")
                .arg(target_path)
                .args(["pull", "--ff-only"])
                .status()
        } else {
            info!("cloning cookbook '{}' from {}", name, url);
            if let Some(parent) = target_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Command::new("git")
                .args(["clone", url])
                .arg(target_path)
                .status()
        };

        match status {
            Ok(s) if s.success() => Ok(()),
            Ok(s) => {
                warn!("git exited with {} syncing cookbook '{}'", s, name);
                Err(Error::NetworkError(format!(
                    "git exited with {s} syncing cookbook '{name}'"
                )))
            }
            Err(e) => Err(Error::NetworkError(format!(
                "failed to invoke git for cookbook '{name}': {e}"
            ))),
        }
    }
}

/// Sync every registered cookbook, warning (not aborting) on a per-cookbook
/// failure, matching C8's contract that a single failure must not block
/// others from loading.
pub fn sync_all(syncer: &dyn CookbookSync, cookbooks: &[(String, String, std::path::PathBuf)]) {
    for (name, url, target_path) in cookbooks {
        if let Err(e) = syncer.sync(name, url, target_path) {
            warn!("failed to sync cookbook '{}': {}", name, e);
        }
    }
}
