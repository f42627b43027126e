// src/config.rs

//! Config Store (C7): JSON persistence of general settings and the
//! cookbook registry under `<data_dir>/config/`.

use crate::catalog::Cookbook;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// General options, persisted to `config.json`. Additive fields default via
/// `#[serde(default)]` so older documents round-trip without migration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub default_cookbook: Option<String>,
    #[serde(default)]
    pub worker_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookbookEntry {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub trusted: bool,
}

/// The cookbook map, persisted to `cookbooks.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CookbookRegistry {
    #[serde(default)]
    pub cookbooks: HashMap<String, CookbookEntry>,
}

/// A small set of well-known cookbooks seeded into an empty registry on the
/// first `cookbook update`, mirroring the original tool's hardcoded bookshelf.
pub fn default_bookshelf() -> Vec<(&'static str, &'static str)> {
    vec![
        ("core", "https://example.com/mussels-cookbooks/core.git"),
        ("extras", "https://example.com/mussels-cookbooks/extras.git"),
    ]
}

pub struct ConfigStore {
    data_dir: PathBuf,
}

impl ConfigStore {
    pub fn new(data_dir: PathBuf) -> Self {
        ConfigStore { data_dir }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.data_dir.join("config")
    }

    fn settings_path(&self) -> PathBuf {
        self.config_dir().join("config.json")
    }

    fn cookbooks_path(&self) -> PathBuf {
        self.config_dir().join("cookbooks.json")
    }

    fn ensure_dir(&self) {
        if let Err(e) = std::fs::create_dir_all(self.config_dir()) {
            warn!("could not create config directory: {}", e);
        }
    }

    /// Silent absence on read (first run).
    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Warning without abort on write failure.
    pub fn save_settings(&self, settings: &Settings) {
        self.ensure_dir();
        match serde_json::to_string_pretty(settings) {
            Ok(content) => {
                if let Err(e) = std::fs::write(self.settings_path(), content) {
                    warn!("failed to write config.json: {}", e);
                }
            }
            Err(e) => warn!("failed to serialize settings: {}", e),
        }
    }

    pub fn load_cookbooks(&self) -> Result<CookbookRegistry> {
        let path = self.cookbooks_path();
        if !path.exists() {
            return Ok(CookbookRegistry::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_cookbooks(&self, registry: &CookbookRegistry) {
        self.ensure_dir();
        match serde_json::to_string_pretty(registry) {
            Ok(content) => {
                if let Err(e) = std::fs::write(self.cookbooks_path(), content) {
                    warn!("failed to write cookbooks.json: {}", e);
                }
            }
            Err(e) => warn!("failed to serialize cookbook registry: {}", e),
        }
    }

    /// Called by C1 after catalog construction to persist whatever cookbook
    /// identities it observed (local overlay excluded: it is synthetic and
    /// never persisted).
    pub fn persist_cookbooks(&self, cookbooks: &HashMap<String, Cookbook>) -> Result<()> {
        let mut registry = self.load_cookbooks()?;
        for (name, book) in cookbooks {
            if name == crate::catalog::LOCAL_COOKBOOK {
                continue;
            }
            registry
                .cookbooks
                .entry(name.clone())
                .or_insert_with(|| CookbookEntry {
                    name: name.clone(),
                    url: book.url.clone(),
                    trusted: book.trusted,
                });
        }
        self.save_cookbooks(&registry);
        Ok(())
    }

    /// `cookbook trust <name>`.
    pub fn trust_cookbook(&self, name: &str) -> Result<()> {
        let mut registry = self.load_cookbooks()?;
        match registry.cookbooks.get_mut(name) {
            Some(entry) => entry.trusted = true,
            None => {
                registry.cookbooks.insert(
                    name.to_string(),
                    CookbookEntry {
                        name: name.to_string(),
                        url: String::new(),
                        trusted: true,
                    },
                );
            }
        }
        self.save_cookbooks(&registry);
        Ok(())
    }

    /// `cookbook add <name> --url <url>`. Adding a cookbook by explicit URL
    /// is itself the trust decision (§4.7): it is marked trusted immediately.
    pub fn add_cookbook(&self, name: &str, url: &str) -> Result<()> {
        let mut registry = self.load_cookbooks()?;
        registry.cookbooks.insert(
            name.to_string(),
            CookbookEntry {
                name: name.to_string(),
                url: url.to_string(),
                trusted: true,
            },
        );
        self.save_cookbooks(&registry);
        Ok(())
    }

    pub fn remove_cookbook(&self, name: &str) -> Result<()> {
        let mut registry = self.load_cookbooks()?;
        registry.cookbooks.remove(name);
        self.save_cookbooks(&registry);
        Ok(())
    }

    /// `cookbook update` with no prior registry seeds the hardcoded
    /// bookshelf; entries already known keep their existing trust decision,
    /// new entries default to untrusted.
    pub fn merge_bookshelf(&self, bookshelf: &[(&str, &str)]) -> Result<()> {
        let mut registry = self.load_cookbooks()?;
        for (name, url) in bookshelf {
            registry
                .cookbooks
                .entry(name.to_string())
                .or_insert_with(|| CookbookEntry {
                    name: name.to_string(),
                    url: url.to_string(),
                    trusted: false,
                });
        }
        self.save_cookbooks(&registry);
        Ok(())
    }
}
