// src/index.rs

//! Version Index (C2): per-name descending version lists across all
//! cookbooks, with the "stickiness" selection semantics of §4.2.

use crate::catalog::{Catalog, Reference};
use crate::error::{Error, Result};
use crate::version::Version;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub version: Version,
    pub cookbooks: Vec<String>,
}

/// The descending version list for a single item name.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub version: String,
    pub cookbook: String,
}

impl NameIndex {
    fn from_versions(versions: impl Iterator<Item = (Version, Vec<String>)>) -> Self {
        let mut entries: Vec<IndexEntry> = versions
            .map(|(version, mut cookbooks)| {
                cookbooks.sort();
                IndexEntry { version, cookbooks }
            })
            .collect();
        entries.sort_by(|a, b| b.version.cmp(&a.version));
        NameIndex { entries }
    }

    pub fn head(&self) -> Option<&IndexEntry> {
        self.entries.first()
    }

    /// §4.2 `select`: filter by constraint, return the highest survivor, then
    /// mutate the index so it becomes sticky for subsequent lookups.
    fn select(&mut self, name: &str, version: Option<&str>, cookbook: Option<&str>) -> Result<Selection> {
        let position = self.entries.iter().position(|e| {
            let version_ok = version.map(|v| e.version.as_str() == v).unwrap_or(true);
            let cookbook_ok = cookbook
                .map(|c| e.cookbooks.iter().any(|x| x == c))
                .unwrap_or(true);
            version_ok && cookbook_ok
        });

        let index = position.ok_or_else(|| Error::UnsatisfiableReference {
            reference: format!(
                "{}{}{}",
                name,
                version.map(|v| format!("=={v}")).unwrap_or_default(),
                cookbook.map(|c| format!(" in {c}")).unwrap_or_default()
            ),
        })?;

        let chosen_cookbook = match cookbook {
            Some(c) => c.to_string(),
            None => self.entries[index].cookbooks[0].clone(),
        };

        let selected_version = self.entries[index].version.as_str().to_string();

        // Stickiness: selected entry becomes the head, and the chosen
        // cookbook becomes first within that entry's cookbook list.
        let mut entry = self.entries.remove(index);
        if let Some(pos) = entry.cookbooks.iter().position(|c| c == &chosen_cookbook) {
            entry.cookbooks.swap(0, pos);
        }
        self.entries.insert(0, entry);

        Ok(Selection {
            name: name.to_string(),
            version: selected_version,
            cookbook: chosen_cookbook,
        })
    }

    /// Re-pin to a specific version without going through full reference
    /// parsing; used by the Toolchain Probe's fallback path (§4.5 step 2).
    pub fn select_exact(&mut self, name: &str, version: &str) -> Result<Selection> {
        self.select(name, Some(version), None)
    }
}

/// Holds both the recipe and tool name indices built from a loaded catalog.
pub struct VersionIndex {
    recipes: HashMap<String, NameIndex>,
    tools: HashMap<String, NameIndex>,
}

impl VersionIndex {
    pub fn build(catalog: &Catalog) -> Result<Self> {
        let mut recipes = HashMap::new();
        for (name, versions) in &catalog.recipes_by_name {
            let parsed: Result<Vec<(Version, Vec<String>)>> = versions
                .iter()
                .map(|(v, by_cookbook)| {
                    Ok((Version::parse(v)?, by_cookbook.keys().cloned().collect()))
                })
                .collect();
            recipes.insert(name.clone(), NameIndex::from_versions(parsed?.into_iter()));
        }

        let mut tools = HashMap::new();
        for (name, versions) in &catalog.tools_by_name {
            let parsed: Result<Vec<(Version, Vec<String>)>> = versions
                .iter()
                .map(|(v, by_cookbook)| {
                    Ok((Version::parse(v)?, by_cookbook.keys().cloned().collect()))
                })
                .collect();
            tools.insert(name.clone(), NameIndex::from_versions(parsed?.into_iter()));
        }

        Ok(VersionIndex { recipes, tools })
    }

    pub fn select_recipe(&mut self, reference: &Reference) -> Result<Selection> {
        let index = self.recipes.get_mut(&reference.name).ok_or_else(|| {
            Error::UnsatisfiableReference {
                reference: reference.to_string(),
            }
        })?;
        index.select(&reference.name, reference.version.as_deref(), reference.cookbook.as_deref())
    }

    pub fn select_tool(&mut self, reference: &Reference) -> Result<Selection> {
        let index = self.tools.get_mut(&reference.name).ok_or_else(|| {
            Error::UnsatisfiableReference {
                reference: reference.to_string(),
            }
        })?;
        index.select(&reference.name, reference.version.as_deref(), reference.cookbook.as_deref())
    }

    /// Versions of a tool older than the currently-pinned one, descending,
    /// for the Toolchain Probe's fallback iteration (§4.5 step 2).
    pub fn remaining_tool_versions(&self, name: &str) -> Vec<String> {
        self.tools
            .get(name)
            .map(|idx| idx.entries.iter().skip(1).map(|e| e.version.as_str().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn tool_name_index_mut(&mut self, name: &str) -> Option<&mut NameIndex> {
        self.tools.get_mut(name)
    }
}
