// src/catalog/mod.rs

//! Catalog Loader (C1): reads cookbook directories and the local overlay
//! into an in-memory catalog of recipes and tools.

mod model;
mod parser;

pub use model::{AdditionalSource, BuildTarget, Cookbook, DetectSpec, Recipe, Reference, Tool};

use crate::config::ConfigStore;
use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const LOCAL_COOKBOOK: &str = "local";

/// The in-memory catalog: per-cookbook contents plus name-indexed lookup
/// tables (`name -> version -> cookbook -> item`), matching §3's Version
/// Index precursor shape.
#[derive(Debug, Default)]
pub struct Catalog {
    pub cookbooks: HashMap<String, Cookbook>,
    pub recipes_by_name: HashMap<String, HashMap<String, HashMap<String, Recipe>>>,
    pub tools_by_name: HashMap<String, HashMap<String, HashMap<String, Tool>>>,
}

impl Catalog {
    fn index_recipe(&mut self, recipe: Recipe) {
        self.recipes_by_name
            .entry(recipe.name.clone())
            .or_default()
            .entry(recipe.version.as_str().to_string())
            .or_default()
            .insert(recipe.cookbook.clone(), recipe);
    }

    fn index_tool(&mut self, tool: Tool) {
        self.tools_by_name
            .entry(tool.name.clone())
            .or_default()
            .entry(tool.version.as_str().to_string())
            .or_default()
            .insert(tool.cookbook.clone(), tool);
    }

    pub fn recipe(&self, name: &str, version: &str, cookbook: &str) -> Option<&Recipe> {
        self.recipes_by_name
            .get(name)
            .and_then(|v| v.get(version))
            .and_then(|c| c.get(cookbook))
    }

    pub fn tool(&self, name: &str, version: &str, cookbook: &str) -> Option<&Tool> {
        self.tools_by_name
            .get(name)
            .and_then(|v| v.get(version))
            .and_then(|c| c.get(cookbook))
    }
}

fn read_definitions(dir: &Path) -> Vec<(PathBuf, String)> {
    let mut out = Vec::new();
    if !dir.is_dir() {
        return out;
    }
    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => out.push((path.to_path_buf(), content)),
            Err(e) => warn!("failed to read {}: {}", path.display(), e),
        }
    }
    out
}

/// Load one cookbook's `recipes/`, `collections/`, and `tools/` subtrees.
/// Malformed definitions are warned about and skipped; this function never
/// fails outright, matching C1's total-loader contract.
fn load_cookbook_tree(name: &str, root: &Path, catalog: &mut Catalog) -> (usize, usize) {
    let mut recipe_count = 0;
    let mut tool_count = 0;

    for sub in ["recipes", "collections"] {
        for (path, content) in read_definitions(&root.join(sub)) {
            match parser::parse_recipe(&content, &path, name) {
                Ok(mut recipe) => {
                    if sub == "collections" {
                        recipe.is_collection = true;
                    }
                    for w in parser::validate_recipe(&recipe) {
                        warn!("{}: {}", path.display(), w);
                    }
                    catalog.index_recipe(recipe);
                    recipe_count += 1;
                }
                Err(e) => warn!("skipping malformed recipe {}: {}", path.display(), e),
            }
        }
    }

    for (path, content) in read_definitions(&root.join("tools")) {
        match parser::parse_tool(&content, &path, name) {
            Ok(tool) => {
                catalog.index_tool(tool);
                tool_count += 1;
            }
            Err(e) => warn!("skipping malformed tool {}: {}", path.display(), e),
        }
    }

    (recipe_count, tool_count)
}

/// Load the full catalog: every cookbook known to the config store under
/// `data_dir/cookbooks/<name>/`, plus the always-trusted `local` overlay at
/// `cwd/mussels/`.
pub fn load(data_dir: &Path, cwd: &Path, config: &ConfigStore) -> Result<Catalog> {
    let mut catalog = Catalog::default();
    let registry = config.load_cookbooks()?;

    for entry in registry.cookbooks.values() {
        let root = data_dir.join("cookbooks").join(&entry.name);
        let mut cookbook = Cookbook {
            name: entry.name.clone(),
            url: entry.url.clone(),
            path: root.clone(),
            trusted: entry.trusted,
            recipes: Vec::new(),
            tools: Vec::new(),
        };
        let (n_recipes, n_tools) = load_cookbook_tree(&entry.name, &root, &mut catalog);
        if n_recipes == 0 && n_tools == 0 {
            warn!("cookbook '{}' is empty", entry.name);
        }
        // Populate per-cookbook sub-indices for display commands.
        for (_, versions) in catalog.recipes_by_name.iter() {
            for (_, by_cookbook) in versions.iter() {
                if let Some(r) = by_cookbook.get(&entry.name) {
                    if r.cookbook == entry.name && !cookbook.recipes.iter().any(|x| x.name == r.name && x.version == r.version) {
                        cookbook.recipes.push(r.clone());
                    }
                }
            }
        }
        for (_, versions) in catalog.tools_by_name.iter() {
            for (_, by_cookbook) in versions.iter() {
                if let Some(t) = by_cookbook.get(&entry.name) {
                    if t.cookbook == entry.name && !cookbook.tools.iter().any(|x| x.name == t.name && x.version == t.version) {
                        cookbook.tools.push(t.clone());
                    }
                }
            }
        }
        catalog.cookbooks.insert(entry.name.clone(), cookbook);
    }

    // Local overlay: always trusted, always named `local`, empty URL.
    let local_root = cwd.join("mussels");
    let mut local = Cookbook {
        name: LOCAL_COOKBOOK.to_string(),
        url: String::new(),
        path: local_root.clone(),
        trusted: true,
        recipes: Vec::new(),
        tools: Vec::new(),
    };
    load_cookbook_tree(LOCAL_COOKBOOK, &local_root, &mut catalog);
    local.recipes = catalog
        .recipes_by_name
        .values()
        .filter_map(|v| v.values().find_map(|c| c.get(LOCAL_COOKBOOK)))
        .cloned()
        .collect();
    local.tools = catalog
        .tools_by_name
        .values()
        .filter_map(|v| v.values().find_map(|c| c.get(LOCAL_COOKBOOK)))
        .cloned()
        .collect();
    catalog.cookbooks.insert(LOCAL_COOKBOOK.to_string(), local);

    config.persist_cookbooks(&catalog.cookbooks)?;

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use tempfile::TempDir;

    fn write_recipe(dir: &Path, name: &str, body: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(format!("{name}.toml")), body).unwrap();
    }

    #[test]
    fn loads_local_overlay_as_trusted() {
        let data_dir = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        write_recipe(
            &cwd.path().join("mussels/recipes"),
            "zlib",
            r#"
                [package]
                name = "zlib"
                version = "1.2.11"
                [source]
                url = "https://example.com/zlib.tar.gz"
                [build.host]
                script = ["make"]
            "#,
        );

        let config = ConfigStore::new(data_dir.path().to_path_buf());
        let catalog = load(data_dir.path(), cwd.path(), &config).unwrap();

        let local = catalog.cookbooks.get(LOCAL_COOKBOOK).unwrap();
        assert!(local.trusted);
        assert_eq!(local.url, "");
        assert_eq!(local.recipes.len(), 1);
    }

    #[test]
    fn empty_cookbook_yields_no_error() {
        let data_dir = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let config = ConfigStore::new(data_dir.path().to_path_buf());
        let catalog = load(data_dir.path(), cwd.path(), &config).unwrap();
        assert!(catalog.cookbooks.contains_key(LOCAL_COOKBOOK));
    }

    #[test]
    fn malformed_definition_is_skipped_not_fatal() {
        let data_dir = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        write_recipe(&cwd.path().join("mussels/recipes"), "broken", "not valid toml [[[");
        write_recipe(
            &cwd.path().join("mussels/recipes"),
            "zlib",
            r#"
                [package]
                name = "zlib"
                version = "1.2.11"
                [source]
                url = "https://example.com/zlib.tar.gz"
                [build.host]
                script = ["make"]
            "#,
        );
        let config = ConfigStore::new(data_dir.path().to_path_buf());
        let catalog = load(data_dir.path(), cwd.path(), &config).unwrap();
        let local = catalog.cookbooks.get(LOCAL_COOKBOOK).unwrap();
        assert_eq!(local.recipes.len(), 1);
    }
}
