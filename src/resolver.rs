// src/resolver.rs

//! Resolver (C3): walks a root recipe's dependencies and required tools,
//! pinning a single `(name, version, cookbook)` triple per name with
//! global-sticky semantics (no backtracking).

use crate::catalog::{Catalog, Reference, LOCAL_COOKBOOK};
use crate::error::{Error, Result};
use crate::index::{Selection, VersionIndex};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PinnedRecipe {
    pub name: String,
    pub version: String,
    pub cookbook: String,
    /// Direct dependency names (tools excluded), consumed by the Batch Planner.
    pub dependencies: Vec<String>,
    pub tools: Vec<Selection>,
}

struct Walker<'a> {
    catalog: &'a Catalog,
    index: &'a mut VersionIndex,
    host: &'a str,
    visited: HashMap<String, PinnedRecipe>,
    order: Vec<String>,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, reference: &Reference, chain: &mut Vec<String>) -> Result<()> {
        let selection = self.index.select_recipe(reference)?;
        let name = selection.name.clone();

        if !chain.is_empty() && name == chain[0] {
            let mut full_chain = chain.clone();
            full_chain.push(name);
            return Err(Error::CircularDependency { chain: full_chain });
        }

        if self.visited.contains_key(&name) {
            // Global-sticky: already pinned earlier in this resolution.
            return Ok(());
        }

        let recipe = self
            .catalog
            .recipe(&name, &selection.version, &selection.cookbook)
            .ok_or_else(|| Error::NotFound(format!("{}:{}=={}", selection.cookbook, name, selection.version)))?
            .clone();

        if !recipe.supports_platform(self.host) {
            return Err(Error::MissingPlatformVariant {
                name: name.clone(),
                platform: self.host.to_string(),
            });
        }

        chain.push(name.clone());

        let mut dependency_names = Vec::new();
        for dep_str in &recipe.dependencies {
            let dep_ref = Reference::parse(dep_str)?.qualify(&recipe.cookbook);
            dependency_names.push(dep_ref.name.clone());
            self.walk(&dep_ref, chain)?;
        }

        let mut tools = Vec::new();
        for tool_str in &recipe.required_tools {
            let tool_ref = Reference::parse(tool_str)?.qualify(&recipe.cookbook);
            tools.push(self.index.select_tool(&tool_ref)?);
        }

        chain.pop();

        self.visited.insert(
            name.clone(),
            PinnedRecipe {
                name: name.clone(),
                version: selection.version,
                cookbook: selection.cookbook,
                dependencies: dependency_names,
                tools,
            },
        );
        self.order.push(name);

        Ok(())
    }
}

/// Entry point: `resolve(root_reference) -> ordered list of triples`.
/// An unqualified root reference defaults to the local overlay.
pub fn resolve(
    root_reference: &Reference,
    catalog: &Catalog,
    index: &mut VersionIndex,
    host_platform: &str,
) -> Result<Vec<PinnedRecipe>> {
    let root = root_reference.qualify(LOCAL_COOKBOOK);

    let mut walker = Walker {
        catalog,
        index,
        host: host_platform,
        visited: HashMap::new(),
        order: Vec::new(),
    };

    let mut chain = Vec::new();
    walker.walk(&root, &mut chain)?;

    Ok(walker
        .order
        .into_iter()
        .map(|name| walker.visited.remove(&name).unwrap())
        .collect())
}
