// src/toolchain.rs

//! Toolchain Probe (C5): detects an installed instance of each required
//! tool, falling back through older versions when the preferred one is
//! absent, and re-pinning the index on fallback.

use crate::catalog::{Catalog, Tool};
use crate::error::{Error, Result};
use crate::index::VersionIndex;
use crate::resolver::PinnedRecipe;
use regex::Regex;
use std::collections::HashMap;
use std::process::Command;
use tracing::{info, warn};

/// The toolchain map consumed by recipes: tool name -> detected instance.
#[derive(Debug, Clone)]
pub struct ToolchainEntry {
    pub name: String,
    pub version: String,
    pub cookbook: String,
    pub command: String,
}

pub type Toolchain = HashMap<String, ToolchainEntry>;

/// PATH-based executable lookup plus an optional `<exe> <flag>` version
/// probe. Covers the common case (`make`, `clang`, `cmake`) without
/// requiring bespoke per-tool detector code.
pub fn detect(tool: &Tool) -> Option<String> {
    let path = which::which(&tool.detect.command).ok()?;

    let flag = tool.detect.version_flag.as_deref().unwrap_or("--version");
    let output = Command::new(&path).arg(flag).output().ok()?;

    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    let pattern = tool
        .detect
        .version_regex
        .as_deref()
        .unwrap_or(r"(\d+\.\d+(?:\.\d+)?)");
    let re = Regex::new(pattern).ok()?;
    let detected = re.captures(&text)?.get(1)?.as_str().to_string();

    if detected == tool.version.as_str() {
        Some(detected)
    } else {
        None
    }
}

/// Result of a full probe pass.
pub struct ProbeOutcome {
    pub toolchain: Toolchain,
}

/// Probe the union of `required_tools` across every recipe in the plan.
pub fn probe(plan: &[PinnedRecipe], catalog: &Catalog, index: &mut VersionIndex) -> Result<ProbeOutcome> {
    let mut preferred: HashMap<String, (String, String)> = HashMap::new();
    for recipe in plan {
        for t in &recipe.tools {
            preferred
                .entry(t.name.clone())
                .or_insert_with(|| (t.version.clone(), t.cookbook.clone()));
        }
    }

    let mut toolchain = Toolchain::new();
    let mut missing: Vec<(String, String)> = Vec::new();

    for (name, (preferred_version, preferred_cookbook)) in &preferred {
        let tool = catalog
            .tool(name, preferred_version, preferred_cookbook)
            .ok_or_else(|| Error::NotFound(format!("{preferred_cookbook}:{name}=={preferred_version}")))?;

        if let Some(detected) = detect(tool) {
            info!("detected {} {} via {}", name, detected, tool.detect.command);
            toolchain.insert(
                name.clone(),
                ToolchainEntry {
                    name: name.clone(),
                    version: detected,
                    cookbook: preferred_cookbook.clone(),
                    command: tool.detect.command.clone(),
                },
            );
            continue;
        }

        warn!("preferred {} {} not detected, trying older versions", name, preferred_version);

        let mut fallback = None;
        for version in index.remaining_tool_versions(name) {
            if let Some(by_cookbook) = catalog.tools_by_name.get(name).and_then(|m| m.get(&version)) {
                let mut candidates: Vec<&String> = by_cookbook.keys().collect();
                candidates.sort();
                for cookbook in candidates {
                    let candidate = &by_cookbook[cookbook];
                    if let Some(detected) = detect(candidate) {
                        fallback = Some((candidate.clone(), cookbook.clone(), detected));
                        break;
                    }
                }
            }
            if fallback.is_some() {
                break;
            }
        }

        match fallback {
            Some((tool, cookbook, detected)) => {
                if let Some(name_index) = index.tool_name_index_mut(name) {
                    name_index.select_exact(name, tool.version.as_str())?;
                }
                info!("falling back to {} {} ({})", name, detected, cookbook);
                toolchain.insert(
                    name.clone(),
                    ToolchainEntry {
                        name: name.clone(),
                        version: detected,
                        cookbook,
                        command: tool.detect.command.clone(),
                    },
                );
            }
            None => missing.push((name.clone(), preferred_version.clone())),
        }
    }

    if !missing.is_empty() {
        missing.sort();
        return Err(Error::MissingTool(missing));
    }

    Ok(ProbeOutcome { toolchain })
}
