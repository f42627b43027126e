// src/catalog/parser.rs

//! Parsing and validation of recipe/tool definition files.
//!
//! Definitions are static TOML documents, not executable modules: this
//! confines untrusted execution to the explicit build step (§4.6 of the
//! spec), which is gated by the trust check before any shell spawns.

use super::model::{AdditionalSource, BuildTarget, DetectSpec, Recipe, Tool};
use crate::error::{Error, Result};
use crate::version::Version;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PackageSection {
    name: String,
    version: String,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceSection {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    checksum: Option<String>,
    #[serde(default)]
    rename: Option<String>,
    #[serde(default)]
    additional: Vec<RawAdditionalSource>,
}

#[derive(Debug, Deserialize)]
struct RawAdditionalSource {
    url: String,
    #[serde(default)]
    checksum: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawBuildTarget {
    #[serde(default)]
    script: Vec<String>,
    #[serde(default)]
    install_paths: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RecipeFile {
    package: PackageSection,
    #[serde(default)]
    source: SourceSection,
    #[serde(default)]
    platform: Vec<String>,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    required_tools: Vec<String>,
    #[serde(default)]
    build: HashMap<String, RawBuildTarget>,
    #[serde(default)]
    is_collection: bool,
}

#[derive(Debug, Deserialize)]
struct DetectSection {
    command: String,
    #[serde(default)]
    version_flag: Option<String>,
    #[serde(default)]
    version_regex: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolFile {
    package: PackageSection,
    #[serde(default)]
    platform: Vec<String>,
    detect: DetectSection,
}

fn parse_error(path: &Path, reason: impl Into<String>) -> Error {
    Error::CatalogParseError {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Parse a recipe definition file's contents. `cookbook` is filled in by the
/// caller (the loader), since a bare file has no notion of which cookbook it
/// was read from.
pub fn parse_recipe(content: &str, path: &Path, cookbook: &str) -> Result<Recipe> {
    let raw: RecipeFile =
        toml::from_str(content).map_err(|e| parse_error(path, e.to_string()))?;

    let version = Version::parse(&raw.package.version)
        .map_err(|_| parse_error(path, format!("invalid version '{}'", raw.package.version)))?;

    let build = raw
        .build
        .into_iter()
        .map(|(target, raw_target)| {
            (
                target,
                BuildTarget {
                    script: raw_target.script,
                    install_paths: raw_target.install_paths,
                },
            )
        })
        .collect();

    let additional_sources = raw
        .source
        .additional
        .into_iter()
        .map(|a| AdditionalSource {
            url: a.url,
            checksum: a.checksum,
        })
        .collect();

    Ok(Recipe {
        name: raw.package.name,
        version,
        cookbook: cookbook.to_string(),
        summary: raw.package.summary,
        source_url: raw.source.url,
        checksum: raw.source.checksum,
        rename: raw.source.rename,
        additional_sources,
        platform: raw.platform,
        dependencies: raw.dependencies,
        required_tools: raw.required_tools,
        build,
        is_collection: raw.is_collection,
    })
}

/// Parse a tool definition file's contents.
pub fn parse_tool(content: &str, path: &Path, cookbook: &str) -> Result<Tool> {
    let raw: ToolFile = toml::from_str(content).map_err(|e| parse_error(path, e.to_string()))?;

    let version = Version::parse(&raw.package.version)
        .map_err(|_| parse_error(path, format!("invalid version '{}'", raw.package.version)))?;

    Ok(Tool {
        name: raw.package.name,
        version,
        cookbook: cookbook.to_string(),
        summary: raw.package.summary,
        platform: raw.platform,
        detect: DetectSpec {
            command: raw.detect.command,
            version_flag: raw.detect.version_flag,
            version_regex: raw.detect.version_regex,
        },
    })
}

/// Non-fatal authoring warnings; these never abort catalog construction.
pub fn validate_recipe(recipe: &Recipe) -> Vec<String> {
    let mut warnings = Vec::new();

    if recipe.name.is_empty() {
        warnings.push("recipe has an empty name".to_string());
    }
    if !recipe.is_collection && recipe.source_url.is_none() {
        warnings.push(format!(
            "recipe '{}' has no source URL and is not a collection",
            recipe.name
        ));
    }
    if !recipe.is_collection && recipe.build.is_empty() {
        warnings.push(format!(
            "recipe '{}' has no build targets defined",
            recipe.name
        ));
    }
    if recipe.summary.is_none() {
        warnings.push(format!("recipe '{}' has no summary", recipe.name));
    }

    warnings
}
