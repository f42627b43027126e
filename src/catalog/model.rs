// src/catalog/model.rs

//! In-memory shapes for cookbooks, recipes, tools, and references.

use crate::error::{Error, Result};
use crate::version::Version;
use std::collections::HashMap;
use std::path::PathBuf;

/// A named collection of recipes and tools sharing an origin and trust decision.
#[derive(Debug, Clone)]
pub struct Cookbook {
    pub name: String,
    pub url: String,
    pub path: PathBuf,
    pub trusted: bool,
    pub recipes: Vec<Recipe>,
    pub tools: Vec<Tool>,
}

impl Cookbook {
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty() && self.tools.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AdditionalSource {
    pub url: String,
    pub checksum: Option<String>,
}

/// Per-target shell fragment plus where its artifacts land in the install tree.
#[derive(Debug, Clone, Default)]
pub struct BuildTarget {
    pub script: Vec<String>,
    pub install_paths: HashMap<String, String>,
}

/// A declarative build unit: download, build, install one library or executable.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub name: String,
    pub version: Version,
    pub cookbook: String,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    pub checksum: Option<String>,
    pub rename: Option<String>,
    pub additional_sources: Vec<AdditionalSource>,
    pub platform: Vec<String>,
    pub dependencies: Vec<String>,
    pub required_tools: Vec<String>,
    pub build: HashMap<String, BuildTarget>,
    pub is_collection: bool,
}

impl Recipe {
    pub fn supports_platform(&self, host: &str) -> bool {
        self.platform.is_empty() || self.platform.iter().any(|p| p == host)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.cookbook, self.name)
    }
}

/// A host prerequisite contract: detect but do not build.
#[derive(Debug, Clone)]
pub struct DetectSpec {
    pub command: String,
    pub version_flag: Option<String>,
    pub version_regex: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub version: Version,
    pub cookbook: String,
    pub summary: Option<String>,
    pub platform: Vec<String>,
    pub detect: DetectSpec,
}

impl Tool {
    pub fn supports_platform(&self, host: &str) -> bool {
        self.platform.is_empty() || self.platform.iter().any(|p| p == host)
    }
}

/// A parsed `name`, `name==version`, `cookbook:name`, or `cookbook:name==version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub cookbook: Option<String>,
    pub name: String,
    pub version: Option<String>,
}

impl Reference {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::CatalogParseError {
                path: "<reference>".into(),
                reason: "empty reference".to_string(),
            });
        }

        let (cookbook, rest) = match s.split_once(':') {
            Some((book, rest)) => (Some(book.to_string()), rest),
            None => (None, s),
        };

        let (name, version) = match rest.split_once("==") {
            Some((n, v)) => (n.to_string(), Some(v.to_string())),
            None => (rest.to_string(), None),
        };

        if name.is_empty() {
            return Err(Error::CatalogParseError {
                path: "<reference>".into(),
                reason: format!("reference '{s}' has no item name"),
            });
        }

        Ok(Reference {
            cookbook,
            name,
            version,
        })
    }

    /// Qualify an unqualified reference with a default cookbook (the
    /// referring recipe's cookbook, or `local` for a bare user argument).
    pub fn qualify(&self, default_cookbook: &str) -> Reference {
        Reference {
            cookbook: Some(
                self.cookbook
                    .clone()
                    .unwrap_or_else(|| default_cookbook.to_string()),
            ),
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(book) = &self.cookbook {
            write!(f, "{book}:")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(v) = &self.version {
            write!(f, "=={v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name() {
        let r = Reference::parse("zlib").unwrap();
        assert_eq!(r.cookbook, None);
        assert_eq!(r.name, "zlib");
        assert_eq!(r.version, None);
    }

    #[test]
    fn parses_name_with_version() {
        let r = Reference::parse("zlib==1.2.11").unwrap();
        assert_eq!(r.name, "zlib");
        assert_eq!(r.version, Some("1.2.11".to_string()));
    }

    #[test]
    fn parses_cookbook_qualified() {
        let r = Reference::parse("acme:openssl").unwrap();
        assert_eq!(r.cookbook, Some("acme".to_string()));
        assert_eq!(r.name, "openssl");
    }

    #[test]
    fn parses_fully_qualified() {
        let r = Reference::parse("acme:openssl==1.1.1b").unwrap();
        assert_eq!(r.cookbook, Some("acme".to_string()));
        assert_eq!(r.name, "openssl");
        assert_eq!(r.version, Some("1.1.1b".to_string()));
    }

    #[test]
    fn qualify_fills_in_default_cookbook() {
        let r = Reference::parse("zlib").unwrap().qualify("acme");
        assert_eq!(r.cookbook, Some("acme".to_string()));
    }

    #[test]
    fn qualify_preserves_explicit_cookbook() {
        let r = Reference::parse("other:zlib").unwrap().qualify("acme");
        assert_eq!(r.cookbook, Some("other".to_string()));
    }

    #[test]
    fn rejects_empty_reference() {
        assert!(Reference::parse("").is_err());
        assert!(Reference::parse("acme:").is_err());
    }
}
