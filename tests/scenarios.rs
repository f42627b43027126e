// tests/scenarios.rs

//! Black-box scenario tests against the public catalog/resolver/planner/
//! driver API, matching §8's S1-S6 of the distilled spec. Toolchain
//! detection uses `true`, present on any GNU userland, with a detector
//! contract that only looks for the literal word "coreutils" in its
//! version banner, so these tests don't depend on a pinned tool version
//! matching the host's actual coreutils release.

use mussels::catalog::{BuildTarget, Cookbook, DetectSpec, Recipe, Reference, Tool};
use mussels::driver::{BuildDriver, DriverConfig};
use mussels::error::Error;
use mussels::version::Version;
use mussels::{planner, resolver, toolchain, Catalog, VersionIndex};
use std::collections::HashMap as Map;
use std::path::PathBuf;
use tempfile::TempDir;

fn recipe(name: &str, version: &str, cookbook: &str, deps: &[&str], tools: &[&str]) -> Recipe {
    Recipe {
        name: name.to_string(),
        version: Version::parse(version).unwrap(),
        cookbook: cookbook.to_string(),
        summary: Some(format!("{name} library")),
        source_url: None,
        checksum: None,
        rename: None,
        additional_sources: vec![],
        platform: vec![],
        dependencies: deps.iter().map(|s| s.to_string()).collect(),
        required_tools: tools.iter().map(|s| s.to_string()).collect(),
        build: Map::from([(
            "host".to_string(),
            BuildTarget {
                script: vec!["true".to_string()],
                install_paths: Map::new(),
            },
        )]),
        is_collection: false,
    }
}

/// A tool detectable via `true --version`, whose banner on any GNU
/// userland contains the literal word "coreutils".
fn detectable_tool(name: &str, cookbook: &str) -> Tool {
    Tool {
        name: name.to_string(),
        version: Version::parse("coreutils").unwrap(),
        cookbook: cookbook.to_string(),
        summary: None,
        platform: vec![],
        detect: DetectSpec {
            command: "true".to_string(),
            version_flag: Some("--version".to_string()),
            version_regex: Some(r"(coreutils)".to_string()),
        },
    }
}

fn undetectable_tool(name: &str, version: &str, cookbook: &str) -> Tool {
    Tool {
        name: name.to_string(),
        version: Version::parse(version).unwrap(),
        cookbook: cookbook.to_string(),
        summary: None,
        platform: vec![],
        detect: DetectSpec {
            command: "definitely-not-a-real-binary-xyz".to_string(),
            version_flag: None,
            version_regex: None,
        },
    }
}

fn cookbook(name: &str, trusted: bool) -> Cookbook {
    Cookbook {
        name: name.to_string(),
        url: String::new(),
        path: PathBuf::new(),
        trusted,
        recipes: vec![],
        tools: vec![],
    }
}

fn index_recipe(catalog: &mut Catalog, r: Recipe) {
    catalog
        .recipes_by_name
        .entry(r.name.clone())
        .or_default()
        .entry(r.version.as_str().to_string())
        .or_default()
        .insert(r.cookbook.clone(), r);
}

fn index_tool(catalog: &mut Catalog, t: Tool) {
    catalog
        .tools_by_name
        .entry(t.name.clone())
        .or_default()
        .entry(t.version.as_str().to_string())
        .or_default()
        .insert(t.cookbook.clone(), t);
}

/// S1 - happy path: zlib -> openssl, both trusted, both build.
#[test]
fn s1_happy_path_succeeds_end_to_end() {
    let mut catalog = Catalog::default();
    catalog.cookbooks.insert("acme".to_string(), cookbook("acme", true));
    index_recipe(&mut catalog, recipe("zlib", "1.2.11", "acme", &[], &["make"]));
    index_recipe(&mut catalog, recipe("openssl", "1.1.1b", "acme", &["zlib"], &["clang"]));
    index_tool(&mut catalog, detectable_tool("make", "acme"));
    index_tool(&mut catalog, detectable_tool("clang", "acme"));

    let mut index = VersionIndex::build(&catalog).unwrap();
    let root = Reference::parse("acme:openssl").unwrap();
    let plan = resolver::resolve(&root, &catalog, &mut index, "Darwin").unwrap();
    let batches = planner::plan_batches(&plan).unwrap();
    assert_eq!(batches, vec![vec!["zlib".to_string()], vec!["openssl".to_string()]]);

    let probe = toolchain::probe(&plan, &catalog, &mut index).unwrap();
    let data_dir = TempDir::new().unwrap();
    let driver = BuildDriver::new(data_dir.path().to_path_buf(), DriverConfig::default());
    let report = driver.run(&batches, &plan, &catalog, &probe.toolchain).unwrap();

    assert!(report.success);
    assert!(report.outcomes.iter().all(|o| o.success && !o.skipped));
}

/// S2 - untrusted block: recipe never executes, exit is a failure.
#[test]
fn s2_untrusted_cookbook_blocks_without_executing() {
    let mut catalog = Catalog::default();
    catalog.cookbooks.insert("acme".to_string(), cookbook("acme", false));
    index_recipe(&mut catalog, recipe("zlib", "1.2.11", "acme", &[], &[]));
    index_recipe(&mut catalog, recipe("openssl", "1.1.1b", "acme", &["zlib"], &[]));

    let mut index = VersionIndex::build(&catalog).unwrap();
    let root = Reference::parse("acme:openssl").unwrap();
    let plan = resolver::resolve(&root, &catalog, &mut index, "Darwin").unwrap();
    let batches = planner::plan_batches(&plan).unwrap();

    let data_dir = TempDir::new().unwrap();
    let driver = BuildDriver::new(data_dir.path().to_path_buf(), DriverConfig::default());
    let report = driver.run(&batches, &plan, &catalog, &Map::new()).unwrap();

    assert!(!report.success);
    assert!(report.outcomes.iter().all(|o| !o.success));
    assert!(!data_dir.path().join("install").exists());
}

/// S3 - dry run: no writes under install/ or cache/.
#[test]
fn s3_dry_run_writes_nothing() {
    let mut catalog = Catalog::default();
    catalog.cookbooks.insert("acme".to_string(), cookbook("acme", true));
    index_recipe(&mut catalog, recipe("zlib", "1.2.11", "acme", &[], &[]));
    index_recipe(&mut catalog, recipe("openssl", "1.1.1b", "acme", &["zlib"], &[]));

    let mut index = VersionIndex::build(&catalog).unwrap();
    let root = Reference::parse("acme:openssl").unwrap();
    let plan = resolver::resolve(&root, &catalog, &mut index, "Darwin").unwrap();
    let batches = planner::plan_batches(&plan).unwrap();

    let data_dir = TempDir::new().unwrap();
    let mut config = DriverConfig::default();
    config.dry_run = true;
    let driver = BuildDriver::new(data_dir.path().to_path_buf(), config);
    let report = driver.run(&batches, &plan, &catalog, &Map::new()).unwrap();

    assert!(report.success);
    assert!(!data_dir.path().join("install").exists());
    assert!(!data_dir.path().join("cache").exists());
}

/// S4 - cycle: resolver reports the exact chain before any planning.
#[test]
fn s4_cycle_is_reported_with_exact_chain() {
    let mut catalog = Catalog::default();
    catalog.cookbooks.insert("acme".to_string(), cookbook("acme", true));
    index_recipe(&mut catalog, recipe("a", "1.0.0", "acme", &["b"], &[]));
    index_recipe(&mut catalog, recipe("b", "1.0.0", "acme", &["a"], &[]));

    let mut index = VersionIndex::build(&catalog).unwrap();
    let root = Reference::parse("acme:a").unwrap();
    let result = resolver::resolve(&root, &catalog, &mut index, "Darwin");

    match result {
        Err(Error::CircularDependency { chain }) => {
            assert_eq!(chain, vec!["a".to_string(), "b".to_string(), "a".to_string()]);
        }
        other => panic!("expected CircularDependency, got {other:?}"),
    }
}

/// S5 - tool fallback: preferred version undetectable, older version detects and is re-pinned.
#[test]
fn s5_tool_fallback_detects_older_version() {
    let mut catalog = Catalog::default();
    catalog.cookbooks.insert("acme".to_string(), cookbook("acme", true));
    index_recipe(&mut catalog, recipe("openssl", "1.1.1b", "acme", &[], &["cmake==bogus-preferred"]));
    index_tool(&mut catalog, undetectable_tool("cmake", "bogus-preferred", "acme"));
    index_tool(&mut catalog, detectable_tool("cmake", "acme"));

    let mut index = VersionIndex::build(&catalog).unwrap();
    let root = Reference::parse("acme:openssl").unwrap();
    let plan = resolver::resolve(&root, &catalog, &mut index, "Darwin").unwrap();
    let probe = toolchain::probe(&plan, &catalog, &mut index).unwrap();

    let pinned = probe.toolchain.get("cmake").unwrap();
    assert_eq!(pinned.version, "coreutils");
}

/// S6 - partial failure: a broken build step causes the remaining batch to
/// be recorded as skipped, not attempted.
#[test]
fn s6_partial_failure_skips_downstream_batch() {
    let mut catalog = Catalog::default();
    catalog.cookbooks.insert("acme".to_string(), cookbook("acme", true));

    let mut broken_openssl = recipe("openssl", "1.1.1b", "acme", &["zlib"], &[]);
    broken_openssl.build.get_mut("host").unwrap().script = vec!["false".to_string()];
    index_recipe(&mut catalog, recipe("zlib", "1.2.11", "acme", &[], &[]));
    index_recipe(&mut catalog, broken_openssl);
    index_recipe(&mut catalog, recipe("curl", "7.81.0", "acme", &["openssl"], &[]));

    let mut index = VersionIndex::build(&catalog).unwrap();
    let root = Reference::parse("acme:curl").unwrap();
    let plan = resolver::resolve(&root, &catalog, &mut index, "Darwin").unwrap();
    let batches = planner::plan_batches(&plan).unwrap();
    assert_eq!(
        batches,
        vec![vec!["zlib".to_string()], vec!["openssl".to_string()], vec!["curl".to_string()]]
    );

    let data_dir = TempDir::new().unwrap();
    let driver = BuildDriver::new(data_dir.path().to_path_buf(), DriverConfig::default());
    let report = driver.run(&batches, &plan, &catalog, &Map::new()).unwrap();

    assert!(!report.success);
    let by_name: Map<&str, _> = report.outcomes.iter().map(|o| (o.name.as_str(), o)).collect();
    assert!(by_name["zlib"].success);
    assert!(!by_name["openssl"].success && !by_name["openssl"].skipped);
    assert!(by_name["curl"].skipped);
}
