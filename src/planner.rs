// src/planner.rs

//! Batch Planner (C4): partitions a resolved plan into layered batches such
//! that batch *k* depends only on batches `0..k`.

use crate::error::Error;
use crate::resolver::PinnedRecipe;
use std::collections::{HashMap, HashSet};

/// Repeatedly extracts the set of names with no remaining dependencies,
/// emitting it as the next batch. A non-empty remaining map with no ready
/// node signals a cycle that slipped past the resolver (§4.4, second line
/// of defense).
pub fn plan_batches(pinned: &[PinnedRecipe]) -> crate::error::Result<Vec<Vec<String>>> {
    let names: HashSet<String> = pinned.iter().map(|p| p.name.clone()).collect();

    let mut remaining: HashMap<String, HashSet<String>> = pinned
        .iter()
        .map(|p| {
            let deps = p
                .dependencies
                .iter()
                .filter(|d| names.contains(*d))
                .cloned()
                .collect();
            (p.name.clone(), deps)
        })
        .collect();

    let mut batches = Vec::new();

    while !remaining.is_empty() {
        let mut ready: Vec<String> = remaining
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(name, _)| name.clone())
            .collect();

        if ready.is_empty() {
            let mut chain: Vec<String> = remaining.keys().cloned().collect();
            chain.sort();
            return Err(Error::CircularDependency { chain });
        }

        ready.sort();

        for name in &ready {
            remaining.remove(name);
        }
        for deps in remaining.values_mut() {
            for name in &ready {
                deps.remove(name);
            }
        }

        batches.push(ready);
    }

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned(name: &str, deps: &[&str]) -> PinnedRecipe {
        PinnedRecipe {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            cookbook: "acme".to_string(),
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
            tools: vec![],
        }
    }

    #[test]
    fn linear_chain_yields_one_batch_per_level() {
        let plan = vec![pinned("openssl", &["zlib"]), pinned("zlib", &[])];
        let batches = plan_batches(&plan).unwrap();
        assert_eq!(batches, vec![vec!["zlib".to_string()], vec!["openssl".to_string()]]);
    }

    #[test]
    fn diamond_dependency_batches_correctly() {
        let plan = vec![
            pinned("app", &["liba", "libb"]),
            pinned("liba", &["shared"]),
            pinned("libb", &["shared"]),
            pinned("shared", &[]),
        ];
        let batches = plan_batches(&plan).unwrap();
        assert_eq!(batches[0], vec!["shared".to_string()]);
        assert_eq!(batches[1], vec!["liba".to_string(), "libb".to_string()]);
        assert_eq!(batches[2], vec!["app".to_string()]);
    }

    #[test]
    fn every_dependency_precedes_its_dependent_batch() {
        let plan = vec![
            pinned("app", &["liba", "libb"]),
            pinned("liba", &["shared"]),
            pinned("libb", &["shared"]),
            pinned("shared", &[]),
        ];
        let batches = plan_batches(&plan).unwrap();
        let batch_of = |name: &str| batches.iter().position(|b| b.contains(&name.to_string())).unwrap();
        assert!(batch_of("shared") < batch_of("liba"));
        assert!(batch_of("shared") < batch_of("libb"));
        assert!(batch_of("liba") < batch_of("app"));
        assert!(batch_of("libb") < batch_of("app"));
    }

    #[test]
    fn undetected_cycle_is_caught_as_second_line_of_defense() {
        let plan = vec![pinned("a", &["b"]), pinned("b", &["a"])];
        let result = plan_batches(&plan);
        assert!(matches!(result, Err(Error::CircularDependency { .. })));
    }

    #[test]
    fn independent_recipes_land_in_a_single_batch() {
        let plan = vec![pinned("a", &[]), pinned("b", &[]), pinned("c", &[])];
        let batches = plan_batches(&plan).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
    }
}
