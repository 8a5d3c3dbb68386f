// src/recipe/graph.rs

//! Recipe dependency graph for build ordering
//!
//! This module provides a directed graph for tracking dependencies between
//! recipes and determining the correct build order using topological sort.
//!
//! # Example
//!
//! ```
//! use sbuild::recipe::graph::RecipeGraph;
//!
//! let mut graph = RecipeGraph::new();
//!
//! graph.add_recipe("the_silver_searcher", &["zlib", "lzma", "pcre"]);
//! graph.add_recipe("zlib", &[] as &[&str]);
//! graph.add_recipe("lzma", &[] as &[&str]);
//! graph.add_recipe("pcre", &[] as &[&str]);
//!
//! let order = graph.topological_sort().unwrap();
//! assert_eq!(order.last().map(String::as_str), Some("the_silver_searcher"));
//! ```
//!
//! # Circular Dependencies
//!
//! A cycle makes the build order undefined. The sort does not try to break
//! it; every recipe it could not order is reported in the error.

use super::registry::Registry;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// A directed graph representing recipe dependencies
#[derive(Debug, Default, Clone)]
pub struct RecipeGraph {
    /// Key: recipe name, Value: set of recipes this recipe depends on
    edges: BTreeMap<String, BTreeSet<String>>,
    /// Key: recipe name, Value: set of recipes that depend on this recipe
    reverse_edges: BTreeMap<String, BTreeSet<String>>,
}

impl RecipeGraph {
    /// Create a new empty recipe graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of everything reachable from `roots`
    ///
    /// Every visited recipe gets a node, even leaves. Fails with
    /// `RecipeNotFound` if a root or any dependency is not registered.
    pub fn from_registry<S: AsRef<str>>(
        registry: &Registry,
        roots: &[S],
        platform: &str,
        arch: &str,
    ) -> Result<Self> {
        let mut graph = Self::new();
        let mut visited = HashSet::new();

        for root in roots {
            graph.visit(registry, root.as_ref(), platform, arch, &mut visited)?;
        }

        Ok(graph)
    }

    fn visit(
        &mut self,
        registry: &Registry,
        name: &str,
        platform: &str,
        arch: &str,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        if !visited.insert(name.to_string()) {
            return Ok(());
        }

        let deps = registry.lookup(name)?.dependencies(platform, arch);
        self.add_recipe(name, &deps);

        for dep in &deps {
            self.visit(registry, dep, platform, arch, visited)?;
        }

        Ok(())
    }

    /// Add a recipe with its dependencies
    ///
    /// If the recipe already exists, this merges the dependencies.
    pub fn add_recipe<S: AsRef<str>>(&mut self, name: &str, dependencies: &[S]) {
        self.edges.entry(name.to_string()).or_default();
        self.reverse_edges.entry(name.to_string()).or_default();

        for dep in dependencies {
            let dep = dep.as_ref();

            self.edges.entry(dep.to_string()).or_default();
            self.reverse_edges
                .entry(dep.to_string())
                .or_default()
                .insert(name.to_string());
            self.edges
                .entry(name.to_string())
                .or_default()
                .insert(dep.to_string());
        }
    }

    /// Get the number of recipes in the graph
    pub fn recipe_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if a recipe exists in the graph
    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// Get the direct dependencies of a recipe
    pub fn dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(name)
    }

    /// Get the recipes that directly depend on this recipe
    pub fn dependents(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.reverse_edges.get(name)
    }

    /// Perform topological sort using Kahn's algorithm
    ///
    /// Returns the recipes in build order (dependencies before dependents).
    /// Among recipes that are ready at the same time, names are taken in
    /// lexical order, so the result is deterministic.
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        let mut in_degrees: BTreeMap<&str, usize> = self
            .edges
            .iter()
            .map(|(name, deps)| (name.as_str(), deps.len()))
            .collect();

        let mut ready: BTreeSet<&str> = in_degrees
            .iter()
            .filter(|&(_, deg)| *deg == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut result = Vec::with_capacity(self.edges.len());

        while let Some(node) = ready.pop_first() {
            result.push(node.to_string());

            if let Some(dependents) = self.reverse_edges.get(node) {
                for dependent in dependents {
                    if let Some(deg) = in_degrees.get_mut(dependent.as_str()) {
                        *deg = deg.saturating_sub(1);
                        if *deg == 0 {
                            ready.insert(dependent.as_str());
                        }
                    }
                }
            }
        }

        if result.len() != self.edges.len() {
            let ordered: HashSet<&str> = result.iter().map(String::as_str).collect();
            let remaining: Vec<String> = self
                .edges
                .keys()
                .filter(|k| !ordered.contains(k.as_str()))
                .cloned()
                .collect();

            return Err(Error::DependencyCycle(remaining));
        }

        Ok(result)
    }
}

/// Resolve the build order for `roots` and everything they depend on
///
/// Every recipe appears exactly once, after all of its dependencies.
pub fn resolve_build_order<S: AsRef<str>>(
    registry: &Registry,
    roots: &[S],
    platform: &str,
    arch: &str,
) -> Result<Vec<String>> {
    let graph = RecipeGraph::from_registry(registry, roots, platform, arch)?;
    debug!("Dependency graph has {} recipe(s)", graph.recipe_count());
    graph.topological_sort()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{BuildContext, Recipe, RecipeInfo};
    use std::collections::HashMap;

    const NONE: &[&str] = &[];

    struct Node(&'static str, Vec<&'static str>);

    impl Recipe for Node {
        fn info(&self) -> RecipeInfo {
            RecipeInfo::new(self.0, "1.0")
        }

        fn dependencies(&self, _platform: &str, _arch: &str) -> Vec<String> {
            self.1.iter().map(|d| d.to_string()).collect()
        }

        fn build(&self, _ctx: &BuildContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    fn registry(nodes: &[(&'static str, &[&'static str])]) -> Registry {
        let mut registry = Registry::new();
        for &(name, deps) in nodes {
            registry.register(Node(name, deps.to_vec()));
        }
        registry
    }

    fn positions(order: &[String]) -> HashMap<&str, usize> {
        order
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = RecipeGraph::new();
        assert_eq!(graph.recipe_count(), 0);
        assert!(graph.topological_sort().unwrap().is_empty());
    }

    #[test]
    fn test_single_recipe() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe("hello", NONE);

        assert_eq!(graph.recipe_count(), 1);
        assert!(graph.contains("hello"));
        assert_eq!(graph.topological_sort().unwrap(), vec!["hello"]);
    }

    #[test]
    fn test_linear_dependencies() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe("c", &["b"]);
        graph.add_recipe("b", &["a"]);
        graph.add_recipe("a", NONE);

        assert_eq!(graph.topological_sort().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_diamond_dependencies() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe("d", &["b", "c"]);
        graph.add_recipe("b", &["a"]);
        graph.add_recipe("c", &["a"]);
        graph.add_recipe("a", NONE);

        let order = graph.topological_sort().unwrap();

        assert_eq!(order.len(), 4);
        assert_eq!(order.first(), Some(&"a".to_string()));
        assert_eq!(order.last(), Some(&"d".to_string()));
    }

    #[test]
    fn test_add_recipe_registers_leaf_nodes() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe("app", &["zlib"]);

        assert!(graph.contains("zlib"));
        assert!(graph.dependents("zlib").unwrap().contains("app"));
        assert!(graph.dependencies("zlib").unwrap().is_empty());
    }

    #[test]
    fn test_add_recipe_merges_deps() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe("foo", &["a", "b"]);
        graph.add_recipe("foo", &["c"]);

        let deps = graph.dependencies("foo").unwrap();
        assert_eq!(deps.len(), 3);
        assert!(deps.contains("c"));
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = RecipeGraph::new();
        graph.add_recipe("a", &["b"]);
        graph.add_recipe("b", &["c"]);
        graph.add_recipe("c", &["a"]);
        graph.add_recipe("leaf", NONE);

        match graph.topological_sort() {
            Err(Error::DependencyCycle(remaining)) => {
                assert_eq!(remaining, vec!["a", "b", "c"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_from_registry() {
        let registry = registry(&[
            ("the_silver_searcher", &["zlib", "lzma", "pcre"]),
            ("zlib", &[]),
            ("lzma", &[]),
            ("pcre", &[]),
            ("socat", &["openssl", "readline"]),
            ("openssl", &[]),
            ("readline", &["ncurses"]),
            ("ncurses", &[]),
            ("unrelated", &[]),
        ]);

        let order =
            resolve_build_order(&registry, &["the_silver_searcher", "socat"], "linux", "amd64")
                .unwrap();
        let pos = positions(&order);

        assert_eq!(order.len(), 8);
        assert!(!pos.contains_key("unrelated"));
        assert!(pos["zlib"] < pos["the_silver_searcher"]);
        assert!(pos["lzma"] < pos["the_silver_searcher"]);
        assert!(pos["pcre"] < pos["the_silver_searcher"]);
        assert!(pos["ncurses"] < pos["readline"]);
        assert!(pos["readline"] < pos["socat"]);
        assert!(pos["openssl"] < pos["socat"]);
    }

    #[test]
    fn test_shared_dependency_ordered_once() {
        let registry = registry(&[
            ("curl", &["openssl", "zlib"]),
            ("openssl", &["zlib"]),
            ("git", &["curl", "zlib"]),
            ("zlib", &[]),
        ]);

        let order = resolve_build_order(&registry, &["git", "curl", "zlib"], "linux", "amd64").unwrap();

        assert_eq!(order, vec!["zlib", "openssl", "curl", "git"]);
    }

    #[test]
    fn test_resolve_missing_dependency() {
        let registry = registry(&[("app", &["ghost"])]);

        assert!(matches!(
            resolve_build_order(&registry, &["app"], "linux", "amd64"),
            Err(Error::RecipeNotFound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_resolve_missing_root() {
        let registry = registry(&[("app", &[])]);

        assert!(matches!(
            resolve_build_order(&registry, &["nope"], "linux", "amd64"),
            Err(Error::RecipeNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_resolve_two_node_cycle() {
        let registry = registry(&[("a", &["b"]), ("b", &["a"])]);

        match resolve_build_order(&registry, &["a"], "linux", "amd64") {
            Err(Error::DependencyCycle(remaining)) => assert_eq!(remaining, vec!["a", "b"]),
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let registry = registry(&[
            ("app", &["c", "b", "a"]),
            ("a", &[]),
            ("b", &[]),
            ("c", &[]),
        ]);

        let first = resolve_build_order(&registry, &["app"], "linux", "amd64").unwrap();
        for _ in 0..5 {
            assert_eq!(
                resolve_build_order(&registry, &["app"], "linux", "amd64").unwrap(),
                first
            );
        }
        assert_eq!(first, vec!["a", "b", "c", "app"]);
    }
}
