// src/recipe/registry.rs

//! Recipe registry
//!
//! The registry is populated once at startup and only read afterwards. Tests
//! build their own isolated registries.

use super::{Recipe, RecipeInfo};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Table of recipes keyed by name
#[derive(Default)]
pub struct Registry {
    recipes: BTreeMap<String, Box<dyn Recipe>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe
    ///
    /// # Panics
    ///
    /// Panics if a recipe with the same name is already registered. Duplicate
    /// names are a programming error in the recipe catalog.
    pub fn register<R: Recipe + 'static>(&mut self, recipe: R) {
        self.register_boxed(Box::new(recipe));
    }

    /// Register an already boxed recipe
    ///
    /// # Panics
    ///
    /// Panics on a duplicate name, like [`Registry::register`].
    pub fn register_boxed(&mut self, recipe: Box<dyn Recipe>) {
        let name = recipe.info().name;
        if self.recipes.contains_key(&name) {
            panic!("recipe with name '{name}' already exists");
        }
        self.recipes.insert(name, recipe);
    }

    /// Number of registered recipes
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Check if a recipe is registered
    pub fn contains(&self, name: &str) -> bool {
        self.recipes.contains_key(name)
    }

    /// Get a recipe by name
    pub fn get(&self, name: &str) -> Option<&dyn Recipe> {
        self.recipes.get(name).map(|r| &**r)
    }

    /// Get a recipe by name, failing with `RecipeNotFound`
    pub fn lookup(&self, name: &str) -> Result<&dyn Recipe> {
        self.get(name)
            .ok_or_else(|| Error::RecipeNotFound(name.to_string()))
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.recipes.keys().map(String::as_str).collect()
    }

    /// Names of all recipes whose info matches `predicate`, sorted
    pub fn all_with<F>(&self, predicate: F) -> Vec<String>
    where
        F: Fn(&RecipeInfo) -> bool,
    {
        self.recipes
            .iter()
            .filter(|(_, recipe)| predicate(&recipe.info()))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Names of all recipes flagged as binaries
    pub fn all_binaries(&self) -> Vec<String> {
        self.all_with(|info| info.binary)
    }

    /// Names of all recipes flagged as libraries
    pub fn all_libraries(&self) -> Vec<String> {
        self.all_with(|info| info.library)
    }

    /// Every recipe `name` transitively depends on, depth-first
    ///
    /// A dependency reachable along several paths appears once per path;
    /// callers use the list for lookups only. Fails if `name` or any
    /// dependency is missing, or if the dependencies loop back on themselves.
    pub fn dependency_names(&self, name: &str, platform: &str, arch: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut stack = Vec::new();
        self.collect_dependency_names(name, platform, arch, &mut names, &mut stack)?;
        Ok(names)
    }

    fn collect_dependency_names(
        &self,
        name: &str,
        platform: &str,
        arch: &str,
        names: &mut Vec<String>,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        let recipe = self.lookup(name)?;

        if let Some(pos) = stack.iter().position(|n| n == name) {
            return Err(Error::DependencyCycle(stack[pos..].to_vec()));
        }
        stack.push(name.to_string());

        for dep in recipe.dependencies(platform, arch) {
            names.push(dep.clone());
            self.collect_dependency_names(&dep, platform, arch, names, stack)?;
        }

        stack.pop();
        Ok(())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("recipes", &self.names())
            .finish()
    }
}
