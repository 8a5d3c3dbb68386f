// src/recipe/mod.rs

//! Recipes: statically registered package build definitions
//!
//! A recipe describes one package: its pinned sources, the other recipes it
//! needs, and three lifecycle hooks the orchestrator calls in order:
//!
//! - **prepare**: patch or pre-process the extracted sources
//! - **build**: run configure/make or whatever compiles the package
//! - **finalize**: copy artifacts into the output directory and publish
//!   variables (e.g. `LDFLAGS`) for recipes that depend on this one
//!
//! # Example Recipe
//!
//! ```
//! use sbuild::recipe::{BuildContext, Recipe, RecipeInfo};
//! use std::path::Path;
//!
//! struct Hello;
//!
//! impl Recipe for Hello {
//!     fn info(&self) -> RecipeInfo {
//!         RecipeInfo::new("hello", "2.12")
//!             .with_source(
//!                 "https://ftp.gnu.org/gnu/hello/${name}-${version}.tar.gz",
//!                 "cf04af86dc085268c5f4470fbae49b18afbc221b78096aab842d934a76bad0ab",
//!             )
//!             .binary()
//!     }
//!
//!     fn build(&self, _ctx: &BuildContext<'_>) -> sbuild::Result<()> {
//!         Ok(())
//!     }
//!
//!     fn finalize(&self, ctx: &mut BuildContext<'_>, _out_dir: &Path) -> sbuild::Result<()> {
//!         ctx.publish("LDFLAGS", "-lhello")
//!     }
//! }
//! ```

pub mod graph;
pub mod registry;
pub mod source;
pub mod toolchain;

pub use graph::{RecipeGraph, resolve_build_order};
pub use registry::Registry;
pub use source::{SourceSpec, expand_placeholders};
pub use toolchain::{Toolchain, cross_prefix, static_flags};

use crate::env::Env;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Variables one recipe publishes for its dependents
pub type VarMap = BTreeMap<String, String>;

/// Recipe name → variables that recipe published during finalize
pub type PackageEnvTable = BTreeMap<String, VarMap>;

/// Static information about a recipe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeInfo {
    /// Unique recipe name
    pub name: String,
    /// Package version
    pub version: String,
    /// Source specifiers: a URL, or `filename::URL`
    ///
    /// `${name}` and `${version}` are expanded against this info.
    pub sources: Vec<String>,
    /// SHA-256 hex digest for each entry in `sources`
    pub sums: Vec<String>,
    /// Whether this recipe builds a library
    pub library: bool,
    /// Whether this recipe builds a binary (built by `all`)
    pub binary: bool,
}

impl RecipeInfo {
    /// Create recipe info with no sources
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Add a source and its SHA-256 digest
    pub fn with_source(mut self, source: impl Into<String>, sha256: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self.sums.push(sha256.into());
        self
    }

    /// Mark as a library recipe
    pub fn library(mut self) -> Self {
        self.library = true;
        self
    }

    /// Mark as a binary recipe
    pub fn binary(mut self) -> Self {
        self.binary = true;
        self
    }

    /// Check that the info is usable for a build
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidRecipe {
                name: "<unnamed>".to_string(),
                reason: "recipe name is empty".to_string(),
            });
        }
        if self.sources.len() != self.sums.len() {
            return Err(Error::InvalidRecipe {
                name: self.name.clone(),
                reason: format!(
                    "{} source(s) but {} checksum(s)",
                    self.sources.len(),
                    self.sums.len()
                ),
            });
        }
        Ok(())
    }

    /// Source specifiers with `${name}`/`${version}` expanded
    pub fn expanded_sources(&self) -> Result<Vec<String>> {
        self.sources
            .iter()
            .map(|s| expand_placeholders(s, &self.name, &self.version))
            .collect()
    }
}

/// A buildable package definition
///
/// Implementations are flat: each recipe answers platform questions itself
/// through the arguments it is given rather than through a type hierarchy.
pub trait Recipe {
    /// Static information about this recipe
    fn info(&self) -> RecipeInfo;

    /// Names of recipes this one needs for the given target
    fn dependencies(&self, _platform: &str, _arch: &str) -> Vec<String> {
        Vec::new()
    }

    /// Prepare the extracted sources (apply patches, etc.)
    fn prepare(&self, _ctx: &BuildContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Run the build
    fn build(&self, ctx: &BuildContext<'_>) -> Result<()>;

    /// Copy artifacts into `out_dir` and publish variables for dependents
    fn finalize(&self, _ctx: &mut BuildContext<'_>, _out_dir: &Path) -> Result<()> {
        Ok(())
    }
}

/// Everything a recipe sees while it is being built
///
/// Created fresh for every recipe build. `dependency_env` only holds the
/// published variables of recipes in this recipe's dependency closure.
#[derive(Debug)]
pub struct BuildContext<'a> {
    /// Name of the recipe being built
    pub recipe: String,
    /// Directory holding the fetched and extracted sources
    pub source_dir: PathBuf,
    /// Environment for commands run by the recipe
    pub env: Env,
    /// Cross compiler prefix (e.g. `x86_64-linux-musl`)
    pub cross_prefix: String,
    /// Flags that make a build static (or the closest equivalent)
    pub static_flags: String,
    /// Target platform
    pub platform: String,
    /// Target architecture
    pub arch: String,
    /// Published variables of each dependency, keyed by recipe name
    pub dependency_env: PackageEnvTable,
    publisher: Option<&'a mut PackageEnvTable>,
}

impl<'a> BuildContext<'a> {
    /// Create a context with an empty environment and no publisher
    pub fn new(recipe: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            recipe: recipe.into(),
            source_dir: source_dir.into(),
            env: Env::empty(),
            cross_prefix: String::new(),
            static_flags: String::new(),
            platform: String::new(),
            arch: String::new(),
            dependency_env: PackageEnvTable::new(),
            publisher: None,
        }
    }

    /// Connect publishing to the package environment table
    pub fn wire_publisher(&mut self, table: &'a mut PackageEnvTable) {
        self.publisher = Some(table);
    }

    /// Whether `publish` is currently allowed
    pub fn can_publish(&self) -> bool {
        self.publisher.is_some()
    }

    /// Publish a variable for recipes that depend on this one
    ///
    /// Overwrites any value previously published under `key`. Only valid
    /// during finalize.
    pub fn publish(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let table = self
            .publisher
            .as_deref_mut()
            .ok_or_else(|| Error::PublishNotWired(self.recipe.clone()))?;
        table
            .entry(self.recipe.clone())
            .or_default()
            .insert(key.into(), value.into());
        Ok(())
    }

    /// A dependency's published variable, or the empty string
    pub fn dependency_var(&self, dependency: &str, key: &str) -> &str {
        self.dependency_env
            .get(dependency)
            .and_then(|vars| vars.get(key))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_info_builder() {
        let info = RecipeInfo::new("zlib", "1.2.8")
            .with_source("http://zlib.net/zlib-1.2.8.tar.gz", "abc")
            .library();

        assert_eq!(info.sources.len(), 1);
        assert_eq!(info.sums, vec!["abc"]);
        assert!(info.library);
        assert!(!info.binary);
        assert!(info.validate().is_ok());
    }

    #[test]
    fn test_validate_mismatched_sums() {
        let mut info = RecipeInfo::new("zlib", "1.2.8").with_source("http://x/a.tgz", "abc");
        info.sums.clear();

        let err = info.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidRecipe { ref name, .. } if name == "zlib"));
    }

    #[test]
    fn test_expanded_sources() {
        let info = RecipeInfo::new("pv", "1.6.0")
            .with_source("https://example.com/${name}-${version}.tar.bz2", "abc");
        assert_eq!(
            info.expanded_sources().unwrap(),
            vec!["https://example.com/pv-1.6.0.tar.bz2"]
        );
    }

    #[test]
    fn test_publish_requires_wiring() {
        let mut ctx = BuildContext::new("zlib", "/tmp/zlib");
        assert!(!ctx.can_publish());
        assert!(matches!(
            ctx.publish("LDFLAGS", "-lz"),
            Err(Error::PublishNotWired(name)) if name == "zlib"
        ));
    }

    #[test]
    fn test_publish_writes_own_slot() {
        let mut table = PackageEnvTable::new();
        {
            let mut ctx = BuildContext::new("zlib", "/tmp/zlib");
            ctx.wire_publisher(&mut table);
            ctx.publish("LDFLAGS", "-lz").unwrap();
            ctx.publish("LDFLAGS", "-L/x -lz").unwrap();
            ctx.publish("CPPFLAGS", "-I/x").unwrap();
        }

        assert_eq!(table.len(), 1);
        assert_eq!(table["zlib"]["LDFLAGS"], "-L/x -lz");
        assert_eq!(table["zlib"]["CPPFLAGS"], "-I/x");
    }

    #[test]
    fn test_dependency_var() {
        let mut ctx = BuildContext::new("ag", "/tmp/ag");
        ctx.dependency_env
            .entry("pcre".to_string())
            .or_default()
            .insert("LDFLAGS".to_string(), "-lpcre".to_string());

        assert_eq!(ctx.dependency_var("pcre", "LDFLAGS"), "-lpcre");
        assert_eq!(ctx.dependency_var("pcre", "CFLAGS"), "");
        assert_eq!(ctx.dependency_var("zlib", "LDFLAGS"), "");
    }
}
