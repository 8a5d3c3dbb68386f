// src/lib.rs

//! sbuild: cross-compiling build orchestrator for static binaries
//!
//! Packages are described by statically registered recipes. A build
//! resolves the requested recipes and their dependencies into a
//! topological order and builds each one in turn with a cross toolchain.
//!
//! # Architecture
//!
//! - Recipes: pinned sources, per-target dependencies, lifecycle hooks
//! - Source cache: download once, verify SHA-256 on every use
//! - Environment propagation: finalized recipes publish variables such as
//!   `LDFLAGS` that are appended into their dependents' environments
//! - Strictly sequential builds; the first failure stops the run

pub mod archive;
pub mod builder;
pub mod config;
pub mod env;
mod error;
pub mod hash;
pub mod recipe;
pub mod recipes;

pub use builder::{
    Builder, Downloader, HttpDownloader, RecipeState, SourceCache, build, expand_targets,
};
pub use config::BuildConfig;
pub use env::Env;
pub use error::{BuildPhase, Error, Result};
pub use recipe::{BuildContext, PackageEnvTable, Recipe, RecipeInfo, Registry};
