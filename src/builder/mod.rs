// src/builder/mod.rs

//! Build orchestration
//!
//! A [`Builder`] turns a list of requested recipe names into a sequence of
//! per-recipe builds: resolve the dependency order, then for each recipe
//! stage a clean source directory, fetch and unpack its sources, compose
//! the environment from what its dependencies published, set up the cross
//! toolchain, and run the recipe's lifecycle hooks.
//!
//! Builds are strictly sequential. The first failing recipe aborts the run.

pub mod cache;

pub use cache::{Downloader, HttpDownloader, SourceCache};

use crate::archive::extract_archive;
use crate::config::BuildConfig;
use crate::env::Env;
use crate::error::{BuildPhase, Error, Result};
use crate::recipe::{
    BuildContext, PackageEnvTable, Recipe, RecipeInfo, Registry, Toolchain,
    resolve_build_order,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info};

/// Request that expands to every binary recipe
pub const ALL_TARGETS: &str = "all";

/// Progress of one recipe through the build pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeState {
    /// Source directory recreated
    Staged,
    /// Sources fetched, verified and unpacked
    Fetched,
    /// Environment composed from dependency variables
    EnvComposed,
    /// `prepare` succeeded
    Prepared,
    /// `build` succeeded
    Built,
    /// Publishing enabled for finalize
    Published,
    /// `finalize` succeeded; the recipe is done
    Finalized,
    /// A step failed
    Failed,
}

impl RecipeState {
    /// Get the state name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::Fetched => "fetched",
            Self::EnvComposed => "env-composed",
            Self::Prepared => "prepared",
            Self::Built => "built",
            Self::Published => "published",
            Self::Finalized => "finalized",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RecipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runs builds against a recipe registry
pub struct Builder<'r> {
    registry: &'r Registry,
    config: BuildConfig,
    root_env: Env,
    cache: SourceCache,
    package_env: PackageEnvTable,
    states: BTreeMap<String, RecipeState>,
}

impl<'r> Builder<'r> {
    /// Create a builder that downloads sources over HTTP
    ///
    /// The root environment is seeded from this process's environment.
    pub fn new(registry: &'r Registry, config: BuildConfig) -> Result<Self> {
        let cache = SourceCache::new(config.cache_dir())?;
        Ok(Self::with_cache(registry, config, cache))
    }

    /// Create a builder that fetches sources through `downloader`
    pub fn with_downloader(
        registry: &'r Registry,
        config: BuildConfig,
        downloader: impl Downloader + 'static,
    ) -> Self {
        let cache = SourceCache::with_downloader(config.cache_dir(), downloader);
        Self::with_cache(registry, config, cache)
    }

    fn with_cache(registry: &'r Registry, config: BuildConfig, cache: SourceCache) -> Self {
        Self {
            registry,
            config,
            root_env: Env::from_os(),
            cache,
            package_env: PackageEnvTable::new(),
            states: BTreeMap::new(),
        }
    }

    /// Replace the root environment every recipe starts from
    pub fn with_root_env(mut self, env: Env) -> Self {
        self.root_env = env;
        self
    }

    /// The build configuration
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Variables published so far, keyed by recipe name
    pub fn package_env(&self) -> &PackageEnvTable {
        &self.package_env
    }

    /// How far a recipe got in this builder's runs
    ///
    /// `None` if the recipe has not been started.
    pub fn recipe_state(&self, name: &str) -> Option<RecipeState> {
        self.states.get(name).copied()
    }

    /// Build the named recipes and everything they depend on
    ///
    /// A lone `all` requests every binary recipe. Resolution errors (missing recipe, cycle) are reported before any
    /// recipe is touched. Otherwise recipes are built in dependency order,
    /// and the first failure stops the run.
    pub fn run<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for dir in [
            self.config.build_dir.clone(),
            self.config.output_dir.clone(),
            self.config.cache_dir(),
        ] {
            debug!("Ensuring directory {} exists", dir.display());
            ensure_dir(&dir)?;
        }

        let targets = expand_targets(self.registry, names);
        let order = resolve_build_order(
            self.registry,
            targets.as_slice(),
            &self.config.platform,
            &self.config.arch,
        )?;
        info!("Build order: {}", order.join(", "));

        for name in &order {
            if let Err(e) = self.build_one(name) {
                self.states.insert(name.clone(), RecipeState::Failed);
                error!("{}", e);
                return Err(e);
            }
        }

        Ok(())
    }

    /// Run the full pipeline for one recipe
    fn build_one(&mut self, name: &str) -> Result<()> {
        let registry = self.registry;
        let recipe = registry
            .lookup(name)
            .map_err(|e| e.in_phase(name, BuildPhase::Stage))?;
        let info = recipe.info();
        info!("Building {} {}", info.name, info.version);

        let source_dir = self.config.source_dir(name);
        stage_source_dir(&source_dir).map_err(|e| e.in_phase(name, BuildPhase::Stage))?;
        self.set_state(name, RecipeState::Staged);

        self.fetch_sources(&info, &source_dir)?;
        self.set_state(name, RecipeState::Fetched);

        let (env, dependency_env) = self
            .compose_env(name)
            .map_err(|e| e.in_phase(name, BuildPhase::ComposeEnv))?;
        self.set_state(name, RecipeState::EnvComposed);

        let toolchain = Toolchain::for_target(&self.config.platform, &self.config.arch)
            .map_err(|e| e.in_phase(name, BuildPhase::Toolchain))?;
        debug!("Using cross prefix {} for {}", toolchain.prefix, name);

        let out_dir = self.config.recipe_output_dir(name, &info.version);

        let mut ctx = BuildContext::new(name, &source_dir);
        ctx.env = toolchain.apply(&env);
        ctx.cross_prefix = toolchain.prefix;
        ctx.static_flags = toolchain.static_flags;
        ctx.platform = self.config.platform.clone();
        ctx.arch = self.config.arch.clone();
        ctx.dependency_env = dependency_env;

        recipe
            .prepare(&ctx)
            .map_err(|e| e.in_phase(name, BuildPhase::Prepare))?;
        self.set_state(name, RecipeState::Prepared);

        recipe
            .build(&ctx)
            .map_err(|e| e.in_phase(name, BuildPhase::Build))?;
        self.set_state(name, RecipeState::Built);

        ctx.wire_publisher(&mut self.package_env);
        self.states.insert(name.to_string(), RecipeState::Published);

        fs::create_dir_all(&out_dir)
            .map_err(|e| {
                Error::IoError(format!("Failed to create {}: {e}", out_dir.display()))
            })
            .and_then(|()| recipe.finalize(&mut ctx, &out_dir))
            .map_err(|e| e.in_phase(name, BuildPhase::Finalize))?;
        self.states.insert(name.to_string(), RecipeState::Finalized);

        info!("Finished {} {}", info.name, info.version);
        Ok(())
    }

    fn set_state(&mut self, name: &str, state: RecipeState) {
        debug!("{} -> {}", name, state);
        self.states.insert(name.to_string(), state);
    }

    /// Fetch every source through the cache and unpack it in place
    fn fetch_sources(&self, info: &RecipeInfo, source_dir: &Path) -> Result<()> {
        let name = info.name.as_str();
        info.validate()
            .map_err(|e| e.in_phase(name, BuildPhase::Fetch))?;
        let sources = info
            .expanded_sources()
            .map_err(|e| e.in_phase(name, BuildPhase::Fetch))?;

        for (source, sum) in sources.iter().zip(&info.sums) {
            let link = self
                .cache
                .fetch(name, source, sum, source_dir)
                .map_err(|e| e.in_phase(name, BuildPhase::Fetch))?;

            extract_archive(&link, source_dir)
                .map_err(|e| e.in_phase(name, BuildPhase::Unpack))?;
        }

        Ok(())
    }

    /// Root environment plus every dependency's published variables
    ///
    /// Dependencies are applied in name order and keys in key order, each
    /// value appended with a space on either side.
    fn compose_env(&self, name: &str) -> Result<(Env, PackageEnvTable)> {
        let closure: BTreeSet<String> = self
            .registry
            .dependency_names(name, &self.config.platform, &self.config.arch)?
            .into_iter()
            .collect();

        let mut env = self.root_env.clone();
        let mut dependency_env = PackageEnvTable::new();

        for dep in closure {
            if let Some(vars) = self.package_env.get(&dep) {
                for (key, value) in vars {
                    env = env.append(key.as_str(), &format!(" {value} "));
                }
                dependency_env.insert(dep, vars.clone());
            }
        }

        Ok((env, dependency_env))
    }
}

impl fmt::Debug for Builder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

/// Build the named recipes with a fresh HTTP-backed builder
pub fn build<S: AsRef<str>>(registry: &Registry, names: &[S], config: BuildConfig) -> Result<()> {
    Builder::new(registry, config)?.run(names)
}

/// Expand a request: a lone `all` means every binary recipe
pub fn expand_targets<S: AsRef<str>>(registry: &Registry, names: &[S]) -> Vec<String> {
    match names {
        [only] if only.as_ref() == ALL_TARGETS => registry.all_binaries(),
        _ => names.iter().map(|n| n.as_ref().to_string()).collect(),
    }
}

/// Remove and recreate a recipe's source directory
fn stage_source_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::IoError(format!(
                "Failed to remove {}: {e}",
                dir.display()
            )));
        }
    }
    ensure_dir(dir)
}

/// Create a directory (and parents) if missing
fn ensure_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder
        .create(dir)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", dir.display())))
}
