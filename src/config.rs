// src/config.rs

//! Build configuration
//!
//! A [`BuildConfig`] names the working and output directories and the target
//! platform/architecture. It can be built in code, or loaded from a TOML file:
//!
//! ```toml
//! build_dir = "/tmp/sbuild"
//! output_dir = "./out"
//! platform = "linux"
//! arch = "arm"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default working directory for builds
pub const DEFAULT_BUILD_DIR: &str = "/tmp/sbuild";

/// Name of the source cache directory inside the build directory
pub const CACHE_DIR_NAME: &str = ".cache";

/// Information that must be provided in order to run a build
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Working directory: staged sources live in `build_dir/<recipe>`
    pub build_dir: PathBuf,
    /// Output directory: artifacts land in `output_dir/<recipe>/<version>`
    pub output_dir: PathBuf,
    /// Operating system to build for (e.g. "linux", "darwin", "android")
    pub platform: String,
    /// Architecture to build for (e.g. "amd64", "arm")
    pub arch: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            output_dir: PathBuf::from("out"),
            platform: "linux".to_string(),
            arch: "amd64".to_string(),
        }
    }
}

impl BuildConfig {
    /// Load a configuration file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Set the working directory
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the target platform
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Set the target architecture
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    /// Root of the source cache
    pub fn cache_dir(&self) -> PathBuf {
        self.build_dir.join(CACHE_DIR_NAME)
    }

    /// Staging directory for a recipe's sources
    pub fn source_dir(&self, recipe: &str) -> PathBuf {
        self.build_dir.join(recipe)
    }

    /// Output directory for a recipe's finalized artifacts
    pub fn recipe_output_dir(&self, recipe: &str, version: &str) -> PathBuf {
        self.output_dir.join(recipe).join(version)
    }
}
