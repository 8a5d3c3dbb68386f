// src/error.rs

//! Error types for the build orchestrator

use std::fmt;
use thiserror::Error;

/// Phase of the per-recipe pipeline in which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPhase {
    /// Removing and recreating the source directory
    Stage,
    /// Fetching a source through the cache
    Fetch,
    /// Extracting a fetched archive
    Unpack,
    /// Merging dependency variables into the environment
    ComposeEnv,
    /// Cross-compiler and static flag setup
    Toolchain,
    /// `Recipe::prepare`
    Prepare,
    /// `Recipe::build`
    Build,
    /// `Recipe::finalize` (including output directory creation)
    Finalize,
}

impl BuildPhase {
    /// Get the phase name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Fetch => "fetch",
            Self::Unpack => "unpack",
            Self::ComposeEnv => "compose-env",
            Self::Toolchain => "toolchain",
            Self::Prepare => "prepare",
            Self::Build => "build",
            Self::Finalize => "finalize",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors produced while resolving, fetching and building recipes
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Download error: {0}")]
    DownloadError(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("Dependency cycle detected among recipes: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("Unknown placeholder ${{{placeholder}}} in source '{spec}'")]
    UnknownPlaceholder { placeholder: String, spec: String },

    #[error("Invalid source specifier: {0}")]
    InvalidSource(String),

    #[error("Invalid recipe {name}: {reason}")]
    InvalidRecipe { name: String, reason: String },

    #[error("Unknown archive format: {0}")]
    UnknownArchiveFormat(String),

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchiveFormat(String),

    #[error("No cross compiler known for platform/arch: {platform}/{arch}")]
    UnsupportedTarget { platform: String, arch: String },

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Recipe {0} tried to publish dependent variables before finalize")]
    PublishNotWired(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Recipe {recipe} failed during {phase}: {source}")]
    RecipeFailed {
        recipe: String,
        phase: BuildPhase,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach recipe name and pipeline phase to an error
    pub fn in_phase(self, recipe: &str, phase: BuildPhase) -> Self {
        Error::RecipeFailed {
            recipe: recipe.to_string(),
            phase,
            source: Box::new(self),
        }
    }

    /// The phase a per-recipe failure happened in, if known
    pub fn phase(&self) -> Option<BuildPhase> {
        match self {
            Error::RecipeFailed { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The innermost error, skipping recipe/phase wrappers
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::RecipeFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for build orchestration
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_phase_wraps_and_unwraps() {
        let err = Error::RecipeNotFound("zlib".to_string()).in_phase("pv", BuildPhase::ComposeEnv);
        assert_eq!(err.phase(), Some(BuildPhase::ComposeEnv));
        assert!(matches!(err.root_cause(), Error::RecipeNotFound(name) if name == "zlib"));
        assert_eq!(
            err.to_string(),
            "Recipe pv failed during compose-env: Recipe not found: zlib"
        );
    }

    #[test]
    fn test_unknown_placeholder_display() {
        let err = Error::UnknownPlaceholder {
            placeholder: "arch".to_string(),
            spec: "http://x/${arch}.tgz".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown placeholder ${arch} in source 'http://x/${arch}.tgz'"
        );
    }

    #[test]
    fn test_cycle_display() {
        let err = Error::DependencyCycle(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Dependency cycle detected among recipes: a, b");
    }
}
