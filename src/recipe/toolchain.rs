// src/recipe/toolchain.rs

//! Cross-compiler selection
//!
//! Maps a target platform/arch to the prefix of a cross toolchain
//! (`x86_64-linux-musl-gcc` and friends) and to the flags that produce a
//! static binary on that platform.

use crate::env::Env;
use crate::error::{Error, Result};

/// Darwin SDK version the darwin cross toolchain targets
pub const DARWIN_VERSION: u32 = 12;

/// Cross-compiler prefix for a platform/arch pair
///
/// Returns the empty string for unknown combinations.
pub fn cross_prefix(platform: &str, arch: &str) -> String {
    match (platform, arch) {
        ("linux", "amd64") => "x86_64-linux-musl".to_string(),
        ("linux", "arm") => "arm-linux-musleabihf".to_string(),
        ("android", _) => "arm-linux-musleabihf".to_string(),
        ("darwin", _) => format!("x86_64-apple-darwin{DARWIN_VERSION}"),
        _ => String::new(),
    }
}

/// Compiler flags for a static build on `platform`
///
/// Darwin cannot link libSystem statically, so it gets LTO and a minimum
/// OS version instead.
pub fn static_flags(platform: &str) -> &'static str {
    match platform {
        "darwin" => " -flto -O3 -mmacosx-version-min=10.6 ",
        _ => " -static ",
    }
}

/// Cross toolchain for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Tool prefix, e.g. `arm-linux-musleabihf`
    pub prefix: String,
    /// Flags for a static build
    pub static_flags: String,
}

impl Toolchain {
    /// Toolchain for a target, failing if no cross compiler is known
    pub fn for_target(platform: &str, arch: &str) -> Result<Self> {
        let prefix = cross_prefix(platform, arch);
        if prefix.is_empty() {
            return Err(Error::UnsupportedTarget {
                platform: platform.to_string(),
                arch: arch.to_string(),
            });
        }

        Ok(Self {
            prefix,
            static_flags: static_flags(platform).to_string(),
        })
    }

    /// Name of a prefixed tool, e.g. `tool("gcc")`
    pub fn tool(&self, name: &str) -> String {
        format!("{}-{}", self.prefix, name)
    }

    /// Point the standard tool variables at this toolchain
    pub fn apply(&self, env: &Env) -> Env {
        env.set("AR", self.tool("ar"))
            .set("CC", self.tool("gcc"))
            .set("CXX", self.tool("g++"))
            .set("LD", self.tool("ld"))
            .set("RANLIB", self.tool("ranlib"))
            .set("STRIP", self.tool("strip"))
    }
}
