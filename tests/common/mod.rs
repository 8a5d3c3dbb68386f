// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use sbuild::{BuildConfig, BuildContext, Downloader, Error, Recipe, RecipeInfo, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Base URL fixture sources are served from
pub const FIXTURE_URL: &str = "http://fixtures.test/src";

/// In-memory downloader that counts requests
#[derive(Clone, Default)]
pub struct FakeDownloader {
    bodies: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeDownloader {
    /// Serve `body` at `url`, returning its SHA-256
    pub fn serve(&self, url: &str, body: Vec<u8>) -> String {
        let sum = sbuild::hash::sha256_bytes(&body);
        self.bodies.lock().unwrap().insert(url.to_string(), body);
        sum
    }

    /// Number of downloads attempted so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self
            .bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::DownloadError(format!("{url} returned HTTP 404")))?;
        fs::write(dest, body)?;
        Ok(())
    }
}

/// Build a gzip-compressed tarball in memory
pub fn tar_gz(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Scratch build/output directories; keep the TempDir alive
pub fn setup_config() -> (TempDir, BuildConfig) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = BuildConfig::default()
        .with_build_dir(temp_dir.path().join("build"))
        .with_output_dir(temp_dir.path().join("out"));
    (temp_dir, config)
}

/// What a recipe saw when its build hook ran
#[derive(Debug, Clone)]
pub struct Observation {
    pub recipe: String,
    pub env: BTreeMap<String, String>,
    pub dependency_env: BTreeMap<String, BTreeMap<String, String>>,
    pub source_dir: PathBuf,
    pub cross_prefix: String,
}

pub type Journal = Arc<Mutex<Vec<Observation>>>;

/// Configurable recipe that records what it observes
pub struct TestRecipe {
    pub name: &'static str,
    pub version: &'static str,
    pub deps: Vec<&'static str>,
    pub sources: Vec<(String, String)>,
    pub publish: Vec<(&'static str, &'static str)>,
    pub fail_build: bool,
    pub library: bool,
    pub journal: Journal,
}

impl TestRecipe {
    pub fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            version: "1.0",
            deps: Vec::new(),
            sources: Vec::new(),
            publish: Vec::new(),
            fail_build: false,
            library: false,
            journal: Arc::clone(journal),
        }
    }

    pub fn depends_on(mut self, deps: &[&'static str]) -> Self {
        self.deps = deps.to_vec();
        self
    }

    pub fn source(mut self, spec: impl Into<String>, sha256: impl Into<String>) -> Self {
        self.sources.push((spec.into(), sha256.into()));
        self
    }

    pub fn publishes(mut self, key: &'static str, value: &'static str) -> Self {
        self.publish.push((key, value));
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_build = true;
        self
    }

    /// Flag as a library, so `all` does not select it
    pub fn library(mut self) -> Self {
        self.library = true;
        self
    }
}

impl Recipe for TestRecipe {
    fn info(&self) -> RecipeInfo {
        let info = self
            .sources
            .iter()
            .fold(RecipeInfo::new(self.name, self.version), |info, (spec, sum)| {
                info.with_source(spec.as_str(), sum.as_str())
            });
        if self.library {
            info.library()
        } else {
            info.binary()
        }
    }

    fn dependencies(&self, _platform: &str, _arch: &str) -> Vec<String> {
        self.deps.iter().map(|d| d.to_string()).collect()
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        self.journal.lock().unwrap().push(Observation {
            recipe: ctx.recipe.clone(),
            env: ctx
                .env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            dependency_env: ctx.dependency_env.clone(),
            source_dir: ctx.source_dir.clone(),
            cross_prefix: ctx.cross_prefix.clone(),
        });

        if self.fail_build {
            return Err(Error::CommandFailed("make exited with code Some(2)".to_string()));
        }
        Ok(())
    }

    fn finalize(&self, ctx: &mut BuildContext<'_>, out_dir: &Path) -> Result<()> {
        for (key, value) in &self.publish {
            ctx.publish(*key, *value)?;
        }
        fs::write(out_dir.join(format!("{}.built", self.name)), self.version)?;
        Ok(())
    }
}

/// Names of the recipes in the journal, in build order
pub fn built(journal: &Journal) -> Vec<String> {
    journal
        .lock()
        .unwrap()
        .iter()
        .map(|o| o.recipe.clone())
        .collect()
}

/// The journal entry for one recipe
pub fn observation(journal: &Journal, recipe: &str) -> Observation {
    journal
        .lock()
        .unwrap()
        .iter()
        .find(|o| o.recipe == recipe)
        .cloned()
        .unwrap_or_else(|| panic!("{recipe} was never built"))
}
