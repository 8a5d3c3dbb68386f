// src/builder/cache.rs

//! Content-verified source cache
//!
//! Sources are downloaded once into `root/<recipe>/<filename>`, verified
//! against their pinned SHA-256 on every use, and symlinked into the
//! recipe's source directory. A file that fails verification is deleted so
//! the next run downloads it again.

use crate::error::{Error, Result};
use crate::hash;
use crate::recipe::SourceSpec;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Some upstream mirrors refuse unknown clients, so downloads present
/// themselves as curl
pub const USER_AGENT: &str =
    "curl 7.24.0 (x86_64-apple-darwin12.0) libcurl/7.24.0 OpenSSL/0.9.8y zlib/1.2.5";

/// Suffix of a download that has not finished yet
const PARTIAL_SUFFIX: &str = ".part";

/// Fetches a URL into a local file
pub trait Downloader {
    /// Download `url` into `dest`, creating or truncating it
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Downloader backed by a blocking HTTP client
pub struct HttpDownloader {
    client: Client,
    show_progress: bool,
}

impl HttpDownloader {
    /// Create a downloader
    ///
    /// Response bodies are never transparently decompressed, so a
    /// `.tar.gz` is stored exactly as served and its checksum holds.
    /// Downloads have no timeout.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(None)
            .user_agent(USER_AGENT)
            .no_gzip()
            .build()
            .map_err(|e| Error::DownloadError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            show_progress: true,
        })
    }

    /// Enable or disable the download progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, total_size: u64, display_name: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(total_size);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);

        if total_size > 0 {
            pb.set_message(display_name.to_string());
        } else {
            pb.set_message(format!("{display_name} (unknown size)"));
        }
        Some(pb)
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("GET {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::DownloadError(format!("{url} returned HTTP {status}")));
        }

        let display_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());
        let total_size = response.content_length().unwrap_or(0);
        let progress_bar = self.progress_bar(total_size, &display_name);

        let mut file = File::create(dest)
            .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", dest.display())))?;

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; STREAM_BUFFER_SIZE];

        loop {
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| Error::DownloadError(format!("Failed to read {url}: {e}")))?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])
                .map_err(|e| Error::IoError(format!("Failed to write data: {e}")))?;

            downloaded += bytes_read as u64;
            if let Some(pb) = &progress_bar {
                pb.set_position(downloaded);
            }
        }

        file.flush()?;

        if let Some(pb) = progress_bar {
            pb.finish_and_clear();
        }

        debug!("Downloaded {} bytes from {}", downloaded, url);
        Ok(())
    }
}

/// On-disk cache of recipe sources
pub struct SourceCache {
    root: PathBuf,
    downloader: Box<dyn Downloader>,
}

impl SourceCache {
    /// Create a cache rooted at `root` that downloads over HTTP
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_downloader(root, HttpDownloader::new()?))
    }

    /// Create a cache that fetches through a custom downloader
    pub fn with_downloader(root: impl Into<PathBuf>, downloader: impl Downloader + 'static) -> Self {
        Self {
            root: root.into(),
            downloader: Box::new(downloader),
        }
    }

    /// Root directory of the cache
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a recipe's source file lives in the cache
    pub fn entry_path(&self, recipe: &str, filename: &str) -> PathBuf {
        self.root.join(recipe).join(filename)
    }

    /// Fetch a source, verify it and link it into `into_dir`
    ///
    /// An already cached file is reused without touching the network. The
    /// file is verified against `sha256` either way; on mismatch it is
    /// deleted and the fetch fails. Returns the path of the link.
    pub fn fetch(&self, recipe: &str, source: &str, sha256: &str, into_dir: &Path) -> Result<PathBuf> {
        let spec = SourceSpec::parse(source)?;
        let recipe_dir = self.root.join(recipe);
        let cached = recipe_dir.join(&spec.filename);

        fs::create_dir_all(&recipe_dir).map_err(|e| {
            Error::IoError(format!("Failed to create {}: {e}", recipe_dir.display()))
        })?;

        if cached.exists() {
            info!("Source {} for {} exists in cache", spec.filename, recipe);
        } else {
            info!("Fetching {} for {}", spec.url, recipe);
            self.download_into_cache(&spec.url, &cached)?;
        }

        if let Err(e) = hash::verify_file_sha256(&cached, sha256) {
            warn!("Removing {} from cache: {}", cached.display(), e);
            if let Err(remove_err) = fs::remove_file(&cached) {
                warn!("Failed to remove {}: {}", cached.display(), remove_err);
            }
            return Err(e);
        }

        let target = fs::canonicalize(&cached).map_err(|e| {
            Error::IoError(format!("Failed to resolve {}: {e}", cached.display()))
        })?;
        let link = into_dir.join(&spec.filename);
        symlink(&target, &link).map_err(|e| {
            Error::IoError(format!(
                "Could not symlink {} to {}: {e}",
                target.display(),
                link.display()
            ))
        })?;

        debug!("Linked {} -> {}", link.display(), target.display());
        Ok(link)
    }

    /// Download to a partial file and move it into place once complete
    fn download_into_cache(&self, url: &str, cached: &Path) -> Result<()> {
        let mut partial = cached.as_os_str().to_owned();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);

        if let Err(e) = self.downloader.download(url, &partial) {
            match fs::remove_file(&partial) {
                Ok(()) => {}
                Err(remove_err) if remove_err.kind() == std::io::ErrorKind::NotFound => {}
                Err(remove_err) => {
                    warn!("Failed to remove {}: {}", partial.display(), remove_err);
                }
            }
            return Err(e);
        }

        fs::rename(&partial, cached).map_err(|e| {
            Error::IoError(format!(
                "Failed to move {} into cache: {e}",
                partial.display()
            ))
        })
    }
}

impl std::fmt::Debug for SourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCache")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    fs::copy(target, link).map(|_| ())
}
