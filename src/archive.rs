// src/archive.rs

//! Source archive extraction
//!
//! The archive format is inferred purely from the file name suffix:
//! `.tar`, `.tar.gz`/`.tgz`, `.tar.bz2`, `.tar.xz` and `.zip` are supported,
//! `.tar.lzma` is recognized but rejected, and anything else is an unknown
//! format.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::Command;
use tar::Archive;
use tracing::debug;
use xz2::read::XzDecoder;

/// Archive formats recognized by file suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Uncompressed tarball (.tar)
    Tar,
    /// Gzip-compressed tarball (.tar.gz, .tgz)
    TarGz,
    /// Bzip2-compressed tarball (.tar.bz2)
    TarBz2,
    /// XZ-compressed tarball (.tar.xz)
    TarXz,
    /// Zip archive (.zip)
    Zip,
}

impl ArchiveFormat {
    /// Detect the archive format from a file name
    pub fn from_filename(filename: &str) -> Result<Self> {
        if filename.ends_with(".tar") {
            Ok(Self::Tar)
        } else if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else if filename.ends_with(".tar.bz2") {
            Ok(Self::TarBz2)
        } else if filename.ends_with(".tar.xz") {
            Ok(Self::TarXz)
        } else if filename.ends_with(".zip") {
            Ok(Self::Zip)
        } else if filename.ends_with(".tar.lzma") {
            Err(Error::UnsupportedArchiveFormat(filename.to_string()))
        } else {
            Err(Error::UnknownArchiveFormat(filename.to_string()))
        }
    }

    /// Detect the archive format from a path's final component
    pub fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::UnknownArchiveFormat(path.display().to_string()))?;
        Self::from_filename(filename)
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Extract an archive into a destination directory
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let format = ArchiveFormat::from_path(archive)?;
    debug!("Extracting {} ({}) into {}", archive.display(), format, dest.display());

    match format {
        ArchiveFormat::Tar => unpack_tar(open(archive)?, archive, dest),
        ArchiveFormat::TarGz => unpack_tar(GzDecoder::new(open(archive)?), archive, dest),
        ArchiveFormat::TarXz => unpack_tar(XzDecoder::new(open(archive)?), archive, dest),
        ArchiveFormat::TarBz2 => unpack_with_tar_command(archive, dest),
        ArchiveFormat::Zip => unpack_zip(archive, dest),
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
    Ok(BufReader::new(file))
}

fn unpack_tar<R: Read>(reader: R, archive: &Path, dest: &Path) -> Result<()> {
    Archive::new(reader).unpack(dest).map_err(|e| {
        Error::IoError(format!("Failed to extract {}: {}", archive.display(), e))
    })
}

/// bzip2 tarballs go through the host `tar`
fn unpack_with_tar_command(archive: &Path, dest: &Path) -> Result<()> {
    let output = Command::new("tar")
        .arg("-C")
        .arg(dest)
        .arg("-xjf")
        .arg(archive)
        .output()
        .map_err(|e| Error::IoError(format!("tar failed: {}", e)))?;

    if !output.status.success() {
        return Err(Error::IoError(format!(
            "Failed to extract {}: {}",
            archive.display(),
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    Ok(())
}

fn unpack_zip(archive: &Path, dest: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(open(archive)?).map_err(|e| {
        Error::IoError(format!("Failed to read zip {}: {}", archive.display(), e))
    })?;
    zip.extract(dest).map_err(|e| {
        Error::IoError(format!("Failed to extract {}: {}", archive.display(), e))
    })
}
