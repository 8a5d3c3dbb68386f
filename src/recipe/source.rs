// src/recipe/source.rs

//! Source specifiers
//!
//! A recipe names each source either as a bare URL, stored under the URL's
//! final path segment, or as `filename::URL` to pick the stored name.

use crate::error::{Error, Result};
use std::fmt;

/// Separator between an explicit filename and the URL
pub const FILENAME_SEPARATOR: &str = "::";

/// A parsed source specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Name the source is stored under in the cache and source directory
    pub filename: String,
    /// Where the source is downloaded from
    pub url: String,
}

impl SourceSpec {
    /// Split a specifier into filename and URL
    ///
    /// `out.tgz::http://x/y.tgz` stores `http://x/y.tgz` as `out.tgz`;
    /// `http://x/path/file.tar.gz` stores the URL as `file.tar.gz`.
    pub fn parse(spec: &str) -> Result<Self> {
        let (filename, url) = match spec.split_once(FILENAME_SEPARATOR) {
            Some((filename, url)) => (filename, url),
            None => {
                let filename = spec.rsplit('/').next().unwrap_or(spec);
                (filename, spec)
            }
        };

        if filename.is_empty() {
            return Err(Error::InvalidSource(format!(
                "'{spec}' does not name a file"
            )));
        }
        if filename.contains(['/', '\\']) || filename == "." || filename == ".." {
            return Err(Error::InvalidSource(format!(
                "'{spec}' names a path, not a file"
            )));
        }
        if url.is_empty() {
            return Err(Error::InvalidSource(format!("'{spec}' has no URL")));
        }

        Ok(Self {
            filename: filename.to_string(),
            url: url.to_string(),
        })
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.filename, FILENAME_SEPARATOR, self.url)
    }
}

/// Expand `${name}` and `${version}` in a source specifier
///
/// Any other placeholder is a recipe bug and fails with `UnknownPlaceholder`.
pub fn expand_placeholders(spec: &str, name: &str, version: &str) -> Result<String> {
    let mut out = String::with_capacity(spec.len());
    let mut rest = spec;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            Error::InvalidSource(format!("unterminated placeholder in '{spec}'"))
        })?;

        match &after[..end] {
            "name" => out.push_str(name),
            "version" => out.push_str(version),
            other => {
                return Err(Error::UnknownPlaceholder {
                    placeholder: other.to_string(),
                    spec: spec.to_string(),
                });
            }
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
