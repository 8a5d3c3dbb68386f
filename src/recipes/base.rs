// src/recipes/base.rs

//! Helpers shared by the built-in recipes

use crate::env::Env;
use crate::error::{Error, Result};
use crate::recipe::{BuildContext, RecipeInfo};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Directory a conventional `name-version` tarball unpacks into
pub fn unpacked_dir(ctx: &BuildContext<'_>, info: &RecipeInfo) -> PathBuf {
    ctx.source_dir
        .join(format!("{}-{}", info.name, info.version))
}

/// Run a command with exactly the variables in `env`
///
/// Output is captured and logged at debug level; a non-zero exit status
/// becomes `CommandFailed` carrying the command's stderr.
pub fn run(cmd: &mut Command, env: &Env) -> Result<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    info!("Running {}", program);

    let output = cmd
        .env_clear()
        .envs(env.iter())
        .output()
        .map_err(|e| Error::CommandFailed(format!("Failed to run {}: {}", program, e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.is_empty() {
        debug!("{} stdout:\n{}", program, stdout);
    }

    if !output.status.success() {
        return Err(Error::CommandFailed(format!(
            "{} exited with code {:?}\nstderr: {}",
            program,
            output.status.code(),
            stderr
        )));
    }

    Ok(())
}

/// Rewrite a text file in place
pub fn edit_file<F>(path: &Path, edit: F) -> Result<()>
where
    F: FnOnce(&str) -> String,
{
    let content = fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
    fs::write(path, edit(&content))
        .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))
}

/// Copy a file, replacing the target and setting its permission bits
pub fn copy_file(source: &Path, target: &Path, mode: u32) -> Result<()> {
    fs::copy(source, target).map_err(|e| {
        Error::IoError(format!(
            "Failed to copy {} to {}: {}",
            source.display(),
            target.display(),
            e
        ))
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(target, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}

/// Strip a binary with the toolchain's `STRIP`
pub fn strip(ctx: &BuildContext<'_>, file: &Path) -> Result<()> {
    let strip = ctx.env.get("STRIP");
    if strip.is_empty() {
        return Err(Error::CommandFailed("STRIP is not set".to_string()));
    }
    run(Command::new(strip).arg(file), &ctx.env)
}
