// src/recipes/pv.rs

//! pv (Pipe Viewer), built as a static binary

use super::base::{copy_file, edit_file, run, strip, unpacked_dir};
use crate::error::Result;
use crate::recipe::{BuildContext, Recipe, RecipeInfo};
use std::path::Path;
use std::process::Command;
use tracing::info;

pub struct Pv;

impl Recipe for Pv {
    fn info(&self) -> RecipeInfo {
        RecipeInfo::new("pv", "1.6.0")
            .with_source(
                "https://www.ivarch.com/programs/sources/${name}-${version}.tar.bz2",
                "0ece824e0da27b384d11d1de371f20cafac465e038041adab57fcf4b5036ef8d",
            )
            .binary()
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let srcdir = unpacked_dir(ctx, &self.info());

        let configure_env = ctx
            .env
            .append("CC", &ctx.static_flags)
            .set("CFLAGS", ctx.static_flags.as_str());
        run(
            Command::new("./configure")
                .arg(format!("--host={}", ctx.cross_prefix))
                .arg("--build=i686")
                .current_dir(&srcdir),
            &configure_env,
        )?;

        let ld = ctx.env.get("LD").to_string();
        edit_file(&srcdir.join("Makefile"), |makefile| {
            add_linker_line(makefile, &ld)
        })?;

        run(Command::new("make").current_dir(&srcdir), &ctx.env)?;

        info!("Finished building pv");
        Ok(())
    }

    fn finalize(&self, ctx: &mut BuildContext<'_>, out_dir: &Path) -> Result<()> {
        let source = unpacked_dir(ctx, &self.info()).join("pv");
        let target = out_dir.join("pv");

        info!("Copying {} to {}", source.display(), target.display());
        copy_file(&source, &target, 0o755)?;
        strip(ctx, &target)
    }
}

/// Add `LD = <ld>` after the Makefile's `CC =` line
fn add_linker_line(makefile: &str, ld: &str) -> String {
    let mut out = String::with_capacity(makefile.len() + ld.len() + 8);
    for line in makefile.split_inclusive('\n') {
        out.push_str(line);
        if line.starts_with("CC =") {
            if !line.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&format!("LD = {ld}\n"));
        }
    }
    out
}
