// src/recipes/zlib.rs

//! zlib, built as a static library

use super::base::{edit_file, run, unpacked_dir};
use crate::error::Result;
use crate::recipe::{BuildContext, Recipe, RecipeInfo};
use std::path::Path;
use std::process::Command;
use tracing::info;

pub struct Zlib;

impl Recipe for Zlib {
    fn info(&self) -> RecipeInfo {
        RecipeInfo::new("zlib", "1.2.8")
            .with_source(
                "http://zlib.net/${name}-${version}.tar.gz",
                "36658cb768a54c1d4dec43c3116c27ed893e88b02ecfcb44f2166f9c0b7f2a0d",
            )
            .library()
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let srcdir = unpacked_dir(ctx, &self.info());

        let configure_env = ctx
            .env
            .set("CHOST", ctx.cross_prefix.as_str())
            .set("CFLAGS", ctx.static_flags.as_str())
            .append("CC", &ctx.static_flags);
        run(
            Command::new("./configure").arg("--static").current_dir(&srcdir),
            &configure_env,
        )?;

        // The generated Makefile hardcodes Apple's libtool as the archiver
        if ctx.platform == "darwin" {
            let prefix = ctx.cross_prefix.clone();
            edit_file(&srcdir.join("Makefile"), |makefile| {
                use_cross_archiver(makefile, &prefix)
            })?;
        }

        run(Command::new("make").current_dir(&srcdir), &ctx.env)?;

        info!("Finished building zlib");
        Ok(())
    }

    fn finalize(&self, ctx: &mut BuildContext<'_>, _out_dir: &Path) -> Result<()> {
        let srcdir = unpacked_dir(ctx, &self.info());
        ctx.publish("CPPFLAGS", format!("-I{}", srcdir.display()))?;
        ctx.publish("LDFLAGS", format!("-L{} -lz", srcdir.display()))?;
        Ok(())
    }
}

fn use_cross_archiver(makefile: &str, prefix: &str) -> String {
    makefile
        .replace("AR=/usr/bin/libtool", &format!("AR={prefix}-ar"))
        .replace("ARFLAGS=-o", "ARFLAGS=rc")
}
