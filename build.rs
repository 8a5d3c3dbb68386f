// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("sbuild")
        .version(env!("CARGO_PKG_VERSION"))
        .author("sbuild Contributors")
        .about("Cross-compile statically linked binaries from pinned sources")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (TOML)"),
        )
        .arg(
            Arg::new("platform")
                .short('p')
                .long("platform")
                .help("Platform to build for (linux, android, darwin)"),
        )
        .arg(
            Arg::new("arch")
                .short('a')
                .long("arch")
                .help("Architecture to build for (amd64, arm)"),
        )
        .arg(
            Arg::new("build_dir")
                .long("build-dir")
                .value_name("DIR")
                .help("Working directory for sources and the download cache"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List available recipes and exit"),
        )
        .arg(Arg::new("output_dir").help("Directory finalized artifacts are written to"))
        .arg(
            Arg::new("recipes")
                .num_args(1..)
                .help("Recipes to build, or `all` for every binary recipe"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("sbuild.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
