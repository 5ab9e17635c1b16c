//! `quince` is the command-line companion of `quince-lib`: a read-only
//! inspection tool for the on-disk content cache.
//!
//! Print a cached page:
//! ```sh
//! quince cat home
//! ```
//!
//! List everything the cache knows about:
//! ```sh
//! quince --dir ./.cache list
//! ```
//!
//! Open a cached page with the default browser:
//! ```sh
//! quince open home
//! ```
//!
//! The tool only parses the cache index and reads content files; it never
//! mutates the cache.
#![warn(clippy::all, clippy::pedantic)]

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use quince_lib::{Body, Cache, DEFAULT_CACHE_DIR_NAME};

#[derive(Parser, Debug)]
#[command(name = "quince", version, about = "Inspect a quince content cache")]
struct Options {
    /// Cache directory
    #[arg(short = 'd', long = "dir", default_value = DEFAULT_CACHE_DIR_NAME, global = true)]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the cached content for a logical name
    Cat {
        /// Logical name of the cache entry
        name: String,
    },
    /// Print the on-disk path of the content file
    Path {
        /// Logical name of the cache entry
        name: String,
    },
    /// Open the cached file with the default browser
    Open {
        /// Logical name of the cache entry
        name: String,
    },
    /// List all cached logical names
    List,
}

fn main() -> Result<()> {
    env_logger::init();

    let opts = Options::parse();
    let cache = Cache::open(&opts.dir)
        .with_context(|| format!("cannot open cache at `{}`", opts.dir.display()))?;

    match opts.command {
        Command::Cat { name } => cat(&cache, &name),
        Command::Path { name } => {
            println!("{}", cache.path(&name)?.display());
            Ok(())
        }
        Command::Open { name } => open_in_browser(&cache, &name),
        Command::List => {
            let mut names = cache.list();
            names.sort();
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
    }
}

/// Write a cached body to stdout. Text goes through `println!`; binary
/// content is written raw so it can be piped.
fn cat(cache: &Cache, name: &str) -> Result<()> {
    match cache.get(name)? {
        Body::Text(text) => println!("{text}"),
        Body::Bytes(bytes) => io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

fn open_in_browser(cache: &Cache, name: &str) -> Result<()> {
    let path = cache.path(name)?;
    log::info!("opening [{}]", path.display());
    open::that(&path).with_context(|| format!("cannot open `{}`", path.display()))?;
    Ok(())
}
