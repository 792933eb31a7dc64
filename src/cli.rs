//! Command-line argument surface, ported from the teacher's `structopt`-based `Opt` to
//! `clap`'s derive API (see `DESIGN.md` for why: `structopt` was folded into `clap` years
//! ago and the rest of the retrieval corpus standardizes on `clap = { features = ["derive"] }`).

use std::path::PathBuf;

use clap::Parser;

/// Rewrites string-table entries in class files (or archives of class files) according to
/// a namespace mapping, e.g. migrating `javax/…` references to `jakarta/…`.
#[derive(Debug, Parser)]
#[command(name = "classmap", version, author)]
pub struct Opt {
    /// The `.class` files or zip/jar archives to rewrite.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Where to place the rewritten output. Required when more than one input is given;
    /// for a single input, defaults to overwriting it in place (via a temp file + rename,
    /// same as the teacher's in-place mode).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// One `FROM=TO` mapping pair. May be repeated.
    #[arg(long = "map", value_name = "FROM=TO")]
    pub map: Vec<String>,

    /// A `key=value` properties file of mapping pairs, loaded before `--map` entries.
    #[arg(long, value_name = "PATH")]
    pub mapping_file: Option<PathBuf>,

    /// Skip creating a `.bak` backup when rewriting a single input in place.
    #[arg(short, long)]
    pub force: bool,

    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}
