//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Browse the class hierarchies of a Python framework
#[derive(Parser, Debug)]
#[command(name = "classy")]
#[command(about = "Browse the class hierarchies of a Python framework")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a source tree into the catalog as one project version
    Import {
        /// Root of the Python source tree
        source_root: PathBuf,

        /// Project name (defaults to the configured one)
        #[arg(short, long)]
        project: Option<String>,

        /// Version number to record, e.g. 4.2
        #[arg(long = "version", value_name = "VERSION")]
        release: String,

        /// Catalog file to update
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write the static site for every imported version
    Build {
        /// Catalog file to read
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip diagram generation
        #[arg(long)]
        no_diagrams: bool,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Serve the catalog over HTTP
    Serve {
        /// Catalog file to read
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version,
}
