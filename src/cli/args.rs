//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--config <path>`: Use this config file

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// damn - catalog the assets inside authoring files and transcode them
#[derive(Parser, Debug)]
#[command(name = "damn")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read configuration from this file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a file and store its asset graph
    #[command(
        name = "analyze",
        long_about = "Analyze a file and store its asset graph.\n\n\
            The analyzer is chosen from the file's mimetype, guessed from its \
            extension. The resulting graph is validated, written into the store \
            under the file's content hash, and the entry path is printed.",
        after_help = "\
EXAMPLES:
    damn analyze notes.txt
    damn analyze scene.blend --store /srv/damn/store"
    )]
    Analyze {
        /// File to analyze
        file: PathBuf,

        /// Store directory (default: config store_path, else the file's directory)
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },

    /// Print the asset graph of a store entry
    #[command(name = "inspect")]
    Inspect {
        /// Path of the store entry
        entry: PathBuf,

        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the conversions offered by the active transcoders
    #[command(name = "mimetypes")]
    Mimetypes {
        /// Only show targets for this source mimetype
        source: Option<String>,
    },

    /// Convert one asset of a store entry to another mimetype
    #[command(
        name = "transcode",
        after_help = "\
EXAMPLES:
    damn transcode store/3f2a9c notes.txt text/html
    damn transcode store/3f2a9c 'diffuse(image/png)' image/jpeg
    damn transcode store/3f2a9c notes.txt application/json --lines 1,10"
    )]
    Transcode {
        /// Path of the store entry
        entry: PathBuf,

        /// Asset name, optionally with its mimetype: name(mimetype)
        asset: String,

        /// Target mimetype
        target: String,

        /// Conversion options as `--name value` pairs
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "OPTIONS")]
        options: Vec<String>,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Shells supported by `damn completion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
