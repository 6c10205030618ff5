//! Command-line definition for `entryfs`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

const CLI_AFTER_HELP: &str = "\
PATHS:
  A path ending in '/' is always a folder. Otherwise an existing folder is
  used as a folder and anything else as a file.

LOGGING:
  RUST_LOG controls log output (e.g. RUST_LOG=entryfs_core=debug).
  -v is shorthand for debug output.";

/// entryfs - inspect and manipulate files and folders through one API
#[derive(Parser, Debug)]
#[command(name = "entryfs", version, about, after_help = CLI_AFTER_HELP)]
pub struct Cli {
    /// TOML config file (temp dir, archive compression, folder mode)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show kind, size, last change, owner, group and mode
    Stat {
        path: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a file's content
    Cat { file: String },
    /// Print a file's lines, numbered
    Lines { file: String },
    /// Replace (or append to) a file's content
    Write {
        file: String,
        text: String,
        #[arg(long)]
        append: bool,
    },
    /// Create a folder
    Mkdir {
        folder: String,
        /// Also create up to N missing ancestors
        #[arg(long, value_name = "N", default_value_t = 0)]
        parents: u32,
    },
    /// List a folder: folders first, then files
    Ls { folder: String },
    /// Copy a file, or a folder's contents recursively
    Cp {
        src: String,
        dst: String,
        /// Overwrite an existing target file
        #[arg(long)]
        replace: bool,
        /// Skip files with this extension (repeatable)
        #[arg(long = "skip-ext", value_name = "EXT")]
        skip_ext: Vec<String>,
    },
    /// Rename a file or folder in place
    Mv { path: String, new_name: String },
    /// Delete a file or an empty folder
    Rm {
        path: String,
        /// Delete a folder with everything in it
        #[arg(short, long)]
        recursive: bool,
    },
    /// Delete everything inside a folder
    Clear { folder: String },
    /// Pack a folder's contents into a zip archive
    Zip { folder: String, archive: String },
    /// Unpack a zip archive into a folder
    Unzip { archive: String, folder: String },
    /// Delete files older than a number of days
    Prune {
        folder: String,
        #[arg(long, value_name = "DAYS")]
        older_than_days: i64,
        /// Delete at most this many files
        #[arg(long, value_name = "N")]
        max_count: Option<usize>,
    },
    /// Print the MIME type for a file name
    Mime { file: String },
    /// Decode a symbolic mode such as -rwxr-xr-x into octal
    ChmodDecode {
        #[arg(allow_hyphen_values = true)]
        symbolic: String,
    },
}
