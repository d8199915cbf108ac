//! CLI argument definitions for nw-miner

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nw-miner")]
#[command(about = "Extract datasheets, models, materials and textures from New World paks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Maximum number of worker threads (default: from config, else all cores)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    /// Oodle helper command, invoked as `<CMD> decompress <size>`
    #[arg(long, global = true, env = "NW_MINER_OODLE_EXEC")]
    pub oodle_exec: Option<String>,

    /// Path to oo2core_8_win64.dll (Windows only)
    #[arg(long, global = true, env = "NW_MINER_OODLE_DLL")]
    pub oodle_dll: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: datasheets, index, then assets
    Run {
        /// A .pak file or a directory searched recursively for .pak files
        paks: PathBuf,

        /// Output directory (default: from config, else ./out)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file of asset records to extract models, materials and textures for
        #[arg(long)]
        records: Option<PathBuf>,

        /// Keep .datasheet files next to their .csv output
        #[arg(long)]
        keep_datasheets: bool,
    },

    /// Extract and convert datasheets
    Datasheets {
        /// A .pak file or a directory searched recursively for .pak files
        paks: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep .datasheet files next to their .csv output
        #[arg(long)]
        keep_datasheets: bool,
    },

    /// Convert already-extracted .datasheet files under a directory
    Convert {
        /// Directory to search
        dir: PathBuf,

        /// Keep .datasheet files next to their .csv output
        #[arg(long)]
        keep_datasheets: bool,
    },

    /// Build the texture/model/material index and write it to <OUTPUT>/header-entries
    Index {
        /// A .pak file or a directory searched recursively for .pak files
        paks: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract models, materials and textures for asset records
    Assets {
        /// A .pak file or a directory searched recursively for .pak files
        paks: PathBuf,

        /// JSON file of asset records
        #[arg(long)]
        records: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the entries of one archive
    List {
        /// Path to the .pak file
        pak: PathBuf,
    },

    /// Show or update the config file
    ///
    /// The global --jobs, --oodle-exec and --oodle-dll values given with this
    /// command are saved as defaults.
    #[command(visible_alias = "c")]
    Configure {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
