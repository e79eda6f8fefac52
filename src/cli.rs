use std::path::PathBuf;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// Without a subcommand, runs the main phase on the first invocation of a
    /// step and the post phase on the second
    #[command(subcommand)]
    pub(crate) command: Option<SetupCommand>,
    /// Root for the downloaded archive, its extraction and the scratch directory
    #[clap(long, global = true, env = "RUNNER_TEMP")]
    pub(crate) temp_dir: Option<PathBuf>,
    /// Root of the persistent tool cache
    #[clap(long, global = true, env = "RUNNER_TOOL_CACHE")]
    pub(crate) tool_cache: Option<PathBuf>,
    /// Use this steam data-home instead of the platform default
    #[clap(long, global = true, env = "STEAM_DIR_OVERRIDE")]
    pub(crate) steam_dir: Option<PathBuf>,
    /// Show debug output (also enabled by RUNNER_DEBUG=1)
    #[clap(short, long, global = true)]
    pub(crate) verbose: bool,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum SetupCommand {
    /// Finds or downloads steamcmd and exports STEAM_CMD, STEAM_DIR and STEAM_TEMP
    Setup,
    /// Prints the logs left in STEAM_TEMP and the steam directories
    Post,
    /// Prints log files below a directory
    Logs {
        directory: PathBuf,
        /// Delete printed files whose path contains `logs`
        #[clap(long)]
        clear: bool,
    },
    /// Shows the latest cached steamcmd without downloading anything
    Which {
        #[clap(long)]
        json: bool,
    },
}
