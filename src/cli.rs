use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reqsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Check whether declared HTTP resources match the remote", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// GET each resource and report whether it matches its PUT mapping
    Observe(ObserveArgs),

    /// Compare a saved response body with a desired body, offline
    Compare(CompareArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Observe
// ============================================================================

#[derive(Parser)]
pub struct ObserveArgs {
    /// Resource files (.toml or .json)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Number of resources observed in parallel
    #[arg(short, long, default_value = "4", env = "REQSYNC_JOBS")]
    pub jobs: usize,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30", env = "REQSYNC_TIMEOUT")]
    pub timeout: u64,

    /// Show a diff of desired vs observed body for out-of-date resources
    #[arg(short, long)]
    pub diff: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Compare
// ============================================================================

#[derive(Parser)]
pub struct CompareArgs {
    /// File holding the observed response body
    #[arg(short, long)]
    pub response: PathBuf,

    /// File holding the desired (PUT) body
    #[arg(short, long)]
    pub desired: PathBuf,

    /// HTTP status code of the observed response
    #[arg(short, long, default_value = "200")]
    pub status: u16,

    /// Compare type tag (e.g. gitlab-file, harbor-robot)
    #[arg(short, long, default_value = "")]
    pub compare_type: String,
}
