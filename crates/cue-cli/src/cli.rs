use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use cue_core::models::ConflictPolicy;

#[derive(Parser)]
#[command(name = "cue")]
#[command(about = "Synchronize video annotation timelines with the remote service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Remote API base URL (overrides CUE_API_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Remote API bearer token (overrides CUE_API_TOKEN)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Optional remote config JSON file
    #[arg(long, global = true, value_name = "PATH")]
    pub config_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile local and remote annotations of a video
    Sync {
        /// Video identifier
        video: String,
    },
    /// Upload local annotations, overwriting the remote copy
    Push {
        /// Video identifier
        video: String,
    },
    /// Download remote annotations, overwriting the local copy
    Pull {
        /// Video identifier
        video: String,
    },
    /// Synchronize and settle a conflict with the given policy
    Resolve {
        /// Video identifier
        video: String,
        /// How to settle the conflict
        #[arg(long, value_enum)]
        policy: ResolvePolicy,
    },
    /// Store a JSON file of timelines as the local annotations of a video
    Import {
        /// Video identifier
        video: String,
        /// Path to a JSON array of timelines
        file: PathBuf,
    },
    /// Print the local annotations of a video
    Show {
        /// Video identifier
        video: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the sync metadata of a video
    Status {
        /// Video identifier
        video: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or update synchronization preferences
    Config {
        /// Enable or disable auto-sync
        #[arg(long, value_name = "BOOL")]
        auto_sync: Option<bool>,
        /// Auto-sync interval in seconds (0 restores the default)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
        /// Conflict resolution policy
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        /// Retry count (0 restores the default)
        #[arg(long, value_name = "N")]
        retry_count: Option<u32>,
    },
    /// Run the auto-sync scheduler until interrupted
    Watch {
        /// Video treated as open for event-driven syncs
        #[arg(long, value_name = "VIDEO")]
        video: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PolicyArg {
    UseLocal,
    UseRemote,
    Merge,
    AskUser,
}

impl From<PolicyArg> for ConflictPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::UseLocal => Self::UseLocal,
            PolicyArg::UseRemote => Self::UseRemote,
            PolicyArg::Merge => Self::Merge,
            PolicyArg::AskUser => Self::AskUser,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ResolvePolicy {
    UseLocal,
    UseRemote,
    Merge,
}

impl From<ResolvePolicy> for ConflictPolicy {
    fn from(value: ResolvePolicy) -> Self {
        match value {
            ResolvePolicy::UseLocal => Self::UseLocal,
            ResolvePolicy::UseRemote => Self::UseRemote,
            ResolvePolicy::Merge => Self::Merge,
        }
    }
}
