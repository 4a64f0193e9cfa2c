// CLI argument parsing and definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "ztw")]
#[command(about = "Provision workspace resources over a zero-trust overlay")]
#[command(version)]
pub struct Args {
    /// Overlay identity file for secure connectivity
    #[arg(long)]
    pub identity: PathBuf,

    /// Local CSV file to upload into the volume
    #[arg(long)]
    pub file: PathBuf,

    /// Workspace profile name
    #[arg(long, default_value = "free-profile")]
    pub profile: String,

    /// Workspace backend ("rest" or "memory")
    #[arg(long, default_value = "rest")]
    pub backend: String,

    /// Workspace REST endpoint (rest backend)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Bearer token for the workspace REST endpoint
    #[arg(long)]
    pub token: Option<String>,

    /// Catalog holding the demo volume
    #[arg(long, default_value = "workspace")]
    pub catalog: String,

    /// Schema holding the demo volume
    #[arg(long, default_value = "default")]
    pub schema: String,

    /// Volume name to reconcile
    #[arg(long, default_value = "datafiles")]
    pub volume: String,

    /// Job name to reconcile
    #[arg(long, default_value = "demo-job")]
    pub job_name: String,

    /// State file backing the memory backend (default: ~/.ztw/workspace.json)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}
