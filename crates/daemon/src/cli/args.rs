pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "stacks")]
#[command(about = "Project file storage: hierarchy, revisions, and rent/return checkouts")]
#[command(version)]
pub struct Args {
    /// Remote daemon API URL (defaults to the configured local daemon)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Caller identity sent as x-caller-id on API requests
    #[arg(long, global = true)]
    pub caller: Option<String>,

    /// Admin bearer token for force operations
    #[arg(long, global = true)]
    pub admin_token: Option<String>,

    /// Path to the stacks config directory (defaults to ~/.stacks)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
