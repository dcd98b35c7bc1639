//! CLI command definitions and execution
//!
//! Commands take paths of the form `profile/bucket[/key]`: the leading
//! segment names a stored credential profile, and the bucket's regional
//! endpoint is resolved per session rather than configured.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use pail_core::{BucketStore, ProfileManager, RemovalWorkflow};
use pail_s3::S3Store;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod completions;
mod get;
mod ls;
mod mb;
mod profile;
mod put;
mod rb;
mod rm;
mod share;
mod stat;

/// pail - object storage session manager
///
/// Manage buckets and objects on S3-compatible storage from the terminal,
/// including guarded removal of versioned buckets.
#[derive(Parser, Debug)]
#[command(name = "pail")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress display
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage credential profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// List buckets and objects
    Ls(ls::LsArgs),

    /// Create a bucket
    Mb(mb::MbArgs),

    /// Remove a bucket (with guarded recursive cleanup)
    Rb(rb::RbArgs),

    /// Remove objects
    Rm(rm::RmArgs),

    /// Upload a file
    Put(put::PutArgs),

    /// Download an object
    Get(get::GetArgs),

    /// Show object metadata
    Stat(stat::StatArgs),

    /// Generate a presigned URL for an object
    Share(share::ShareArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Profile(cmd) => profile::execute(cmd, cli.json).await,
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Mb(args) => mb::execute(args, output_config).await,
        Commands::Rb(args) => rb::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Put(args) => put::execute(args, output_config).await,
        Commands::Get(args) => get::execute(args, output_config).await,
        Commands::Stat(args) => stat::execute(args, output_config).await,
        Commands::Share(args) => share::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// A connected session: the provider store plus the per-session workflow
/// (endpoint cache, degraded indicator, cancellation).
pub(crate) struct Session {
    pub store: Arc<S3Store>,
    pub workflow: RemovalWorkflow,
}

/// Load a profile, build the provider client, and open a session.
///
/// Reports its own errors; the returned `ExitCode` is what the command
/// should exit with.
pub(crate) async fn open_session(
    profile_name: &str,
    formatter: &Formatter,
    cancel: CancellationToken,
) -> Result<Session, ExitCode> {
    let manager = match ProfileManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to load profiles: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    let profile = match manager.get(profile_name) {
        Ok(p) => p,
        Err(_) => {
            formatter.error(&format!("Profile '{profile_name}' not found"));
            return Err(ExitCode::NotFound);
        }
    };

    let retry = profile.retry_config();
    let store = match S3Store::new(profile).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return Err(ExitCode::NetworkError);
        }
    };

    let workflow = RemovalWorkflow::new(
        Arc::clone(&store) as Arc<dyn BucketStore>,
        retry,
        cancel,
    );

    Ok(Session { store, workflow })
}

/// Spawn a Ctrl-C watcher that cancels the returned token.
pub(crate) fn cancellation_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });
    cancel
}

/// Parse a `profile/bucket` path
pub(crate) fn parse_bucket_path(path: &str) -> Result<(String, String), String> {
    let path = path.trim_end_matches('/');

    if path.is_empty() {
        return Err("Path cannot be empty".to_string());
    }

    let parts: Vec<&str> = path.splitn(2, '/').collect();

    if parts.len() != 2 {
        return Err(format!(
            "Invalid path format: '{path}'. Expected: profile/bucket"
        ));
    }

    let profile = parts[0].to_string();
    let bucket = parts[1].to_string();

    if bucket.is_empty() {
        return Err("Bucket name cannot be empty".to_string());
    }

    Ok((profile, bucket))
}

/// Parse a `profile/bucket/key` path
pub(crate) fn parse_object_path(path: &str) -> Result<(String, String, String), String> {
    if path.is_empty() {
        return Err("Path cannot be empty".to_string());
    }

    let parts: Vec<&str> = path.splitn(3, '/').collect();

    if parts.len() != 3 || parts[2].is_empty() {
        return Err(format!(
            "Invalid path format: '{path}'. Expected: profile/bucket/key"
        ));
    }

    Ok((
        parts[0].to_string(),
        parts[1].to_string(),
        parts[2].to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_path_valid() {
        let (profile, bucket) = parse_bucket_path("prod/mybucket").unwrap();
        assert_eq!(profile, "prod");
        assert_eq!(bucket, "mybucket");
    }

    #[test]
    fn test_parse_bucket_path_trailing_slash() {
        let (profile, bucket) = parse_bucket_path("prod/mybucket/").unwrap();
        assert_eq!(profile, "prod");
        assert_eq!(bucket, "mybucket");
    }

    #[test]
    fn test_parse_bucket_path_no_bucket() {
        assert!(parse_bucket_path("prod").is_err());
        assert!(parse_bucket_path("prod/").is_err());
        assert!(parse_bucket_path("").is_err());
    }

    #[test]
    fn test_parse_object_path_valid() {
        let (profile, bucket, key) = parse_object_path("prod/mybucket/path/to/file.txt").unwrap();
        assert_eq!(profile, "prod");
        assert_eq!(bucket, "mybucket");
        assert_eq!(key, "path/to/file.txt");
    }

    #[test]
    fn test_parse_object_path_missing_key() {
        assert!(parse_object_path("prod/mybucket").is_err());
        assert!(parse_object_path("prod/mybucket/").is_err());
        assert!(parse_object_path("").is_err());
    }
}
