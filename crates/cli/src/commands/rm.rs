//! rm command - Remove objects
//!
//! Removes one or more current objects. Each key is existence-checked
//! before the delete goes out, so "removed" means the object was actually
//! there.

use clap::Args;
use serde::Serialize;

use pail_core::{BucketRef, BucketStore as _, Error};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{cancellation_on_ctrl_c, open_session, parse_object_path};

/// Remove objects
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object path(s) to remove (profile/bucket/key)
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Skip the existence check and ignore missing objects
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<Vec<String>>,
    total: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    let mut worst = ExitCode::Success;

    for path in &args.paths {
        match remove_one(path, &args, &formatter).await {
            Ok(Some(removed)) => deleted.push(removed),
            Ok(None) => {}
            Err(code) => {
                failed.push(path.clone());
                if code == ExitCode::AuthError || code == ExitCode::UsageError {
                    return code;
                }
                worst = code;
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&RmOutput {
            status: if failed.is_empty() { "success" } else { "partial" },
            total: deleted.len(),
            deleted,
            failed: (!failed.is_empty()).then_some(failed),
        });
    } else if !deleted.is_empty() {
        formatter.success(&format!("Removed {} object(s).", deleted.len()));
    }

    worst
}

async fn remove_one(
    path: &str,
    args: &RmArgs,
    formatter: &Formatter,
) -> Result<Option<String>, ExitCode> {
    let (profile_name, bucket, key) = match parse_object_path(path) {
        Ok(parsed) => parsed,
        Err(e) => {
            formatter.error(&e);
            return Err(ExitCode::UsageError);
        }
    };

    let cancel = cancellation_on_ctrl_c();
    let session = open_session(&profile_name, formatter, cancel).await?;

    let binding = match session
        .workflow
        .resolve_endpoint(&BucketRef::new(&bucket))
        .await
    {
        Ok(b) => b,
        Err(e) => {
            formatter.error(&format!("Failed to resolve bucket '{bucket}': {e}"));
            return Err(ExitCode::from(&e));
        }
    };

    let full_path = format!("{profile_name}/{bucket}/{key}");

    // Verify the object is actually there before deleting
    if !args.force {
        if let Err(e) = session.store.head_object(&binding, &key).await {
            return match e {
                Error::NotFound(_) => {
                    formatter.error(&format!("Object not found: {full_path}"));
                    Err(ExitCode::NotFound)
                }
                _ => {
                    formatter.error(&format!("Failed to check {full_path}: {e}"));
                    Err(ExitCode::from(&e))
                }
            };
        }
    }

    match session.store.delete_object(&binding, &key).await {
        Ok(()) => {
            if !formatter.is_json() {
                formatter.println(&format!("Removed: {full_path}"));
            }
            Ok(Some(full_path))
        }
        Err(Error::NotFound(_)) if args.force => Ok(None),
        Err(e) => {
            match &e {
                Error::NotFound(_) => {
                    formatter.error(&format!("Object not found: {full_path}"));
                }
                Error::AccessDenied(_) => {
                    formatter.error(&format!("Access denied: {full_path}"));
                }
                _ => {
                    formatter.error(&format!("Failed to remove {full_path}: {e}"));
                }
            }
            Err(ExitCode::from(&e))
        }
    }
}
