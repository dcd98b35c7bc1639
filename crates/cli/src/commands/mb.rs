//! mb command - Make bucket
//!
//! Creates a new bucket in the requested region.

use clap::Args;
use serde::Serialize;

use pail_core::{BucketStore as _, Error};
use pail_core::removal::DEFAULT_REGION;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{cancellation_on_ctrl_c, open_session, parse_bucket_path};

/// Create a bucket
#[derive(Args, Debug)]
pub struct MbArgs {
    /// Target path (profile/bucket)
    pub target: String,

    /// Region for the bucket (default: us-east-1)
    #[arg(long)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
struct MbOutput {
    status: &'static str,
    bucket: String,
    region: String,
}

/// Execute the mb command
pub async fn execute(args: MbArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (profile_name, bucket) = match parse_mb_path(&args.target) {
        Ok(parsed) => parsed,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let cancel = cancellation_on_ctrl_c();
    let session = match open_session(&profile_name, &formatter, cancel).await {
        Ok(s) => s,
        Err(code) => return code,
    };

    let region = args
        .region
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    match session.store.create_bucket(&bucket, &region).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&MbOutput {
                    status: "success",
                    bucket: bucket.clone(),
                    region,
                });
            } else {
                formatter.success(&format!(
                    "Bucket '{profile_name}/{bucket}' created in {region}."
                ));
            }
            ExitCode::Success
        }
        Err(e) => {
            match &e {
                Error::Conflict(_) => {
                    formatter.error(&format!("Bucket '{profile_name}/{bucket}' already exists"));
                }
                Error::AccessDenied(_) => {
                    formatter.error(&format!(
                        "Access denied: cannot create bucket '{profile_name}/{bucket}'"
                    ));
                }
                _ => {
                    formatter.error(&format!("Failed to create bucket: {e}"));
                }
            }
            ExitCode::from(&e)
        }
    }
}

/// Parse mb target path into (profile, bucket)
fn parse_mb_path(path: &str) -> Result<(String, String), String> {
    let (profile, bucket) = parse_bucket_path(path)?;

    // Basic bucket name validation
    if bucket.len() < 3 || bucket.len() > 63 {
        return Err("Bucket name must be between 3 and 63 characters".to_string());
    }

    Ok((profile, bucket))
}
