//! share command - Generate a presigned URL
//!
//! Produces a time-limited GET URL for an object so it can be shared
//! without credentials.

use std::time::Duration;

use clap::Args;
use serde::Serialize;

use pail_core::{BucketRef, Error};
use pail_s3::DEFAULT_EXPIRY;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{cancellation_on_ctrl_c, open_session, parse_object_path};

/// Generate a presigned URL for an object
#[derive(Args, Debug)]
pub struct ShareArgs {
    /// Object path (profile/bucket/key)
    pub path: String,

    /// URL lifetime in seconds (default: one hour)
    #[arg(long, default_value_t = DEFAULT_EXPIRY.as_secs())]
    pub expire: u64,
}

#[derive(Debug, Serialize)]
struct ShareOutput {
    url: String,
    expires_in_seconds: u64,
}

/// Execute the share command
pub async fn execute(args: ShareArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (profile_name, bucket, key) = match parse_object_path(&args.path) {
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

    let binding = match session
        .workflow
        .resolve_endpoint(&BucketRef::new(&bucket))
        .await
    {
        Ok(b) => b,
        Err(e) => {
            formatter.error(&format!("Failed to resolve bucket '{bucket}': {e}"));
            return ExitCode::from(&e);
        }
    };

    match session
        .store
        .presigned_get(&binding, &key, Duration::from_secs(args.expire))
        .await
    {
        Ok(url) => {
            if formatter.is_json() {
                formatter.json(&ShareOutput {
                    url,
                    expires_in_seconds: args.expire,
                });
            } else {
                formatter.success(&format!(
                    "Presigned URL (valid for {} seconds):",
                    args.expire
                ));
                formatter.println(&url);
            }
            ExitCode::Success
        }
        Err(Error::NotFound(_)) => {
            formatter.error(&format!("Object not found: {profile_name}/{bucket}/{key}"));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&format!("Failed to generate URL: {e}"));
            ExitCode::from(&e)
        }
    }
}
