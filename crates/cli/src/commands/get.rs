//! get command - Download an object
//!
//! Fetches an object and writes it to a local file.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use pail_core::{BucketRef, BucketStore as _, Error};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::{cancellation_on_ctrl_c, open_session, parse_object_path};

/// Download an object
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Object path (profile/bucket/key)
    pub source: String,

    /// Destination file (default: the object's base name)
    pub dest: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct GetOutput {
    status: &'static str,
    key: String,
    dest: String,
    size: u64,
}

/// Execute the get command
pub async fn execute(args: GetArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let (profile_name, bucket, key) = match parse_object_path(&args.source) {
        Ok(parsed) => parsed,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let dest = args.dest.unwrap_or_else(|| {
        PathBuf::from(key.rsplit('/').next().unwrap_or(&key))
    });

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

    let spinner = ProgressBar::spinner(&output_config, &format!("Downloading {key}..."));
    let result = session.store.get_object(&binding, &key).await;
    spinner.finish_and_clear();

    let data = match result {
        Ok(data) => data,
        Err(Error::NotFound(_)) => {
            formatter.error(&format!("Object not found: {profile_name}/{bucket}/{key}"));
            return ExitCode::NotFound;
        }
        Err(e) => {
            formatter.error(&format!("Download failed: {e}"));
            return ExitCode::from(&e);
        }
    };

    let size = data.len() as u64;
    if let Err(e) = tokio::fs::write(&dest, data).await {
        formatter.error(&format!("Cannot write '{}': {e}", dest.display()));
        return ExitCode::GeneralError;
    }

    if formatter.is_json() {
        formatter.json(&GetOutput {
            status: "success",
            key,
            dest: dest.display().to_string(),
            size,
        });
    } else {
        formatter.success(&format!("Saved to: {}", dest.display()));
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dest_is_base_name() {
        let key = "path/to/archive.tar.gz";
        let dest = PathBuf::from(key.rsplit('/').next().unwrap());
        assert_eq!(dest, PathBuf::from("archive.tar.gz"));
    }
}
