//! put command - Upload a file
//!
//! Uploads a local file, guessing the content type from the file
//! extension.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use pail_core::{BucketRef, BucketStore as _};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::{cancellation_on_ctrl_c, open_session, parse_bucket_path, parse_object_path};

/// Upload a file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub file: PathBuf,

    /// Target path (profile/bucket[/key]; key defaults to the file name)
    pub target: String,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    bucket: String,
    key: String,
    size: u64,
    content_type: String,
}

/// Execute the put command
pub async fn execute(args: PutArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let (profile_name, bucket, key) = match parse_put_target(&args.target, &args.file) {
        Ok(parsed) => parsed,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let data = match tokio::fs::read(&args.file).await {
        Ok(data) => data,
        Err(e) => {
            formatter.error(&format!("Cannot read '{}': {e}", args.file.display()));
            return ExitCode::UsageError;
        }
    };
    let size = data.len() as u64;

    let content_type = mime_guess::from_path(&args.file)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

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

    let spinner = ProgressBar::spinner(&output_config, &format!("Uploading {key}..."));
    let result = session
        .store
        .put_object(&binding, &key, data, Some(content_type.clone()))
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&PutOutput {
                    status: "success",
                    bucket,
                    key,
                    size,
                    content_type,
                });
            } else {
                formatter.success(&format!("Uploaded: {profile_name}/{bucket}/{key}"));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Upload failed: {e}"));
            ExitCode::from(&e)
        }
    }
}

/// Resolve the upload target, defaulting the key to the file name.
fn parse_put_target(target: &str, file: &Path) -> Result<(String, String, String), String> {
    if let Ok(parsed) = parse_object_path(target) {
        return Ok(parsed);
    }

    let (profile, bucket) = parse_bucket_path(target)?;
    let key = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Cannot derive object key from '{}'", file.display()))?
        .to_string();
    Ok((profile, bucket, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_put_target_explicit_key() {
        let (profile, bucket, key) =
            parse_put_target("prod/mybucket/dir/report.pdf", Path::new("local.pdf")).unwrap();
        assert_eq!(profile, "prod");
        assert_eq!(bucket, "mybucket");
        assert_eq!(key, "dir/report.pdf");
    }

    #[test]
    fn test_parse_put_target_key_from_file_name() {
        let (profile, bucket, key) =
            parse_put_target("prod/mybucket", Path::new("/tmp/report.pdf")).unwrap();
        assert_eq!(profile, "prod");
        assert_eq!(bucket, "mybucket");
        assert_eq!(key, "report.pdf");
    }

    #[test]
    fn test_parse_put_target_invalid() {
        assert!(parse_put_target("prod", Path::new("a.txt")).is_err());
    }
}
