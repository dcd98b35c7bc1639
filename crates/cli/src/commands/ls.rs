//! ls command - List buckets and objects
//!
//! Lists buckets when given a profile only, or objects when given a bucket
//! path.

use clap::Args;
use serde::Serialize;

use pail_core::{BucketRef, BucketSummary, Error, ObjectVersionRecord};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::{cancellation_on_ctrl_c, open_session};

/// List buckets or objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote path (profile, or profile/bucket[/prefix])
    pub path: String,

    /// Summarize output (show totals)
    #[arg(long)]
    pub summarize: bool,
}

#[derive(Debug, Serialize)]
struct LsBucketsOutput {
    buckets: Vec<BucketSummary>,
}

#[derive(Debug, Serialize)]
struct LsObjectsOutput {
    objects: Vec<ObjectEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct ObjectEntry {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<String>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let (profile_name, bucket, prefix) = match parse_ls_path(&args.path) {
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

    match bucket {
        None => list_buckets(&session, &formatter, args.summarize).await,
        Some(bucket) => {
            list_objects(&session, &bucket, prefix, &args, &formatter, &output_config).await
        }
    }
}

async fn list_buckets(
    session: &super::Session,
    formatter: &Formatter,
    summarize: bool,
) -> ExitCode {
    use pail_core::BucketStore as _;

    match session.store.list_buckets().await {
        Ok(buckets) => {
            if formatter.is_json() {
                formatter.json(&LsBucketsOutput {
                    buckets: buckets.clone(),
                });
            } else {
                for bucket in &buckets {
                    let date = bucket
                        .created
                        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "                   ".to_string());
                    formatter.println(&format!("[{date}] {}/", bucket.name));
                }
                if summarize {
                    formatter.println(&format!("\nTotal: {} buckets", buckets.len()));
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to list buckets: {e}"));
            ExitCode::from(&e)
        }
    }
}

async fn list_objects(
    session: &super::Session,
    bucket: &str,
    prefix: Option<String>,
    args: &LsArgs,
    formatter: &Formatter,
    output_config: &OutputConfig,
) -> ExitCode {
    use pail_core::BucketStore as _;

    let spinner = ProgressBar::spinner(output_config, "Listing objects...");

    let binding = match session
        .workflow
        .resolve_endpoint(&BucketRef::new(bucket))
        .await
    {
        Ok(b) => b,
        Err(e) => {
            spinner.finish_and_clear();
            if matches!(e, Error::NotFound(_)) {
                formatter.error(&format!("Bucket not found: {bucket}"));
            } else {
                formatter.error(&format!("Failed to resolve bucket: {e}"));
            }
            return ExitCode::from(&e);
        }
    };

    let mut records = Vec::new();
    let mut continuation: Option<String> = None;

    // Paginate through all results
    loop {
        match session
            .store
            .list_current_page(&binding, prefix.clone(), continuation.clone(), 1000)
            .await
        {
            Ok(page) => {
                records.extend(page.records);
                continuation = page.continuation;
                if continuation.is_none() {
                    break;
                }
            }
            Err(e) => {
                spinner.finish_and_clear();
                if matches!(e, Error::NotFound(_)) {
                    formatter.error(&format!("Bucket not found: {bucket}"));
                } else {
                    formatter.error(&format!("Failed to list objects: {e}"));
                }
                return ExitCode::from(&e);
            }
        }
    }
    spinner.finish_and_clear();

    let total_size: u64 = records.iter().filter_map(ObjectVersionRecord::size).sum();

    if formatter.is_json() {
        formatter.json(&LsObjectsOutput {
            objects: records
                .iter()
                .map(|r| ObjectEntry {
                    key: r.key().to_string(),
                    size: r.size(),
                    last_modified: r.last_modified().map(|d| d.to_string()),
                })
                .collect(),
            summary: args.summarize.then(|| Summary {
                total_objects: records.len(),
                total_size_bytes: total_size,
                total_size_human: humansize::format_size(total_size, humansize::BINARY),
            }),
        });
    } else {
        for record in &records {
            let date = record
                .last_modified()
                .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "                   ".to_string());
            let size = record
                .size()
                .map(|s| humansize::format_size(s, humansize::BINARY))
                .unwrap_or_else(|| "0 B".to_string());
            formatter.println(&format!("[{date}] {size:>10} {}", record.key()));
        }

        if args.summarize {
            formatter.println(&format!(
                "\nTotal: {} objects, {}",
                records.len(),
                humansize::format_size(total_size, humansize::BINARY)
            ));
        }
    }

    ExitCode::Success
}

/// Parse ls path into (profile, bucket, prefix)
fn parse_ls_path(path: &str) -> Result<(String, Option<String>, Option<String>), String> {
    let path = path.trim_end_matches('/');

    if path.is_empty() {
        return Err("Path cannot be empty".to_string());
    }

    let parts: Vec<&str> = path.splitn(3, '/').collect();

    match parts.len() {
        1 => Ok((parts[0].to_string(), None, None)),
        2 => Ok((parts[0].to_string(), Some(parts[1].to_string()), None)),
        3 => Ok((
            parts[0].to_string(),
            Some(parts[1].to_string()),
            Some(format!("{}/", parts[2])),
        )),
        _ => Err(format!("Invalid path format: {path}")),
    }
}
