//! rb command - Remove bucket
//!
//! Resolves the bucket's regional endpoint, classifies its contents, and
//! removes it, recursively deleting every object, version, and delete
//! marker first when `--force` authorizes it. Removal is refused whenever
//! the post-cleanup check cannot certify the bucket empty, and a partial
//! cleanup always surfaces the full set of unresolved items.

use clap::Args;
use console::Term;
use serde::Serialize;

use pail_core::{BucketRef, BucketState, DeletionReport, Error, RemovalDecision};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::{cancellation_on_ctrl_c, open_session, parse_bucket_path};

/// Remove a bucket
#[derive(Args, Debug)]
pub struct RbArgs {
    /// Target path (profile/bucket)
    pub target: String,

    /// Delete all objects, versions, and delete markers first
    #[arg(long)]
    pub force: bool,

    /// Skip the interactive confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct RbOutput {
    status: &'static str,
    bucket: String,
    region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<DeletionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Execute the rb command
pub async fn execute(args: RbArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let (profile_name, bucket) = match parse_bucket_path(&args.target) {
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

    let bucket_ref = BucketRef::new(&bucket);

    // Pin the bucket to its home region before anything else touches it
    let spinner = ProgressBar::spinner(&output_config, "Resolving bucket region...");
    let binding = match session.workflow.resolve_endpoint(&bucket_ref).await {
        Ok(b) => b,
        Err(e) => {
            spinner.finish_and_clear();
            return report_error(&formatter, &bucket, &e);
        }
    };
    tracing::debug!(bucket, region = binding.region, "bucket pinned to home region");

    spinner.set_message("Checking bucket contents...");
    let state = match session.workflow.check_emptiness(&binding).await {
        Ok(s) => s,
        Err(e) => {
            spinner.finish_and_clear();
            return report_error(&formatter, &bucket, &e);
        }
    };
    spinner.finish_and_clear();

    if state != BucketState::Empty && !args.force {
        formatter.error(&format!(
            "Bucket '{profile_name}/{bucket}' is {state}. Use --force to delete its contents first."
        ));
        return ExitCode::Conflict;
    }

    if !confirm_removal(&args, &formatter, &bucket, state) {
        formatter.warning("Aborted.");
        return ExitCode::Success;
    }

    let spinner = if state == BucketState::Empty {
        ProgressBar::spinner(&output_config, "Removing bucket...")
    } else {
        ProgressBar::spinner(&output_config, "Deleting objects...")
    };

    let summary = match session.workflow.remove_bucket(&bucket_ref, args.force).await {
        Ok(s) => s,
        Err(e) => {
            spinner.finish_and_clear();
            return report_error(&formatter, &bucket, &e);
        }
    };
    spinner.finish_and_clear();

    match summary.decision {
        RemovalDecision::Removed => {
            if formatter.is_json() {
                formatter.json(&RbOutput {
                    status: "success",
                    bucket: bucket.clone(),
                    region: binding.region.clone(),
                    report: summary.report,
                    message: None,
                });
            } else {
                if let Some(report) = &summary.report {
                    formatter.println(&format!(
                        "Deleted {} objects ({} versions and delete markers included).",
                        report.total_succeeded, report.total_attempted
                    ));
                }
                formatter.success(&format!(
                    "Bucket '{profile_name}/{bucket}' removed successfully."
                ));
            }
            ExitCode::Success
        }
        RemovalDecision::Refused(reason) => {
            let interrupted = summary
                .report
                .as_ref()
                .and_then(|r| r.abort_reason.as_deref())
                == Some("cancelled");
            let partial = summary
                .report
                .as_ref()
                .is_some_and(|r| !r.failures.is_empty());

            if formatter.is_json() {
                formatter.json(&RbOutput {
                    status: "refused",
                    bucket: bucket.clone(),
                    region: binding.region.clone(),
                    report: summary.report,
                    message: Some(reason.clone()),
                });
            } else {
                if let Some(report) = &summary.report {
                    print_report(&formatter, report);
                }
                formatter.error(&format!("Bucket removal refused: {reason}"));
            }

            if interrupted {
                ExitCode::Interrupted
            } else if partial {
                ExitCode::PartialFailure
            } else {
                ExitCode::Conflict
            }
        }
    }
}

/// Confirmation before an irreversible removal: the operator types the
/// bucket name back, unless `--yes` (scripts) opts out.
fn confirm_removal(args: &RbArgs, formatter: &Formatter, bucket: &str, state: BucketState) -> bool {
    if args.yes {
        return true;
    }

    if formatter.is_json() || formatter.is_quiet() {
        formatter.error("Confirmation required; pass --yes for non-interactive use");
        return false;
    }

    if state != BucketState::Empty {
        formatter.warning(&format!(
            "Bucket is {state}; ALL objects, versions, and delete markers will be permanently deleted."
        ));
    }
    formatter.println(&format!("Type the bucket name ('{bucket}') to confirm removal:"));

    match Term::stdout().read_line() {
        Ok(line) => line.trim() == bucket,
        Err(_) => false,
    }
}

fn print_report(formatter: &Formatter, report: &DeletionReport) {
    formatter.println(&format!(
        "Deleted {} of {} items.",
        report.total_succeeded, report.total_attempted
    ));
    if !report.failures.is_empty() {
        formatter.println(&format!("Unresolved items ({}):", report.failures.len()));
        for failure in &report.failures {
            let version = failure
                .version_id
                .as_deref()
                .map(|v| format!(" ({v})"))
                .unwrap_or_default();
            let code = failure.error_code.as_deref().unwrap_or("unknown");
            formatter.println(&format!("  {}{version}: {code}", failure.key));
        }
    }
}

fn report_error(formatter: &Formatter, bucket: &str, error: &Error) -> ExitCode {
    match error {
        Error::NotFound(_) => {
            formatter.error(&format!("Bucket '{bucket}' does not exist"));
        }
        Error::AccessDenied(_) => {
            formatter.error(&format!("Access denied: cannot remove bucket '{bucket}'"));
        }
        Error::NetworkUnavailable(_) => {
            formatter.error(&format!(
                "Network unreachable while working on '{bucket}'; the session is degraded until connectivity returns"
            ));
        }
        Error::Conflict(_) => {
            formatter.error(&error.to_string());
        }
        _ => {
            formatter.error(&format!("Failed to remove bucket '{bucket}': {error}"));
        }
    }
    ExitCode::from(error)
}
