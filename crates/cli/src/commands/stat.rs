//! stat command - Show object metadata
//!
//! Displays size, content type, modification time, and ETag for one
//! object.

use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};

use pail_core::{BucketRef, BucketStore as _, Error, ObjectStat};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{cancellation_on_ctrl_c, open_session, parse_object_path};

/// Show object metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Object path (profile/bucket/key)
    pub path: String,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, output_config: OutputConfig) -> ExitCode {
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

    match session.store.head_object(&binding, &key).await {
        Ok(stat) => {
            if formatter.is_json() {
                formatter.json(&stat);
            } else {
                formatter.println(&render_table(&stat).to_string());
            }
            ExitCode::Success
        }
        Err(Error::NotFound(_)) => {
            formatter.error(&format!("Object not found: {profile_name}/{bucket}/{key}"));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&format!("Failed to fetch metadata: {e}"));
            ExitCode::from(&e)
        }
    }
}

fn render_table(stat: &ObjectStat) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property".to_string(), "Value".to_string()]);
    table.add_row(vec!["Key".to_string(), stat.key.clone()]);
    table.add_row(vec![
        "Size".to_string(),
        format!(
            "{} ({} bytes)",
            humansize::format_size(stat.size, humansize::BINARY),
            stat.size
        ),
    ]);
    table.add_row(vec![
        "Content-Type".to_string(),
        stat.content_type
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
    ]);
    table.add_row(vec![
        "Last Modified".to_string(),
        stat.last_modified
            .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    ]);
    table.add_row(vec![
        "ETag".to_string(),
        stat.etag.clone().unwrap_or_else(|| "none".to_string()),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_contains_fields() {
        let stat = ObjectStat {
            key: "report.pdf".into(),
            size: 2048,
            content_type: Some("application/pdf".into()),
            last_modified: None,
            etag: Some("abc123".into()),
        };

        let rendered = render_table(&stat).to_string();
        assert!(rendered.contains("report.pdf"));
        assert!(rendered.contains("application/pdf"));
        assert!(rendered.contains("2048"));
        assert!(rendered.contains("abc123"));
    }
}
