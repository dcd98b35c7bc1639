//! Profile management commands
//!
//! Profiles are named credential sets. Unlike an endpoint-style
//! configuration there is no URL to store; the service endpoint for each
//! bucket is resolved from the bucket's home region at use time.

use clap::Subcommand;
use serde::Serialize;

use pail_core::{Profile, ProfileManager};

use crate::exit_code::ExitCode;

/// Profile subcommands for managing stored credentials
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or update a profile
    Set(SetArgs),

    /// List all configured profiles
    List(ListArgs),

    /// Remove a profile
    Remove(RemoveArgs),

    /// Show one profile (secret key redacted)
    Show(ShowArgs),
}

/// Arguments for the `profile set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (e.g., "default", "prod")
    pub name: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Session token for temporary credentials
    #[arg(long)]
    pub session_token: Option<String>,

    /// Default region for account-level calls (default: us-east-1)
    #[arg(long)]
    pub region: Option<String>,
}

/// Arguments for the `profile list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `profile remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

/// Arguments for the `profile show` command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Name of the profile to show
    pub name: String,
}

/// JSON output for profile list
#[derive(Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileInfo>,
}

/// Profile information for output (without sensitive data)
#[derive(Serialize)]
struct ProfileInfo {
    name: String,
    access_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
}

impl From<&Profile> for ProfileInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            access_key: profile.access_key.clone(),
            region: profile.region.clone(),
        }
    }
}

/// JSON output for profile set/remove operations
#[derive(Serialize)]
struct ProfileOperationOutput {
    success: bool,
    profile: String,
    message: String,
}

/// Execute a profile subcommand
pub async fn execute(cmd: ProfileCommands, json_output: bool) -> ExitCode {
    let manager = match ProfileManager::new() {
        Ok(m) => m,
        Err(e) => {
            print_error(json_output, &e.to_string());
            return ExitCode::GeneralError;
        }
    };

    match cmd {
        ProfileCommands::Set(args) => execute_set(args, &manager, json_output),
        ProfileCommands::List(args) => execute_list(args, &manager, json_output),
        ProfileCommands::Remove(args) => execute_remove(args, &manager, json_output),
        ProfileCommands::Show(args) => execute_show(args, &manager, json_output),
    }
}

fn execute_set(args: SetArgs, manager: &ProfileManager, json_output: bool) -> ExitCode {
    if args.name.is_empty() {
        print_error(json_output, "Profile name cannot be empty");
        return ExitCode::UsageError;
    }

    if args.access_key.is_empty() || args.secret_key.is_empty() {
        print_error(json_output, "Access key and secret key cannot be empty");
        return ExitCode::UsageError;
    }

    let mut profile = Profile::new(&args.name, &args.access_key, &args.secret_key);
    profile.session_token = args.session_token;
    profile.region = args.region;

    match manager.set(profile) {
        Ok(()) => {
            if json_output {
                let output = ProfileOperationOutput {
                    success: true,
                    profile: args.name.clone(),
                    message: format!("Profile '{}' configured successfully", args.name),
                };
                println!("{}", serde_json::to_string_pretty(&output).unwrap());
            } else {
                println!("Profile '{}' configured successfully.", args.name);
            }
            ExitCode::Success
        }
        Err(e) => {
            print_error(json_output, &e.to_string());
            ExitCode::GeneralError
        }
    }
}

fn execute_list(args: ListArgs, manager: &ProfileManager, json_output: bool) -> ExitCode {
    match manager.list() {
        Ok(profiles) => {
            if json_output {
                let output = ProfileListOutput {
                    profiles: profiles.iter().map(ProfileInfo::from).collect(),
                };
                println!("{}", serde_json::to_string_pretty(&output).unwrap());
            } else if profiles.is_empty() {
                println!("No profiles configured.");
            } else if args.long {
                for profile in &profiles {
                    println!(
                        "{:<12} {} (region: {})",
                        profile.name,
                        profile.access_key,
                        profile.region.as_deref().unwrap_or("us-east-1")
                    );
                }
            } else {
                for profile in &profiles {
                    println!("{}", profile.name);
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            print_error(json_output, &e.to_string());
            ExitCode::GeneralError
        }
    }
}

fn execute_remove(args: RemoveArgs, manager: &ProfileManager, json_output: bool) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            if json_output {
                let output = ProfileOperationOutput {
                    success: true,
                    profile: args.name.clone(),
                    message: format!("Profile '{}' removed successfully", args.name),
                };
                println!("{}", serde_json::to_string_pretty(&output).unwrap());
            } else {
                println!("Profile '{}' removed successfully.", args.name);
            }
            ExitCode::Success
        }
        Err(pail_core::Error::ProfileNotFound(_)) => {
            print_error(json_output, &format!("Profile '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => {
            print_error(json_output, &e.to_string());
            ExitCode::GeneralError
        }
    }
}

fn execute_show(args: ShowArgs, manager: &ProfileManager, json_output: bool) -> ExitCode {
    match manager.get(&args.name) {
        Ok(profile) => {
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ProfileInfo::from(&profile)).unwrap()
                );
            } else {
                println!("name:       {}", profile.name);
                println!("access key: {}", profile.access_key);
                println!("secret key: ** redacted **");
                println!(
                    "region:     {}",
                    profile.region.as_deref().unwrap_or("us-east-1 (default)")
                );
            }
            ExitCode::Success
        }
        Err(pail_core::Error::ProfileNotFound(_)) => {
            print_error(json_output, &format!("Profile '{}' not found", args.name));
            ExitCode::NotFound
        }
        Err(e) => {
            print_error(json_output, &e.to_string());
            ExitCode::GeneralError
        }
    }
}

fn print_error(json_output: bool, message: &str) {
    if json_output {
        eprintln!("{}", serde_json::json!({ "error": message }));
    } else {
        eprintln!("Error: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_info_redacts_secret() {
        let profile = Profile::new("test", "AKIATEST", "verysecret");
        let info = ProfileInfo::from(&profile);
        let json = serde_json::to_string(&info).unwrap();

        assert!(json.contains("AKIATEST"));
        assert!(!json.contains("verysecret"));
    }

    #[test]
    fn test_profile_info_region_passthrough() {
        let mut profile = Profile::new("test", "k", "s");
        profile.region = Some("eu-north-1".into());
        let info = ProfileInfo::from(&profile);
        assert_eq!(info.region.as_deref(), Some("eu-north-1"));
    }
}
