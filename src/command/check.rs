use anyhow::Result;
use tracing::{debug, info};

use crate::api::{normalize_base_url, workspace_root, ProbeError, ServingClient};
use crate::cli::resolve_settings_path;
use crate::companion::{self, CliToolStatus};
use crate::settings::{self, EndpointConfig, SettingsError};

const RULE_WIDTH: usize = 60;

/// Inputs for a connectivity check run
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Settings file override; `~/.claude/settings.json` when unset
    pub settings_path: Option<String>,
    pub cli_program: String,
}

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed,
    Failed,
}

impl CheckOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            CheckOutcome::Passed => 0,
            CheckOutcome::Failed => 1,
        }
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Load settings, probe the serving endpoint and print a report.
pub async fn run_check(options: &CheckOptions) -> Result<CheckOutcome> {
    println!("{}", rule());
    println!("Serving endpoint settings check");
    println!("{}", rule());

    let config = match load_config(options) {
        Ok(config) => config,
        Err(e) => {
            report_settings_error(&e);
            return Ok(CheckOutcome::Failed);
        }
    };
    debug!("Loaded configuration: {:?}", config);

    let client = ServingClient::new()?;
    let outcome = if probe_endpoint(&client, &config).await {
        check_companion_cli(&options.cli_program).await;
        CheckOutcome::Passed
    } else {
        CheckOutcome::Failed
    };

    print_summary(outcome);
    Ok(outcome)
}

fn load_config(options: &CheckOptions) -> Result<EndpointConfig, SettingsError> {
    let path = resolve_settings_path(options.settings_path.as_deref())?;
    settings::load_settings(&path)?.endpoint_config()
}

fn report_settings_error(err: &SettingsError) {
    match err {
        SettingsError::FileNotFound(path) => {
            println!("❌ Settings file not found: {}", path.display());
            println!("   Create the settings file. See SETTINGS.md for details.");
        }
        SettingsError::Parse { source, .. } => {
            println!("❌ Settings file has a JSON syntax error: {}", source);
        }
        SettingsError::Io { source, .. } => {
            println!("❌ Failed to read settings file: {}", source);
        }
        SettingsError::IncompleteConfig { missing, has_env } => {
            if !has_env {
                println!("❌ No 'env' section found in the settings file.");
            }
            println!("❌ Configuration is incomplete. The following keys are not set:");
            for key in missing {
                println!("   - {}", key);
            }
            println!("\nSee SETTINGS.md for details.");
        }
    }
}

/// Probe the endpoint and print the result. Returns true on HTTP 200.
async fn probe_endpoint(client: &ServingClient, config: &EndpointConfig) -> bool {
    let base_url = normalize_base_url(&config.base_url);

    println!("\n🔍 Starting connection test...");
    println!("   Workspace URL: {}", workspace_root(&config.base_url));
    println!("   Endpoint: {}", config.model);
    println!("   Base URL: {}", base_url);

    match client.endpoint_status(config).await {
        Ok(status) => {
            info!("Endpoint {} is reachable", config.model);
            println!("\n✅ Connection succeeded!");
            println!("   Endpoint state: {}", status.state);
            true
        }
        Err(e) => {
            debug!("Probe of {} failed: {:?}", config.base_url, e);
            for line in probe_error_lines(&e, base_url) {
                println!("{}", line);
            }
            false
        }
    }
}

/// Console explanation for a failed probe.
fn probe_error_lines(err: &ProbeError, base_url: &str) -> Vec<String> {
    match err {
        ProbeError::Unauthorized => vec![
            "\n❌ Authentication error (401)".to_string(),
            "   Check the expiry and permissions of your access token.".to_string(),
            "   See DATABRICKS_SETUP.md to issue a new token.".to_string(),
        ],
        ProbeError::EndpointNotFound { endpoint } => vec![
            "\n❌ Endpoint not found (404)".to_string(),
            format!("   Check that the endpoint name '{}' is correct.", endpoint),
            "   See DATABRICKS_SETUP.md to look up the endpoint name.".to_string(),
        ],
        ProbeError::Http { status, body } => vec![
            format!("\n❌ Error: HTTP {}", status),
            format!("   Response: {}", body),
        ],
        ProbeError::Connection(_) => vec![
            "\n❌ Connection error".to_string(),
            "   Check your network connection and the host URL.".to_string(),
            format!("   Base URL: {}", base_url),
        ],
        ProbeError::Timeout(_) => vec![
            "\n❌ Timeout error".to_string(),
            "   Check your network connection.".to_string(),
        ],
        ProbeError::Unexpected(message) => vec![format!("\n❌ Unexpected error: {}", message)],
    }
}

async fn check_companion_cli(program: &str) {
    println!("\n🔍 Checking the Claude Code CLI...");

    match companion::check_cli_version(program).await {
        CliToolStatus::Available { version } => {
            println!("   ✅ Claude Code CLI is available");
            println!("   Version: {}", version);
        }
        CliToolStatus::Failed { code } => {
            println!("   ⚠️  Failed to get the Claude Code CLI version");
            if let Some(code) = code {
                println!("   Exit code: {}", code);
            }
        }
        CliToolStatus::NotInstalled => {
            println!("   ⚠️  Claude Code CLI not found");
            println!("   See INSTALL.md for installation steps.");
        }
        CliToolStatus::Error(e) => {
            println!("   ⚠️  Error while checking the Claude Code CLI: {}", e);
        }
    }
}

fn print_summary(outcome: CheckOutcome) {
    println!("\n{}", rule());
    match outcome {
        CheckOutcome::Passed => {
            println!("✅ All checks passed!");
            println!("   The serving endpoint is ready to use from Claude Code.");
            println!("\nUsage:");
            println!("   claude                    # interactive mode");
            println!("   claude -p \"Hello\"         # non-interactive mode");
        }
        CheckOutcome::Failed => {
            println!("❌ The check failed.");
            println!("   Please review your settings.");
            println!("\nThings to check:");
            println!("   1. SETTINGS.md for the settings file contents");
            println!("   2. DATABRICKS_SETUP.md for the access token and base URL");
        }
    }
    println!("{}", rule());
}
