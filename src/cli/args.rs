use clap::Parser;

/// Check that ~/.claude/settings.json can reach its serving endpoint
#[derive(Parser, Debug)]
#[command(name = "endpoint-check")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file to check. Defaults to ~/.claude/settings.json
    #[arg(long, env = "CLAUDE_SETTINGS_PATH")]
    pub settings: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Companion CLI executable used for the version check
    #[arg(long, hide = true, default_value = crate::companion::DEFAULT_CLI_PROGRAM)]
    pub cli_program: String,
}
