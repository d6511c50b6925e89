//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use phishwatch_client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_RECENT_LIMIT, DEFAULT_TREND_LIMIT};
use phishwatch_session::SessionLimits;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "phishwatch",
    version,
    about = "Submit suspicious emails for phishing analysis and review past scans"
)]
pub struct Cli {
    /// Base URL of the analysis service.
    #[arg(long, env = "PHISHWATCH_API_BASE", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Key for the scan history endpoints, sent as `X-API-Key`.
    #[arg(long, env = "PHISHWATCH_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds (0 disables).
    #[arg(long, env = "PHISHWATCH_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Reject larger `.eml` uploads before sending them.
    #[arg(long, env = "PHISHWATCH_MAX_UPLOAD_BYTES", global = true)]
    pub max_upload_bytes: Option<u64>,

    /// Number of recent scans to list (1-100).
    #[arg(long, env = "PHISHWATCH_RECENT_LIMIT", default_value_t = DEFAULT_RECENT_LIMIT, global = true)]
    pub recent_limit: u32,

    /// Number of scans the trend aggregates cover (20-1000).
    #[arg(long, env = "PHISHWATCH_TREND_LIMIT", default_value_t = DEFAULT_TREND_LIMIT, global = true)]
    pub trend_limit: u32,

    /// Print results as JSON instead of cards.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze pasted email text (argument, --file, or stdin).
    AnalyzeText {
        text: Option<String>,
        /// Read the email text from a file.
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Upload an .eml file for analysis.
    AnalyzeEml { path: PathBuf },
    /// List the most recent scans.
    Recent,
    /// Show a stored scan by id.
    Scan { id: i64 },
    /// Show aggregate trends over recent scans.
    Trends,
    /// Refresh recent scans and trends together.
    Dashboard,
    /// Interactive session: analyze, browse history, select saved scans.
    Shell,
    /// Check that the service is reachable.
    Health,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            recent: self.recent_limit,
            trends: self.trend_limit,
        }
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_to_client_config() {
        let cli = Cli::try_parse_from([
            "phishwatch",
            "--base-url",
            "http://scanner.internal/api/",
            "--api-key",
            "k",
            "--timeout-secs",
            "0",
            "--max-upload-bytes",
            "2000000",
            "recent",
        ])
        .unwrap();
        let config = cli.client_config();
        assert_eq!(config.base_url, "http://scanner.internal/api/");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_upload_bytes, Some(2_000_000));
        assert!(matches!(cli.command, Command::Recent));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["phishwatch", "trends", "--trend-limit", "500", "-vv", "--json"])
            .unwrap();
        assert_eq!(cli.session_limits().trends, 500);
        assert_eq!(cli.log_level(), Level::DEBUG);
        assert!(cli.json);
    }

    #[test]
    fn analyze_text_rejects_both_sources() {
        let parsed = Cli::try_parse_from(["phishwatch", "analyze-text", "hi", "--file", "x.txt"]);
        assert!(parsed.is_err());
    }
}
