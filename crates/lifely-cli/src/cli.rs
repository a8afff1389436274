//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lifely_core::TracingOutputFormat;

/// lifely - your year in calendar events
#[derive(Debug, Parser)]
#[command(name = "lifely")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "LIFELY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log line format: compact, pretty or json
    #[arg(long, env = "LIFELY_LOG_FORMAT", default_value = "compact")]
    pub log_format: TracingOutputFormat,

    /// Show results immediately instead of animating them
    #[arg(long, env = "LIFELY_REDUCED_MOTION")]
    pub reduced_motion: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize read-only access to Google Calendar
    Auth(AuthArgs),

    /// Revoke the stored token and delete it
    Revoke,

    /// Show the signed-in account
    Whoami,

    /// List your calendars
    Calendars,

    /// Summarize a year of events (default)
    Wrapped(WrappedArgs),

    /// Render visited places as an HTML heat map
    Heatmap(HeatmapArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    /// OAuth client ID (from Google Cloud Console)
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret (from Google Cloud Console)
    #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// Path to Google Cloud Console credentials JSON file
    ///
    /// This is the JSON file downloaded from the Google Cloud Console
    /// OAuth 2.0 credentials page. Alternative to providing client_id
    /// and client_secret separately.
    #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
    pub credentials_file: Option<PathBuf>,

    /// Force re-authentication even if already authenticated
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct WrappedArgs {
    /// Year to analyze (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Fetch from the API even when cached events exist
    #[arg(long)]
    pub no_cache: bool,

    /// Number of people to show
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Debug, Args)]
pub struct HeatmapArgs {
    /// JSON array of `{"lat", "lng", "visits", "label"}` objects
    #[arg(long, required_unless_present = "year", conflicts_with = "year")]
    pub points: Option<PathBuf>,

    /// Place the cached events of this year instead
    #[arg(long)]
    pub year: Option<i32>,

    /// Minimum number of places needed to draw the map
    #[arg(long)]
    pub min_points: Option<usize>,

    /// Write the HTML here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration and data paths
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["lifely"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.debug);
        assert_eq!(cli.log_format, TracingOutputFormat::Compact);
    }

    #[test]
    fn log_format_flag() {
        let cli = Cli::try_parse_from(["lifely", "--log-format", "json", "whoami"]).unwrap();
        assert_eq!(cli.log_format, TracingOutputFormat::Json);
        assert!(Cli::try_parse_from(["lifely", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn wrapped_flags() {
        let cli =
            Cli::try_parse_from(["lifely", "wrapped", "--year", "2024", "--no-cache", "--top", "5"])
                .unwrap();
        match cli.command {
            Some(Command::Wrapped(args)) => {
                assert_eq!(args.year, Some(2024));
                assert!(args.no_cache);
                assert_eq!(args.top, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn heatmap_requires_a_source() {
        assert!(Cli::try_parse_from(["lifely", "heatmap"]).is_err());
        assert!(
            Cli::try_parse_from(["lifely", "heatmap", "--points", "p.json", "--year", "2024"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["lifely", "heatmap", "--year", "2024"]).unwrap();
        match cli.command {
            Some(Command::Heatmap(args)) => {
                assert_eq!(args.year, Some(2024));
                assert!(args.points.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from([
            "lifely",
            "heatmap",
            "--points",
            "places.json",
            "--min-points",
            "3",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Heatmap(args)) => {
                assert_eq!(args.points, Some(PathBuf::from("places.json")));
                assert_eq!(args.min_points, Some(3));
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
