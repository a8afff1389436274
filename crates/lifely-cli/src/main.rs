//! lifely CLI entry point.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lifely_core::{TracingConfig, init_tracing};
use lifely_render::MotionPreference;

use lifely_cli::cli::{Cli, Command, ConfigAction};
use lifely_cli::commands;
use lifely_cli::config::ClientConfig;
use lifely_cli::error::{ClientError, ClientResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = load_config(&cli);

    let debug = cli.debug || config.as_ref().is_ok_and(|c| c.debug);
    if let Err(e) = init_tracing(TracingConfig::for_cli(debug).with_format(cli.log_format)) {
        eprintln!("warning: {}", e);
    }

    let result = match config {
        Ok(config) => run(cli, config, config_path).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// An explicit `--config` must exist; the default location is optional.
fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    match cli.config {
        Some(ref path) => ClientConfig::load_from(path).map_err(ClientError::Config),
        None => ClientConfig::load().map_err(ClientError::Config),
    }
}

async fn run(cli: Cli, config: ClientConfig, config_path: PathBuf) -> ClientResult<()> {
    let motion = MotionPreference::from_flag(
        cli.reduced_motion || config.display.reduced_motion || !std::io::stdout().is_terminal(),
    );

    match cli.command {
        Some(Command::Auth(args)) => commands::auth::run(args, &config, &config_path).await,
        Some(Command::Revoke) => commands::revoke::run(&config).await,
        Some(Command::Whoami) => commands::whoami::run(&config).await,
        Some(Command::Calendars) => commands::calendars::run(&config).await,
        Some(Command::Wrapped(args)) => commands::wrapped::run(args, &config, motion).await,
        Some(Command::Heatmap(args)) => commands::heatmap::run(args, &config),
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config, &config_path),
        },
        None => commands::wrapped::run(Default::default(), &config, motion).await,
    }
}
