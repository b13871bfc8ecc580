//! Restmap CLI - previews and executes declarative REST operations
//!
//! This is the outermost composition point: it loads configuration, installs
//! the logging subscriber and hands each subcommand a configured client.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    // The file may carry logging settings, so it is read before logging starts
    let config = Config::load_with_file(cli.config.as_deref());

    if let Err(e) = init_logging(&cli, config.as_ref().ok()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli, config).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

#[instrument(skip_all, fields(command = ?cli.command))]
async fn run(cli: Cli, config: Result<Config>) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let config = config?;
    let api_config = config.to_api_config(cli.live, cli.debug)?;
    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(
        verbosity = cli.verbosity_level(),
        environment = %api_config.environment,
        "Executing command"
    );

    match cli.command {
        Commands::Call(args) => handlers::handle_call(args, api_config, &mut output).await,
        Commands::Preview(args) => handlers::handle_preview(args, api_config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &api_config, &mut output).await,
    }
}

fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    if let Some(config) = config {
        logging_config.merge_file(&config.logging, cli.verbosity_level());
    }
    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
