//! edsrv CLI - edit-server for browser extensions

use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use edsrv_core::config::{
    ADDR_FLAG, DEFAULT_ADDR, DEFAULT_LOG_LEVEL, EDITOR_FLAG, LOG_LEVELS, LOG_LEVEL_FLAG,
    TMP_DIR_FLAG,
};
use edsrv_core::{Config, ConfigOverrides, ProcessEditor, APP_NAME};
use edsrv_server::client::DEFAULT_STATUS_TIMEOUT;
use edsrv_server::{check_status, EditServer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};

/// Subcommand selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Start the edit-server
    Start,
    /// Check a running edit-server
    Status { timeout: Duration },
}

/// CLI arguments structure
#[derive(Debug, Clone)]
pub struct Args {
    pub config_file: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    pub command: CliCommand,
}

impl Args {
    /// Command-line definition
    pub fn command() -> Command {
        let addr = Arg::new(ADDR_FLAG)
            .long(ADDR_FLAG)
            .help(format!("Listen address and port [default: {}]", DEFAULT_ADDR))
            .value_parser(clap::value_parser!(String));

        Command::new(APP_NAME)
            .version(env!("CARGO_PKG_VERSION"))
            .about("Edit-server for browser extensions")
            .long_about(
                "edsrv is an edit-server meant to work as an API backend for browser \
                extensions that allow using an external text editor on a regular webpage. \
                Text sent to it is written to a temporary file, the configured editor runs \
                against that file, and the edited text is sent back.",
            )
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                Arg::new(LOG_LEVEL_FLAG)
                    .long(LOG_LEVEL_FLAG)
                    .global(true)
                    .help(format!("Log verbosity level [default: {}]", DEFAULT_LOG_LEVEL))
                    .value_parser(LOG_LEVELS),
            )
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .global(true)
                    .help("Path to configuration file (JSON format)")
                    .long_help(
                        "Path to a JSON file with any of the \"addr\", \"editor\", \"tmp-dir\" \
                        and \"log-level\" keys. Values from the file win over the EDITOR and \
                        TMPDIR environment variables, command-line flags win over the file.",
                    )
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .subcommand(
                Command::new("start")
                    .about("Starts the edit-server API backend service")
                    .arg(addr.clone())
                    .arg(
                        Arg::new(EDITOR_FLAG)
                            .long(EDITOR_FLAG)
                            .help("Command-line editor snippet [default: $EDITOR]")
                            .long_help(
                                "Editor command and its arguments, split on whitespace. The \
                                temporary file path is appended as the last argument, the \
                                command must only exit once editing is done.",
                            )
                            .value_parser(clap::value_parser!(String)),
                    )
                    .arg(
                        Arg::new(TMP_DIR_FLAG)
                            .long(TMP_DIR_FLAG)
                            .help("Temporary directory, must exist [default: $TMPDIR]")
                            .value_parser(clap::value_parser!(PathBuf)),
                    ),
            )
            .subcommand(
                Command::new("status")
                    .about("Checks edit-server status")
                    .arg(addr)
                    .arg(
                        Arg::new("timeout")
                            .long("timeout")
                            .help("Seconds to wait for the status response")
                            .default_value("5")
                            .value_parser(clap::value_parser!(u64).range(1..)),
                    ),
            )
            .after_help(
                "EXAMPLES:\n    \
                edsrv start --editor 'gvim --nofork' --tmp-dir /tmp   Start the edit-server\n    \
                edsrv status --addr 127.0.0.1:8928                   Check it is running",
            )
    }

    /// Parse command line arguments
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let mut overrides = ConfigOverrides {
            log_level: matches.get_one::<String>(LOG_LEVEL_FLAG).cloned(),
            ..Default::default()
        };

        let command = match matches.subcommand() {
            Some(("status", sub)) => {
                overrides.addr = sub.get_one::<String>(ADDR_FLAG).cloned();
                let secs = sub
                    .get_one::<u64>("timeout")
                    .copied()
                    .unwrap_or(DEFAULT_STATUS_TIMEOUT.as_secs());
                CliCommand::Status {
                    timeout: Duration::from_secs(secs),
                }
            }
            Some(("start", sub)) => {
                overrides.addr = sub.get_one::<String>(ADDR_FLAG).cloned();
                overrides.editor = sub.get_one::<String>(EDITOR_FLAG).cloned();
                overrides.tmp_dir = sub.get_one::<PathBuf>(TMP_DIR_FLAG).cloned();
                CliCommand::Start
            }
            // subcommand_required rules out anything else
            _ => CliCommand::Start,
        };

        Self {
            config_file: matches.get_one::<PathBuf>("config").cloned(),
            overrides,
            command,
        }
    }

    /// Load configuration: environment, then config file, then flags
    pub fn load_config(&self) -> edsrv_core::Result<Config> {
        let mut config = Config::from_env();

        if let Some(config_file) = &self.config_file {
            config.apply_overrides(&ConfigOverrides::from_file(config_file)?);
        }
        config.apply_overrides(&self.overrides);

        Ok(config)
    }
}

/// Runs the edit-server until Ctrl-C
async fn start(config: &Config) -> anyhow::Result<()> {
    config.validate_start()?;

    let editor = ProcessEditor::new(&config.editor, &config.tmp_dir)?;
    let server = EditServer::bind(&config.addr, Arc::new(editor)).await?;

    info!(
        addr = %config.addr,
        editor = %config.editor,
        tmp_dir = %config.tmp_dir.display(),
        "edit-server ready! Press Ctrl+C to stop."
    );

    server.run(shutdown_signal()).await?;
    Ok(())
}

/// Checks the edit-server answers on its status endpoint
async fn status(config: &Config, timeout: Duration) -> anyhow::Result<()> {
    config.validate_status()?;

    let body = check_status(&config.addr, timeout)
        .await
        .with_context(|| format!("edit-server at {} is not healthy", config.addr))?;

    info!(addr = %config.addr, "{}", body);
    info!(addr = %config.addr, "edit-server is healthy!");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let log_level = match config.level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let verbose = log_level >= Level::DEBUG;
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(verbose)
        .with_ansi(true)
        .init();

    let result = match args.command {
        CliCommand::Start => start(&config).await,
        CliCommand::Status { timeout } => status(&config, timeout).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
