//! Tripcast CLI entry point

use std::fs;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use tripcast::chat::{ChatSession, render_outcome};
use tripcast::cli::{Cli, Command, OutputFormat, Overrides, get_log_path};
use tripcast::config::Config;
use tripcast::trip::TripWorkflow;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level comes from the config file before the full load so that load itself is logged
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan {
            message,
            origin,
            destination,
            format,
            overrides,
        } => {
            debug!(?origin, ?destination, %format, "main: matched Plan command");
            cmd_plan(config, &message.join(" "), origin, destination, format, &overrides).await
        }
        Command::Chat { overrides } => {
            debug!("main: matched Chat command");
            cmd_chat(config, &overrides).await
        }
        Command::Config => {
            debug!("main: matched Config command");
            cmd_config(&config)
        }
    }
}

fn build_workflow(mut config: Config, overrides: &Overrides) -> Result<TripWorkflow> {
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration after overrides")?;
    TripWorkflow::from_config(&config)
}

/// Plan one trip and print the result
async fn cmd_plan(
    config: Config,
    message: &str,
    origin: Option<String>,
    destination: Option<String>,
    format: OutputFormat,
    overrides: &Overrides,
) -> Result<()> {
    debug!(%message, "cmd_plan: called");
    let workflow = build_workflow(config, overrides)?;
    let outcome = workflow.run(message, origin, destination).await;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize trip")?;
            println!("{}", json);
        }
        OutputFormat::Text => println!("{}", render_outcome(&outcome)),
    }
    Ok(())
}

/// Start an interactive session
async fn cmd_chat(config: Config, overrides: &Overrides) -> Result<()> {
    debug!("cmd_chat: called");
    let workflow = build_workflow(config, overrides)?;
    ChatSession::new(workflow).run().await
}

/// Print the effective configuration
fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}
