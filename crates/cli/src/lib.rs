pub mod commands;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use revlens_core::config::{ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "revlens",
    about = "Revlens dashboard engine CLI",
    long_about = "Load a RevOps dashboard snapshot, apply period and segment filters, and print the derived metrics.",
    after_help = "Examples:\n  revlens derive --period 90 --segment ENT\n  revlens insights --data data/dashboard_data.json\n  revlens config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Print the filtered dashboard view as JSON")]
    Derive(ViewArgs),
    #[command(about = "Print narrative insights for the filtered view")]
    Insights(ViewArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config {
        #[arg(long, help = "Read configuration from this TOML file")]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ViewArgs {
    #[arg(long, help = "Snapshot JSON file (defaults to data.path from config)")]
    pub data: Option<PathBuf>,
    #[arg(long, help = "Trailing window in days; 0 uses the configured default")]
    pub period: Option<u32>,
    #[arg(long, help = "Segment id, or `all`")]
    pub segment: Option<String>,
    #[arg(long, help = "Read configuration from this TOML file")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Log level for stderr diagnostics")]
    pub log_level: Option<String>,
}

impl ViewArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                data_path: self.data.clone(),
                log_level: self.log_level.clone(),
            },
        }
    }
}

/// Diagnostics go to stderr so stdout stays parseable JSON. Safe to call more
/// than once; later calls keep the first subscriber.
pub fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(logging.level.trim()).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(io::stderr);

    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Derive(args) => commands::derive::run(&args),
        Command::Insights(args) => commands::insights::run(&args),
        Command::Config { config } => commands::config::run(config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
