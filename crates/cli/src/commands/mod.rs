pub mod config;
pub mod derive;
pub mod insights;

use anyhow::Context;
use revlens_core::config::{EngineConfig, LoadOptions};
use revlens_core::{ApplicationError, Dashboard, Filters, SegmentFilter};
use serde::Serialize;
use tracing::info;

use crate::{init_logging, ViewArgs};

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_LOAD: u8 = 3;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a, T> {
    command: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl CommandResult {
    pub fn success<T: Serialize>(command: &str, data: &T) -> Self {
        let payload = CommandOutcome {
            command,
            status: "ok",
            error_class: None,
            message: None,
            data: Some(data),
        };
        match serialize_payload(&payload) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", format!("{error:#}"), 1),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome::<()> {
            command,
            status: "error",
            error_class: Some(error_class),
            message: Some(message.into()),
            data: None,
        };
        let output = serialize_payload(&payload).unwrap_or_else(|error| {
            format!(
                "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        });
        Self { exit_code, output }
    }

    fn from_application_error(command: &str, error: &ApplicationError) -> Self {
        let exit_code = match error {
            ApplicationError::Configuration(_) => EXIT_CONFIG,
            ApplicationError::Load(_) => EXIT_LOAD,
        };
        Self::failure(
            command,
            error.error_class(),
            format!("{} ({error})", error.user_message()),
            exit_code,
        )
    }
}

fn serialize_payload<T: Serialize>(payload: &T) -> anyhow::Result<String> {
    serde_json::to_string(payload).context("failed to serialize command output")
}

/// Shared front half of the view commands: config, logging, snapshot load,
/// then the requested filters.
fn open_dashboard(command: &str, args: &ViewArgs) -> Result<Dashboard, CommandResult> {
    let config = load_config(args.load_options())
        .map_err(|error| CommandResult::from_application_error(command, &error))?;
    init_logging(&config.logging);

    let mut dashboard = Dashboard::load(&config)
        .map_err(|error| CommandResult::from_application_error(command, &error))?;

    if args.period.is_some() || args.segment.is_some() {
        let current = dashboard.filters().clone();
        let filters = Filters::new(
            args.period.unwrap_or(current.period_days),
            args.segment.as_deref().map(SegmentFilter::parse).unwrap_or(current.segment),
        );
        dashboard.set_filters(filters);
    }

    info!(
        event_name = "cli.view.ready",
        command,
        period_days = dashboard.filters().period_days,
        segment = %dashboard.filters().segment,
        "dashboard view ready"
    );
    Ok(dashboard)
}

fn load_config(options: LoadOptions) -> Result<EngineConfig, ApplicationError> {
    Ok(EngineConfig::load(options)?)
}
