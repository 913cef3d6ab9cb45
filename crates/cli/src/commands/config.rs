use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use revlens_core::config::{EngineConfig, LoadOptions};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: JsonValue,
    source: String,
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    precedence: &'static str,
    entries: Vec<ConfigEntry>,
}

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let options = LoadOptions {
        config_path: config_path.clone(),
        require_file: config_path.is_some(),
        ..LoadOptions::default()
    };
    let config = match EngineConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let file_path = config_path.filter(|path| path.exists()).or_else(detect_config_path);
    let file_doc = load_config_file_doc(file_path.as_deref());
    let source = |key: &str, env_keys: &[&str]| {
        field_source(key, env_keys, file_doc.as_ref(), file_path.as_deref())
    };

    let entries = vec![
        ConfigEntry {
            key: "data.path",
            value: json!(config.data.path.display().to_string()),
            source: source("data.path", &["REVLENS_DATA_PATH"]),
        },
        ConfigEntry {
            key: "filters.default_period_days",
            value: json!(config.filters.default_period_days),
            source: source(
                "filters.default_period_days",
                &["REVLENS_FILTERS_DEFAULT_PERIOD_DAYS"],
            ),
        },
        ConfigEntry {
            key: "filters.default_segment",
            value: json!(config.filters.default_segment),
            source: source("filters.default_segment", &["REVLENS_FILTERS_DEFAULT_SEGMENT"]),
        },
        ConfigEntry {
            key: "segments.fallback_share",
            value: json!(config.segments.fallback_share),
            source: source("segments.fallback_share", &["REVLENS_SEGMENTS_FALLBACK_SHARE"]),
        },
        ConfigEntry {
            key: "segments.roi_adjustments",
            value: json!(config.segments.roi_adjustments),
            source: source("segments.roi_adjustments", &[]),
        },
        ConfigEntry {
            key: "segments.deal_segments",
            value: json!(config.segments.deal_segments.len()),
            source: source("segments.deal_segments", &[]),
        },
        ConfigEntry {
            key: "insights.stuck_deal_days",
            value: json!(config.insights.stuck_deal_days),
            source: source("insights.stuck_deal_days", &["REVLENS_INSIGHTS_STUCK_DEAL_DAYS"]),
        },
        ConfigEntry {
            key: "logging.level",
            value: json!(config.logging.level),
            source: source("logging.level", &["REVLENS_LOGGING_LEVEL", "REVLENS_LOG_LEVEL"]),
        },
        ConfigEntry {
            key: "logging.format",
            value: json!(config.logging.format),
            source: source("logging.format", &["REVLENS_LOGGING_FORMAT", "REVLENS_LOG_FORMAT"]),
        },
    ];

    CommandResult::success(
        "config",
        &ConfigReport { precedence: "env > file > default", entries },
    )
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("revlens.toml"), PathBuf::from("config/revlens.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
    {
        return format!("env ({env_key})");
    }

    if config_file_doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    key_path.split('.').try_fold(root, |current, key| current.get(key)).is_some()
}
