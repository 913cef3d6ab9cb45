use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::dataset::SegmentId;
use crate::domain::filters::SegmentFilter;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub data: DataConfig,
    pub filters: FilterDefaults,
    pub segments: SegmentMappings,
    pub insights: InsightsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterDefaults {
    /// Used whenever the active filters carry a period of `0`.
    pub default_period_days: u32,
    pub default_segment: SegmentFilter,
}

/// Static lookup tables that sit alongside the snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentMappings {
    /// Share assumed for a segment that is missing from a domain's breakdown.
    pub fallback_share: f64,
    pub roi_adjustments: BTreeMap<SegmentId, f64>,
    /// `dealId -> segment` for stuck deals; unmapped deals only show under `all`.
    pub deal_segments: BTreeMap<String, SegmentId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InsightsConfig {
    pub stuck_deal_days: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Caller-supplied values applied after the environment. View filters are not
/// config; callers pass them to `Dashboard::set_filters`.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub data_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data: DataConfig { path: PathBuf::from("data/dashboard_data.json") },
            filters: FilterDefaults { default_period_days: 180, default_segment: SegmentFilter::All },
            segments: SegmentMappings::default(),
            insights: InsightsConfig { stuck_deal_days: 45 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for SegmentMappings {
    fn default() -> Self {
        let roi_adjustments =
            [("SMB", 0.94), ("MM", 1.0), ("ENT", 1.08)].map(|(segment, factor)| (segment.to_string(), factor));
        let deal_segments = [
            ("DEAL_0002", "SMB"),
            ("DEAL_0004", "MM"),
            ("DEAL_0006", "SMB"),
            ("DEAL_0007", "ENT"),
            ("DEAL_0010", "MM"),
            ("DEAL_0013", "SMB"),
            ("DEAL_0014", "SMB"),
            ("DEAL_0016", "ENT"),
            ("DEAL_0018", "ENT"),
            ("DEAL_0019", "MM"),
            ("DEAL_0123", "ENT"),
            ("DEAL_0456", "MM"),
        ]
        .map(|(deal, segment)| (deal.to_string(), segment.to_string()));

        Self {
            fallback_share: 0.3,
            roi_adjustments: roi_adjustments.into_iter().collect(),
            deal_segments: deal_segments.into_iter().collect(),
        }
    }
}

impl SegmentMappings {
    /// ROI multiplier for the active segment; `1.0` for `all` and unknown segments.
    pub fn roi_adjustment(&self, segment: &SegmentFilter) -> f64 {
        segment
            .segment_id()
            .and_then(|id| self.roi_adjustments.get(id))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn deal_segment(&self, deal_id: &str) -> Option<&str> {
        self.deal_segments.get(deal_id).map(String::as_str)
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl EngineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("revlens.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(data) = patch.data {
            if let Some(path) = data.path {
                self.data.path = path;
            }
        }

        if let Some(filters) = patch.filters {
            if let Some(default_period_days) = filters.default_period_days {
                self.filters.default_period_days = default_period_days;
            }
            if let Some(default_segment) = filters.default_segment {
                self.filters.default_segment = SegmentFilter::parse(&default_segment);
            }
        }

        // Lookup tables given in a file replace the built-in tables wholesale.
        if let Some(segments) = patch.segments {
            if let Some(fallback_share) = segments.fallback_share {
                self.segments.fallback_share = fallback_share;
            }
            if let Some(roi_adjustments) = segments.roi_adjustments {
                self.segments.roi_adjustments = roi_adjustments;
            }
            if let Some(deal_segments) = segments.deal_segments {
                self.segments.deal_segments = deal_segments;
            }
        }

        if let Some(insights) = patch.insights {
            if let Some(stuck_deal_days) = insights.stuck_deal_days {
                self.insights.stuck_deal_days = stuck_deal_days;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("REVLENS_DATA_PATH") {
            self.data.path = PathBuf::from(value);
        }

        if let Some(value) = read_env("REVLENS_FILTERS_DEFAULT_PERIOD_DAYS") {
            self.filters.default_period_days =
                parse_u32("REVLENS_FILTERS_DEFAULT_PERIOD_DAYS", &value)?;
        }
        if let Some(value) = read_env("REVLENS_FILTERS_DEFAULT_SEGMENT") {
            self.filters.default_segment = SegmentFilter::parse(&value);
        }

        if let Some(value) = read_env("REVLENS_SEGMENTS_FALLBACK_SHARE") {
            self.segments.fallback_share = parse_f64("REVLENS_SEGMENTS_FALLBACK_SHARE", &value)?;
        }

        if let Some(value) = read_env("REVLENS_INSIGHTS_STUCK_DEAL_DAYS") {
            self.insights.stuck_deal_days = parse_u32("REVLENS_INSIGHTS_STUCK_DEAL_DAYS", &value)?;
        }

        let log_level = read_env("REVLENS_LOGGING_LEVEL").or_else(|| read_env("REVLENS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("REVLENS_LOGGING_FORMAT").or_else(|| read_env("REVLENS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(data_path) = overrides.data_path {
            self.data.path = data_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_data(&self.data)?;
        validate_filters(&self.filters)?;
        validate_segments(&self.segments)?;
        validate_insights(&self.insights)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("revlens.toml"), PathBuf::from("config/revlens.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_data(data: &DataConfig) -> Result<(), ConfigError> {
    if data.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("data.path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_filters(filters: &FilterDefaults) -> Result<(), ConfigError> {
    if filters.default_period_days == 0 {
        return Err(ConfigError::Validation(
            "filters.default_period_days must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_segments(segments: &SegmentMappings) -> Result<(), ConfigError> {
    let share = segments.fallback_share;
    if !share.is_finite() || share <= 0.0 || share > 1.0 {
        return Err(ConfigError::Validation(
            "segments.fallback_share must be in range (0, 1]".to_string(),
        ));
    }

    if let Some((segment, _)) =
        segments.roi_adjustments.iter().find(|(_, factor)| !factor.is_finite() || **factor <= 0.0)
    {
        return Err(ConfigError::Validation(format!(
            "segments.roi_adjustments.{segment} must be a positive number"
        )));
    }

    if let Some((deal_id, _)) =
        segments.deal_segments.iter().find(|(_, segment)| SegmentFilter::parse(segment).is_all())
    {
        return Err(ConfigError::Validation(format!(
            "segments.deal_segments.{deal_id} must name a concrete segment"
        )));
    }

    Ok(())
}

fn validate_insights(insights: &InsightsConfig) -> Result<(), ConfigError> {
    if insights.stuck_deal_days == 0 {
        return Err(ConfigError::Validation(
            "insights.stuck_deal_days must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    data: Option<DataPatch>,
    filters: Option<FiltersPatch>,
    segments: Option<SegmentsPatch>,
    insights: Option<InsightsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct FiltersPatch {
    default_period_days: Option<u32>,
    default_segment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SegmentsPatch {
    fallback_share: Option<f64>,
    roi_adjustments: Option<BTreeMap<SegmentId, f64>>,
    deal_segments: Option<BTreeMap<String, SegmentId>>,
}

#[derive(Debug, Default, Deserialize)]
struct InsightsPatch {
    stuck_deal_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
