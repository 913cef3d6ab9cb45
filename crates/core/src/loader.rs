use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::dataset::CanonicalDataset;
use crate::errors::LoadError;
use crate::normalize::normalize;

/// Reads and normalizes a snapshot file.
pub fn load_from_path(path: &Path) -> Result<CanonicalDataset, LoadError> {
    info!(
        event_name = "engine.load.start",
        path = %path.display(),
        "loading dashboard snapshot"
    );

    let raw = fs::read_to_string(path).map_err(|source| {
        warn!(
            event_name = "engine.load.read_failed",
            path = %path.display(),
            error = %source,
            "snapshot could not be read"
        );
        LoadError::ReadFile { path: path.to_path_buf(), source }
    })?;

    load_from_str(&raw)
}

pub fn load_from_str(raw: &str) -> Result<CanonicalDataset, LoadError> {
    let value: Value = serde_json::from_str(raw).map_err(|source| {
        warn!(event_name = "engine.load.parse_failed", error = %source, "snapshot is not valid JSON");
        LoadError::Parse { source }
    })?;
    load_from_value(&value)
}

/// The only precondition is that the document is an object; everything
/// beneath it is defaulted by the normalizer.
pub fn load_from_value(value: &Value) -> Result<CanonicalDataset, LoadError> {
    let found = match value {
        Value::Object(_) => None,
        Value::Null => Some("null"),
        Value::Bool(_) => Some("bool"),
        Value::Number(_) => Some("number"),
        Value::String(_) => Some("string"),
        Value::Array(_) => Some("array"),
    };
    if let Some(found) = found {
        warn!(event_name = "engine.load.not_an_object", found, "snapshot has the wrong top-level shape");
        return Err(LoadError::NotAnObject { found });
    }

    let dataset = normalize(value);
    info!(
        event_name = "engine.load.complete",
        channels = dataset.marketing.channel_performance.len(),
        segments = dataset.revenue.segment_breakdown.len(),
        "dashboard snapshot loaded"
    );
    Ok(dataset)
}
