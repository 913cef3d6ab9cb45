use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// The snapshot could not be turned into a dataset. Fatal to initialisation.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read snapshot `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("snapshot is not valid JSON: {source}")]
    Parse { source: serde_json::Error },
    #[error("snapshot must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl ApplicationError {
    /// Short classifier used in structured command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Load(_) => "load",
            Self::Configuration(_) => "config_validation",
        }
    }

    /// The single status line shown to a user instead of a partial dashboard.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Load(_) => {
                "We hit a snag loading the dashboard data. Reload, or confirm that the snapshot file is accessible."
            }
            Self::Configuration(_) => {
                "The dashboard configuration is invalid. Check the config file and environment overrides."
            }
        }
    }
}
