pub mod config;
pub mod dashboard;
pub mod derive;
pub mod domain;
pub mod errors;
pub mod format;
pub mod insights;
pub mod loader;
pub mod normalize;
pub mod overview;
pub mod period;
pub mod segment;

pub use config::{ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat, SegmentMappings};
pub use dashboard::Dashboard;
pub use derive::{derive_view, HeuristicViewDeriver, ViewDeriver};
pub use domain::dataset::{CanonicalDataset, SegmentId};
pub use domain::filters::{Filters, SegmentFilter};
pub use domain::view::DerivedOutput;
pub use errors::{ApplicationError, LoadError};
pub use format::{calculate_share, format_currency, format_number};
pub use insights::{build_insights, Insight, InsightKind};
pub use normalize::normalize;
pub use overview::{build_overview, top_entity, TrendDelta};
pub use period::{coverage_factor, filter_by_period, intensity, PeriodWindow};
pub use segment::{marketing_share, pipeline_share, revenue_share, SegmentShares};
