pub mod marketing;
pub mod pipeline;
pub mod revenue;

use tracing::debug;

use crate::config::{EngineConfig, SegmentMappings};
use crate::domain::dataset::{CanonicalDataset, MarketingTrendPoint, RevenueTrendPoint};
use crate::domain::filters::Filters;
use crate::domain::view::DerivedOutput;
use crate::overview::build_overview;
use crate::period::PeriodWindow;
use crate::segment::SegmentShares;

use self::{marketing::derive_marketing, pipeline::derive_pipeline, revenue::derive_revenue};

pub const DEFAULT_PERIOD_DAYS: u32 = 180;

pub trait ViewDeriver: Send + Sync {
    fn derive(&self, dataset: &CanonicalDataset, filters: &Filters) -> DerivedOutput;
}

/// Share and intensity heuristics over the canonical snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct HeuristicViewDeriver {
    mappings: SegmentMappings,
    default_period_days: u32,
}

impl HeuristicViewDeriver {
    pub fn new(mappings: SegmentMappings, default_period_days: u32) -> Self {
        Self { mappings, default_period_days }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.segments.clone(), config.filters.default_period_days)
    }

    pub fn mappings(&self) -> &SegmentMappings {
        &self.mappings
    }
}

impl Default for HeuristicViewDeriver {
    fn default() -> Self {
        Self::new(SegmentMappings::default(), DEFAULT_PERIOD_DAYS)
    }
}

impl ViewDeriver for HeuristicViewDeriver {
    fn derive(&self, dataset: &CanonicalDataset, filters: &Filters) -> DerivedOutput {
        derive_view(dataset, filters, &self.mappings, self.default_period_days)
    }
}

fn marketing_date(point: &MarketingTrendPoint) -> &str {
    &point.date
}

fn revenue_month(point: &RevenueTrendPoint) -> &str {
    &point.month
}

/// One full derivation pass. A period of `0` falls back to
/// `default_period_days`; the returned bundle still records the filters as
/// requested.
pub fn derive_view(
    dataset: &CanonicalDataset,
    filters: &Filters,
    mappings: &SegmentMappings,
    default_period_days: u32,
) -> DerivedOutput {
    let period_days = match filters.period_days {
        0 => default_period_days,
        days => days,
    };
    let segment = &filters.segment;
    let shares = SegmentShares::resolve(dataset, segment, mappings.fallback_share);

    let marketing_window =
        PeriodWindow::over(&dataset.marketing.trends_data, period_days, marketing_date);
    let revenue_window = PeriodWindow::over(&dataset.revenue.trends_data, period_days, revenue_month);

    let marketing = derive_marketing(
        &dataset.marketing,
        &marketing_window,
        shares.marketing,
        mappings.roi_adjustment(segment),
    );
    // Pipeline has no dated series of its own and follows marketing activity.
    let pipeline = derive_pipeline(
        &dataset.pipeline,
        marketing_window.intensity,
        shares.pipeline,
        segment,
        mappings,
    );
    let revenue = derive_revenue(&dataset.revenue, &revenue_window, segment, shares.revenue);
    let overview = build_overview(&marketing, &pipeline, &revenue);

    debug!(
        event_name = "engine.derive.complete",
        period_days,
        segment = %segment,
        marketing_coverage = marketing_window.coverage,
        revenue_coverage = revenue_window.coverage,
        marketing_share = shares.marketing,
        pipeline_share = shares.pipeline,
        revenue_share = shares.revenue,
        "derived filtered view"
    );

    DerivedOutput { filters: filters.clone(), marketing, pipeline, revenue, overview }
}
