//! Proportional weight of one customer segment within a domain's totals.
//!
//! Every share lies in `(0, 1]`. `all` is always `1`; an aggregate of zero
//! means there is nothing to apportion, so the view is left unscaled; a
//! segment with no weight of its own resolves to the configured fallback.

use crate::domain::dataset::{CanonicalDataset, SegmentAmounts, SegmentRecord};
use crate::domain::filters::SegmentFilter;

pub fn revenue_share(
    breakdown: &[SegmentRecord],
    segment: &SegmentFilter,
    fallback_share: f64,
) -> f64 {
    let Some(id) = segment.segment_id() else {
        return 1.0;
    };
    let total: f64 = breakdown.iter().map(|record| record.total_mrr).sum();
    if total == 0.0 {
        return 1.0;
    }

    breakdown
        .iter()
        .find(|record| record.segment == id)
        .map(|record| record.total_mrr / total)
        .filter(|share| *share > 0.0)
        .unwrap_or(fallback_share)
}

pub fn pipeline_share(
    deals_by_segment: &SegmentAmounts,
    segment: &SegmentFilter,
    fallback_share: f64,
) -> f64 {
    let Some(id) = segment.segment_id() else {
        return 1.0;
    };
    let total: f64 = deals_by_segment.values().sum();
    if total == 0.0 {
        return 1.0;
    }

    deals_by_segment
        .get(id)
        .map(|value| value / total)
        .filter(|share| *share > 0.0)
        .unwrap_or(fallback_share)
}

/// Marketing has no segment breakdown of its own and borrows revenue's.
pub fn marketing_share(
    breakdown: &[SegmentRecord],
    segment: &SegmentFilter,
    fallback_share: f64,
) -> f64 {
    revenue_share(breakdown, segment, fallback_share)
}

/// Shares for all three domains under one segment filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentShares {
    pub marketing: f64,
    pub pipeline: f64,
    pub revenue: f64,
}

impl SegmentShares {
    pub fn resolve(dataset: &CanonicalDataset, segment: &SegmentFilter, fallback_share: f64) -> Self {
        let breakdown = &dataset.revenue.segment_breakdown;
        Self {
            marketing: marketing_share(breakdown, segment, fallback_share),
            pipeline: pipeline_share(&dataset.pipeline.deals_by_segment, segment, fallback_share),
            revenue: revenue_share(breakdown, segment, fallback_share),
        }
    }
}
