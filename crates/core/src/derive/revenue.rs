use crate::domain::dataset::{MrrComponents, RevenueData, RevenueTrendPoint, SegmentRecord};
use crate::domain::filters::SegmentFilter;
use crate::domain::view::{RevenueMetricsView, RevenueView, SegmentRow};
use crate::period::PeriodWindow;

const SEGMENT_CHURN_BASE: f64 = 0.9;
const SEGMENT_CHURN_WEIGHT: f64 = 0.3;

pub fn derive_revenue(
    data: &RevenueData,
    window: &PeriodWindow<RevenueTrendPoint>,
    segment: &SegmentFilter,
    share: f64,
) -> RevenueView {
    RevenueView {
        metrics: compute_metrics(data, window.intensity, segment, share),
        trends: build_trend_series(&window.points, share),
        segment_table: compute_segment_table(&data.segment_breakdown, window.intensity),
    }
}

/// Under a specific segment the bases are that segment's own record, so only
/// the time intensity is applied on top of them.
pub fn compute_metrics(
    data: &RevenueData,
    intensity: f64,
    segment: &SegmentFilter,
    share: f64,
) -> RevenueMetricsView {
    let base = &data.metrics;
    let (mrr, nrr, components, churn_rate) = match segment.segment_id() {
        Some(id) => {
            let record = data.segment(id).cloned().unwrap_or_default();
            let components = MrrComponents {
                new_mrr: record.new_mrr,
                expansion_mrr: record.expansion_mrr,
                contraction_mrr: record.contraction_mrr,
            };
            let churn_rate = base.churn_rate * (SEGMENT_CHURN_BASE + share * SEGMENT_CHURN_WEIGHT);
            (record.total_mrr, record.avg_nrr, components, churn_rate)
        }
        None => (base.total_mrr, base.avg_nrr, data.mrr_components, base.churn_rate * intensity),
    };

    let total_mrr = mrr * intensity;
    RevenueMetricsView {
        total_mrr,
        total_arr: total_mrr * 12.0,
        avg_nrr: nrr,
        churn_rate,
        mrr_components: MrrComponents {
            new_mrr: components.new_mrr * intensity,
            expansion_mrr: components.expansion_mrr * intensity,
            contraction_mrr: components.contraction_mrr * intensity,
        },
    }
}

pub fn build_trend_series(points: &[RevenueTrendPoint], share: f64) -> Vec<RevenueTrendPoint> {
    points
        .iter()
        .map(|point| RevenueTrendPoint { month: point.month.clone(), mrr: point.mrr * share })
        .collect()
}

pub fn compute_segment_table(breakdown: &[SegmentRecord], intensity: f64) -> Vec<SegmentRow> {
    breakdown
        .iter()
        .map(|record| SegmentRow {
            segment: record.segment.clone(),
            total_mrr: record.total_mrr * intensity,
            customer_count: record.customer_count,
            avg_arpa: record.avg_arpa,
            avg_nrr: record.avg_nrr,
            expansion_mrr: record.expansion_mrr * intensity,
        })
        .collect()
}
