use crate::config::SegmentMappings;
use crate::domain::dataset::{Deal, PipelineData, PipelineMetrics, SegmentAmounts, Stage};
use crate::domain::filters::SegmentFilter;
use crate::domain::view::{PipelineMetricsView, PipelineView, StageView};

const DEAL_FACTOR_FLOOR: f64 = 0.35;
const STAGE_SHARE_FLOOR: f64 = 0.3;
const WIN_RATE_MIN: f64 = 3.0;
const WIN_RATE_MAX: f64 = 95.0;

pub fn derive_pipeline(
    data: &PipelineData,
    intensity: f64,
    share: f64,
    segment: &SegmentFilter,
    mappings: &SegmentMappings,
) -> PipelineView {
    PipelineView {
        metrics: compute_metrics(&data.metrics, intensity, share),
        stage_breakdown: compute_stages(&data.stage_breakdown, intensity, share),
        deals_by_segment: compute_segments(&data.deals_by_segment, intensity, segment),
        stuck_deals: stuck_deals_for(&data.stuck_deals, segment, mappings),
    }
}

/// Deal counts never fall below 35% of the snapshot, while pipeline value
/// scales fully; average deal size is recomputed from the two.
pub fn compute_metrics(base: &PipelineMetrics, intensity: f64, share: f64) -> PipelineMetricsView {
    let value_factor = intensity * share;
    let deal_factor = value_factor.max(DEAL_FACTOR_FLOOR);

    let total_pipeline = base.total_pipeline * value_factor;
    let total_deals = (base.total_deals * deal_factor).round().max(1.0) as u64;

    PipelineMetricsView {
        total_pipeline,
        weighted_pipeline: base.weighted_pipeline * value_factor,
        avg_deal_size: total_pipeline / total_deals as f64,
        total_deals,
        win_rate: win_rate(base.win_rate, share, intensity),
    }
}

/// Win rate in percent, kept inside `[3, 95]`.
pub fn win_rate(base: f64, share: f64, intensity: f64) -> f64 {
    (base * (0.85 + share * 0.3) * (0.85 + intensity * 0.3)).clamp(WIN_RATE_MIN, WIN_RATE_MAX)
}

pub fn compute_stages(stages: &[Stage], intensity: f64, share: f64) -> Vec<StageView> {
    let value_factor = intensity * share;
    stages
        .iter()
        .map(|stage| {
            let total_amount = stage.total_amount * value_factor;
            let deal_count = scaled_stage_count(stage.deal_count, share);
            StageView {
                stage: stage.stage.clone(),
                total_amount,
                deal_count,
                avg_amount: total_amount / deal_count as f64,
                avg_probability: stage.avg_probability,
                expected_value: stage.expected_value * value_factor,
            }
        })
        .collect()
}

/// Every stage reports at least one deal after scaling, even an empty one.
pub fn scaled_stage_count(base_count: f64, share: f64) -> u64 {
    (base_count * share.max(STAGE_SHARE_FLOOR)).round().max(1.0) as u64
}

pub fn compute_segments(
    deals_by_segment: &SegmentAmounts,
    intensity: f64,
    segment: &SegmentFilter,
) -> SegmentAmounts {
    match segment.segment_id() {
        Some(id) => {
            let value = deals_by_segment.get(id).copied().unwrap_or(0.0);
            SegmentAmounts::from([(id.to_string(), value * intensity)])
        }
        None => deals_by_segment
            .iter()
            .map(|(segment, value)| (segment.clone(), value * intensity))
            .collect(),
    }
}

/// Segment membership comes only from the configured deal lookup.
pub fn stuck_deals_for(deals: &[Deal], segment: &SegmentFilter, mappings: &SegmentMappings) -> Vec<Deal> {
    match segment.segment_id() {
        None => deals.to_vec(),
        Some(id) => deals
            .iter()
            .filter(|deal| mappings.deal_segment(&deal.deal_id) == Some(id))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
        use super::{
        compute_metrics, compute_segments, compute_stages, scaled_stage_count, stuck_deals_for,
        win_rate,
    };
    use crate::config::SegmentMappings;
    use crate::domain::dataset::{Deal, PipelineMetrics, SegmentAmounts, Stage};
    use crate::domain::filters::SegmentFilter;

    fn base() -> PipelineMetrics {
        PipelineMetrics {
            total_pipeline: 2_000_000.0,
            weighted_pipeline: 800_000.0,
            avg_deal_size: 20_000.0,
            total_deals: 100.0,
            avg_probability: 0.4,
            win_rate: 25.0,
        }
    }

    fn deal(id: &str, amount: f64) -> Deal {
        Deal { deal_id: id.to_string(), amount, ..Deal::default() }
    }

    #[test]
    fn deal_count_uses_floored_factor_but_value_does_not() {
        let metrics = compute_metrics(&base(), 0.55, 0.2);

        assert!((metrics.total_pipeline - 2_000_000.0 * 0.11).abs() < 1e-6);
        assert!((metrics.weighted_pipeline - 800_000.0 * 0.11).abs() < 1e-6);
        assert_eq!(metrics.total_deals, 35);
        assert!((metrics.avg_deal_size - metrics.total_pipeline / 35.0).abs() < 1e-9);
    }

    #[test]
    fn full_view_keeps_snapshot_values() {
        let metrics = compute_metrics(&base(), 1.0, 1.0);
        assert_eq!(metrics.total_deals, 100);
        assert_eq!(metrics.total_pipeline, 2_000_000.0);
        assert!((metrics.win_rate - 25.0 * 1.15 * 1.15).abs() < 1e-9);
    }

    #[test]
    fn empty_snapshot_still_reports_one_deal() {
        let metrics = compute_metrics(&PipelineMetrics::default(), 1.0, 1.0);
        assert_eq!(metrics.total_deals, 1);
        assert_eq!(metrics.avg_deal_size, 0.0);
        assert_eq!(metrics.win_rate, 3.0);
    }

    #[test]
    fn win_rate_stays_within_bounds() {
        let grid = [0.0, 0.1, 0.25, 0.5, 0.75, 1.0];
        for base in [0.0, 1.0, 2.5, 40.0, 80.0, 99.0, 100.0, 250.0] {
            for share in grid {
                for intensity in grid {
                    let rate = win_rate(base, share, intensity);
                    assert!((3.0..=95.0).contains(&rate), "{base} {share} {intensity} -> {rate}");
                }
            }
        }
    }

    #[test]
    fn stage_counts_never_drop_to_zero() {
        for base_count in [0.0, 1.0, 2.0, 3.0, 7.0, 40.0] {
            for share in [0.01, 0.1, 0.3, 0.5, 0.99, 1.0] {
                assert!(scaled_stage_count(base_count, share) >= 1);
            }
        }
        assert_eq!(scaled_stage_count(0.0, 1.0), 1);
        assert_eq!(scaled_stage_count(20.0, 0.1), 6);
        assert_eq!(scaled_stage_count(20.0, 0.5), 10);
    }

    #[test]
    fn stage_average_is_recomputed_after_scaling() {
        let stages = vec![
            Stage {
                stage: "Negotiation".to_string(),
                total_amount: 300_000.0,
                avg_amount: 60_000.0,
                deal_count: 5.0,
                avg_probability: 0.7,
                expected_value: 210_000.0,
            },
            Stage { stage: "Empty".to_string(), avg_amount: 12.0, ..Stage::default() },
        ];
        let derived = compute_stages(&stages, 0.7, 0.5);

        let negotiation = &derived[0];
        assert!((negotiation.total_amount - 105_000.0).abs() < 1e-6);
        assert_eq!(negotiation.deal_count, 3);
        assert!((negotiation.avg_amount - 35_000.0).abs() < 1e-6);
        assert_eq!(negotiation.avg_probability, 0.7);
        assert!((negotiation.expected_value - 73_500.0).abs() < 1e-6);

        assert_eq!(derived[1].deal_count, 1);
        assert_eq!(derived[1].avg_amount, 0.0);
    }

    #[test]
    fn empty_stage_with_value_reports_one_deal() {
        let stages = vec![Stage {
            stage: "Closed".to_string(),
            total_amount: 5_000.0,
            deal_count: 0.0,
            ..Stage::default()
        }];
        let derived = compute_stages(&stages, 1.0, 1.0);

        assert_eq!(derived[0].deal_count, 1);
        assert!((derived[0].avg_amount - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn segment_rollup_narrows_to_active_segment() {
        let deals = SegmentAmounts::from([("SMB".to_string(), 100.0), ("ENT".to_string(), 300.0)]);

        let all = compute_segments(&deals, 0.5, &SegmentFilter::All);
        assert_eq!(all.get("SMB"), Some(&50.0));
        assert_eq!(all.get("ENT"), Some(&150.0));
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["SMB", "ENT"]);

        let ent = compute_segments(&deals, 0.5, &SegmentFilter::parse("ENT"));
        assert_eq!(ent.len(), 1);
        assert_eq!(ent.get("ENT"), Some(&150.0));

        let missing = compute_segments(&deals, 0.5, &SegmentFilter::parse("MM"));
        assert_eq!(missing.get("MM"), Some(&0.0));
    }

    #[test]
    fn stuck_deals_filter_through_static_lookup() {
        let mappings = SegmentMappings::default();
        let deals = vec![
            deal("DEAL_0002", 10_000.0),
            deal("DEAL_0007", 90_000.0),
            deal("DEAL_9999", 50_000.0),
            deal("DEAL_0013", 5_000.0),
        ];

        assert_eq!(stuck_deals_for(&deals, &SegmentFilter::All, &mappings), deals);

        let smb: Vec<String> = stuck_deals_for(&deals, &SegmentFilter::parse("SMB"), &mappings)
            .into_iter()
            .map(|deal| deal.deal_id)
            .collect();
        assert_eq!(smb, vec!["DEAL_0002", "DEAL_0013"]);

        let ent = stuck_deals_for(&deals, &SegmentFilter::parse("ENT"), &mappings);
        assert_eq!(ent.len(), 1);
        assert_eq!(ent[0].deal_id, "DEAL_0007");

        assert!(stuck_deals_for(&deals, &SegmentFilter::parse("GOV"), &mappings).is_empty());
    }
}
