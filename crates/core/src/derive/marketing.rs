use crate::domain::dataset::{
    Channel, FunnelStage, MarketingData, MarketingMetrics, MarketingTrendPoint,
};
use crate::domain::view::MarketingView;
use crate::period::PeriodWindow;

const ROI_WINDOW_BASE: f64 = 0.85;
const ROI_WINDOW_WEIGHT: f64 = 0.3;

/// Factors applied to every marketing quantity in one pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarketingScaling {
    pub coverage: f64,
    pub intensity: f64,
    pub share: f64,
    pub roi_adjustment: f64,
}

impl MarketingScaling {
    fn additive(&self) -> f64 {
        self.intensity * self.share
    }

    /// ROI reacts to window length separately from the intensity transform.
    fn roi(&self, base_roi: f64) -> f64 {
        base_roi * self.roi_adjustment * (ROI_WINDOW_BASE + self.coverage * ROI_WINDOW_WEIGHT)
    }
}

pub fn derive_marketing(
    data: &MarketingData,
    window: &PeriodWindow<MarketingTrendPoint>,
    share: f64,
    roi_adjustment: f64,
) -> MarketingView {
    let scaling = MarketingScaling {
        coverage: window.coverage,
        intensity: window.intensity,
        share,
        roi_adjustment,
    };
    let metrics = compute_metrics(&data.metrics, &window.points, scaling);

    MarketingView {
        funnel: build_funnel(&metrics),
        channels: compute_channels(&data.channel_performance, scaling),
        trends: build_trend_series(&window.points, share),
        metrics,
    }
}

/// Lead counts come from the filtered trend points; opportunities and
/// closed-won follow from the snapshot's aggregate conversion ratios.
pub fn compute_metrics(
    base: &MarketingMetrics,
    points: &[MarketingTrendPoint],
    scaling: MarketingScaling,
) -> MarketingMetrics {
    let (leads, mqls, sqls) = points.iter().fold((0.0, 0.0, 0.0), |(leads, mqls, sqls), point| {
        (leads + point.leads, mqls + point.mqls, sqls + point.sqls)
    });

    let spend = base.total_spend * scaling.additive();
    let opportunity_ratio = base.total_opportunities / base.total_sqls.max(1.0);
    let closed_won_ratio = base.total_closed_won / base.total_opportunities.max(1.0);
    let total_opportunities = sqls * opportunity_ratio * scaling.share;

    MarketingMetrics {
        total_spend: spend,
        total_leads: leads * scaling.share,
        total_mqls: mqls * scaling.share,
        total_sqls: sqls * scaling.share,
        total_opportunities,
        total_closed_won: total_opportunities * closed_won_ratio,
        avg_cac: if leads > 0.0 { spend / leads } else { base.avg_cac },
        avg_roi: scaling.roi(base.avg_roi),
    }
}

pub fn compute_channels(channels: &[Channel], scaling: MarketingScaling) -> Vec<Channel> {
    let factor = scaling.additive();
    channels
        .iter()
        .map(|channel| {
            let spend = channel.spend * factor;
            let leads = channel.leads * factor;
            Channel {
                channel: channel.channel.clone(),
                spend,
                leads,
                mqls: channel.mqls * factor,
                sqls: channel.sqls * factor,
                opportunities: channel.opportunities * factor,
                closed_won: channel.closed_won * factor,
                roi: scaling.roi(channel.roi),
                cac: if leads > 0.0 { spend / leads } else { channel.cac },
            }
        })
        .collect()
}

pub fn build_funnel(metrics: &MarketingMetrics) -> Vec<FunnelStage> {
    [
        ("Leads", metrics.total_leads),
        ("MQLs", metrics.total_mqls),
        ("SQLs", metrics.total_sqls),
        ("Opportunities", metrics.total_opportunities),
        ("Closed Won", metrics.total_closed_won),
    ]
    .into_iter()
    .map(|(stage, count)| FunnelStage { stage: stage.to_string(), count })
    .collect()
}

pub fn build_trend_series(points: &[MarketingTrendPoint], share: f64) -> Vec<MarketingTrendPoint> {
    points
        .iter()
        .map(|point| MarketingTrendPoint {
            date: point.date.clone(),
            leads: point.leads * share,
            mqls: point.mqls * share,
            sqls: point.sqls * share,
        })
        .collect()
}
