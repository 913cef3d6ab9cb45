//! Cross-domain summary built from already-derived domain views.

use std::fmt;

use crate::domain::view::{
    HeadlineMetrics, Highlights, MarketingView, OverviewMeta, OverviewView, PipelineView,
    RevenueView,
};
use crate::format::{format_currency, format_number};

pub const NO_CHANNEL_DATA: &str = "No channel data";
pub const NO_STUCK_DEALS: &str = "No stuck deals 🎉";
pub const NO_SEGMENT_DATA: &str = "No segment data";

/// Greatest item by `key`; ties keep the first one encountered.
pub fn top_entity<T, F>(items: &[T], key: F) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    items.iter().fold(None, |best, item| match best {
        Some(current) if key(item) <= key(current) => Some(current),
        _ => Some(item),
    })
}

/// Movement between the last two points of a trend series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrendDelta {
    NoData,
    /// Not enough history for a ratio; carries the latest value.
    Current(f64),
    /// Percentage change against the previous point.
    Change(f64),
}

impl TrendDelta {
    pub fn from_series(values: &[f64]) -> Self {
        match values {
            [] => Self::NoData,
            [.., previous, latest] if *previous != 0.0 => {
                Self::Change((latest - previous) / previous.abs() * 100.0)
            }
            [.., latest] => Self::Current(*latest),
        }
    }
}

impl fmt::Display for TrendDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => f.write_str("Tracking…"),
            Self::Current(latest) => write!(f, "{} current", format_currency(*latest)),
            Self::Change(delta) if *delta >= 0.0 => write!(f, "▲ +{delta:.1}% vs prior month"),
            Self::Change(delta) => write!(f, "▼ {delta:.1}% vs prior month"),
        }
    }
}

pub fn mrr_trend(revenue: &RevenueView) -> TrendDelta {
    let values: Vec<f64> = revenue.trends.iter().map(|point| point.mrr).collect();
    TrendDelta::from_series(&values)
}

pub fn build_overview(
    marketing: &MarketingView,
    pipeline: &PipelineView,
    revenue: &RevenueView,
) -> OverviewView {
    let top_channel = top_entity(&marketing.channels, |channel| channel.roi);
    let largest_deal = top_entity(&pipeline.stuck_deals, |deal| deal.amount);
    let top_segment = top_entity(&revenue.segment_table, |segment| segment.total_mrr);

    OverviewView {
        metrics: HeadlineMetrics {
            total_mrr: revenue.metrics.total_mrr,
            pipeline_value: pipeline.metrics.total_pipeline,
            marketing_roi: marketing.metrics.avg_roi,
            win_rate: pipeline.metrics.win_rate,
        },
        meta: OverviewMeta {
            mrr: mrr_trend(revenue).to_string(),
            pipeline: format!("Weighted: {}", format_currency(pipeline.metrics.weighted_pipeline)),
            roi: format!("{} channels active", marketing.channels.len()),
            winrate: format!(
                "{} total deals",
                format_number(pipeline.metrics.total_deals as f64)
            ),
        },
        highlights: Highlights {
            top_channel: top_channel.map_or_else(
                || NO_CHANNEL_DATA.to_string(),
                |channel| format!("{} ({:.1}% ROI)", channel.channel, channel.roi),
            ),
            largest_deal: largest_deal.map_or_else(
                || NO_STUCK_DEALS.to_string(),
                |deal| format!("{} ({})", format_currency(deal.amount), deal.account),
            ),
            top_segment: top_segment.map_or_else(
                || NO_SEGMENT_DATA.to_string(),
                |segment| {
                    format!("{} ({} MRR)", segment.segment, format_currency(segment.total_mrr))
                },
            ),
        },
    }
}
