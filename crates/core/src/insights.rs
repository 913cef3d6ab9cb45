use serde::{Deserialize, Serialize};

use crate::domain::view::DerivedOutput;
use crate::format::{calculate_share, format_currency};
use crate::overview::{mrr_trend, top_entity};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    StuckDeals,
    HealthyPipeline,
    TopChannel,
    TopSegment,
    Momentum,
}

impl InsightKind {
    pub fn icon(self) -> &'static str {
        match self {
            Self::StuckDeals => "⚠️",
            Self::HealthyPipeline => "✅",
            Self::TopChannel => "📈",
            Self::TopSegment => "💡",
            Self::Momentum => "🚀",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub icon: String,
    pub text: String,
}

impl Insight {
    fn new(kind: InsightKind, text: String) -> Self {
        Self { kind, icon: kind.icon().to_string(), text }
    }
}

/// Narrative highlights for a derived view, in display order. The stuck-deal
/// and momentum entries are always present.
pub fn build_insights(view: &DerivedOutput, stuck_deal_days: u32) -> Vec<Insight> {
    let mut insights = Vec::with_capacity(4);

    let stuck_deals = &view.pipeline.stuck_deals;
    match top_entity(stuck_deals, |deal| deal.amount) {
        Some(biggest) => insights.push(Insight::new(
            InsightKind::StuckDeals,
            format!(
                "{} deals are stuck {stuck_deal_days}+ days. Biggest: {} worth {} in {}.",
                stuck_deals.len(),
                biggest.deal_id,
                format_currency(biggest.amount),
                biggest.stage
            ),
        )),
        None => insights.push(Insight::new(
            InsightKind::HealthyPipeline,
            format!(
                "No deals are stuck beyond {stuck_deal_days} days. Pipeline velocity looks healthy."
            ),
        )),
    }

    if let Some(channel) = top_entity(&view.marketing.channels, |channel| channel.roi) {
        insights.push(Insight::new(
            InsightKind::TopChannel,
            format!(
                "{} leads marketing with {:.1}% ROI on {} spend.",
                channel.channel,
                channel.roi,
                format_currency(channel.spend)
            ),
        ));
    }

    let segments = &view.revenue.segment_table;
    if let Some(segment) = top_entity(segments, |segment| segment.total_mrr) {
        let total: f64 = segments.iter().map(|row| row.total_mrr).sum();
        insights.push(Insight::new(
            InsightKind::TopSegment,
            format!(
                "{} generates {:.1}% of MRR ({}).",
                segment.segment,
                calculate_share(segment.total_mrr, total),
                format_currency(segment.total_mrr)
            ),
        ));
    }

    insights.push(Insight::new(
        InsightKind::Momentum,
        format!("MRR momentum: {}.", mrr_trend(&view.revenue)),
    ));

    insights
}
