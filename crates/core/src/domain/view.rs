//! Derived, filter-adjusted output consumed by rendering collaborators.
//!
//! A [`DerivedOutput`] is produced whole by one derivation pass and is never
//! mutated afterwards.

use serde::{Deserialize, Serialize};

use super::dataset::{
    Channel, Deal, FunnelStage, MarketingMetrics, MarketingTrendPoint, MrrComponents,
    RevenueTrendPoint, SegmentAmounts, SegmentId,
};
use super::filters::Filters;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedOutput {
    pub filters: Filters,
    pub marketing: MarketingView,
    pub pipeline: PipelineView,
    pub revenue: RevenueView,
    pub overview: OverviewView,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketingView {
    pub metrics: MarketingMetrics,
    pub funnel: Vec<FunnelStage>,
    pub channels: Vec<Channel>,
    pub trends: Vec<MarketingTrendPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineView {
    pub metrics: PipelineMetricsView,
    pub stage_breakdown: Vec<StageView>,
    pub deals_by_segment: SegmentAmounts,
    pub stuck_deals: Vec<Deal>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMetricsView {
    pub total_pipeline: f64,
    pub weighted_pipeline: f64,
    pub avg_deal_size: f64,
    pub total_deals: u64,
    pub win_rate: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    pub stage: String,
    pub total_amount: f64,
    pub deal_count: u64,
    pub avg_amount: f64,
    pub avg_probability: f64,
    pub expected_value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueView {
    pub metrics: RevenueMetricsView,
    pub trends: Vec<RevenueTrendPoint>,
    pub segment_table: Vec<SegmentRow>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetricsView {
    #[serde(rename = "totalMRR")]
    pub total_mrr: f64,
    #[serde(rename = "totalARR")]
    pub total_arr: f64,
    #[serde(rename = "avgNRR")]
    pub avg_nrr: f64,
    #[serde(rename = "churnRate")]
    pub churn_rate: f64,
    #[serde(rename = "mrrComponents")]
    pub mrr_components: MrrComponents,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentRow {
    pub segment: SegmentId,
    #[serde(rename = "totalMRR")]
    pub total_mrr: f64,
    #[serde(rename = "customerCount")]
    pub customer_count: f64,
    #[serde(rename = "avgARPA")]
    pub avg_arpa: f64,
    #[serde(rename = "avgNRR")]
    pub avg_nrr: f64,
    #[serde(rename = "expansionMRR")]
    pub expansion_mrr: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewView {
    pub metrics: HeadlineMetrics,
    pub meta: OverviewMeta,
    pub highlights: Highlights,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadlineMetrics {
    #[serde(rename = "totalMRR")]
    pub total_mrr: f64,
    #[serde(rename = "pipelineValue")]
    pub pipeline_value: f64,
    #[serde(rename = "marketingROI")]
    pub marketing_roi: f64,
    #[serde(rename = "winRate")]
    pub win_rate: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewMeta {
    pub mrr: String,
    pub pipeline: String,
    pub roi: String,
    pub winrate: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    pub top_channel: String,
    pub largest_deal: String,
    pub top_segment: String,
}
