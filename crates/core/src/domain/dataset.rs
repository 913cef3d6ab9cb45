use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type SegmentId = String;

/// Per-segment amounts in snapshot order.
pub type SegmentAmounts = IndexMap<SegmentId, f64>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDataset {
    pub marketing: MarketingData,
    pub pipeline: PipelineData,
    pub revenue: RevenueData,
    pub benchmarks: Vec<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingData {
    pub metrics: MarketingMetrics,
    pub channel_performance: Vec<Channel>,
    pub funnel_data: Vec<FunnelStage>,
    pub trends_data: Vec<MarketingTrendPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineData {
    pub metrics: PipelineMetrics,
    pub stage_breakdown: Vec<Stage>,
    pub deals_by_segment: SegmentAmounts,
    pub stuck_deals: Vec<Deal>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueData {
    pub metrics: RevenueMetrics,
    pub segment_breakdown: Vec<SegmentRecord>,
    pub mrr_components: MrrComponents,
    pub trends_data: Vec<RevenueTrendPoint>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketingMetrics {
    #[serde(rename = "totalSpend")]
    pub total_spend: f64,
    #[serde(rename = "totalLeads")]
    pub total_leads: f64,
    #[serde(rename = "totalMQLs")]
    pub total_mqls: f64,
    #[serde(rename = "totalSQLs")]
    pub total_sqls: f64,
    #[serde(rename = "totalOpportunities")]
    pub total_opportunities: f64,
    #[serde(rename = "totalClosedWon")]
    pub total_closed_won: f64,
    #[serde(rename = "avgCAC")]
    pub avg_cac: f64,
    #[serde(rename = "avgROI")]
    pub avg_roi: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMetrics {
    pub total_pipeline: f64,
    pub weighted_pipeline: f64,
    pub avg_deal_size: f64,
    pub total_deals: f64,
    pub avg_probability: f64,
    pub win_rate: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetrics {
    #[serde(rename = "totalMRR")]
    pub total_mrr: f64,
    #[serde(rename = "totalARR")]
    pub total_arr: f64,
    #[serde(rename = "avgARPA")]
    pub avg_arpa: f64,
    #[serde(rename = "avgNRR")]
    pub avg_nrr: f64,
    #[serde(rename = "totalCustomers")]
    pub total_customers: f64,
    #[serde(rename = "churnedCustomers")]
    pub churned_customers: f64,
    #[serde(rename = "churnRate")]
    pub churn_rate: f64,
}

/// Month-over-month MRR movement, keyed the way the snapshot exporter writes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MrrComponents {
    pub new_mrr: f64,
    pub expansion_mrr: f64,
    pub contraction_mrr: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub channel: String,
    pub spend: f64,
    pub leads: f64,
    #[serde(rename = "MQLs")]
    pub mqls: f64,
    #[serde(rename = "SQLs")]
    pub sqls: f64,
    pub opportunities: f64,
    pub closed_won: f64,
    #[serde(rename = "ROI")]
    pub roi: f64,
    #[serde(rename = "CAC")]
    pub cac: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage: String,
    pub count: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketingTrendPoint {
    pub date: String,
    pub leads: f64,
    #[serde(rename = "MQLs")]
    pub mqls: f64,
    #[serde(rename = "SQLs")]
    pub sqls: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub stage: String,
    pub total_amount: f64,
    pub avg_amount: f64,
    pub deal_count: f64,
    pub avg_probability: f64,
    pub expected_value: f64,
}

/// A pipeline deal flagged as stuck by the snapshot exporter.
///
/// Segment membership is not carried on the record; see
/// [`SegmentMappings::deal_segments`](crate::config::SegmentMappings).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub deal_id: String,
    pub account: String,
    pub stage: String,
    pub amount: f64,
    pub days_in_stage: u32,
    pub owner: String,
    pub probability: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub segment: SegmentId,
    #[serde(rename = "totalMRR")]
    pub total_mrr: f64,
    #[serde(rename = "newMRR")]
    pub new_mrr: f64,
    #[serde(rename = "expansionMRR")]
    pub expansion_mrr: f64,
    #[serde(rename = "contractionMRR")]
    pub contraction_mrr: f64,
    #[serde(rename = "avgARPA")]
    pub avg_arpa: f64,
    #[serde(rename = "avgNRR")]
    pub avg_nrr: f64,
    #[serde(rename = "customerCount")]
    pub customer_count: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueTrendPoint {
    pub month: String,
    pub mrr: f64,
}

impl RevenueData {
    pub fn segment(&self, segment: &str) -> Option<&SegmentRecord> {
        self.segment_breakdown.iter().find(|record| record.segment == segment)
    }
}
