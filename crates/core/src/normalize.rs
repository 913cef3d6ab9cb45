//! Coerces an untrusted snapshot document into a [`CanonicalDataset`].
//!
//! Breakdown collections arrive either as an array of records or as a map
//! keyed by category. Both shapes resolve through the same alias table, so an
//! equivalent keyed map and record array normalize to identical output.
//! Missing or malformed fields default to zero and are never reported.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::dataset::{
    CanonicalDataset, Channel, Deal, FunnelStage, MarketingData, MarketingMetrics,
    MarketingTrendPoint, MrrComponents, PipelineData, PipelineMetrics, RevenueData,
    RevenueMetrics, RevenueTrendPoint, SegmentAmounts, SegmentRecord, Stage,
};

const STAGE_TOTAL_AMOUNT: &[&str] = &["totalAmount", "amount.sum", "amount", "sum"];
const STAGE_AVG_AMOUNT: &[&str] = &["avgAmount", "amount.mean", "mean"];
const STAGE_DEAL_COUNT: &[&str] = &["dealCount", "amount.count", "count"];
const STAGE_AVG_PROBABILITY: &[&str] = &["avgProbability", "probability.mean", "probability"];
const STAGE_EXPECTED_VALUE: &[&str] = &["expectedValue", "expected_value.sum", "expected_value"];

const SEGMENT_TOTAL_MRR: &[&str] = &["totalMRR", "mrr"];
const SEGMENT_NEW_MRR: &[&str] = &["newMRR", "new_mrr"];
const SEGMENT_EXPANSION_MRR: &[&str] = &["expansionMRR", "expansion_mrr"];
const SEGMENT_CONTRACTION_MRR: &[&str] = &["contractionMRR", "contraction_mrr"];
const SEGMENT_AVG_ARPA: &[&str] = &["avgARPA", "arpa"];
const SEGMENT_AVG_NRR: &[&str] = &["avgNRR", "nrr"];
const SEGMENT_CUSTOMER_COUNT: &[&str] = &["customerCount", "customers"];

const SEGMENT_DEAL_VALUE: &[&str] = &["amount", "value", "total"];

/// The two accepted collection shapes, plus everything else.
#[derive(Debug)]
enum Shape<'a> {
    Records(&'a [Value]),
    Keyed(&'a Map<String, Value>),
    Missing,
}

impl<'a> Shape<'a> {
    fn detect(field: &'static str, value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Array(items)) => Self::Records(items),
            Some(Value::Object(map)) => Self::Keyed(map),
            None | Some(Value::Null) => Self::Missing,
            Some(other) => {
                debug!(
                    event_name = "engine.normalize.shape_defaulted",
                    field,
                    found = json_kind(other),
                    "collection has an unsupported shape; using an empty default"
                );
                Self::Missing
            }
        }
    }
}

pub fn normalize(raw: &Value) -> CanonicalDataset {
    let marketing = raw.get("marketing");
    let pipeline = raw.get("pipeline");
    let revenue = raw.get("revenue");

    let dataset = CanonicalDataset {
        marketing: normalize_marketing(marketing),
        pipeline: normalize_pipeline(pipeline),
        revenue: normalize_revenue(revenue),
        benchmarks: match raw.get("benchmarks") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
    };

    debug!(
        event_name = "engine.normalize.complete",
        channels = dataset.marketing.channel_performance.len(),
        marketing_points = dataset.marketing.trends_data.len(),
        stages = dataset.pipeline.stage_breakdown.len(),
        stuck_deals = dataset.pipeline.stuck_deals.len(),
        segments = dataset.revenue.segment_breakdown.len(),
        revenue_points = dataset.revenue.trends_data.len(),
        "snapshot normalized"
    );

    dataset
}

fn normalize_marketing(domain: Option<&Value>) -> MarketingData {
    let metrics = metrics_map(domain);
    MarketingData {
        metrics: MarketingMetrics {
            total_spend: number(metrics, &["totalSpend"]),
            total_leads: number(metrics, &["totalLeads"]),
            total_mqls: number(metrics, &["totalMQLs"]),
            total_sqls: number(metrics, &["totalSQLs"]),
            total_opportunities: number(metrics, &["totalOpportunities"]),
            total_closed_won: number(metrics, &["totalClosedWon"]),
            avg_cac: number(metrics, &["avgCAC"]),
            avg_roi: number(metrics, &["avgROI"]),
        },
        channel_performance: collect_records(
            "marketing.channelPerformance",
            field(domain, "channelPerformance"),
            "channel",
            |channel, record| Channel {
                channel,
                spend: number(record, &["spend"]),
                leads: number(record, &["leads"]),
                mqls: number(record, &["MQLs", "mqls"]),
                sqls: number(record, &["SQLs", "sqls"]),
                opportunities: number(record, &["opportunities"]),
                closed_won: number(record, &["closed_won", "closedWon"]),
                roi: number(record, &["ROI", "roi"]),
                cac: number(record, &["CAC", "cac"]),
            },
        ),
        funnel_data: normalize_funnel(field(domain, "funnelData")),
        trends_data: collect_records(
            "marketing.trendsData",
            field(domain, "trendsData"),
            "date",
            |date, record| MarketingTrendPoint {
                date,
                leads: number(record, &["leads"]),
                mqls: number(record, &["MQLs", "mqls"]),
                sqls: number(record, &["SQLs", "sqls"]),
            },
        ),
    }
}

fn normalize_funnel(value: Option<&Value>) -> Vec<FunnelStage> {
    match Shape::detect("marketing.funnelData", value) {
        Shape::Records(items) => items
            .iter()
            .filter(|item| item.is_object())
            .map(|item| FunnelStage {
                stage: text(item, &["stage"]).unwrap_or_default(),
                count: number(item, &["count"]),
            })
            .collect(),
        Shape::Keyed(map) => map
            .iter()
            .map(|(stage, count)| FunnelStage {
                stage: stage.clone(),
                count: count.as_f64().filter(|n| n.is_finite()).unwrap_or_else(|| number(count, &["count"])),
            })
            .collect(),
        Shape::Missing => Vec::new(),
    }
}

fn normalize_pipeline(domain: Option<&Value>) -> PipelineData {
    let metrics = metrics_map(domain);
    PipelineData {
        metrics: PipelineMetrics {
            total_pipeline: number(metrics, &["totalPipeline"]),
            weighted_pipeline: number(metrics, &["weightedPipeline"]),
            avg_deal_size: number(metrics, &["avgDealSize"]),
            total_deals: number(metrics, &["totalDeals"]),
            avg_probability: number(metrics, &["avgProbability"]),
            win_rate: number(metrics, &["winRate"]),
        },
        stage_breakdown: collect_records(
            "pipeline.stageBreakdown",
            field(domain, "stageBreakdown"),
            "stage",
            |stage, record| Stage {
                stage,
                total_amount: number(record, STAGE_TOTAL_AMOUNT),
                avg_amount: number(record, STAGE_AVG_AMOUNT),
                deal_count: number(record, STAGE_DEAL_COUNT),
                avg_probability: number(record, STAGE_AVG_PROBABILITY),
                expected_value: number(record, STAGE_EXPECTED_VALUE),
            },
        ),
        deals_by_segment: normalize_deals_by_segment(field(domain, "dealsBySegment")),
        stuck_deals: collect_records(
            "pipeline.stuckDeals",
            field(domain, "stuckDeals"),
            "dealId",
            |deal_id, record| Deal {
                deal_id: if deal_id.is_empty() {
                    text(record, &["deal_id"]).unwrap_or_default()
                } else {
                    deal_id
                },
                account: text(record, &["account"]).unwrap_or_default(),
                stage: text(record, &["stage"]).unwrap_or_default(),
                amount: number(record, &["amount"]),
                days_in_stage: whole_days(number(record, &["daysInStage", "days_in_stage"])),
                owner: text(record, &["owner"]).unwrap_or_default(),
                probability: number(record, &["probability"]),
            },
        ),
    }
}

fn normalize_deals_by_segment(value: Option<&Value>) -> SegmentAmounts {
    match Shape::detect("pipeline.dealsBySegment", value) {
        Shape::Keyed(map) => map
            .iter()
            .map(|(segment, amount)| {
                let amount = amount
                    .as_f64()
                    .filter(|n| n.is_finite())
                    .unwrap_or_else(|| number(amount, SEGMENT_DEAL_VALUE));
                (segment.clone(), amount)
            })
            .collect(),
        Shape::Records(items) => items
            .iter()
            .filter_map(|item| {
                let segment = text(item, &["segment"])?;
                Some((segment, number(item, SEGMENT_DEAL_VALUE)))
            })
            .collect(),
        Shape::Missing => SegmentAmounts::new(),
    }
}

fn normalize_revenue(domain: Option<&Value>) -> RevenueData {
    let metrics = metrics_map(domain);
    let components = field(domain, "mrrComponents").unwrap_or(&Value::Null);
    RevenueData {
        metrics: RevenueMetrics {
            total_mrr: number(metrics, &["totalMRR"]),
            total_arr: number(metrics, &["totalARR"]),
            avg_arpa: number(metrics, &["avgARPA"]),
            avg_nrr: number(metrics, &["avgNRR"]),
            total_customers: number(metrics, &["totalCustomers"]),
            churned_customers: number(metrics, &["churnedCustomers"]),
            churn_rate: number(metrics, &["churnRate"]),
        },
        segment_breakdown: collect_records(
            "revenue.segmentBreakdown",
            field(domain, "segmentBreakdown"),
            "segment",
            |segment, record| SegmentRecord {
                segment,
                total_mrr: number(record, SEGMENT_TOTAL_MRR),
                new_mrr: number(record, SEGMENT_NEW_MRR),
                expansion_mrr: number(record, SEGMENT_EXPANSION_MRR),
                contraction_mrr: number(record, SEGMENT_CONTRACTION_MRR),
                avg_arpa: number(record, SEGMENT_AVG_ARPA),
                avg_nrr: number(record, SEGMENT_AVG_NRR),
                customer_count: number(record, SEGMENT_CUSTOMER_COUNT),
            },
        ),
        mrr_components: MrrComponents {
            new_mrr: number(components, &["new_mrr"]),
            expansion_mrr: number(components, &["expansion_mrr"]),
            contraction_mrr: number(components, &["contraction_mrr"]),
        },
        trends_data: collect_records(
            "revenue.trendsData",
            field(domain, "trendsData"),
            "month",
            |month, record| RevenueTrendPoint {
                month: if month.is_empty() { text(record, &["date"]).unwrap_or_default() } else { month },
                mrr: number(record, &["mrr"]),
            },
        ),
    }
}

/// Converts either collection shape into records.
///
/// For keyed input the map key fills the identifier field unless the value
/// carries a non-empty identifier of its own.
fn collect_records<T>(
    name: &'static str,
    value: Option<&Value>,
    id_field: &str,
    build: impl Fn(String, &Value) -> T,
) -> Vec<T> {
    match Shape::detect(name, value) {
        Shape::Records(items) => items
            .iter()
            .filter(|item| item.is_object())
            .map(|item| build(text(item, &[id_field]).unwrap_or_default(), item))
            .collect(),
        Shape::Keyed(map) => map
            .iter()
            .map(|(key, item)| {
                let id = text(item, &[id_field])
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| key.clone());
                build(id, item)
            })
            .collect(),
        Shape::Missing => Vec::new(),
    }
}

fn field<'a>(domain: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    domain.and_then(|value| value.get(name))
}

fn metrics_map(domain: Option<&Value>) -> &Value {
    field(domain, "metrics").unwrap_or(&Value::Null)
}

/// First alias that resolves to a finite number wins; dotted aliases walk
/// into nested objects.
fn number(record: &Value, aliases: &[&str]) -> f64 {
    aliases
        .iter()
        .filter_map(|alias| lookup(record, alias))
        .find_map(|value| value.as_f64().filter(|n| n.is_finite()))
        .unwrap_or(0.0)
}

fn text(record: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().filter_map(|alias| lookup(record, alias)).find_map(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |current, segment| current.get(segment))
}

fn whole_days(value: f64) -> u32 {
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
