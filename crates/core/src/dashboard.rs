//! Stateful session over one loaded snapshot.
//!
//! The dataset is read once and shared. Every filter change runs a complete
//! derivation and swaps the output `Arc` in a single assignment, so a reader
//! that cloned the previous `Arc` keeps a consistent bundle.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::config::EngineConfig;
use crate::derive::{HeuristicViewDeriver, ViewDeriver};
use crate::domain::dataset::CanonicalDataset;
use crate::domain::filters::{Filters, SegmentFilter};
use crate::domain::view::DerivedOutput;
use crate::errors::ApplicationError;
use crate::insights::{build_insights, Insight};
use crate::loader;

pub struct Dashboard<D = HeuristicViewDeriver> {
    dataset: Arc<CanonicalDataset>,
    deriver: D,
    filters: Filters,
    view: Arc<DerivedOutput>,
    stuck_deal_days: u32,
}

impl Dashboard<HeuristicViewDeriver> {
    /// Loads the snapshot named by `config.data.path`.
    pub fn load(config: &EngineConfig) -> Result<Self, ApplicationError> {
        let dataset = loader::load_from_path(&config.data.path)?;
        Ok(Self::from_dataset(dataset, config))
    }

    pub fn from_raw(raw: &Value, config: &EngineConfig) -> Result<Self, ApplicationError> {
        let dataset = loader::load_from_value(raw)?;
        Ok(Self::from_dataset(dataset, config))
    }

    pub fn from_dataset(dataset: CanonicalDataset, config: &EngineConfig) -> Self {
        Self::with_deriver(dataset, HeuristicViewDeriver::from_config(config), config)
    }
}

impl<D: ViewDeriver> Dashboard<D> {
    pub fn with_deriver(dataset: CanonicalDataset, deriver: D, config: &EngineConfig) -> Self {
        let dataset = Arc::new(dataset);
        let filters = Filters::new(
            config.filters.default_period_days,
            config.filters.default_segment.clone(),
        );
        let view = Arc::new(deriver.derive(&dataset, &filters));

        Self { dataset, deriver, filters, view, stuck_deal_days: config.insights.stuck_deal_days }
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn dataset(&self) -> Arc<CanonicalDataset> {
        Arc::clone(&self.dataset)
    }

    pub fn view(&self) -> Arc<DerivedOutput> {
        Arc::clone(&self.view)
    }

    pub fn set_period_days(&mut self, period_days: u32) -> Arc<DerivedOutput> {
        let filters = self.filters.with_period_days(period_days);
        self.set_filters(filters)
    }

    pub fn set_segment(&mut self, segment: impl Into<SegmentFilter>) -> Arc<DerivedOutput> {
        let filters = self.filters.with_segment(segment.into());
        self.set_filters(filters)
    }

    /// Always recomputes, even when `filters` equals the current ones.
    pub fn set_filters(&mut self, filters: Filters) -> Arc<DerivedOutput> {
        let view = Arc::new(self.deriver.derive(&self.dataset, &filters));
        info!(
            event_name = "engine.derive.filters_applied",
            period_days = filters.period_days,
            segment = %filters.segment,
            "dashboard filters applied"
        );
        self.filters = filters;
        self.view = view;
        self.view()
    }

    pub fn insights(&self) -> Vec<Insight> {
        build_insights(&self.view, self.stuck_deal_days)
    }
}
