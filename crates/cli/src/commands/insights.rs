use serde::Serialize;

use crate::commands::{open_dashboard, CommandResult};
use crate::ViewArgs;
use revlens_core::{Filters, Insight};

#[derive(Debug, Serialize)]
struct InsightsReport {
    filters: Filters,
    insights: Vec<Insight>,
}

pub fn run(args: &ViewArgs) -> CommandResult {
    let dashboard = match open_dashboard("insights", args) {
        Ok(dashboard) => dashboard,
        Err(failure) => return failure,
    };

    let report =
        InsightsReport { filters: dashboard.filters().clone(), insights: dashboard.insights() };
    CommandResult::success("insights", &report)
}
