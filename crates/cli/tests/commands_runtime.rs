use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use revlens_cli::commands::{config, derive, insights};
use revlens_cli::ViewArgs;
use serde_json::Value;
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
    "marketing": {
        "metrics": { "totalSpend": 90000, "avgROI": 150, "avgCAC": 30 },
        "channelPerformance": [
            { "channel": "Paid Search", "spend": 40000, "leads": 1200, "ROI": 190 },
            { "channel": "Webinars", "spend": 15000, "leads": 300, "ROI": 220 }
        ],
        "trendsData": [
            { "date": "2024-10-01", "leads": 400, "MQLs": 160, "SQLs": 60 },
            { "date": "2024-11-01", "leads": 420, "MQLs": 170, "SQLs": 64 },
            { "date": "2024-12-01", "leads": 440, "MQLs": 180, "SQLs": 70 }
        ]
    },
    "pipeline": {
        "metrics": { "totalPipeline": 3000000, "weightedPipeline": 1100000, "totalDeals": 80, "winRate": 22 },
        "dealsBySegment": { "SMB": 600000, "ENT": 2400000 },
        "stuckDeals": [
            { "dealId": "DEAL_0007", "account": "Initech", "stage": "Negotiation", "amount": 180000, "daysInStage": 70 }
        ]
    },
    "revenue": {
        "metrics": { "totalMRR": 100000, "avgNRR": 1.05, "churnRate": 2.5 },
        "segmentBreakdown": {
            "SMB": { "mrr": 40000, "customers": 180 },
            "ENT": { "mrr": 60000, "customers": 12 }
        },
        "trendsData": [
            { "month": "2024-11", "mrr": 96000 },
            { "month": "2024-12", "mrr": 100000 }
        ]
    }
}"#;

#[test]
fn derive_prints_the_filtered_view() {
    with_env(&[], || {
        let (_dir, path) = snapshot_file(SNAPSHOT);
        let args = ViewArgs {
            data: Some(path),
            period: Some(365),
            segment: Some("SMB".to_string()),
            ..ViewArgs::default()
        };

        let result = derive::run(&args);
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "derive");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["filters"]["periodDays"], 365);
        assert_eq!(payload["data"]["filters"]["segment"], "SMB");
        assert_eq!(payload["data"]["revenue"]["metrics"]["totalMRR"], 40000.0);
        assert_eq!(payload["data"]["pipeline"]["stuckDeals"].as_array().map(Vec::len), Some(0));
    });
}

#[test]
fn derive_defaults_to_configured_filters() {
    with_env(&[("REVLENS_FILTERS_DEFAULT_PERIOD_DAYS", "90")], || {
        let (_dir, path) = snapshot_file(SNAPSHOT);
        let result = derive::run(&ViewArgs { data: Some(path), ..ViewArgs::default() });
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["filters"]["periodDays"], 90);
        assert_eq!(payload["data"]["filters"]["segment"], "all");
    });
}

#[test]
fn filter_flags_win_over_configured_defaults() {
    with_env(
        &[("REVLENS_FILTERS_DEFAULT_PERIOD_DAYS", "90"), ("REVLENS_FILTERS_DEFAULT_SEGMENT", "ENT")],
        || {
            let (_dir, path) = snapshot_file(SNAPSHOT);
            let args = ViewArgs {
                data: Some(path),
                period: Some(30),
                segment: Some("SMB".to_string()),
                ..ViewArgs::default()
            };

            let result = derive::run(&args);
            assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["data"]["filters"]["periodDays"], 30);
            assert_eq!(payload["data"]["filters"]["segment"], "SMB");

            let period_only = derive::run(&ViewArgs { segment: None, ..args });
            let payload = parse_payload(&period_only.output);
            assert_eq!(payload["data"]["filters"]["periodDays"], 30);
            assert_eq!(payload["data"]["filters"]["segment"], "ENT");
        },
    );
}

#[test]
fn derive_reports_missing_snapshot_as_load_failure() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let args = ViewArgs { data: Some(dir.path().join("absent.json")), ..ViewArgs::default() };

        let result = derive::run(&args);
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "derive");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "load");
    });
}

#[test]
fn derive_reports_malformed_snapshot_as_load_failure() {
    with_env(&[], || {
        let (_dir, path) = snapshot_file("[1, 2, 3]");
        let result = derive::run(&ViewArgs { data: Some(path), ..ViewArgs::default() });
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "load");
    });
}

#[test]
fn invalid_configuration_exits_before_loading() {
    with_env(&[("REVLENS_SEGMENTS_FALLBACK_SHARE", "1.5")], || {
        let (_dir, path) = snapshot_file(SNAPSHOT);
        let result = derive::run(&ViewArgs { data: Some(path), ..ViewArgs::default() });
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn insights_lists_highlights_for_the_view() {
    with_env(&[], || {
        let (_dir, path) = snapshot_file(SNAPSHOT);
        let args = ViewArgs { data: Some(path), period: Some(365), ..ViewArgs::default() };

        let result = insights::run(&args);
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        let insights = payload["data"]["insights"].as_array().cloned().unwrap_or_default();
        let kinds: Vec<&str> =
            insights.iter().filter_map(|insight| insight["kind"].as_str()).collect();
        assert_eq!(kinds, vec!["stuck_deals", "top_channel", "top_segment", "momentum"]);
        assert_eq!(
            insights[0]["text"],
            "1 deals are stuck 45+ days. Biggest: DEAL_0007 worth $180.0K in Negotiation."
        );
        assert_eq!(insights[3]["text"], "MRR momentum: ▲ +4.2% vs prior month.");
    });
}

#[test]
fn config_reports_sources() {
    with_env(&[("REVLENS_INSIGHTS_STUCK_DEAL_DAYS", "30")], || {
        let dir = TempDir::new().expect("temp dir");
        let config_path = dir.path().join("revlens.toml");
        fs::write(&config_path, "[filters]\ndefault_period_days = 120\n").expect("write config");

        let result = config::run(Some(config_path.clone()));
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        let entries = payload["data"]["entries"].as_array().cloned().unwrap_or_default();
        let entry = |key: &str| {
            entries.iter().find(|entry| entry["key"] == key).cloned().unwrap_or(Value::Null)
        };

        assert_eq!(entry("filters.default_period_days")["value"], 120);
        assert_eq!(
            entry("filters.default_period_days")["source"],
            format!("file ({})", config_path.display())
        );
        assert_eq!(entry("insights.stuck_deal_days")["value"], 30);
        assert_eq!(entry("insights.stuck_deal_days")["source"], "env (REVLENS_INSIGHTS_STUCK_DEAL_DAYS)");
        assert_eq!(entry("segments.fallback_share")["source"], "default");
    });
}

#[test]
fn config_rejects_missing_explicit_file() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let result = config::run(Some(dir.path().join("missing.toml")));
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["status"], "error");
    });
}

fn snapshot_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("dashboard_data.json");
    fs::write(&path, contents).expect("write snapshot");
    (dir, path)
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "REVLENS_DATA_PATH",
        "REVLENS_FILTERS_DEFAULT_PERIOD_DAYS",
        "REVLENS_FILTERS_DEFAULT_SEGMENT",
        "REVLENS_SEGMENTS_FALLBACK_SHARE",
        "REVLENS_INSIGHTS_STUCK_DEAL_DAYS",
        "REVLENS_LOGGING_LEVEL",
        "REVLENS_LOGGING_FORMAT",
        "REVLENS_LOG_LEVEL",
        "REVLENS_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
