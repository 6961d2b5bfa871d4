use std::collections::BTreeSet;

use resample::config::MAX_BIN_COUNT;
use resample::{
    Bucket, IndexRange, RequestedRange, ResampleConfig, ResampleResult, ResolvedBucket, Sample,
    ServerAggregates, TimeBucket, clamp_range, collect_ids, resample,
};
use serde_json::{Value, json};

fn samples(value: Value) -> Vec<Sample> {
    serde_json::from_value(value).unwrap()
}

fn config(value: Value) -> ResampleConfig {
    serde_json::from_value(value).unwrap()
}

fn hourly_samples() -> Vec<Sample> {
    samples(json!([
        { "batch_id": "b1", "time": "2024-03-01T00:10:00Z", "rows": 4, "category": "North", "size": 1.0 },
        { "batch_id": "b2", "time": "2024-03-01T01:20:00Z", "rows": 6, "category": "South", "size": 4.5 },
        { "batch_id": "b3", "time": "2024-03-01T01:40:00Z", "rows": 1, "category": "North", "size": 9.0 },
        { "batch_id": "b4", "time": "2024-03-01T03:05:00Z", "rows": 9, "category": "East", "size": 2.0 },
        { "batch_id": "b5", "time": "2024-03-01T07:55:00Z", "rows": 3, "category": " ", "size": 7.5 },
        { "batch_id": "b6", "time": "garbage", "rows": 3 },
    ]))
}

fn server_aggregates() -> ServerAggregates {
    serde_json::from_value(json!({
        "numericBins": {
            "size": [
                { "start": 5, "end": 10, "count": 2, "sum": 16.5, "min": 7.5, "max": 9, "batch_ids": ["b3", "b5"] },
                { "start": 0, "end": 5, "count": 3, "sum": 7.5, "min": 1, "max": 4.5, "batch_ids": ["b1", "b2", "b4"] },
                { "start": 10, "end": 15, "count": 0, "sum": 0 },
            ]
        },
        "categoryGroups": {
            "region": [
                { "key": "cat:z", "label": "zulu", "value": 3, "sortValue": 2, "batch_ids": ["b1"] },
                { "key": "cat:B", "label": "Bravo", "value": 1, "batch_ids": ["b2", "b3"] },
                { "key": "cat:a", "label": "alpha", "value": 5, "batch_ids": ["b4"] },
                { "key": "cat:m", "label": "mike", "value": 2, "sortValue": 1, "batchIds": [5] },
                { "key": "cat:x", "label": "xray", "value": 4, "sortValue": "Q" },
            ]
        }
    }))
    .unwrap()
}

/// Every engine path: per-sample grouping, client bins at ordinary, single,
/// defaulted and oversized counts, reused server bins, and precomputed groups.
fn all_configs() -> Vec<(ResampleConfig, Option<ServerAggregates>)> {
    let server = server_aggregates();
    [
        (json!({ "timezone": 0 }), None),
        (json!({ "bucket": "hour", "timezone": 0, "range": [1, 2] }), None),
        (json!({ "dimension": "category", "aggregation": "avg", "range": [0, 1] }), None),
        (json!({ "dimension": "size", "bucket": 4, "aggregation": "max", "range": [2, null] }), None),
        (json!({ "dimension": "batch_index", "aggregation": "min", "range": [-4, 40] }), None),
        (json!({ "dimension": "size", "bucket": 1, "range": [0, 0] }), None),
        (json!({ "dimension": "size", "bucket": 0, "range": [3, 7] }), None),
        (json!({ "dimension": "size", "bucket": 1e18, "range": [990, null] }), None),
        (
            json!({ "dimension": "size", "metric": "size", "bucket": 3, "aggregation": "avg", "range": [0, 1] }),
            Some(server.clone()),
        ),
        (
            json!({ "dimension": "region", "dimension_kind": "categorical", "range": [1, 3] }),
            Some(server),
        ),
    ]
    .into_iter()
    .map(|(cfg, server)| (config(cfg), server))
    .collect()
}

fn auto_bucket(times: &[&str]) -> Option<ResolvedBucket> {
    let input: Vec<Sample> = times
        .iter()
        .map(|t| samples(json!([{ "time": t, "rows": 1 }])).remove(0))
        .collect();
    resample(&input, &config(json!({ "bucket": "auto", "timezone": 0 })), None).resolved_bucket
}

fn assert_sorted(series: &[Bucket]) {
    for pair in series.windows(2) {
        assert!(
            pair[0].sort_value.compare(&pair[1].sort_value).is_le(),
            "{} then {}",
            pair[0].key,
            pair[1].key
        );
    }
}

#[test]
fn repeated_calls_are_identical() {
    let input = hourly_samples();
    for (cfg, server) in all_configs() {
        let first = resample(&input, &cfg, server.as_ref());
        let second = resample(&input, &cfg, server.as_ref());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn series_is_sorted_and_ranges_are_contained() {
    let input = hourly_samples();
    for (cfg, server) in all_configs() {
        let result = resample(&input, &cfg, server.as_ref());
        assert!(!result.series.is_empty());
        assert_sorted(&result.series);

        let IndexRange(start, end) = result.display_range.unwrap();
        assert!(start <= end);
        assert!(end <= result.series.len() - 1);
    }
}

#[test]
fn allowed_ids_cover_the_selected_buckets() {
    let input = hourly_samples();
    for (cfg, server) in all_configs() {
        let result = resample(&input, &cfg, server.as_ref());
        match &result.allowed_ids {
            Some(ids) => {
                assert!(result.filter_active);
                let range = result.config_range.unwrap();
                assert_eq!(result.display_range, Some(range));
                assert_eq!(ids, &collect_ids(&result.series, range));
                let expected: BTreeSet<String> = result
                    .displayed()
                    .flat_map(|(_, b)| b.batch_ids.iter().cloned())
                    .collect();
                assert_eq!(ids, &expected);
            }
            None => assert!(!result.filter_active),
        }
    }
}

#[test]
fn no_range_means_no_filter() {
    let input = hourly_samples();
    for (mut cfg, server) in all_configs() {
        cfg.range = None;
        let result = resample(&input, &cfg, server.as_ref());
        assert!(!result.filter_active);
        assert_eq!(result.allowed_ids, None);
        assert_eq!(result.config_range, None);
        assert_eq!(
            result.display_range,
            Some(IndexRange(0, result.series.len() - 1))
        );
    }
}

#[test]
fn precomputed_groups_follow_sort_order() {
    let result = resample(
        &hourly_samples(),
        &config(json!({ "dimension": "region", "dimension_kind": "categorical" })),
        Some(&server_aggregates()),
    );
    let labels: Vec<&str> = result.series.iter().map(|b| b.label.as_str()).collect();
    // Numeric sort values first, then text: "Q" and the lower-cased labels.
    assert_eq!(labels, ["mike", "zulu", "xray", "alpha", "Bravo"]);
    assert_eq!(result.series[1].value, 3.0);
    assert!(result.series[0].batch_ids.contains("5"));
}

#[test]
fn oversized_bin_count_is_clamped() {
    let input = samples(json!([{ "size": 1, "batch_id": "a" }, { "size": 2, "batch_id": "b" }]));
    for bucket in [json!(1e18), json!(1e12), json!("9e99")] {
        let result = resample(
            &input,
            &config(json!({ "dimension": "size", "bucket": bucket })),
            None,
        );
        assert_eq!(result.resolved_bucket, Some(ResolvedBucket::Bins(MAX_BIN_COUNT)));
        assert_eq!(result.series.len(), MAX_BIN_COUNT);
        assert!(result.series[MAX_BIN_COUNT - 1].batch_ids.contains("b"));
    }
}

#[test]
fn auto_bucket_follows_span() {
    let day = Some(ResolvedBucket::Time(TimeBucket::Day));
    let month = Some(ResolvedBucket::Time(TimeBucket::Month));
    let hour = Some(ResolvedBucket::Time(TimeBucket::Hour));
    let minute = Some(ResolvedBucket::Time(TimeBucket::Minute));

    assert_eq!(auto_bucket(&["2024-01-01", "2024-01-08"]), day);
    assert_eq!(auto_bucket(&["2024-01-01", "2024-06-15"]), month);
    assert_eq!(auto_bucket(&["2024-01-01T00:00", "2024-01-01T12:00"]), hour);
    assert_eq!(auto_bucket(&["2024-01-01T00:00", "2024-01-01T00:05"]), minute);
    assert_eq!(auto_bucket(&[]), day);
}

#[test]
fn blank_categories_fold_into_uncategorized() {
    let input = samples(json!([
        { "category": "North", "rows": 10 },
        { "category": "", "rows": 5 },
        { "rows": 3 },
    ]));
    let result = resample(
        &input,
        &config(json!({ "dimension": "category", "aggregation": "sum", "metric": "rows" })),
        None,
    );
    let values: Vec<(&str, f64)> = result
        .series
        .iter()
        .map(|b| (b.label.as_str(), b.value))
        .collect();
    assert_eq!(values, [("North", 10.0), ("Uncategorized", 8.0)]);
    assert_eq!(result.series[1].key, "cat:Uncategorized");
}

#[test]
fn explicit_bucket_overrides_span() {
    let input = samples(json!([
        { "time": "2024-01-01T00:00:00Z", "rows": 1 },
        { "time": "2024-01-01T00:03:00Z", "rows": 1 },
        { "time": "2025-08-01T00:00:00Z", "rows": 1 },
    ]));
    let result = resample(&input, &config(json!({ "bucket": "week", "timezone": 0 })), None);
    assert_eq!(
        result.resolved_bucket,
        Some(ResolvedBucket::Time(TimeBucket::Week))
    );
    assert_eq!(result.series.len(), 2);
    assert!(result.series[0].key.starts_with("week:"));
}

#[test]
fn clamping_twice_changes_nothing() {
    for max_index in [0_i64, 1, 5, 40] {
        for (a, b) in [
            (-10.0, Some(-3.0)),
            (0.0, None),
            (2.0, Some(1.0)),
            (3.5, Some(100.0)),
            (50.0, Some(60.0)),
        ] {
            let once = clamp_range(Some(&RequestedRange::new(a, b)), max_index);
            let twice = once.and_then(|r| clamp_range(Some(&RequestedRange::from(r)), max_index));
            assert_eq!(once, twice, "[{a}, {b:?}] within {max_index}");
        }
    }
}

#[test]
fn matching_server_bins_are_reused() {
    let server: ServerAggregates = serde_json::from_value(json!({
        "numeric_bins": {
            "size": [
                { "start": 0, "end": 5, "count": 4, "sum": 10, "min": 1, "max": 4, "batch_ids": ["a", "b", "c", "d"] },
                { "start": 5, "end": 10, "count": 2, "sum": 14, "min": 6, "max": 8, "batch_ids": ["e", "f"] },
                { "start": 10, "end": 15, "count": 0, "sum": 0, "batch_ids": [] },
            ]
        }
    }))
    .unwrap();
    // Raw samples disagree with the bins; reuse must ignore them.
    let input = samples(json!([{ "size": 100, "batch_id": "zz" }]));

    let run = |aggregation: &str| -> ResampleResult {
        resample(
            &input,
            &config(json!({
                "dimension": "size",
                "metric": "size",
                "bucket": 3,
                "aggregation": aggregation,
            })),
            Some(&server),
        )
    };
    let sum = run("sum");
    let avg = run("avg");

    assert_eq!(sum.series.len(), 3);
    assert_eq!(sum.resolved_bucket, Some(ResolvedBucket::Bins(3)));
    assert_eq!(
        sum.series.iter().map(|b| b.value).collect::<Vec<_>>(),
        [10.0, 14.0, 0.0]
    );
    assert_eq!(
        avg.series.iter().map(|b| b.value).collect::<Vec<_>>(),
        [2.5, 7.0, 0.0]
    );
    for (s, a) in sum.series.iter().zip(&avg.series) {
        assert_eq!(s.key, a.key);
        assert_eq!(s.label, a.label);
        assert_eq!(s.batch_ids, a.batch_ids);
    }
    assert!(sum.series.iter().all(|b| !b.batch_ids.contains("zz")));
}

#[test]
fn mismatched_bin_count_recomputes() {
    let server: ServerAggregates = serde_json::from_value(json!({
        "numeric_bins": {
            "size": [{ "start": 0, "end": 10, "count": 1, "sum": 5, "batch_ids": ["a"] }]
        }
    }))
    .unwrap();
    let input = samples(json!([
        { "size": 1, "batch_id": "x" },
        { "size": 9, "batch_id": "y" },
    ]));
    let result = resample(
        &input,
        &config(json!({ "dimension": "size", "metric": "size", "bucket": 2 })),
        Some(&server),
    );
    assert_eq!(result.series.len(), 2);
    assert_eq!(result.series[0].label, "1.00 - 5.00");
    assert_eq!(result.series[1].label, "5.00 - 9.00");
    assert_eq!(
        result.series.iter().map(|b| b.value).collect::<Vec<_>>(),
        [1.0, 9.0]
    );
}

#[test]
fn result_serializes_with_widget_field_names() {
    let input = samples(json!([
        { "category": "North", "rows": 1, "id": 7 },
        { "category": "South", "rows": 2, "id": 8 },
    ]));
    let result = resample(
        &input,
        &config(json!({ "dimension": "category", "range": [1, 1] })),
        None,
    );
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["displayRange"], json!([1, 1]));
    assert_eq!(value["configRange"], json!([1, 1]));
    assert_eq!(value["allowedIds"], json!(["8"]));
    assert_eq!(value["filterActive"], json!(true));
    assert_eq!(value["resolvedBucket"], Value::Null);
    assert_eq!(value["series"][0]["sortValue"], json!("North"));
    assert_eq!(value["series"][1]["batchIds"], json!(["8"]));
}
