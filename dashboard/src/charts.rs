pub mod svg;

use resample::{ResampleRequest, ResampleResult};

/// One drawable point of a resampled series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint<'a> {
    pub label: &'a str,
    pub value: f64,
    /// Inside an active brush range.
    pub selected: bool,
}

pub fn points(result: &ResampleResult) -> Vec<ChartPoint<'_>> {
    let brush = result.display_range.filter(|_| result.filter_active);
    result
        .series
        .iter()
        .enumerate()
        .map(|(i, bucket)| ChartPoint {
            label: &bucket.label,
            value: bucket.value,
            selected: brush.is_some_and(|r| r.contains(i)),
        })
        .collect()
}

/// Title used when a chart has no preset title, e.g. `rows · sum by category`.
pub fn default_title(request: &ResampleRequest) -> String {
    let by = request.dimension.field().unwrap_or("batch");
    format!("{} · {} by {by}", request.metric, request.aggregation)
}
