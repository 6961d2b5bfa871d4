//! Resample configuration.
//!
//! [`ResampleConfig`] is the loose wire shape a chart widget sends; every field
//! is optional, and unknown tokens or mistyped values fall back to defaults. [`ResampleConfig::normalize`]
//! turns it into a [`ResampleRequest`] once, so the engine never re-checks raw
//! strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::TokenError;
use crate::range::RequestedRange;
use crate::sample::{as_number, deserialize_offset, deserialize_token};
use crate::time_bucket::{Calendar, TimeBucket};

pub const DEFAULT_DIMENSION: &str = "time";
pub const DEFAULT_METRIC: &str = "rows";
pub const DEFAULT_BIN_COUNT: usize = 10;
/// Upper bound on a requested bin count; larger requests are clamped.
pub const MAX_BIN_COUNT: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    Temporal,
    Categorical,
    Numeric,
    Ordinal,
}

impl DimensionKind {
    /// Kind implied by a dimension name when the caller does not say.
    pub fn infer(dimension: &str) -> DimensionKind {
        match dimension {
            "time" | "timestamp" => DimensionKind::Temporal,
            "category" => DimensionKind::Categorical,
            "" | "batch_index" => DimensionKind::Ordinal,
            _ => DimensionKind::Numeric,
        }
    }
}

impl FromStr for DimensionKind {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temporal" | "time" => Ok(DimensionKind::Temporal),
            "categorical" | "category" => Ok(DimensionKind::Categorical),
            "numeric" | "number" => Ok(DimensionKind::Numeric),
            "ordinal" => Ok(DimensionKind::Ordinal),
            _ => Err(TokenError::DimensionKind(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl Aggregation {
    /// Reduces accumulated statistics to one value.
    ///
    /// Empty accumulators never produce NaN: `avg` over zero samples is 0 and
    /// an untouched min/max sentinel reads as 0.
    pub fn apply(self, sum: f64, count: u64, min: f64, max: f64) -> f64 {
        match self {
            Aggregation::Sum => sum,
            Aggregation::Avg => {
                if count == 0 {
                    0.0
                } else {
                    sum / count as f64
                }
            }
            Aggregation::Min => {
                if min.is_finite() {
                    min
                } else {
                    0.0
                }
            }
            Aggregation::Max => {
                if max.is_finite() {
                    max
                } else {
                    0.0
                }
            }
            Aggregation::Count => count as f64,
        }
    }

    /// The reducer used for grouped (time, category, ordinal) series, which
    /// has no count mode and sums instead.
    pub fn for_groups(self) -> Aggregation {
        match self {
            Aggregation::Count => Aggregation::Sum,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "avg" | "average" | "mean" => Ok(Aggregation::Avg),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "count" => Ok(Aggregation::Count),
            _ => Err(TokenError::Aggregation(s.to_owned())),
        }
    }
}

/// The grouping attribute, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    Temporal { field: String },
    Categorical { field: String },
    Numeric { field: String },
    Ordinal,
}

impl Dimension {
    pub fn kind(&self) -> DimensionKind {
        match self {
            Dimension::Temporal { .. } => DimensionKind::Temporal,
            Dimension::Categorical { .. } => DimensionKind::Categorical,
            Dimension::Numeric { .. } => DimensionKind::Numeric,
            Dimension::Ordinal => DimensionKind::Ordinal,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Dimension::Temporal { field }
            | Dimension::Categorical { field }
            | Dimension::Numeric { field } => Some(field),
            Dimension::Ordinal => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketSpec {
    #[default]
    Auto,
    Time(TimeBucket),
    Bins(usize),
}

impl BucketSpec {
    /// Reads `"auto"`, a granularity token, or a positive bin count (as a
    /// number or numeric string, at most [`MAX_BIN_COUNT`]). Anything else is
    /// `Auto`.
    pub fn from_value(value: Option<&Value>) -> BucketSpec {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return BucketSpec::Auto;
        };
        if let Some(token) = value.as_str() {
            let token = token.trim();
            if token.is_empty() || token.eq_ignore_ascii_case("auto") {
                return BucketSpec::Auto;
            }
            match token.parse::<TimeBucket>() {
                Ok(bucket) => return BucketSpec::Time(bucket),
                Err(err) if as_number(value).is_none() => {
                    debug!(%err, "falling back to automatic bucketing");
                    return BucketSpec::Auto;
                }
                Err(_) => {}
            }
        }
        match as_number(value) {
            Some(n) if n >= 1.0 => {
                if n > MAX_BIN_COUNT as f64 {
                    debug!(requested = n, max = MAX_BIN_COUNT, "clamping bin count");
                }
                BucketSpec::Bins((n.trunc() as usize).min(MAX_BIN_COUNT))
            }
            _ => {
                debug!(bucket = %value, "ignoring unusable bucket count");
                BucketSpec::Auto
            }
        }
    }

    pub fn bin_count(self) -> Option<usize> {
        match self {
            BucketSpec::Bins(n) => Some(n),
            _ => None,
        }
    }
}

/// Loosely-typed resample configuration as received from a chart widget.
///
/// A field of the wrong JSON type reads as unset instead of rejecting the
/// whole configuration: numbers are accepted where tokens are expected and
/// numeric strings where numbers are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    #[serde(deserialize_with = "deserialize_token")]
    pub dimension: Option<String>,
    #[serde(alias = "dimensionKind", deserialize_with = "deserialize_token")]
    pub dimension_kind: Option<String>,
    #[serde(deserialize_with = "deserialize_token")]
    pub metric: Option<String>,
    #[serde(deserialize_with = "deserialize_token")]
    pub aggregation: Option<String>,
    pub bucket: Option<Value>,
    pub range: Option<Value>,
    /// Calendar offset east of UTC, in minutes. Absent means the local zone.
    #[serde(deserialize_with = "deserialize_offset")]
    pub timezone: Option<i32>,
}

impl ResampleConfig {
    /// Fills every unset field from `base`.
    pub fn or(self, base: &ResampleConfig) -> ResampleConfig {
        ResampleConfig {
            dimension: self.dimension.or_else(|| base.dimension.clone()),
            dimension_kind: self.dimension_kind.or_else(|| base.dimension_kind.clone()),
            metric: self.metric.or_else(|| base.metric.clone()),
            aggregation: self.aggregation.or_else(|| base.aggregation.clone()),
            bucket: self.bucket.or_else(|| base.bucket.clone()),
            range: self.range.or_else(|| base.range.clone()),
            timezone: self.timezone.or(base.timezone),
        }
    }

    pub fn normalize(&self) -> ResampleRequest {
        let dimension_name = self
            .dimension
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_DIMENSION);

        let kind = match self.dimension_kind.as_deref() {
            None => DimensionKind::infer(dimension_name),
            Some(raw) => raw.parse::<DimensionKind>().unwrap_or_else(|err| {
                debug!(%err, "inferring dimension kind from name");
                DimensionKind::infer(dimension_name)
            }),
        };

        let field = |fallback: &str| {
            if dimension_name.is_empty() {
                fallback.to_owned()
            } else {
                dimension_name.to_owned()
            }
        };
        let dimension = match kind {
            DimensionKind::Temporal => Dimension::Temporal {
                field: field(DEFAULT_DIMENSION),
            },
            DimensionKind::Categorical => Dimension::Categorical {
                field: field("category"),
            },
            DimensionKind::Numeric if dimension_name.is_empty() => Dimension::Ordinal,
            DimensionKind::Numeric => Dimension::Numeric {
                field: dimension_name.to_owned(),
            },
            DimensionKind::Ordinal => Dimension::Ordinal,
        };

        let aggregation = match self.aggregation.as_deref() {
            None => Aggregation::default(),
            Some(raw) => raw.parse::<Aggregation>().unwrap_or_else(|err| {
                debug!(%err, "aggregating with sum");
                Aggregation::Sum
            }),
        };

        let metric = self
            .metric
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_METRIC)
            .to_owned();

        ResampleRequest {
            dimension,
            metric,
            aggregation,
            bucket: BucketSpec::from_value(self.bucket.as_ref()),
            range: self.range.as_ref().and_then(RequestedRange::from_value),
            calendar: self
                .timezone
                .map_or(Calendar::Local, Calendar::from_offset_minutes),
        }
    }
}

/// A normalised, strongly-typed resample request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleRequest {
    pub dimension: Dimension,
    pub metric: String,
    pub aggregation: Aggregation,
    pub bucket: BucketSpec,
    pub range: Option<RequestedRange>,
    pub calendar: Calendar,
}

impl Default for ResampleRequest {
    fn default() -> Self {
        ResampleConfig::default().normalize()
    }
}
