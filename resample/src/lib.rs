//! Resampling of metric samples into chart series.
//!
//! [`resample`] groups a flat list of samples by a temporal, categorical,
//! numeric or ordinal dimension, aggregates a metric per bucket, and applies an
//! optional brush range that maps a run of buckets back to the record ids they
//! cover. Every call is pure and synchronous.

pub mod aggregate;
pub mod config;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod groups;
pub mod key;
pub mod numeric;
pub mod range;
pub mod sample;
pub mod series;
pub mod time_bucket;

pub use config::{Aggregation, BucketSpec, Dimension, DimensionKind, ResampleConfig, ResampleRequest};
pub use engine::{ServerAggregates, resample, resample_request};
pub use error::TokenError;
pub use numeric::NumericBin;
pub use range::{IndexRange, RequestedRange, clamp_range, collect_ids};
pub use sample::{Sample, samples_from_value};
pub use series::{Bucket, ResampleResult, ResolvedBucket};
pub use time_bucket::{Calendar, TimeBucket};
