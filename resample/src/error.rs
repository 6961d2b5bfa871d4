use thiserror::Error;

/// A configuration token that does not name any known variant.
///
/// The engine itself never surfaces these: normalisation logs them and falls
/// back to the documented default. Callers that want strict parsing can use
/// the `FromStr` impls directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("unknown aggregation `{0}`")]
    Aggregation(String),
    #[error("unknown dimension kind `{0}`")]
    DimensionKind(String),
    #[error("unknown bucket `{0}`")]
    Bucket(String),
}
