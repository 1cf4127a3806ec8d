use thiserror::Error;

/// Failures surfaced by the cost engine.
///
/// `UnknownLevelKey` and `MalformedLevelKey` are only fatal for a single range:
/// the aggregator absorbs them and skips that range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostError {
    #[error("malformed progression data: {0}")]
    MalformedProgressionData(String),

    #[error("progression table '{0}' is not loaded")]
    TableNotLoaded(String),

    #[error("unknown level key '{key}' in table '{table}'")]
    UnknownLevelKey { table: String, key: String },

    #[error("malformed level key {key} in table '{table}'")]
    MalformedLevelKey { table: String, key: String },
}
