//! Error taxonomy for scoring and clustering
//!
//! Two families of failure exist: input validation (a record cannot be scored)
//! and clustering preconditions (a batch cannot be partitioned). Both surface
//! synchronously; nothing here is retryable.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HealthError {
    #[error("Tree '{tree_id}': required field '{field}' is missing")]
    MissingField { tree_id: String, field: &'static str },

    #[error("Tree '{tree_id}': field '{field}' is not finite ({value})")]
    NonFinite {
        tree_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("Tree '{tree_id}': field '{field}' = {value} outside physical range [{min}, {max}]")]
    OutOfRange {
        tree_id: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Duplicate tree id '{0}' in batch")]
    DuplicateTreeId(String),

    #[error("Batch is empty")]
    EmptyBatch,

    #[error("Clustering needs at least {k} distinct points, batch has {distinct}")]
    TooFewDistinctPoints { k: usize, distinct: usize },

    #[error("All records are identical on pH, moisture and bunch count; clustering is undefined")]
    DegenerateFeatures,

    #[error("Invalid cluster configuration: {0}")]
    InvalidClusterConfig(String),

    #[error("{records} records paired with {labels} labels")]
    LengthMismatch { records: usize, labels: usize },

    #[error("Tree '{0}' has no assignment in the clustering result")]
    UnassignedTree(String),

    #[error("Invalid rule table '{table}': {message}")]
    InvalidRuleTable { table: String, message: String },
}

pub type HealthResult<T> = std::result::Result<T, HealthError>;
