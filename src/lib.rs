//! Palm Health Scorer
//!
//! Health classification and quality clustering for oil-palm tree records.
//!
//! Module layout:
//! - `record`: Tree records and the Good / Medium / Poor label
//! - `rules/`: Configurable scoring rule tables (canonical + field survey presets)
//! - `classifier`: Rule-table scoring, single record and parallel batch
//! - `clusterer/`: Batch-local standardization, seeded k-means, rank naming
//! - `summary` / `advice`: Group aggregates and field recommendations
//! - `data`: Polars DataFrame adapter and CSV I/O
//! - `config`: JSON engine configuration
//! - `sample`: Fixed 100-tree demonstration batch
//!
//! Every computation is a pure function of the batch it is given; no
//! statistics or cluster identities survive between calls.

pub mod error;
pub mod record;
pub mod rules;
pub mod classifier;
pub mod clusterer;
pub mod summary;
pub mod advice;
pub mod data;
pub mod config;
pub mod sample;

// Re-export commonly used types
pub use error::{HealthError, HealthResult};
pub use record::{HealthLabel, TreeRecord};
pub use rules::{Bracket, Field, Predicate, RuleTable, ScoringRule};
pub use classifier::{classify, HealthClassifier, HealthScore, RuleContribution};
pub use clusterer::{cluster, ClusterAssignment, ClusterConfig, ClusterProfile, ClusterRank, ClusteringResult};
pub use summary::{summarize_batch, summarize_by_block, summarize_by_rank, BatchSummary, GroupSummary, HealthDistribution};
pub use advice::{advise, advise_group, AdviceCard, Severity};
pub use config::EngineConfig;
pub use sample::demo_batch;
