//! Construction and synthesis error types.

use sluice_core::PluginError;
use thiserror::Error;

/// Errors raised while constructing pipeline components.
///
/// Construction checks run before a node is allocated, so a failed
/// builder leaves no trace in the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A checkpoint declaration has an empty interval.
    #[error("Checkpoint config requires an interval")]
    MissingCheckpointInterval,

    /// A route has no `Route.Branch` child.
    #[error("Route requires at least one Route.Branch child")]
    RouteWithoutBranch,

    /// Two union inputs declare structurally different schemas.
    #[error("Union schema mismatch: input {index} has fields [{found}] which do not match input 0 fields [{expected}]")]
    UnionSchemaMismatch {
        /// Position of the mismatched input.
        index: usize,
        /// Sorted field names of the mismatched input.
        found: String,
        /// Sorted field names of input 0.
        expected: String,
    },

    /// A pattern matcher has an empty row pattern.
    #[error("MatchRecognize requires a pattern")]
    MissingPattern,

    /// A pattern matcher defines no pattern variables.
    #[error("MatchRecognize requires at least one DEFINE clause")]
    MissingDefine,

    /// A pattern matcher declares no output measures.
    #[error("MatchRecognize requires at least one MEASURES expression")]
    MissingMeasures,

    /// A query has no select clause.
    #[error("Query requires a Query.Select child")]
    MissingSelect,

    /// A query repeats a clause that may appear at most once.
    #[error("Query must have at most one {clause} child")]
    DuplicateClause {
        /// The repeated clause's component name.
        clause: &'static str,
    },

    /// A query has a having clause but no group-by.
    #[error("Query.Having requires a Query.GroupBy sibling")]
    HavingWithoutGroupBy,

    /// A SQL escape hatch was given no input streams.
    #[error("RawSQL requires at least one input stream")]
    RawSqlWithoutInputs,
}

/// Errors raised while synthesizing an app or running the testing
/// helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    /// Plugin chain resolution failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}
