//! # Sluice Plan
//!
//! Plan compilation for the sluice stream-pipeline compiler: lowers a
//! validated construct tree into a flat [`model::ExecutionPlan`] and
//! encodes it into the binary wire format consumed by the runtime.
//!
//! ## Pipeline
//!
//! 1. Build the dataflow graph from the tree and run builtin validation;
//!    any error diagnostic aborts compilation.
//! 2. Resolve operator schemas by propagating declared source schemas
//!    downstream ([`resolve`]).
//! 3. Emit one operator per non-structural node with its typed config,
//!    shuffle-annotated edges, and pipeline-level settings ([`compiler`]).
//! 4. Encode the plan ([`wire`]).
//!
//! ```rust,ignore
//! use sluice_plan::{compile_plan, CompileOptions};
//!
//! let compiled = compile_plan(&tree, &CompileOptions::default())?;
//! assert_eq!(compiled.plan, sluice_plan::decode_plan(&compiled.binary)?);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compiler;
pub mod model;
pub mod resolve;
pub mod wire;

pub use compiler::{compile_plan, CompileError, CompileOptions, CompiledPlan};
pub use model::{
    ChangelogMode, Edge, ExecutionPlan, ExecutionStrategy, KeyValue, OperatorConfig, OperatorNode,
    OperatorType, PipelineMode, PlanField, PlanSchema, PlanWatermark, ShuffleStrategy,
    SourceLocation,
};
pub use resolve::{resolve_schemas, SchemaMap};
pub use wire::{decode_plan, encode_plan, WireError};

/// Top-level error for plan operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Plan compilation failed.
    #[error(transparent)]
    Compile(#[from] compiler::CompileError),

    /// Wire encoding or decoding failed.
    #[error(transparent)]
    Wire(#[from] wire::WireError),
}

/// Result alias for plan operations.
pub type Result<T> = std::result::Result<T, Error>;
