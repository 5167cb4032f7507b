//! # Sluice Core
//!
//! Core model for the sluice stream-pipeline compiler: the immutable
//! construct tree, the synthesis session that allocates node identities,
//! logical schemas, the plugin system, and the pipeline graph with its
//! structural validation.
//!
//! ## Architecture
//!
//! A pipeline is described as a tree of typed components. Each builder call
//! goes through a caller-owned [`session::SynthSession`], which resolves the
//! node kind and allocates a deterministic, SQL-safe node id. The finished
//! tree is lowered into a [`graph::PipelineGraph`] whose edges follow the
//! parent/child structure, validated (cycles, orphan sources, dangling
//! sinks, plugin validators), and handed to the plan compiler.
//!
//! ```rust,ignore
//! let mut session = SynthSession::new();
//! let sink = session.element(sink_props, None, Children::None);
//! let source = session.element(source_props, Some("orders"), sink);
//! let graph = PipelineGraph::from_tree(&source);
//! assert!(graph.validate().is_empty());
//! ```
//!
//! Everything in this crate is synchronous and performs no I/O.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod graph;
pub mod operator;
pub mod plugin;
pub mod schema;
pub mod session;
pub mod tree;

/// Insertion-ordered map with the fx hasher.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;

/// Insertion-ordered set with the fx hasher.
pub type FxIndexSet<T> = indexmap::IndexSet<T, fxhash::FxBuildHasher>;

pub use graph::{GraphEdge, GraphError, PipelineGraph, Severity, ValidationDiagnostic};
pub use operator::{OperatorProps, PropBag, PropValue};
pub use plugin::{
    resolve_plugins, AfterSynthHookContext, PipelineArtifact, PlanTransformer, Plugin,
    PluginError, PluginOrdering, ResolvedPluginChain, SynthHookContext,
};
pub use schema::{
    FieldDefinition, PhysicalType, SchemaBuilder, SchemaDefinition, SchemaError, WatermarkSpec,
};
pub use session::{to_sql_identifier, SynthSession};
pub use tree::{Children, ConstructNode, NodeId, NodeKind};

/// Top-level error for core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Schema construction or validation failed.
    #[error("Schema error: {0}")]
    Schema(#[from] schema::SchemaError),

    /// Plugin chain resolution failed.
    #[error("Plugin error: {0}")]
    Plugin(#[from] plugin::PluginError),

    /// Graph operation failed.
    #[error("Graph error: {0}")]
    Graph(#[from] graph::GraphError),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
