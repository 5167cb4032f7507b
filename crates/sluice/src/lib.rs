//! # Sluice
//!
//! A declarative stream-pipeline compiler: typed pipeline trees in,
//! validated execution plans out.
//!
//! Pipelines are authored as trees of typed components, synthesized
//! into dataflow graphs with structural validation, and compiled into a
//! deterministic binary plan for the runtime.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sluice::prelude::*;
//!
//! let mut session = SynthSession::new();
//!
//! let schema = SchemaDefinition::builder()
//!     .field("region", FieldDefinition::string())
//!     .field("amount", FieldDefinition::double())
//!     .field("ts", FieldDefinition::timestamp(3))
//!     .watermark("ts", "ts - INTERVAL '5' SECOND")
//!     .build()?;
//!
//! let sink = kafka_sink(&mut session, None, KafkaSinkProps {
//!     topic: "order-totals".into(),
//!     bootstrap_servers: None,
//!     format: None,
//!     key_by: vec!["region".into()],
//!     parallelism: None,
//! }, ());
//!
//! let source = kafka_source(&mut session, None, KafkaSourceProps {
//!     topic: "orders".into(),
//!     bootstrap_servers: None,
//!     format: None,
//!     schema,
//!     watermark: None,
//!     startup_mode: None,
//!     consumer_group: None,
//!     parallelism: None,
//! }, sink);
//!
//! let root = pipeline(&mut session, PipelineProps {
//!     name: "order-analytics".into(),
//!     mode: None,
//!     parallelism: Some(2),
//!     checkpoint: None,
//!     state_backend: None,
//!     state_ttl: None,
//!     restart_strategy: None,
//!     namespace: None,
//!     bootstrap_servers: None,
//! }, source)?;
//!
//! let app = synthesize_app(&mut session, "shop", root, &SynthOptions::default())?;
//! let compiled = compile_plan(&app.pipelines[0].tree, &CompileOptions::default())?;
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export the construction and synthesis surface
pub use sluice_dsl::*;

// Re-export the core model modules for the long tail of typed props
pub use sluice_core::{operator, tree};

// Re-export core model types
pub use sluice_core::{
    Children, ConstructNode, FieldDefinition, FxIndexMap, NodeId, NodeKind, OperatorProps,
    PipelineArtifact, PipelineGraph, Plugin, PluginOrdering, ResolvedPluginChain, SchemaBuilder,
    SchemaDefinition, Severity, SynthSession, ValidationDiagnostic, WatermarkSpec,
};

// Re-export plan compilation
pub use sluice_plan::{
    compile_plan, decode_plan, encode_plan, CompileOptions, CompiledPlan, ExecutionPlan,
    OperatorConfig, OperatorNode, OperatorType, ShuffleStrategy,
};

/// Commonly used types, constructors, and helpers.
///
/// ```rust,ignore
/// use sluice::prelude::*;
/// ```
pub mod prelude {
    // Session and tree
    pub use sluice_core::{Children, ConstructNode, NodeId, NodeKind, SynthSession};

    // Schemas
    pub use sluice_core::{FieldDefinition, PhysicalType, SchemaDefinition, WatermarkSpec};

    // Common operator props
    pub use sluice_core::operator::{
        AggregateProps, CheckpointSpec, ConsoleSinkProps, FilterProps, FlatMapProps,
        GeneratorSourceProps, KafkaSinkProps, KafkaSourceProps, MapProps, PipelineProps,
        SessionWindowProps, SlideWindowProps, TumbleWindowProps,
    };

    // Component constructors
    pub use sluice_dsl::components::*;

    // Synthesis
    pub use sluice_core::{PipelineArtifact, Plugin};
    pub use sluice_dsl::{
        synthesize_app, AppConfig, AppSynthResult, Environment, SynthOptions,
    };

    // Plan compilation
    pub use sluice_plan::{compile_plan, CompileOptions, CompiledPlan, ExecutionPlan};

    // Standard library re-exports for convenience
    pub use std::sync::Arc;

    // Insertion-ordered map used throughout the typed props
    pub use sluice_core::FxIndexMap;
}
