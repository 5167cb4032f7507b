//! # Sluice DSL
//!
//! Declarative builders over [`sluice_core`]: typed component
//! constructors for sources, sinks, transforms, joins, windows, queries
//! and CEP, app-level synthesis with a configuration cascade and
//! deployment environments, and test helpers for single pipelines.
//!
//! ## Building a pipeline
//!
//! Every builder takes the synthesis session first, so node ids stay
//! deterministic and unique within one synthesis:
//!
//! ```rust,ignore
//! let mut session = SynthSession::new();
//! let sink = kafka_sink(&mut session, None, sink_props, ());
//! let source = kafka_source(&mut session, None, source_props, sink);
//! let root = pipeline(&mut session, pipeline_props, source)?;
//! let app = synthesize_app(&mut session, "shop", root, &SynthOptions::default())?;
//! ```
//!
//! Builders with structural requirements (route branches, query
//! clauses, join inputs) return a [`BuildError`] instead of deferring
//! the failure to plan compilation.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod components;
pub mod config;
pub mod environment;
pub mod error;
pub mod testing;

pub use app::{synthesize_app, AppSynthResult, SynthOptions};
pub use config::{
    AppConfig, AppConfigBuilder, ConfigError, KafkaDefaults, KubernetesDefaults, RuntimeDefaults,
};
pub use environment::{resolve_environment, Environment, PipelineOverrides, ResolvedOverrides};
pub use error::{BuildError, SynthError};
