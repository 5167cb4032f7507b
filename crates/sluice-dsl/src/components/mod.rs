//! # Pipeline Components
//!
//! Typed constructors for every builtin component. Each builder takes the
//! session, the component's props, and its downstream children, and
//! returns the allocated construct node; builders with construction
//! checks return `Result` instead. Multi-input components (joins, SQL
//! escape hatches, pattern matchers) take their input nodes as explicit
//! arguments and record the input ids in the stored props.

use std::sync::Arc;

use sluice_core::operator::{CustomProps, OperatorProps};
use sluice_core::{Children, ConstructNode, SynthSession};

mod cep;
mod fields;
mod joins;
mod pipeline;
mod query;
mod raw_sql;
mod route;
mod sinks;
mod sources;
mod transforms;
mod windows;

pub use cep::{match_recognize, MatchRecognizeSpec};
pub use fields::{add_field, cast, coalesce, drop_columns, rename};
pub use joins::{
    interval_join, join, lookup_join, temporal_join, IntervalJoinSpec, JoinSpec, LookupJoinSpec,
    TemporalJoinSpec,
};
pub use pipeline::pipeline;
pub use query::{query, query_group_by, query_having, query_order_by, query_select, query_where};
pub use raw_sql::{raw_sql, RawSqlSpec};
pub use route::{route, route_branch, route_default};
pub use sinks::{console_sink, kafka_sink};
pub use sources::{generator_source, kafka_source};
pub use transforms::{aggregate, deduplicate, filter, flat_map, map, top_n, union};
pub use windows::{session_window, slide_window, tumble_window};

/// Builds a plugin-defined component node.
///
/// The kind resolves through the session's component overlay and falls
/// back to `Transform` when the component is unregistered.
pub fn custom(
    session: &mut SynthSession,
    props: CustomProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::Custom(props), None, children)
}
