//! Row-transform constructors.

use std::sync::Arc;

use sluice_core::operator::{
    AggregateProps, DeduplicateProps, FilterProps, FlatMapProps, MapProps, OperatorProps,
    TopNProps, UnionProps,
};
use sluice_core::{Children, ConstructNode, SynthSession};

use crate::error::BuildError;

/// Builds a `Filter` node.
pub fn filter(
    session: &mut SynthSession,
    props: FilterProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::Filter(props), None, children)
}

/// Builds a `Map` projection node.
pub fn map(
    session: &mut SynthSession,
    props: MapProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::Map(props), None, children)
}

/// Builds a `FlatMap` unnesting node.
pub fn flat_map(
    session: &mut SynthSession,
    props: FlatMapProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::FlatMap(props), None, children)
}

/// Builds an `Aggregate` node.
pub fn aggregate(
    session: &mut SynthSession,
    props: AggregateProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::Aggregate(props), None, children)
}

/// Builds a `Union` node.
///
/// When two or more input schemas are declared they are checked for
/// structural compatibility: the sorted `name:TYPE` signatures must match
/// pairwise. Field order may differ between inputs.
///
/// # Errors
///
/// Returns [`BuildError::UnionSchemaMismatch`] naming the first input
/// whose signature differs from input 0.
pub fn union(
    session: &mut SynthSession,
    props: UnionProps,
    children: impl Into<Children>,
) -> Result<Arc<ConstructNode>, BuildError> {
    if props.inputs.len() >= 2 {
        let reference = &props.inputs[0];
        let expected = reference.signature();
        for (index, input) in props.inputs.iter().enumerate().skip(1) {
            if input.signature() != expected {
                return Err(BuildError::UnionSchemaMismatch {
                    index,
                    found: input.sorted_field_names().join(", "),
                    expected: reference.sorted_field_names().join(", "),
                });
            }
        }
    }

    Ok(session.element(OperatorProps::Union(props), None, children))
}

/// Builds a `Deduplicate` node.
pub fn deduplicate(
    session: &mut SynthSession,
    props: DeduplicateProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::Deduplicate(props), None, children)
}

/// Builds a `TopN` node.
pub fn top_n(
    session: &mut SynthSession,
    props: TopNProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::TopN(props), None, children)
}
