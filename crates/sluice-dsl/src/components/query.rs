//! Query composite constructors.
//!
//! A `Query` node groups SQL clause wrappers (`Query.Select`,
//! `Query.Where`, `Query.GroupBy`, `Query.Having`, `Query.OrderBy`)
//! plus at most one upstream input child. Clause multiplicity is checked
//! at construction time.

use std::sync::Arc;

use sluice_core::operator::{
    OperatorProps, QueryGroupByProps, QueryHavingProps, QueryOrderByProps, QueryProps,
    QuerySelectProps, QueryWhereProps,
};
use sluice_core::{Children, ConstructNode, SynthSession};

use crate::error::BuildError;

const CLAUSE_COMPONENTS: [&str; 5] = [
    "Query.Select",
    "Query.Where",
    "Query.GroupBy",
    "Query.Having",
    "Query.OrderBy",
];

/// Builds a `Query` node from clause wrappers and an optional input.
///
/// # Errors
///
/// Returns [`BuildError::MissingSelect`] without a `Query.Select` child,
/// [`BuildError::DuplicateClause`] when any clause type appears twice,
/// and [`BuildError::HavingWithoutGroupBy`] for a `Query.Having` with no
/// `Query.GroupBy` sibling.
pub fn query(
    session: &mut SynthSession,
    props: QueryProps,
    children: impl Into<Children>,
) -> Result<Arc<ConstructNode>, BuildError> {
    let nodes = children.into().flatten();
    let count =
        |component: &str| nodes.iter().filter(|c| c.component() == component).count();

    let selects = count("Query.Select");
    if selects == 0 {
        return Err(BuildError::MissingSelect);
    }
    for clause in CLAUSE_COMPONENTS {
        if count(clause) > 1 {
            return Err(BuildError::DuplicateClause { clause });
        }
    }
    if count("Query.Having") > 0 && count("Query.GroupBy") == 0 {
        return Err(BuildError::HavingWithoutGroupBy);
    }

    Ok(session.element(OperatorProps::Query(props), None, nodes.into_vec()))
}

/// Builds a `Query.Select` clause wrapper.
pub fn query_select(
    session: &mut SynthSession,
    props: QuerySelectProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::QuerySelect(props), None, children)
}

/// Builds a `Query.Where` clause wrapper.
pub fn query_where(
    session: &mut SynthSession,
    props: QueryWhereProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::QueryWhere(props), None, children)
}

/// Builds a `Query.GroupBy` clause wrapper.
pub fn query_group_by(
    session: &mut SynthSession,
    props: QueryGroupByProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::QueryGroupBy(props), None, children)
}

/// Builds a `Query.Having` clause wrapper.
pub fn query_having(
    session: &mut SynthSession,
    props: QueryHavingProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::QueryHaving(props), None, children)
}

/// Builds a `Query.OrderBy` clause wrapper.
pub fn query_order_by(
    session: &mut SynthSession,
    props: QueryOrderByProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::QueryOrderBy(props), None, children)
}
