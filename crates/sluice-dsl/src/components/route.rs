//! Route constructors.

use std::sync::Arc;

use sluice_core::operator::{OperatorProps, RouteBranchProps, RouteDefaultProps, RouteProps};
use sluice_core::{Children, ConstructNode, SynthSession};

use crate::error::BuildError;

/// Builds a `Route` node.
///
/// # Errors
///
/// Returns [`BuildError::RouteWithoutBranch`] when no child is a
/// `Route.Branch` wrapper.
pub fn route(
    session: &mut SynthSession,
    props: RouteProps,
    children: impl Into<Children>,
) -> Result<Arc<ConstructNode>, BuildError> {
    let nodes = children.into().flatten();
    let has_branch = nodes
        .iter()
        .any(|child| matches!(child.props, OperatorProps::RouteBranch(_)));
    if !has_branch {
        return Err(BuildError::RouteWithoutBranch);
    }

    Ok(session.element(OperatorProps::Route(props), None, nodes.into_vec()))
}

/// Builds a `Route.Branch` wrapper around its targets.
pub fn route_branch(
    session: &mut SynthSession,
    props: RouteBranchProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::RouteBranch(props), None, children)
}

/// Builds a `Route.Default` wrapper around its targets.
pub fn route_default(
    session: &mut SynthSession,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(
        OperatorProps::RouteDefault(RouteDefaultProps::default()),
        None,
        children,
    )
}
