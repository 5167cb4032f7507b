//! Field-transform constructors.

use std::sync::Arc;

use sluice_core::operator::{
    AddFieldProps, CastProps, CoalesceProps, DropProps, OperatorProps, RenameProps,
};
use sluice_core::{Children, ConstructNode, SynthSession};

/// Builds a `Rename` node.
pub fn rename(
    session: &mut SynthSession,
    props: RenameProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::Rename(props), None, children)
}

/// Builds a `Drop` node.
pub fn drop_columns(
    session: &mut SynthSession,
    props: DropProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::Drop(props), None, children)
}

/// Builds a `Cast` node.
pub fn cast(
    session: &mut SynthSession,
    props: CastProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::Cast(props), None, children)
}

/// Builds a `Coalesce` node.
pub fn coalesce(
    session: &mut SynthSession,
    props: CoalesceProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::Coalesce(props), None, children)
}

/// Builds an `AddField` node.
pub fn add_field(
    session: &mut SynthSession,
    props: AddFieldProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::AddField(props), None, children)
}
