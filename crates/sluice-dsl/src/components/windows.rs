//! Window constructors.

use std::sync::Arc;

use sluice_core::operator::{
    OperatorProps, SessionWindowProps, SlideWindowProps, TumbleWindowProps,
};
use sluice_core::{Children, ConstructNode, SynthSession};

/// Builds a `TumbleWindow` node.
pub fn tumble_window(
    session: &mut SynthSession,
    props: TumbleWindowProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::TumbleWindow(props), None, children)
}

/// Builds a `SlideWindow` node.
pub fn slide_window(
    session: &mut SynthSession,
    props: SlideWindowProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::SlideWindow(props), None, children)
}

/// Builds a `SessionWindow` node.
pub fn session_window(
    session: &mut SynthSession,
    props: SessionWindowProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    session.element(OperatorProps::SessionWindow(props), None, children)
}
