//! Structure-sharing tree transformations.
//!
//! All transforms are bottom-up and preserve reference identity: a node is
//! re-allocated only when one of its children changed or the visitor
//! replaced it, so untouched subtrees stay pointer-equal across a
//! transform. An identity visitor returns the exact input `Arc`.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::operator::OperatorProps;
use crate::session::SynthSession;
use crate::tree::ConstructNode;

/// Maps a visitor over the tree bottom-up (children before parents).
///
/// The visitor receives each (possibly re-allocated) node and returns its
/// replacement; returning the argument unchanged keeps the node shared.
#[must_use]
pub fn map_tree<F>(root: &Arc<ConstructNode>, visitor: &mut F) -> Arc<ConstructNode>
where
    F: FnMut(Arc<ConstructNode>) -> Arc<ConstructNode>,
{
    let mut changed = false;
    let mut children: SmallVec<[Arc<ConstructNode>; 4]> =
        SmallVec::with_capacity(root.children.len());
    for child in &root.children {
        let mapped = map_tree(child, visitor);
        if !Arc::ptr_eq(&mapped, child) {
            changed = true;
        }
        children.push(mapped);
    }

    let node = if changed {
        Arc::new(ConstructNode {
            id: root.id.clone(),
            kind: root.kind,
            props: root.props.clone(),
            children,
        })
    } else {
        Arc::clone(root)
    };

    visitor(node)
}

/// Walks the tree pre-order. A visitor returning `false` skips the node's
/// subtree but keeps walking its siblings.
pub fn walk_tree<F>(root: &Arc<ConstructNode>, visitor: &mut F)
where
    F: FnMut(&Arc<ConstructNode>) -> bool,
{
    if !visitor(root) {
        return;
    }
    for child in &root.children {
        walk_tree(child, visitor);
    }
}

/// Collects every node matching the predicate, in pre-order.
#[must_use]
pub fn find_nodes<P>(root: &Arc<ConstructNode>, predicate: P) -> Vec<Arc<ConstructNode>>
where
    P: Fn(&ConstructNode) -> bool,
{
    let mut found = Vec::new();
    walk_tree(root, &mut |node| {
        if predicate(node) {
            found.push(Arc::clone(node));
        }
        true
    });
    found
}

/// Replaces the node with id `target` by `wrap(node)`, re-allocating the
/// spine to the root. The target keeps its subtree unless `wrap` changes it.
#[must_use]
pub fn wrap_node<F>(root: &Arc<ConstructNode>, target: &str, wrap: F) -> Arc<ConstructNode>
where
    F: Fn(Arc<ConstructNode>) -> Arc<ConstructNode>,
{
    map_tree(root, &mut |node| {
        if node.id.as_str() == target {
            wrap(node)
        } else {
            node
        }
    })
}

/// Substitutes the node with id `target` by `replacement`.
#[must_use]
pub fn replace_child(
    root: &Arc<ConstructNode>,
    target: &str,
    replacement: &Arc<ConstructNode>,
) -> Arc<ConstructNode> {
    map_tree(root, &mut |node| {
        if node.id.as_str() == target {
            Arc::clone(replacement)
        } else {
            node
        }
    })
}

/// Re-resolves the kind of every custom component against the session's
/// component overlay.
///
/// Trees are often built before plugin registration; once a plugin chain is
/// resolved and its components registered, this pass fixes up the kinds of
/// nodes that fell back to `Transform`. Builtin components keep their
/// statically known kinds.
#[must_use]
pub fn rekind_tree(session: &SynthSession, root: &Arc<ConstructNode>) -> Arc<ConstructNode> {
    map_tree(root, &mut |node| {
        if matches!(node.props, OperatorProps::Custom(_)) {
            let kind = session.resolve_kind(&node.props);
            if kind != node.kind {
                return Arc::new(ConstructNode {
                    id: node.id.clone(),
                    kind,
                    props: node.props.clone(),
                    children: node.children.clone(),
                });
            }
        }
        node
    })
}
