//! # Construct Tree
//!
//! The immutable tree of typed pipeline components and its
//! structure-sharing transformations.
//!
//! Trees nest downstream: a node's children are the operators it feeds.
//! Shared `Arc` children are legal and produce a DAG once lowered into a
//! [`PipelineGraph`](crate::graph::PipelineGraph).

mod node;
mod transform;

pub use node::{Children, ConstructNode, NodeId, NodeKind};
pub use transform::{
    find_nodes, map_tree, rekind_tree, replace_child, walk_tree, wrap_node,
};
