//! # Pipeline Graph
//!
//! Directed dataflow graph derived from a construct tree: parent-child
//! containment becomes edges, both adjacency directions are indexed, and
//! the graph answers topology questions for schema resolution and plan
//! compilation.
//!
//! ## Validation
//!
//! Builtin checks cover orphan sources (no consumer), dangling sinks (no
//! input), and cycles. All three report [`Severity::Error`]. Plugin
//! validators run after the builtin checks and see their diagnostics.
//!
//! ## Example
//!
//! ```rust,ignore
//! let graph = PipelineGraph::from_tree(&pipeline);
//! let order = graph.topological_sort()?;
//! let diagnostics = graph.validate();
//! ```

use std::sync::Arc;

use fxhash::FxHashMap;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::plugin::ResolvedPluginChain;
use crate::tree::{ConstructNode, NodeId, NodeKind};
use crate::{FxIndexMap, FxIndexSet};

#[cfg(test)]
mod tests;

/// Errors raised by graph algorithms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The graph contains at least one cycle.
    #[error("Cycle detected in pipeline graph")]
    CycleDetected,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// Source node id.
    pub from: NodeId,
    /// Destination node id.
    pub to: NodeId,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fails compilation.
    Error,
    /// Reported but non-fatal.
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDiagnostic {
    /// Finding severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Offending node id, when tied to one node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    /// Offending component name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl ValidationDiagnostic {
    /// Error-severity diagnostic.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            node_id: None,
            component: None,
        }
    }

    /// Warning-severity diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            node_id: None,
            component: None,
        }
    }

    /// Attaches the offending node's id and component.
    #[must_use]
    pub fn for_node(mut self, node: &ConstructNode) -> Self {
        self.node_id = Some(node.id.clone());
        self.component = Some(node.props.component().to_string());
        self
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Dataflow graph over construct nodes with both adjacency directions.
#[derive(Debug, Default)]
pub struct PipelineGraph {
    nodes: FxIndexMap<NodeId, Arc<ConstructNode>>,
    adjacency: FxIndexMap<NodeId, FxIndexSet<NodeId>>,
    reverse: FxIndexMap<NodeId, FxIndexSet<NodeId>>,
}

impl PipelineGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from a construct tree: every node is added in
    /// pre-order and each parent-child pair becomes an edge.
    #[must_use]
    pub fn from_tree(root: &Arc<ConstructNode>) -> Self {
        let mut graph = Self::new();
        graph.add_subtree(root);
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edge_count(),
            root = %root.id,
            "constructed pipeline graph from tree"
        );
        graph
    }

    fn add_subtree(&mut self, node: &Arc<ConstructNode>) {
        self.add_node(Arc::clone(node));
        for child in &node.children {
            self.add_node(Arc::clone(child));
            self.add_edge(&node.id, &child.id);
            self.add_subtree(child);
        }
    }

    /// Inserts a node and ensures adjacency entries exist for it.
    pub fn add_node(&mut self, node: Arc<ConstructNode>) {
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        self.adjacency.entry(id.clone()).or_default();
        self.reverse.entry(id).or_default();
    }

    /// Inserts a directed edge. Endpoints are not required to be known
    /// nodes; consumers skip edges with missing endpoints.
    pub fn add_edge(&mut self, from: &NodeId, to: &NodeId) {
        self.adjacency
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        self.reverse
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Arc<ConstructNode>> {
        self.nodes.get(id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<ConstructNode>> {
        self.nodes.values()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(FxIndexSet::len).sum()
    }

    /// Successors of a node, in edge insertion order.
    pub fn outgoing(&self, id: &str) -> impl Iterator<Item = &NodeId> {
        self.adjacency.get(id).into_iter().flatten()
    }

    /// Predecessors of a node, in edge insertion order.
    pub fn incoming(&self, id: &str) -> impl Iterator<Item = &NodeId> {
        self.reverse.get(id).into_iter().flatten()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = GraphEdge> + '_ {
        self.adjacency.iter().flat_map(|(from, tos)| {
            tos.iter().map(move |to| GraphEdge {
                from: from.clone(),
                to: to.clone(),
            })
        })
    }

    /// Nodes of the given kinds, in insertion order.
    #[must_use]
    pub fn nodes_by_kind(&self, kinds: &[NodeKind]) -> Vec<&Arc<ConstructNode>> {
        self.nodes
            .values()
            .filter(|node| kinds.contains(&node.kind))
            .collect()
    }

    /// Kahn topological sort over the node set.
    ///
    /// Ties resolve in node insertion order, so the result is
    /// deterministic for a given build sequence.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CycleDetected`] when not every node can be
    /// scheduled.
    pub fn topological_sort(&self) -> Result<Vec<Arc<ConstructNode>>, GraphError> {
        let mut in_degree: FxIndexMap<NodeId, usize> =
            self.nodes.keys().map(|id| (id.clone(), 0)).collect();
        for targets in self.adjacency.values() {
            for to in targets {
                *in_degree.entry(to.clone()).or_insert(0) += 1;
            }
        }

        let mut queue: std::collections::VecDeque<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| id.clone())
            .collect();

        let mut sorted = Vec::with_capacity(self.nodes.len());
        while let Some(id) = queue.pop_front() {
            if let Some(node) = self.nodes.get(&id) {
                sorted.push(Arc::clone(node));
            }

            if let Some(targets) = self.adjacency.get(&id) {
                for neighbor in targets {
                    let Some(degree) = in_degree.get_mut(neighbor) else {
                        continue;
                    };
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(neighbor.clone());
                    }
                }
            }
        }

        if sorted.len() != self.nodes.len() {
            return Err(GraphError::CycleDetected);
        }

        Ok(sorted)
    }

    // ---- Builtin validation ----

    /// Sources with no outgoing edge.
    #[must_use]
    pub fn detect_orphan_sources(&self) -> Vec<ValidationDiagnostic> {
        let mut diagnostics = Vec::new();
        for node in self.nodes.values() {
            if node.kind != NodeKind::Source {
                continue;
            }
            let consumed = self
                .adjacency
                .get(&node.id)
                .is_some_and(|targets| !targets.is_empty());
            if !consumed {
                diagnostics.push(
                    ValidationDiagnostic::error(format!(
                        "Orphan source '{}' ({}): declared but never consumed",
                        node.props.component(),
                        node.id
                    ))
                    .for_node(node),
                );
            }
        }
        diagnostics
    }

    /// Sinks with no incoming edge.
    #[must_use]
    pub fn detect_dangling_sinks(&self) -> Vec<ValidationDiagnostic> {
        let mut diagnostics = Vec::new();
        for node in self.nodes.values() {
            if node.kind != NodeKind::Sink {
                continue;
            }
            let fed = self
                .reverse
                .get(&node.id)
                .is_some_and(|sources| !sources.is_empty());
            if !fed {
                diagnostics.push(
                    ValidationDiagnostic::error(format!(
                        "Dangling sink '{}' ({}): no input path",
                        node.props.component(),
                        node.id
                    ))
                    .for_node(node),
                );
            }
        }
        diagnostics
    }

    /// First cycle found by depth-first search, as a single diagnostic
    /// naming one node on the cycle.
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<ValidationDiagnostic> {
        let mut colors: FxHashMap<&NodeId, Color> =
            self.nodes.keys().map(|id| (id, Color::White)).collect();
        let mut cycle_node: Option<NodeId> = None;

        for id in self.nodes.keys() {
            if colors.get(id) == Some(&Color::White) && self.dfs(id, &mut colors, &mut cycle_node) {
                break;
            }
        }

        let Some(id) = cycle_node else {
            return Vec::new();
        };

        let component = self
            .nodes
            .get(&id)
            .map_or_else(|| id.to_string(), |node| node.props.component().to_string());
        let mut diagnostic = ValidationDiagnostic::error(format!(
            "Cycle detected involving node '{component}' ({id})"
        ));
        diagnostic.node_id = Some(id.clone());
        diagnostic.component = self.nodes.get(&id).map(|n| n.props.component().to_string());
        vec![diagnostic]
    }

    fn dfs<'a>(
        &'a self,
        id: &'a NodeId,
        colors: &mut FxHashMap<&'a NodeId, Color>,
        cycle_node: &mut Option<NodeId>,
    ) -> bool {
        colors.insert(id, Color::Gray);
        if let Some(targets) = self.adjacency.get(id) {
            for neighbor in targets {
                match colors.get(neighbor) {
                    Some(Color::Gray) => {
                        *cycle_node = Some(neighbor.clone());
                        return true;
                    }
                    Some(Color::White) => {
                        if self.dfs(neighbor, colors, cycle_node) {
                            return true;
                        }
                    }
                    _ => {}
                }
            }
        }
        colors.insert(id, Color::Black);
        false
    }

    /// Runs the builtin checks: orphan sources, dangling sinks, cycles.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationDiagnostic> {
        let mut diagnostics = self.detect_orphan_sources();
        diagnostics.extend(self.detect_dangling_sinks());
        diagnostics.extend(self.detect_cycles());
        if !diagnostics.is_empty() {
            debug!(count = diagnostics.len(), "builtin validation found issues");
        }
        diagnostics
    }

    /// Runs the builtin checks followed by every plugin validator in the
    /// chain. Plugin validators see the diagnostics accumulated before
    /// them.
    #[must_use]
    pub fn validate_with_plugins(
        &self,
        root: &Arc<ConstructNode>,
        chain: &ResolvedPluginChain,
    ) -> Vec<ValidationDiagnostic> {
        let mut diagnostics = self.validate();
        diagnostics.extend(chain.run_validators(root, &diagnostics));
        diagnostics
    }
}
