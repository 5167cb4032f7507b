//! Construct-tree node types.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::operator::OperatorProps;
use crate::schema::SchemaDefinition;

// ---- NodeId ----

/// Identifier of a node in the construct tree.
///
/// Ids are SQL-safe strings allocated by a
/// [`SynthSession`](crate::session::SynthSession) and unique within one
/// synthesis. Cloning is cheap (shared backing string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Creates an id from a raw string.
    ///
    /// Regular construction goes through the session allocator; this is for
    /// graph surgery and tests.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

// ---- NodeKind ----

/// Structural role of a node in the pipeline graph.
///
/// Builtin components map onto kinds statically;
/// plugin-registered components resolve through the session overlay and
/// fall back to [`NodeKind::Transform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Pipeline root; never becomes an operator.
    Pipeline,
    /// Data producer with zero inputs.
    Source,
    /// Data consumer with zero outputs.
    Sink,
    /// Record-at-a-time or stateful transformation.
    Transform,
    /// Two-input (or lookup) join.
    Join,
    /// Time- or session-windowed aggregation scope.
    Window,
    /// Opaque SQL escape hatch.
    #[serde(rename = "RawSQL")]
    RawSql,
    /// Complex event processing (pattern matching).
    #[serde(rename = "CEP")]
    Cep,
    /// Named logical view.
    View,
}

impl NodeKind {
    /// Canonical display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pipeline => "Pipeline",
            Self::Source => "Source",
            Self::Sink => "Sink",
            Self::Transform => "Transform",
            Self::Join => "Join",
            Self::Window => "Window",
            Self::RawSql => "RawSQL",
            Self::Cep => "CEP",
            Self::View => "View",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---- ConstructNode ----

/// One node of the construct tree.
///
/// Nodes are immutable after creation; transforms produce new nodes and
/// share untouched subtrees by reference (see
/// [`map_tree`](crate::tree::map_tree)). Children point downstream: a
/// parent/child tree edge becomes a dataflow edge in the pipeline graph.
#[derive(Debug, Clone)]
pub struct ConstructNode {
    /// Unique, SQL-safe node id.
    pub id: NodeId,
    /// Resolved structural kind.
    pub kind: NodeKind,
    /// Typed component payload.
    pub props: OperatorProps,
    /// Downstream children in declaration order.
    pub children: SmallVec<[Arc<ConstructNode>; 4]>,
}

impl ConstructNode {
    /// Component name of this node (for example `KafkaSource`).
    #[must_use]
    pub fn component(&self) -> &str {
        self.props.component()
    }

    /// Per-operator parallelism override, when set.
    #[must_use]
    pub fn parallelism(&self) -> Option<u32> {
        self.props.parallelism()
    }

    /// Schema explicitly declared on this node, when present.
    #[must_use]
    pub fn declared_schema(&self) -> Option<&SchemaDefinition> {
        self.props.declared_schema()
    }

    /// Whether this node is a structural route wrapper
    /// (`Route.Branch` / `Route.Default`).
    #[must_use]
    pub fn is_route_wrapper(&self) -> bool {
        matches!(
            self.props,
            OperatorProps::RouteBranch(_) | OperatorProps::RouteDefault(_)
        )
    }

    /// Plain JSON representation of the subtree rooted here, for
    /// inspection and debugging tools.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let props = serde_json::to_value(&self.props).unwrap_or(serde_json::Value::Null);
        let children: Vec<serde_json::Value> = self.children.iter().map(|c| c.to_json()).collect();
        serde_json::json!({
            "id": self.id.as_str(),
            "kind": self.kind.as_str(),
            "component": self.component(),
            "props": props,
            "children": children,
        })
    }
}

// ---- Children ----

/// Accumulator for the child lists passed to builders.
///
/// Child arguments may be a single node, a vector, an option, or any
/// nesting of those; flattening collapses the structure in order and drops
/// absent entries.
#[derive(Debug, Clone, Default)]
pub enum Children {
    /// No children.
    #[default]
    None,
    /// A single child.
    One(Arc<ConstructNode>),
    /// A nested list, flattened recursively.
    Many(Vec<Children>),
}

impl Children {
    /// Collapses the accumulator into a flat, order-preserving child list.
    #[must_use]
    pub fn flatten(self) -> SmallVec<[Arc<ConstructNode>; 4]> {
        let mut out = SmallVec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(self, out: &mut SmallVec<[Arc<ConstructNode>; 4]>) {
        match self {
            Self::None => {}
            Self::One(node) => out.push(node),
            Self::Many(items) => {
                for item in items {
                    item.collect_into(out);
                }
            }
        }
    }
}

impl From<()> for Children {
    fn from((): ()) -> Self {
        Self::None
    }
}

impl From<Arc<ConstructNode>> for Children {
    fn from(node: Arc<ConstructNode>) -> Self {
        Self::One(node)
    }
}

impl From<&Arc<ConstructNode>> for Children {
    fn from(node: &Arc<ConstructNode>) -> Self {
        Self::One(Arc::clone(node))
    }
}

impl From<Option<Arc<ConstructNode>>> for Children {
    fn from(node: Option<Arc<ConstructNode>>) -> Self {
        node.map_or(Self::None, Self::One)
    }
}

impl From<Vec<Arc<ConstructNode>>> for Children {
    fn from(nodes: Vec<Arc<ConstructNode>>) -> Self {
        Self::Many(nodes.into_iter().map(Self::One).collect())
    }
}

impl From<&[Arc<ConstructNode>]> for Children {
    fn from(nodes: &[Arc<ConstructNode>]) -> Self {
        Self::Many(nodes.iter().map(Self::from).collect())
    }
}

impl From<Vec<Children>> for Children {
    fn from(items: Vec<Children>) -> Self {
        Self::Many(items)
    }
}

impl<const N: usize> From<[Arc<ConstructNode>; N]> for Children {
    fn from(nodes: [Arc<ConstructNode>; N]) -> Self {
        Self::Many(nodes.into_iter().map(Self::One).collect())
    }
}

impl FromIterator<Arc<ConstructNode>> for Children {
    fn from_iter<I: IntoIterator<Item = Arc<ConstructNode>>>(iter: I) -> Self {
        Self::Many(iter.into_iter().map(Self::One).collect())
    }
}
