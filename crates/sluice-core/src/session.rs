//! # Synthesis Session
//!
//! Session-scoped state for building construct trees: the node id
//! generator and the custom component kind overlay. One session per
//! synthesis run; two sessions never share ids.
//!
//! ## Id Generation
//!
//! Ids are derived from an explicit name hint when one is given,
//! otherwise from the component name and a session-wide counter. Hints
//! are sanitized to SQL identifier form and deduplicated with a numeric
//! suffix starting at 2. The counter advances on every element, hinted
//! or not, so unhinted ids stay stable when hints are added elsewhere.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut session = SynthSession::new();
//! let source = session.element(props, Some("orders.raw"), Children::None);
//! assert_eq!(source.id.as_str(), "orders_raw");
//! ```

use std::sync::Arc;

use fxhash::FxHashSet;

use crate::operator::OperatorProps;
use crate::plugin::ResolvedPluginChain;
use crate::tree::{Children, ConstructNode, NodeId, NodeKind};
use crate::FxIndexMap;

/// Sanitizes arbitrary text into a SQL-safe identifier.
///
/// Dots, dashes and slashes become underscores, every other
/// non-alphanumeric character is removed, then leading and trailing
/// underscores are trimmed and runs collapsed.
#[must_use]
pub fn to_sql_identifier(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| if matches!(c, '.' | '-' | '/') { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    let trimmed = replaced.trim_matches('_');
    let mut out = String::with_capacity(trimmed.len());
    let mut prev_underscore = false;
    for c in trimmed.chars() {
        if c == '_' {
            if !prev_underscore {
                out.push(c);
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }
    out
}

/// Mutable state of one synthesis run.
#[derive(Debug, Default)]
pub struct SynthSession {
    next_node_id: u64,
    used_ids: FxHashSet<String>,
    components: FxIndexMap<String, NodeKind>,
}

impl SynthSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a construct node, assigning it a session-unique id.
    ///
    /// The kind is the component's statically known kind; custom
    /// components consult the registered overlay and fall back to
    /// `Transform`.
    pub fn element(
        &mut self,
        props: OperatorProps,
        name_hint: Option<&str>,
        children: impl Into<Children>,
    ) -> Arc<ConstructNode> {
        let id = self.generate_node_id(props.component(), name_hint);
        let kind = self.resolve_kind(&props);
        Arc::new(ConstructNode {
            id: NodeId::from(id),
            kind,
            props,
            children: children.into().flatten(),
        })
    }

    /// Resolves the structural kind for a props payload.
    #[must_use]
    pub fn resolve_kind(&self, props: &OperatorProps) -> NodeKind {
        props.builtin_kind().unwrap_or_else(|| {
            self.components
                .get(props.component())
                .copied()
                .unwrap_or(NodeKind::Transform)
        })
    }

    /// Registers a custom component's kind.
    pub fn register_component(&mut self, name: impl Into<String>, kind: NodeKind) {
        self.components.insert(name.into(), kind);
    }

    /// Registers a batch of custom component kinds.
    pub fn register_components<I>(&mut self, components: I)
    where
        I: IntoIterator<Item = (String, NodeKind)>,
    {
        for (name, kind) in components {
            self.components.insert(name, kind);
        }
    }

    /// Registers every component kind a resolved plugin chain carries.
    pub fn register_chain(&mut self, chain: &ResolvedPluginChain) {
        self.register_components(chain.component_kinds());
    }

    /// Drops every registered custom component kind.
    pub fn clear_components(&mut self) {
        self.components.clear();
    }

    /// Restores the id generator to its initial state.
    ///
    /// Replaying the same builder sequence after a reset yields the same
    /// ids, which deterministic-synthesis tests rely on.
    pub fn reset_ids(&mut self) {
        self.next_node_id = 0;
        self.used_ids.clear();
    }

    /// Snapshot of the current component overlay, for scoped
    /// registration.
    #[must_use]
    pub fn component_snapshot(&self) -> FxIndexMap<String, NodeKind> {
        self.components.clone()
    }

    /// Restores a previously taken component snapshot.
    pub fn restore_components(&mut self, snapshot: FxIndexMap<String, NodeKind>) {
        self.components = snapshot;
    }

    fn generate_node_id(&mut self, component: &str, name_hint: Option<&str>) -> String {
        let base = match name_hint {
            Some(hint) => to_sql_identifier(hint),
            None => {
                let n = self.next_node_id;
                self.next_node_id += 1;
                format!("{component}_{n}")
            }
        };

        let mut id = base.clone();
        let mut suffix = 2u64;
        while self.used_ids.contains(&id) {
            id = format!("{base}_{suffix}");
            suffix += 1;
        }

        self.used_ids.insert(id.clone());
        // Hinted elements consume a counter slot too.
        if name_hint.is_some() {
            self.next_node_id += 1;
        }

        id
    }
}
