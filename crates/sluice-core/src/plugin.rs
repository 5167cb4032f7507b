//! # Plugin System
//!
//! Plugins extend synthesis in five layers: custom component
//! registration, tree transformers, plan prop transformers, validators,
//! and lifecycle hooks. [`resolve_plugins`] orders a set of plugins by
//! their declared constraints and merges their registrations into a
//! [`ResolvedPluginChain`] with conflict detection.
//!
//! ## Ordering
//!
//! Each plugin may declare `before` and `after` constraints naming other
//! plugins. Resolution is a topological sort with a deterministic
//! alphabetical tie-break; constraints naming unknown plugins are
//! ignored.
//!
//! ## Example
//!
//! ```rust,ignore
//! struct Lineage;
//!
//! impl Plugin for Lineage {
//!     fn name(&self) -> &str {
//!         "lineage"
//!     }
//!
//!     fn component_kinds(&self) -> Vec<(String, NodeKind)> {
//!         vec![("LineageTap".to_string(), NodeKind::Sink)]
//!     }
//! }
//!
//! let chain = resolve_plugins(&[Arc::new(Lineage)])?;
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use fxhash::FxHashSet;
use thiserror::Error;

use crate::graph::ValidationDiagnostic;
use crate::operator::PropBag;
use crate::session::SynthSession;
use crate::tree::{ConstructNode, NodeId, NodeKind};
use crate::{FxIndexMap, FxIndexSet};

/// Errors raised while resolving a plugin set into a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// Two plugins share a name.
    #[error("Duplicate plugin name '{name}'")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// Ordering constraints admit no valid order.
    #[error("Circular ordering constraint among plugins: {}", .names.join(", "))]
    CircularOrdering {
        /// Plugins left unplaced, in input order.
        names: Vec<String>,
    },

    /// Two plugins register the same component.
    #[error("Component '{component}' registered by both '{first}' and '{second}'")]
    ComponentConflict {
        /// The contested component name.
        component: String,
        /// Plugin that registered it first.
        first: String,
        /// Plugin that tried to register it again.
        second: String,
    },

    /// Two plugins register a plan transformer for the same component.
    #[error("Plan transformer for '{component}' registered by both '{first}' and '{second}'")]
    TransformerConflict {
        /// The contested component name.
        component: String,
        /// Plugin that registered it first.
        first: String,
        /// Plugin that tried to register it again.
        second: String,
    },
}

// ---- Hook contexts ----

/// Context passed to `before_synth` hooks.
#[derive(Debug)]
pub struct SynthHookContext<'a> {
    /// Name of the app being synthesized.
    pub app_name: &'a str,
    /// Pipeline roots as authored, before any transformation.
    pub pipelines: &'a [Arc<ConstructNode>],
}

/// Context passed to `after_synth` hooks.
#[derive(Debug)]
pub struct AfterSynthHookContext<'a> {
    /// Name of the app being synthesized.
    pub app_name: &'a str,
    /// Pipeline roots as authored, before any transformation.
    pub pipelines: &'a [Arc<ConstructNode>],
    /// Synthesized pipeline artifacts.
    pub results: &'a [PipelineArtifact],
}

/// One synthesized pipeline: its resolved name and transformed tree.
#[derive(Debug, Clone)]
pub struct PipelineArtifact {
    /// Pipeline name.
    pub name: String,
    /// Fully transformed construct tree.
    pub tree: Arc<ConstructNode>,
}

// ---- Plugin trait ----

/// Declarative before/after ordering constraints.
#[derive(Debug, Clone, Default)]
pub struct PluginOrdering {
    /// Plugins this one must run before.
    pub before: Vec<String>,
    /// Plugins this one must run after.
    pub after: Vec<String>,
}

/// Computes replacement props for one plan operator. Receives the node
/// and an id index over the whole tree.
pub type PlanTransformer =
    Arc<dyn Fn(&ConstructNode, &FxIndexMap<NodeId, Arc<ConstructNode>>) -> PropBag + Send + Sync>;

/// A synthesis extension. All methods except [`name`](Plugin::name) have
/// no-op defaults.
pub trait Plugin: Send + Sync {
    /// Unique plugin name.
    fn name(&self) -> &str;

    /// Optional version string, informational only.
    fn version(&self) -> Option<&str> {
        None
    }

    /// Ordering constraints relative to other plugins.
    fn ordering(&self) -> PluginOrdering {
        PluginOrdering::default()
    }

    /// Custom components this plugin registers, with their kinds.
    fn component_kinds(&self) -> Vec<(String, NodeKind)> {
        vec![]
    }

    /// Rewrites a pipeline tree during synthesis.
    fn transform_tree(
        &self,
        _session: &mut SynthSession,
        tree: Arc<ConstructNode>,
    ) -> Arc<ConstructNode> {
        tree
    }

    /// Plan prop transformers keyed by component name.
    fn plan_transformers(&self) -> Vec<(String, PlanTransformer)> {
        vec![]
    }

    /// Validates a pipeline tree. Receives diagnostics accumulated so
    /// far, builtin checks first.
    fn validate(
        &self,
        _tree: &Arc<ConstructNode>,
        _existing: &[ValidationDiagnostic],
    ) -> Vec<ValidationDiagnostic> {
        vec![]
    }

    /// Called once before any pipeline is synthesized.
    fn before_synth(&self, _context: &SynthHookContext<'_>) {}

    /// Called once after all pipelines are synthesized.
    fn after_synth(&self, _context: &AfterSynthHookContext<'_>) {}
}

// ---- Resolved chain ----

/// An ordered plugin set with merged registrations.
pub struct ResolvedPluginChain {
    plugins: Vec<Arc<dyn Plugin>>,
    components: FxIndexMap<String, (NodeKind, String)>,
    plan_transformers: FxIndexMap<String, (PlanTransformer, String)>,
}

impl ResolvedPluginChain {
    /// The chain of no plugins.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            plugins: Vec::new(),
            components: FxIndexMap::default(),
            plan_transformers: FxIndexMap::default(),
        }
    }

    /// `true` when the chain holds no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Plugin names in resolved execution order.
    #[must_use]
    pub fn order(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// `true` when any plugin registered custom components.
    #[must_use]
    pub fn has_components(&self) -> bool {
        !self.components.is_empty()
    }

    /// Merged custom component kinds, in registration order.
    pub fn component_kinds(&self) -> impl Iterator<Item = (String, NodeKind)> + '_ {
        self.components
            .iter()
            .map(|(name, (kind, _))| (name.clone(), *kind))
    }

    /// Looks up the merged plan transformer for a component.
    #[must_use]
    pub fn plan_transformer(&self, component: &str) -> Option<&PlanTransformer> {
        self.plan_transformers
            .get(component)
            .map(|(transformer, _)| transformer)
    }

    /// Applies every plugin's tree transformer in chain order.
    pub fn transform_tree(
        &self,
        session: &mut SynthSession,
        tree: Arc<ConstructNode>,
    ) -> Arc<ConstructNode> {
        self.plugins
            .iter()
            .fold(tree, |tree, plugin| plugin.transform_tree(session, tree))
    }

    /// Runs every plugin validator against a tree.
    ///
    /// Each validator sees the builtin diagnostics plus everything
    /// earlier validators produced. Returns only the plugin diagnostics.
    #[must_use]
    pub fn run_validators(
        &self,
        tree: &Arc<ConstructNode>,
        builtin: &[ValidationDiagnostic],
    ) -> Vec<ValidationDiagnostic> {
        let mut seen = builtin.to_vec();
        let mut produced = Vec::new();
        for plugin in &self.plugins {
            let new = plugin.validate(tree, &seen);
            seen.extend(new.iter().cloned());
            produced.extend(new);
        }
        produced
    }

    /// Invokes every `before_synth` hook in chain order.
    pub fn before_synth(&self, context: &SynthHookContext<'_>) {
        for plugin in &self.plugins {
            plugin.before_synth(context);
        }
    }

    /// Invokes every `after_synth` hook in chain order.
    pub fn after_synth(&self, context: &AfterSynthHookContext<'_>) {
        for plugin in &self.plugins {
            plugin.after_synth(context);
        }
    }
}

impl fmt::Debug for ResolvedPluginChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedPluginChain")
            .field("order", &self.order())
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field(
                "plan_transformers",
                &self.plan_transformers.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ---- Resolution ----

/// Orders plugins by their constraints and merges their registrations.
///
/// Ties break alphabetically, so resolution is deterministic for any
/// input order. Constraints naming unknown plugins are ignored.
///
/// # Errors
///
/// Returns [`PluginError::DuplicateName`] for repeated names,
/// [`PluginError::CircularOrdering`] when constraints admit no order,
/// and the conflict variants when two plugins register the same
/// component or plan transformer.
pub fn resolve_plugins(plugins: &[Arc<dyn Plugin>]) -> Result<ResolvedPluginChain, PluginError> {
    if plugins.is_empty() {
        return Ok(ResolvedPluginChain::empty());
    }

    let mut seen = FxHashSet::default();
    for plugin in plugins {
        if !seen.insert(plugin.name().to_string()) {
            return Err(PluginError::DuplicateName {
                name: plugin.name().to_string(),
            });
        }
    }

    let ordered = topological_sort(plugins)?;
    let components = merge_components(&ordered)?;
    let plan_transformers = merge_plan_transformers(&ordered)?;

    Ok(ResolvedPluginChain {
        plugins: ordered,
        components,
        plan_transformers,
    })
}

fn topological_sort(
    plugins: &[Arc<dyn Plugin>],
) -> Result<Vec<Arc<dyn Plugin>>, PluginError> {
    let by_name: FxIndexMap<&str, &Arc<dyn Plugin>> =
        plugins.iter().map(|p| (p.name(), p)).collect();

    let mut edges: FxIndexMap<String, FxIndexSet<String>> = FxIndexMap::default();
    let mut in_degree: FxIndexMap<String, usize> = FxIndexMap::default();
    for plugin in plugins {
        edges.insert(plugin.name().to_string(), FxIndexSet::default());
        in_degree.insert(plugin.name().to_string(), 0);
    }

    for plugin in plugins {
        let ordering = plugin.ordering();
        for target in &ordering.before {
            if by_name.contains_key(target.as_str()) {
                if let Some(outgoing) = edges.get_mut(plugin.name()) {
                    outgoing.insert(target.clone());
                }
                if let Some(degree) = in_degree.get_mut(target.as_str()) {
                    *degree += 1;
                }
            }
        }
        for dep in &ordering.after {
            if by_name.contains_key(dep.as_str()) {
                if let Some(outgoing) = edges.get_mut(dep.as_str()) {
                    outgoing.insert(plugin.name().to_string());
                }
                if let Some(degree) = in_degree.get_mut(plugin.name()) {
                    *degree += 1;
                }
            }
        }
    }

    let mut queue: VecDeque<String> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| name.clone())
        .collect();
    queue.make_contiguous().sort_unstable();

    let mut result: Vec<Arc<dyn Plugin>> = Vec::with_capacity(plugins.len());
    while let Some(name) = queue.pop_front() {
        if let Some(plugin) = by_name.get(name.as_str()) {
            result.push(Arc::clone(plugin));
        }

        let neighbors: Vec<String> = edges
            .get(name.as_str())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        for neighbor in neighbors {
            let Some(degree) = in_degree.get_mut(neighbor.as_str()) else {
                continue;
            };
            *degree -= 1;
            if *degree == 0 {
                // Sorted insertion keeps the alphabetical tie-break.
                match queue.iter().position(|queued| queued.as_str() > neighbor.as_str()) {
                    Some(index) => queue.insert(index, neighbor),
                    None => queue.push_back(neighbor),
                }
            }
        }
    }

    if result.len() != plugins.len() {
        let placed: FxHashSet<&str> = result.iter().map(|p| p.name()).collect();
        let names = plugins
            .iter()
            .map(|p| p.name().to_string())
            .filter(|name| !placed.contains(name.as_str()))
            .collect();
        return Err(PluginError::CircularOrdering { names });
    }

    Ok(result)
}

fn merge_components(
    ordered: &[Arc<dyn Plugin>],
) -> Result<FxIndexMap<String, (NodeKind, String)>, PluginError> {
    let mut merged: FxIndexMap<String, (NodeKind, String)> = FxIndexMap::default();
    for plugin in ordered {
        for (component, kind) in plugin.component_kinds() {
            if let Some((_, first)) = merged.get(&component) {
                return Err(PluginError::ComponentConflict {
                    component,
                    first: first.clone(),
                    second: plugin.name().to_string(),
                });
            }
            merged.insert(component, (kind, plugin.name().to_string()));
        }
    }
    Ok(merged)
}

fn merge_plan_transformers(
    ordered: &[Arc<dyn Plugin>],
) -> Result<FxIndexMap<String, (PlanTransformer, String)>, PluginError> {
    let mut merged: FxIndexMap<String, (PlanTransformer, String)> = FxIndexMap::default();
    for plugin in ordered {
        for (component, transformer) in plugin.plan_transformers() {
            if let Some((_, first)) = merged.get(&component) {
                return Err(PluginError::TransformerConflict {
                    component,
                    first: first.clone(),
                    second: plugin.name().to_string(),
                });
            }
            merged.insert(component, (transformer, plugin.name().to_string()));
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{CustomProps, OperatorProps, PropBag};
    use crate::tree::Children;

    struct TestPlugin {
        name: &'static str,
        ordering: PluginOrdering,
        components: Vec<(String, NodeKind)>,
        transformers: Vec<&'static str>,
    }

    impl TestPlugin {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                ordering: PluginOrdering::default(),
                components: vec![],
                transformers: vec![],
            }
        }

        fn before(mut self, targets: &[&str]) -> Self {
            self.ordering.before = targets.iter().map(ToString::to_string).collect();
            self
        }

        fn after(mut self, deps: &[&str]) -> Self {
            self.ordering.after = deps.iter().map(ToString::to_string).collect();
            self
        }

        fn with_component(mut self, component: &str, kind: NodeKind) -> Self {
            self.components.push((component.to_string(), kind));
            self
        }

        fn with_transformer(mut self, component: &'static str) -> Self {
            self.transformers.push(component);
            self
        }
    }

    impl Plugin for TestPlugin {
        fn name(&self) -> &str {
            self.name
        }

        fn ordering(&self) -> PluginOrdering {
            self.ordering.clone()
        }

        fn component_kinds(&self) -> Vec<(String, NodeKind)> {
            self.components.clone()
        }

        fn transform_tree(
            &self,
            session: &mut SynthSession,
            tree: Arc<ConstructNode>,
        ) -> Arc<ConstructNode> {
            let marker = session.element(
                OperatorProps::Custom(CustomProps {
                    component: format!("Marker:{}", self.name),
                    schema: None,
                    props: PropBag::default(),
                    parallelism: None,
                }),
                None,
                Children::None,
            );
            let mut children = tree.children.clone();
            children.push(marker);
            Arc::new(ConstructNode {
                id: tree.id.clone(),
                kind: tree.kind,
                props: tree.props.clone(),
                children,
            })
        }

        fn plan_transformers(&self) -> Vec<(String, PlanTransformer)> {
            self.transformers
                .iter()
                .map(|component| {
                    let transformer: PlanTransformer = Arc::new(|_, _| PropBag::default());
                    ((*component).to_string(), transformer)
                })
                .collect()
        }
    }

    fn arc(plugin: TestPlugin) -> Arc<dyn Plugin> {
        Arc::new(plugin)
    }

    #[test]
    fn test_unconstrained_plugins_sort_alphabetically() {
        let chain = resolve_plugins(&[
            arc(TestPlugin::named("charlie")),
            arc(TestPlugin::named("alpha")),
            arc(TestPlugin::named("bravo")),
        ])
        .unwrap();
        assert_eq!(chain.order(), ["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn test_before_constraint_overrides_alphabetical_order() {
        let chain = resolve_plugins(&[
            arc(TestPlugin::named("alpha")),
            arc(TestPlugin::named("zeta").before(&["alpha"])),
        ])
        .unwrap();
        assert_eq!(chain.order(), ["zeta", "alpha"]);
    }

    #[test]
    fn test_after_constraint() {
        let chain = resolve_plugins(&[
            arc(TestPlugin::named("alpha").after(&["zeta"])),
            arc(TestPlugin::named("zeta")),
        ])
        .unwrap();
        assert_eq!(chain.order(), ["zeta", "alpha"]);
    }

    #[test]
    fn test_unknown_constraint_names_are_ignored() {
        let chain = resolve_plugins(&[
            arc(TestPlugin::named("alpha").before(&["ghost"]).after(&["phantom"])),
        ])
        .unwrap();
        assert_eq!(chain.order(), ["alpha"]);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let err = resolve_plugins(&[
            arc(TestPlugin::named("dup")),
            arc(TestPlugin::named("dup")),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate plugin name 'dup'");
    }

    #[test]
    fn test_cycle_reports_unplaced_plugins_in_input_order() {
        let err = resolve_plugins(&[
            arc(TestPlugin::named("beta").before(&["alpha"])),
            arc(TestPlugin::named("alpha").before(&["beta"])),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Circular ordering constraint among plugins: beta, alpha"
        );
    }

    #[test]
    fn test_component_conflict() {
        let err = resolve_plugins(&[
            arc(TestPlugin::named("one").with_component("Widget", NodeKind::Source)),
            arc(TestPlugin::named("two").with_component("Widget", NodeKind::Sink)),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Component 'Widget' registered by both 'one' and 'two'"
        );
    }

    #[test]
    fn test_plan_transformer_conflict() {
        let err = resolve_plugins(&[
            arc(TestPlugin::named("one").with_transformer("Widget")),
            arc(TestPlugin::named("two").with_transformer("Widget")),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Plan transformer for 'Widget' registered by both 'one' and 'two'"
        );
    }

    #[test]
    fn test_transform_tree_applies_in_chain_order() {
        let chain = resolve_plugins(&[
            arc(TestPlugin::named("second").after(&["first"])),
            arc(TestPlugin::named("first")),
        ])
        .unwrap();

        let mut session = SynthSession::new();
        let root = session.element(
            OperatorProps::Custom(CustomProps {
                component: "Root".to_string(),
                schema: None,
                props: PropBag::default(),
                parallelism: None,
            }),
            None,
            Children::None,
        );

        let transformed = chain.transform_tree(&mut session, root);
        let markers: Vec<&str> = transformed
            .children
            .iter()
            .map(|child| child.props.component())
            .collect();
        assert_eq!(markers, ["Marker:first", "Marker:second"]);
    }

    #[test]
    fn test_empty_input_resolves_to_empty_chain() {
        let chain = resolve_plugins(&[]).unwrap();
        assert!(chain.is_empty());
        assert!(!chain.has_components());
    }
}
