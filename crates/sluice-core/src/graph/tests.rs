use std::sync::Arc;

use super::*;
use crate::operator::{
    ConsoleSinkProps, FilterProps, KafkaSourceProps, OperatorProps, PipelineProps,
};
use crate::schema::{FieldDefinition, SchemaDefinition};
use crate::session::SynthSession;
use crate::tree::Children;

// ---- Helpers ----

fn test_schema() -> SchemaDefinition {
    SchemaDefinition::builder()
        .field("id", FieldDefinition::bigint())
        .field("ts", FieldDefinition::timestamp(3))
        .build()
        .unwrap()
}

fn source(session: &mut SynthSession, children: Children) -> Arc<ConstructNode> {
    session.element(
        OperatorProps::KafkaSource(KafkaSourceProps {
            topic: "orders".to_string(),
            bootstrap_servers: None,
            format: None,
            schema: test_schema(),
            watermark: None,
            startup_mode: None,
            consumer_group: None,
            parallelism: None,
        }),
        Some("orders"),
        children,
    )
}

fn filter(session: &mut SynthSession, condition: &str, children: Children) -> Arc<ConstructNode> {
    session.element(
        OperatorProps::Filter(FilterProps {
            condition: condition.to_string(),
            parallelism: None,
        }),
        None,
        children,
    )
}

fn sink(session: &mut SynthSession) -> Arc<ConstructNode> {
    session.element(
        OperatorProps::ConsoleSink(ConsoleSinkProps::default()),
        None,
        Children::None,
    )
}

fn pipeline(session: &mut SynthSession, children: Children) -> Arc<ConstructNode> {
    session.element(
        OperatorProps::Pipeline(PipelineProps {
            name: "test".to_string(),
            mode: None,
            parallelism: None,
            checkpoint: None,
            state_backend: None,
            state_ttl: None,
            restart_strategy: None,
            namespace: None,
            bootstrap_servers: None,
        }),
        None,
        children,
    )
}

/// Pipeline -> Source -> Filter -> Sink as a nested tree.
fn linear_pipeline(session: &mut SynthSession) -> Arc<ConstructNode> {
    let sink = sink(session);
    let filter = filter(session, "id > 0", Children::One(sink));
    let source = source(session, Children::One(filter));
    pipeline(session, Children::One(source))
}

// ---- Construction ----

#[test]
fn test_from_tree_adds_nodes_in_preorder() {
    let mut session = SynthSession::new();
    let root = linear_pipeline(&mut session);
    let graph = PipelineGraph::from_tree(&root);

    let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["Pipeline_3", "orders", "Filter_1", "ConsoleSink_0"]);
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn test_from_tree_edges_follow_containment() {
    let mut session = SynthSession::new();
    let root = linear_pipeline(&mut session);
    let graph = PipelineGraph::from_tree(&root);

    let edges: Vec<(String, String)> = graph
        .edges()
        .map(|e| (e.from.to_string(), e.to.to_string()))
        .collect();
    assert_eq!(
        edges,
        [
            ("Pipeline_3".to_string(), "orders".to_string()),
            ("orders".to_string(), "Filter_1".to_string()),
            ("Filter_1".to_string(), "ConsoleSink_0".to_string()),
        ]
    );

    let incoming: Vec<&str> = graph.incoming("Filter_1").map(NodeId::as_str).collect();
    assert_eq!(incoming, ["orders"]);
    let outgoing: Vec<&str> = graph.outgoing("Filter_1").map(NodeId::as_str).collect();
    assert_eq!(outgoing, ["ConsoleSink_0"]);
}

#[test]
fn test_duplicate_edges_collapse() {
    let mut session = SynthSession::new();
    let a = filter(&mut session, "a", Children::None);
    let b = filter(&mut session, "b", Children::None);

    let mut graph = PipelineGraph::new();
    graph.add_node(Arc::clone(&a));
    graph.add_node(Arc::clone(&b));
    graph.add_edge(&a.id, &b.id);
    graph.add_edge(&a.id, &b.id);

    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_add_edge_tolerates_unknown_endpoints() {
    let mut session = SynthSession::new();
    let a = filter(&mut session, "a", Children::None);

    let mut graph = PipelineGraph::new();
    graph.add_node(Arc::clone(&a));
    graph.add_edge(&a.id, &NodeId::from("ghost"));

    assert!(graph.node("ghost").is_none());
    assert_eq!(graph.edge_count(), 1);

    // Unknown endpoints never make it into the sorted node list.
    let order = graph.topological_sort().unwrap();
    assert_eq!(order.len(), 1);
    assert_eq!(order[0].id.as_str(), "Filter_0");
}

#[test]
fn test_nodes_by_kind() {
    let mut session = SynthSession::new();
    let root = linear_pipeline(&mut session);
    let graph = PipelineGraph::from_tree(&root);

    let sources = graph.nodes_by_kind(&[NodeKind::Source]);
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id.as_str(), "orders");

    let endpoints = graph.nodes_by_kind(&[NodeKind::Source, NodeKind::Sink]);
    assert_eq!(endpoints.len(), 2);
}

// ---- Topological sort ----

#[test]
fn test_topological_sort_parents_first() {
    let mut session = SynthSession::new();
    let root = linear_pipeline(&mut session);
    let graph = PipelineGraph::from_tree(&root);

    let sorted = graph.topological_sort().unwrap();
    let order: Vec<&str> = sorted.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(order, ["Pipeline_3", "orders", "Filter_1", "ConsoleSink_0"]);
}

#[test]
fn test_topological_sort_detects_cycle() {
    let mut session = SynthSession::new();
    let a = filter(&mut session, "a", Children::None);
    let b = filter(&mut session, "b", Children::None);

    let mut graph = PipelineGraph::new();
    graph.add_node(Arc::clone(&a));
    graph.add_node(Arc::clone(&b));
    graph.add_edge(&a.id, &b.id);
    graph.add_edge(&b.id, &a.id);

    let err = graph.topological_sort().unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected));
    assert_eq!(err.to_string(), "Cycle detected in pipeline graph");
}

// ---- Builtin validation ----

#[test]
fn test_orphan_source_is_reported() {
    let mut session = SynthSession::new();
    let orphan = source(&mut session, Children::None);
    let root = pipeline(&mut session, Children::One(Arc::clone(&orphan)));
    let graph = PipelineGraph::from_tree(&root);

    let diagnostics = graph.detect_orphan_sources();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(
        diagnostics[0].message,
        "Orphan source 'KafkaSource' (orders): declared but never consumed"
    );
    assert_eq!(diagnostics[0].node_id.as_ref().unwrap().as_str(), "orders");
}

#[test]
fn test_dangling_sink_is_reported() {
    let mut session = SynthSession::new();
    let dangling = sink(&mut session);
    let root = pipeline(&mut session, Children::One(Arc::clone(&dangling)));
    let mut graph = PipelineGraph::new();
    graph.add_node(Arc::clone(&root));
    graph.add_node(Arc::clone(&dangling));

    let diagnostics = graph.detect_dangling_sinks();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "Dangling sink 'ConsoleSink' (ConsoleSink_0): no input path"
    );
}

#[test]
fn test_cycle_produces_single_diagnostic() {
    let mut session = SynthSession::new();
    let a = filter(&mut session, "a", Children::None);
    let b = filter(&mut session, "b", Children::None);
    let c = filter(&mut session, "c", Children::None);

    let mut graph = PipelineGraph::new();
    graph.add_node(Arc::clone(&a));
    graph.add_node(Arc::clone(&b));
    graph.add_node(Arc::clone(&c));
    graph.add_edge(&a.id, &b.id);
    graph.add_edge(&b.id, &c.id);
    graph.add_edge(&c.id, &a.id);

    let diagnostics = graph.detect_cycles();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0]
        .message
        .starts_with("Cycle detected involving node 'Filter'"));
}

#[test]
fn test_validate_orders_builtin_checks() {
    let mut session = SynthSession::new();
    let orphan = source(&mut session, Children::None);
    let dangling = sink(&mut session);
    let a = filter(&mut session, "a", Children::None);
    let b = filter(&mut session, "b", Children::None);

    let mut graph = PipelineGraph::new();
    graph.add_node(Arc::clone(&orphan));
    graph.add_node(Arc::clone(&dangling));
    graph.add_node(Arc::clone(&a));
    graph.add_node(Arc::clone(&b));
    graph.add_edge(&a.id, &b.id);
    graph.add_edge(&b.id, &a.id);

    let diagnostics = graph.validate();
    assert_eq!(diagnostics.len(), 3);
    assert!(diagnostics[0].message.starts_with("Orphan source"));
    assert!(diagnostics[1].message.starts_with("Dangling sink"));
    assert!(diagnostics[2].message.starts_with("Cycle detected"));
}

// ---- Plugin validation ----

struct CountingValidator {
    name: &'static str,
}

impl crate::plugin::Plugin for CountingValidator {
    fn name(&self) -> &str {
        self.name
    }

    fn validate(
        &self,
        _tree: &Arc<ConstructNode>,
        existing: &[ValidationDiagnostic],
    ) -> Vec<ValidationDiagnostic> {
        vec![ValidationDiagnostic::warning(format!(
            "{} saw {} diagnostics",
            self.name,
            existing.len()
        ))]
    }
}

#[test]
fn test_plugin_validators_see_accumulated_diagnostics() {
    let mut session = SynthSession::new();
    let orphan = source(&mut session, Children::None);
    let root = pipeline(&mut session, Children::One(Arc::clone(&orphan)));
    let graph = PipelineGraph::from_tree(&root);

    let chain = crate::plugin::resolve_plugins(&[
        Arc::new(CountingValidator { name: "first" }) as Arc<dyn crate::plugin::Plugin>,
        Arc::new(CountingValidator { name: "second" }),
    ])
    .unwrap();

    let diagnostics = graph.validate_with_plugins(&root, &chain);
    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[1].message, "first saw 1 diagnostics");
    assert_eq!(diagnostics[2].message, "second saw 2 diagnostics");
}
