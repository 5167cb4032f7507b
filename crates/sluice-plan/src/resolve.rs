//! # Schema Resolution
//!
//! Forward propagation of record schemas through the pipeline graph.
//!
//! Resolution is best-effort and partial: sources and schema-carrying
//! custom components seed the map, transforms derive from their first
//! resolved predecessor, and anything the pass cannot reach simply stays
//! absent. The plan model exposes schemas as `Option` for exactly this
//! reason.

use fxhash::FxHashSet;
use tracing::debug;

use sluice_core::operator::OperatorProps;
use sluice_core::tree::{ConstructNode, NodeId, NodeKind};
use sluice_core::{FxIndexMap, GraphError, PipelineGraph};

use crate::model::{PlanField, PlanSchema};

/// Resolved schemas keyed by node id, in resolution order.
pub type SchemaMap = FxIndexMap<NodeId, PlanSchema>;

/// Resolves a schema for every reachable operator in the graph.
///
/// Nodes whose props declare a schema seed the map; the rest are visited
/// in topological order and derive their output schema from the first
/// usable predecessor. Structural nodes (the pipeline root, route
/// wrappers) are never resolution targets.
///
/// # Errors
///
/// Returns [`GraphError::CycleDetected`] when the graph cannot be
/// ordered.
pub fn resolve_schemas(graph: &PipelineGraph) -> Result<SchemaMap, GraphError> {
    let mut schemas = SchemaMap::default();

    for node in graph.nodes() {
        if let Some(def) = node.declared_schema() {
            schemas.insert(node.id.clone(), PlanSchema::from_definition(def));
        }
    }

    for node in graph.topological_sort()? {
        if schemas.contains_key(&node.id) {
            continue;
        }
        if node.kind == NodeKind::Pipeline || node.is_route_wrapper() {
            continue;
        }
        if let Some(input) = incoming_schema(graph, &schemas, &node) {
            schemas.insert(node.id.clone(), derive_output_schema(&node, input));
        }
    }

    debug!(
        resolved = schemas.len(),
        nodes = graph.node_count(),
        "resolved operator schemas"
    );
    Ok(schemas)
}

/// Picks the input schema for a node from its predecessors.
///
/// Structural predecessors are skipped. A `Route` predecessor ends the
/// scan even when its own schema is unresolved; branch operators never
/// look past the router.
fn incoming_schema(
    graph: &PipelineGraph,
    schemas: &SchemaMap,
    node: &ConstructNode,
) -> Option<PlanSchema> {
    for pred_id in graph.incoming(node.id.as_str()) {
        let Some(pred) = graph.node(pred_id.as_str()) else {
            continue;
        };
        if pred.kind == NodeKind::Pipeline || pred.is_route_wrapper() {
            continue;
        }
        if pred.component() == "Route" {
            return schemas.get(pred_id).cloned();
        }
        if let Some(schema) = schemas.get(pred_id) {
            return Some(schema.clone());
        }
    }
    None
}

/// Derives an operator's output schema from its input schema.
///
/// Only operators with a statically knowable effect on the field list
/// have a rule; everything else passes the input through unchanged,
/// watermark and primary key included.
fn derive_output_schema(node: &ConstructNode, input: PlanSchema) -> PlanSchema {
    match &node.props {
        OperatorProps::Map(p) => PlanSchema {
            fields: p.select.keys().map(|name| PlanField::untyped(name)).collect(),
            watermark: None,
            primary_key: Vec::new(),
        },
        OperatorProps::Rename(p) => PlanSchema {
            fields: input
                .fields
                .into_iter()
                .map(|mut field| {
                    if let Some(new_name) = p.columns.get(&field.name) {
                        field.name.clone_from(new_name);
                    }
                    field
                })
                .collect(),
            watermark: None,
            primary_key: Vec::new(),
        },
        OperatorProps::Drop(p) => {
            let dropped: FxHashSet<&str> = p.columns.iter().map(String::as_str).collect();
            PlanSchema {
                fields: input
                    .fields
                    .into_iter()
                    .filter(|field| !dropped.contains(field.name.as_str()))
                    .collect(),
                watermark: None,
                primary_key: Vec::new(),
            }
        }
        OperatorProps::AddField(p) => {
            let mut fields = input.fields;
            for name in p.columns.keys() {
                match p.types.get(name) {
                    Some(def) => fields.push(PlanField::from_field(name, def)),
                    None => fields.push(PlanField::untyped(name)),
                }
            }
            PlanSchema {
                fields,
                watermark: None,
                primary_key: Vec::new(),
            }
        }
        _ => input,
    }
}
