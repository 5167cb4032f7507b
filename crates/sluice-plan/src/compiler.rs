//! # Plan Compiler
//!
//! Lowers a validated construct tree into an [`ExecutionPlan`]: one
//! operator per non-structural graph node, explicit dataflow edges with
//! shuffle strategies, and pipeline-level settings pulled off the root.
//!
//! Compilation is deterministic. The same tree and options always produce
//! the same plan and the same encoded bytes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sluice_plan::{compile_plan, CompileOptions};
//!
//! let options = CompileOptions {
//!     source_file: Some("pipelines/orders.rs".to_string()),
//! };
//! let compiled = compile_plan(&tree, &options)?;
//! std::fs::write("orders.plan", &compiled.binary)?;
//! ```

use std::sync::Arc;

use rkyv::util::AlignedVec;
use thiserror::Error;
use tracing::debug;

use sluice_core::operator::{
    CheckpointMode, DataFormat, JoinType, KafkaStartupMode, OperatorProps,
};
use sluice_core::tree::{ConstructNode, NodeKind};
use sluice_core::{FxIndexMap, GraphError, PipelineGraph, Severity};

use crate::model::{
    AddFieldConfig, AggregateConfig, CastConfig, ChangelogMode, CheckpointConfig, CoalesceConfig,
    ConsoleSinkConfig, DeduplicateConfig, DropConfig, Edge, ExecutionPlan, ExecutionStrategy,
    FilterConfig, FlatMapConfig, GeneratorSourceConfig, HashJoinConfig, IntervalJoinConfig,
    KafkaSinkConfig, KafkaSourceConfig, KeyValue, LookupAsyncConfig, LookupCacheConfig,
    LookupJoinConfig, MapConfig, MatchRecognizeConfig, OperatorConfig, OperatorNode, OperatorType,
    PipelineMode, PlanField, PlanSchema, RawSqlConfig, RenameConfig, RestartConfig,
    RouteBranchConfig, RouteConfig, SessionWindowConfig, ShuffleStrategy, SlideWindowConfig,
    SourceLocation, StateConfig, TemporalJoinConfig, TopNConfig, TumbleWindowConfig, UnionConfig,
};
use crate::resolve::{resolve_schemas, SchemaMap};
use crate::wire::{encode_plan, WireError};

/// Errors produced by plan compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Graph validation reported error diagnostics.
    #[error("Plan compilation failed with {count} error(s):\n{details}")]
    Validation {
        /// Number of error diagnostics.
        count: usize,
        /// One indented line per diagnostic message.
        details: String,
    },

    /// The graph could not be ordered.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The compiled plan could not be encoded.
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Compilation options.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Source file path embedded into operator source locations.
    pub source_file: Option<String>,
}

/// A compiled pipeline: the in-memory plan plus its encoded wire bytes.
#[derive(Debug)]
pub struct CompiledPlan {
    /// The execution plan.
    pub plan: ExecutionPlan,
    /// The plan encoded for the runtime.
    pub binary: AlignedVec,
}

/// Compiles a construct tree into an execution plan.
///
/// The tree's root is expected to be a pipeline node; a non-pipeline root
/// compiles with default pipeline settings.
///
/// # Errors
///
/// Returns [`CompileError::Validation`] when builtin graph validation
/// reports any error diagnostic, and [`CompileError::Wire`] when the
/// finished plan cannot be encoded.
pub fn compile_plan(
    tree: &Arc<ConstructNode>,
    options: &CompileOptions,
) -> Result<CompiledPlan, CompileError> {
    let graph = PipelineGraph::from_tree(tree);

    let errors: Vec<String> = graph
        .validate()
        .into_iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message)
        .collect();
    if !errors.is_empty() {
        let details = errors
            .iter()
            .map(|message| format!("  - {message}"))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(CompileError::Validation {
            count: errors.len(),
            details,
        });
    }

    let schemas = resolve_schemas(&graph)?;

    let mut operators = Vec::new();
    for node in graph.nodes() {
        if node.kind == NodeKind::Pipeline || node.is_route_wrapper() {
            continue;
        }
        operators.push(compile_operator(node, &schemas, options));
    }

    let mut edges = Vec::new();
    for graph_edge in graph.edges() {
        let (Some(from_node), Some(to_node)) = (
            graph.node(graph_edge.from.as_str()),
            graph.node(graph_edge.to.as_str()),
        ) else {
            continue;
        };
        if from_node.kind == NodeKind::Pipeline || to_node.kind == NodeKind::Pipeline {
            continue;
        }
        if from_node.is_route_wrapper() || to_node.is_route_wrapper() {
            continue;
        }
        edges.push(Edge {
            from_operator: graph_edge.from.to_string(),
            to_operator: graph_edge.to.to_string(),
            shuffle: shuffle_strategy(from_node, to_node),
            partition_keys: partition_keys(to_node),
        });
    }
    for node in graph.nodes() {
        if node.component() == "Route" {
            append_route_edges(node, &mut edges);
        }
    }

    let plan = build_plan(tree, operators, edges);
    let binary = encode_plan(&plan)?;
    debug!(
        pipeline = %plan.pipeline_name,
        operators = plan.operators.len(),
        edges = plan.edges.len(),
        bytes = binary.len(),
        "compiled execution plan"
    );
    Ok(CompiledPlan { plan, binary })
}

// ---- Pipeline settings ----

fn build_plan(tree: &ConstructNode, operators: Vec<OperatorNode>, edges: Vec<Edge>) -> ExecutionPlan {
    let root = match &tree.props {
        OperatorProps::Pipeline(props) => Some(props),
        _ => None,
    };

    let checkpoint = root
        .and_then(|p| p.checkpoint.as_ref())
        .map(|c| CheckpointConfig {
            interval: c.interval.clone(),
            mode: c.mode.unwrap_or(CheckpointMode::ExactlyOnce).as_str().to_string(),
        });

    let state = root.and_then(|p| {
        if p.state_backend.is_none() && p.state_ttl.is_none() {
            return None;
        }
        Some(StateConfig {
            backend: p
                .state_backend
                .map_or_else(String::new, |b| b.as_str().to_string()),
            ttl: p.state_ttl.clone().unwrap_or_default(),
        })
    });

    let restart = root
        .and_then(|p| p.restart_strategy.as_ref())
        .map(|r| RestartConfig {
            kind: r.kind.as_str().to_string(),
            attempts: r.attempts.unwrap_or(0),
            delay: r.delay.clone().unwrap_or_default(),
        });

    ExecutionPlan {
        pipeline_name: root.map_or_else(|| "unnamed".to_string(), |p| p.name.clone()),
        default_parallelism: root.and_then(|p| p.parallelism).unwrap_or(1),
        mode: root
            .and_then(|p| p.mode)
            .map_or(PipelineMode::Streaming, PipelineMode::from),
        operators,
        edges,
        checkpoint,
        state,
        restart,
    }
}

// ---- Operator lowering ----

fn compile_operator(
    node: &ConstructNode,
    schemas: &SchemaMap,
    options: &CompileOptions,
) -> OperatorNode {
    let schema = schemas.get(&node.id);
    OperatorNode {
        id: node.id.to_string(),
        operator_type: operator_type(&node.props),
        name: node.component().to_string(),
        parallelism: node.parallelism().unwrap_or(0),
        execution_strategy: execution_strategy(&node.props),
        changelog_mode: ChangelogMode::AppendOnly,
        input_schema: schema.cloned(),
        output_schema: schema.cloned(),
        source_location: options.source_file.as_ref().map(|file| SourceLocation {
            file: file.clone(),
            line: 0,
            column: 0,
        }),
        config: operator_config(node),
    }
}

fn operator_type(props: &OperatorProps) -> OperatorType {
    match props {
        OperatorProps::KafkaSource(_) => OperatorType::KafkaSource,
        OperatorProps::GeneratorSource(_) => OperatorType::GeneratorSource,
        OperatorProps::KafkaSink(_) => OperatorType::KafkaSink,
        OperatorProps::ConsoleSink(_) => OperatorType::ConsoleSink,
        OperatorProps::Filter(_) => OperatorType::Filter,
        OperatorProps::Map(_) => OperatorType::Map,
        OperatorProps::FlatMap(_) => OperatorType::FlatMap,
        OperatorProps::Rename(_) => OperatorType::Rename,
        OperatorProps::Drop(_) => OperatorType::Drop,
        OperatorProps::Cast(_) => OperatorType::Cast,
        OperatorProps::Union(_) => OperatorType::Union,
        OperatorProps::Route(_) => OperatorType::Route,
        OperatorProps::Coalesce(_) => OperatorType::Coalesce,
        OperatorProps::AddField(_) => OperatorType::AddField,
        OperatorProps::Aggregate(_) => OperatorType::Aggregate,
        OperatorProps::Deduplicate(_) => OperatorType::Deduplicate,
        OperatorProps::TopN(_) => OperatorType::TopN,
        OperatorProps::TumbleWindow(_) => OperatorType::TumbleWindow,
        OperatorProps::SlideWindow(_) => OperatorType::SlideWindow,
        OperatorProps::SessionWindow(_) => OperatorType::SessionWindow,
        OperatorProps::Join(_) => OperatorType::HashJoin,
        OperatorProps::TemporalJoin(_) => OperatorType::TemporalJoin,
        OperatorProps::LookupJoin(_) => OperatorType::LookupJoin,
        OperatorProps::IntervalJoin(_) => OperatorType::IntervalJoin,
        OperatorProps::RawSql(_) => OperatorType::RawSql,
        OperatorProps::MatchRecognize(_) => OperatorType::MatchRecognize,
        _ => OperatorType::Unspecified,
    }
}

fn execution_strategy(props: &OperatorProps) -> ExecutionStrategy {
    match props {
        OperatorProps::TumbleWindow(_)
        | OperatorProps::SlideWindow(_)
        | OperatorProps::SessionWindow(_)
        | OperatorProps::Aggregate(_)
        | OperatorProps::RawSql(_) => ExecutionStrategy::MicroBatchSql,
        _ => ExecutionStrategy::NativeColumnar,
    }
}

fn pairs(map: &FxIndexMap<String, String>) -> Vec<KeyValue> {
    map.iter()
        .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
        .collect()
}

#[allow(clippy::too_many_lines)]
fn operator_config(node: &ConstructNode) -> Option<OperatorConfig> {
    let config = match &node.props {
        OperatorProps::KafkaSource(p) => OperatorConfig::KafkaSource(KafkaSourceConfig {
            topic: p.topic.clone(),
            bootstrap_servers: p.bootstrap_servers.clone().unwrap_or_default(),
            format: p.format.unwrap_or(DataFormat::Json).as_str().to_string(),
            schema: Some(PlanSchema::from_definition(&p.schema)),
            startup_mode: p
                .startup_mode
                .unwrap_or(KafkaStartupMode::LatestOffset)
                .as_str()
                .to_string(),
            consumer_group: p.consumer_group.clone().unwrap_or_default(),
        }),
        OperatorProps::GeneratorSource(p) => OperatorConfig::GeneratorSource(GeneratorSourceConfig {
            schema: Some(PlanSchema::from_definition(&p.schema)),
            rows_per_second: p.rows_per_second,
            max_rows: p.max_rows.unwrap_or(0),
        }),
        OperatorProps::KafkaSink(p) => OperatorConfig::KafkaSink(KafkaSinkConfig {
            topic: p.topic.clone(),
            bootstrap_servers: p.bootstrap_servers.clone().unwrap_or_default(),
            format: p.format.unwrap_or(DataFormat::Json).as_str().to_string(),
            key_by: p.key_by.clone(),
        }),
        OperatorProps::ConsoleSink(p) => OperatorConfig::ConsoleSink(ConsoleSinkConfig {
            max_rows: p.max_rows.unwrap_or(0),
        }),
        OperatorProps::Filter(p) => OperatorConfig::Filter(FilterConfig {
            condition_sql: p.condition.clone(),
        }),
        OperatorProps::Map(p) => OperatorConfig::Map(MapConfig {
            columns: pairs(&p.select),
        }),
        OperatorProps::FlatMap(p) => OperatorConfig::FlatMap(FlatMapConfig {
            unnest_column: p.unnest.clone(),
            output_fields: p
                .as_fields
                .iter()
                .map(|(name, field)| PlanField::from_field(name, field))
                .collect(),
        }),
        OperatorProps::Rename(p) => OperatorConfig::Rename(RenameConfig {
            columns: pairs(&p.columns),
        }),
        OperatorProps::Drop(p) => OperatorConfig::Drop(DropConfig {
            columns: p.columns.clone(),
        }),
        OperatorProps::Cast(p) => OperatorConfig::Cast(CastConfig {
            columns: p
                .columns
                .iter()
                .map(|(name, field)| PlanField::from_field(name, field))
                .collect(),
        }),
        OperatorProps::Union(_) => OperatorConfig::Union(UnionConfig {}),
        OperatorProps::Route(_) => OperatorConfig::Route(route_config(node)),
        OperatorProps::Coalesce(p) => OperatorConfig::Coalesce(CoalesceConfig {
            columns: pairs(&p.columns),
        }),
        OperatorProps::AddField(p) => OperatorConfig::AddField(AddFieldConfig {
            columns: pairs(&p.columns),
            types: p
                .types
                .iter()
                .map(|(name, field)| PlanField::from_field(name, field))
                .collect(),
        }),
        OperatorProps::Aggregate(p) => OperatorConfig::Aggregate(AggregateConfig {
            group_by: p.group_by.clone(),
            select: pairs(&p.select),
        }),
        OperatorProps::Deduplicate(p) => OperatorConfig::Deduplicate(DeduplicateConfig {
            key: p.key.clone(),
            order: p.order.clone(),
            keep: p.keep.as_str().to_string(),
        }),
        OperatorProps::TopN(p) => OperatorConfig::TopN(TopNConfig {
            partition_by: p.partition_by.clone(),
            order_by: p
                .order_by
                .iter()
                .map(|(column, direction)| KeyValue::new(column.clone(), direction.as_str()))
                .collect(),
            n: p.n,
        }),
        OperatorProps::TumbleWindow(p) => OperatorConfig::TumbleWindow(TumbleWindowConfig {
            size: p.size.clone(),
            time_column: p.on.clone(),
        }),
        OperatorProps::SlideWindow(p) => OperatorConfig::SlideWindow(SlideWindowConfig {
            size: p.size.clone(),
            slide: p.slide.clone(),
            time_column: p.on.clone(),
        }),
        OperatorProps::SessionWindow(p) => OperatorConfig::SessionWindow(SessionWindowConfig {
            gap: p.gap.clone(),
            time_column: p.on.clone(),
        }),
        OperatorProps::Join(p) => OperatorConfig::HashJoin(HashJoinConfig {
            condition_sql: p.on.clone(),
            join_type: p.join_type.unwrap_or(JoinType::Inner).as_str().to_string(),
            state_ttl: p.state_ttl.clone().unwrap_or_default(),
        }),
        OperatorProps::TemporalJoin(p) => OperatorConfig::TemporalJoin(TemporalJoinConfig {
            condition_sql: p.on.clone(),
            as_of: p.as_of.clone(),
        }),
        OperatorProps::LookupJoin(p) => OperatorConfig::LookupJoin(LookupJoinConfig {
            table: p.table.clone(),
            url: p.url.clone(),
            condition_sql: p.on.clone(),
            select: pairs(&p.select),
            lookup_async: p.lookup_async.as_ref().map(|a| LookupAsyncConfig {
                enabled: a.enabled,
                capacity: a.capacity.unwrap_or(0),
                timeout: a.timeout.clone().unwrap_or_default(),
            }),
            cache: p.cache.as_ref().map(|c| LookupCacheConfig {
                cache_type: c.cache_type.as_str().to_string(),
                max_rows: c.max_rows,
                ttl: c.ttl.clone(),
            }),
        }),
        OperatorProps::IntervalJoin(p) => OperatorConfig::IntervalJoin(IntervalJoinConfig {
            condition_sql: p.on.clone(),
            interval_from: p.interval.from.clone(),
            interval_to: p.interval.to.clone(),
            join_type: p.join_type.unwrap_or(JoinType::Inner).as_str().to_string(),
        }),
        OperatorProps::RawSql(p) => OperatorConfig::RawSql(RawSqlConfig { sql: p.sql.clone() }),
        OperatorProps::MatchRecognize(p) => OperatorConfig::MatchRecognize(MatchRecognizeConfig {
            partition_by: p.partition_by.clone(),
            order_by: parse_order_by(p.order_by.as_deref()),
            pattern: p.pattern.clone(),
            define: pairs(&p.define),
            measures: pairs(&p.measures),
            after_match: p.after.map_or_else(String::new, |a| a.as_str().to_string()),
        }),
        _ => return None,
    };
    Some(config)
}

/// Lowers an order-by declaration like `ts ASC` into a single entry.
fn parse_order_by(declaration: Option<&str>) -> Vec<KeyValue> {
    let Some(declaration) = declaration else {
        return Vec::new();
    };
    let Some(column) = declaration.split_whitespace().next() else {
        return Vec::new();
    };
    let direction = if declaration.contains("DESC") {
        "DESC"
    } else {
        "ASC"
    };
    vec![KeyValue::new(column, direction)]
}

fn route_config(node: &ConstructNode) -> RouteConfig {
    let mut branches = Vec::new();
    let mut default_operator = String::new();
    for child in &node.children {
        match &child.props {
            OperatorProps::RouteBranch(branch) => {
                branches.push(RouteBranchConfig {
                    condition_sql: branch.condition.clone(),
                    target_operator: child
                        .children
                        .first()
                        .map_or_else(String::new, |target| target.id.to_string()),
                });
            }
            OperatorProps::RouteDefault(_) => {
                default_operator = child
                    .children
                    .first()
                    .map_or_else(String::new, |target| target.id.to_string());
            }
            _ => {}
        }
    }
    RouteConfig {
        branches,
        default_operator,
    }
}

// ---- Edge lowering ----

fn shuffle_strategy(from: &ConstructNode, to: &ConstructNode) -> ShuffleStrategy {
    match &to.props {
        OperatorProps::Join(_)
        | OperatorProps::IntervalJoin(_)
        | OperatorProps::Aggregate(_)
        | OperatorProps::TumbleWindow(_)
        | OperatorProps::SlideWindow(_)
        | OperatorProps::SessionWindow(_)
        | OperatorProps::TopN(_)
        | OperatorProps::Deduplicate(_) => ShuffleStrategy::Hash,
        // The versioned-table side is replicated; the probe stream hashes.
        OperatorProps::TemporalJoin(p) => {
            if from.id == p.temporal {
                ShuffleStrategy::Broadcast
            } else {
                ShuffleStrategy::Hash
            }
        }
        _ => ShuffleStrategy::Forward,
    }
}

fn partition_keys(to: &ConstructNode) -> Vec<String> {
    match &to.props {
        OperatorProps::Aggregate(p) => p.group_by.clone(),
        OperatorProps::Deduplicate(p) => p.key.clone(),
        OperatorProps::TopN(p) => p.partition_by.clone(),
        _ => Vec::new(),
    }
}

/// Emits Route→branch-operator edges, bypassing the structural wrappers.
fn append_route_edges(route: &ConstructNode, edges: &mut Vec<Edge>) {
    for child in &route.children {
        if !child.is_route_wrapper() {
            continue;
        }
        for grandchild in &child.children {
            if grandchild.is_route_wrapper() {
                continue;
            }
            edges.push(Edge {
                from_operator: route.id.to_string(),
                to_operator: grandchild.id.to_string(),
                shuffle: ShuffleStrategy::Forward,
                partition_keys: Vec::new(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use sluice_core::operator::{
        AggregateProps, CheckpointSpec, ConsoleSinkProps, FilterProps, JoinProps,
        KafkaSourceProps, PipelineMode as PropsMode, PipelineProps, RestartKind, RestartStrategy,
        RouteBranchProps, RouteDefaultProps, RouteProps, StateBackend, TemporalJoinProps,
        TumbleWindowProps,
    };
    use sluice_core::schema::{FieldDefinition, SchemaDefinition};
    use sluice_core::session::SynthSession;
    use sluice_core::tree::Children;

    use super::*;

    fn order_schema() -> SchemaDefinition {
        SchemaDefinition::builder()
            .field("id", FieldDefinition::bigint())
            .field("amount", FieldDefinition::double())
            .field("ts", FieldDefinition::timestamp(3))
            .build()
            .unwrap()
    }

    fn source(session: &mut SynthSession, children: impl Into<Children>) -> Arc<ConstructNode> {
        session.element(
            OperatorProps::KafkaSource(KafkaSourceProps {
                topic: "orders".to_string(),
                bootstrap_servers: Some("localhost:9092".to_string()),
                format: None,
                schema: order_schema(),
                watermark: None,
                startup_mode: None,
                consumer_group: None,
                parallelism: None,
            }),
            Some("orders"),
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

    fn pipeline_named(
        session: &mut SynthSession,
        props: PipelineProps,
        children: impl Into<Children>,
    ) -> Arc<ConstructNode> {
        session.element(OperatorProps::Pipeline(props), None, children)
    }

    fn basic_pipeline_props(name: &str) -> PipelineProps {
        PipelineProps {
            name: name.to_string(),
            mode: None,
            parallelism: None,
            checkpoint: None,
            state_backend: None,
            state_ttl: None,
            restart_strategy: None,
            namespace: None,
            bootstrap_servers: None,
        }
    }

    #[test]
    fn test_compile_linear_pipeline() {
        let mut session = SynthSession::new();
        let s = sink(&mut session);
        let filter = session.element(
            OperatorProps::Filter(FilterProps {
                condition: "amount > 10".into(),
                parallelism: Some(2),
            }),
            None,
            s,
        );
        let src = source(&mut session, filter);
        let root = pipeline_named(&mut session, basic_pipeline_props("orders"), src.clone());

        let compiled = compile_plan(&root, &CompileOptions::default()).unwrap();
        let plan = &compiled.plan;

        assert_eq!(plan.pipeline_name, "orders");
        assert_eq!(plan.default_parallelism, 1);
        assert_eq!(plan.mode, PipelineMode::Streaming);
        // The pipeline root is structural and produces no operator.
        assert_eq!(plan.operators.len(), 3);
        assert!(plan.operators.iter().all(|op| op.id != root.id.as_str()));

        let source_op = plan.operator(src.id.as_str()).unwrap();
        assert_eq!(source_op.operator_type, OperatorType::KafkaSource);
        assert_eq!(source_op.name, "KafkaSource");
        assert_eq!(source_op.parallelism, 0);
        assert!(source_op.output_schema.is_some());
        assert!(source_op.source_location.is_none());

        let filter_op = plan
            .operators
            .iter()
            .find(|op| op.operator_type == OperatorType::Filter)
            .unwrap();
        assert_eq!(filter_op.parallelism, 2);
        assert!(matches!(
            filter_op.config,
            Some(OperatorConfig::Filter(ref c)) if c.condition_sql == "amount > 10"
        ));

        // Source -> Filter -> Sink, no edges touching the pipeline root.
        assert_eq!(plan.edges.len(), 2);
        assert!(plan.edges.iter().all(|e| e.shuffle == ShuffleStrategy::Forward));
    }

    #[test]
    fn test_validation_errors_abort_compilation() {
        let mut session = SynthSession::new();
        let s = sink(&mut session);
        let connected = source(&mut session, s);
        let orphan_a = source(&mut session, Children::None);
        let orphan_b = source(&mut session, Children::None);
        let root = pipeline_named(
            &mut session,
            basic_pipeline_props("broken"),
            [connected, orphan_a.clone(), orphan_b.clone()],
        );

        let err = compile_plan(&root, &CompileOptions::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Plan compilation failed with 2 error(s):\n"));
        assert!(message.contains(&format!(
            "  - Orphan source 'KafkaSource' ({}): declared but never consumed",
            orphan_a.id
        )));
        assert!(message.contains(&format!(
            "  - Orphan source 'KafkaSource' ({}): declared but never consumed",
            orphan_b.id
        )));
    }

    #[test]
    fn test_kafka_source_config_defaults() {
        let mut session = SynthSession::new();
        let s = sink(&mut session);
        let src = source(&mut session, s);
        let root = pipeline_named(&mut session, basic_pipeline_props("p"), src.clone());

        let compiled = compile_plan(&root, &CompileOptions::default()).unwrap();
        let op = compiled.plan.operator(src.id.as_str()).unwrap();
        let Some(OperatorConfig::KafkaSource(config)) = &op.config else {
            panic!("expected kafka source config");
        };
        assert_eq!(config.topic, "orders");
        assert_eq!(config.bootstrap_servers, "localhost:9092");
        assert_eq!(config.format, "json");
        assert_eq!(config.startup_mode, "latest-offset");
        assert_eq!(config.consumer_group, "");
        assert_eq!(config.schema.as_ref().unwrap().fields.len(), 3);
    }

    #[test]
    fn test_aggregate_edge_hashes_on_group_keys() {
        let mut session = SynthSession::new();
        let s = sink(&mut session);
        let mut select = FxIndexMap::default();
        select.insert("total".to_string(), "SUM(amount)".to_string());
        let agg = session.element(
            OperatorProps::Aggregate(AggregateProps {
                group_by: vec!["id".to_string()],
                select,
                parallelism: None,
            }),
            None,
            s,
        );
        let src = source(&mut session, agg.clone());
        let root = pipeline_named(&mut session, basic_pipeline_props("p"), src.clone());

        let compiled = compile_plan(&root, &CompileOptions::default()).unwrap();
        let plan = &compiled.plan;

        let agg_op = plan.operator(agg.id.as_str()).unwrap();
        assert_eq!(agg_op.execution_strategy, ExecutionStrategy::MicroBatchSql);

        let edge = plan
            .edges
            .iter()
            .find(|e| e.to_operator == agg.id.as_str())
            .unwrap();
        assert_eq!(edge.shuffle, ShuffleStrategy::Hash);
        assert_eq!(edge.partition_keys, vec!["id".to_string()]);

        // Downstream of the aggregate the data forwards again.
        let out = plan
            .edges
            .iter()
            .find(|e| e.from_operator == agg.id.as_str())
            .unwrap();
        assert_eq!(out.shuffle, ShuffleStrategy::Forward);
        assert!(out.partition_keys.is_empty());
    }

    #[test]
    fn test_temporal_join_broadcasts_the_versioned_side() {
        let mut session = SynthSession::new();
        let stream = source(&mut session, Children::None);
        let table = session.element(
            OperatorProps::KafkaSource(KafkaSourceProps {
                topic: "rates".to_string(),
                bootstrap_servers: None,
                format: None,
                schema: order_schema(),
                watermark: None,
                startup_mode: None,
                consumer_group: None,
                parallelism: None,
            }),
            Some("rates"),
            Children::None,
        );
        let join = session.element(
            OperatorProps::TemporalJoin(TemporalJoinProps {
                stream: stream.id.clone(),
                temporal: table.id.clone(),
                on: "orders.currency = rates.currency".into(),
                as_of: "ts".into(),
                parallelism: None,
            }),
            None,
            [stream.clone(), table.clone()],
        );

        assert_eq!(shuffle_strategy(&table, &join), ShuffleStrategy::Broadcast);
        assert_eq!(shuffle_strategy(&stream, &join), ShuffleStrategy::Hash);
        assert!(partition_keys(&join).is_empty());
    }

    #[test]
    fn test_route_emits_branch_edges_and_config() {
        let mut session = SynthSession::new();
        let high_sink = sink(&mut session);
        let low_sink = sink(&mut session);
        let branch = session.element(
            OperatorProps::RouteBranch(RouteBranchProps {
                condition: "amount > 100".into(),
            }),
            None,
            high_sink.clone(),
        );
        let default_branch = session.element(
            OperatorProps::RouteDefault(RouteDefaultProps::default()),
            None,
            low_sink.clone(),
        );
        let route = session.element(
            OperatorProps::Route(RouteProps::default()),
            None,
            [branch.clone(), default_branch.clone()],
        );
        let src = source(&mut session, route.clone());
        let root = pipeline_named(&mut session, basic_pipeline_props("routed"), src);

        let compiled = compile_plan(&root, &CompileOptions::default()).unwrap();
        let plan = &compiled.plan;

        // Wrappers never become operators.
        assert!(plan
            .operators
            .iter()
            .all(|op| op.name != "Route.Branch" && op.name != "Route.Default"));

        let route_op = plan.operator(route.id.as_str()).unwrap();
        let Some(OperatorConfig::Route(config)) = &route_op.config else {
            panic!("expected route config");
        };
        assert_eq!(config.branches.len(), 1);
        assert_eq!(config.branches[0].condition_sql, "amount > 100");
        assert_eq!(config.branches[0].target_operator, high_sink.id.as_str());
        assert_eq!(config.default_operator, low_sink.id.as_str());

        // Route edges reach through the wrappers to the branch operators.
        assert!(plan.edges.iter().any(|e| {
            e.from_operator == route.id.as_str() && e.to_operator == high_sink.id.as_str()
        }));
        assert!(plan.edges.iter().any(|e| {
            e.from_operator == route.id.as_str() && e.to_operator == low_sink.id.as_str()
        }));
        // No edge touches a wrapper node.
        for wrapper in [&branch, &default_branch] {
            assert!(plan.edges.iter().all(|e| {
                e.from_operator != wrapper.id.as_str() && e.to_operator != wrapper.id.as_str()
            }));
        }
    }

    #[test]
    fn test_pipeline_settings_lowered() {
        let mut session = SynthSession::new();
        let s = sink(&mut session);
        let src = source(&mut session, s);
        let props = PipelineProps {
            name: "nightly".to_string(),
            mode: Some(PropsMode::Batch),
            parallelism: Some(4),
            checkpoint: Some(CheckpointSpec {
                interval: "30s".to_string(),
                mode: None,
            }),
            state_backend: Some(StateBackend::Pebble),
            state_ttl: None,
            restart_strategy: Some(RestartStrategy {
                kind: RestartKind::FixedDelay,
                attempts: Some(3),
                delay: Some("10s".to_string()),
            }),
            namespace: None,
            bootstrap_servers: None,
        };
        let root = pipeline_named(&mut session, props, src);

        let compiled = compile_plan(&root, &CompileOptions::default()).unwrap();
        let plan = &compiled.plan;

        assert_eq!(plan.pipeline_name, "nightly");
        assert_eq!(plan.mode, PipelineMode::Batch);
        assert_eq!(plan.default_parallelism, 4);

        let checkpoint = plan.checkpoint.as_ref().unwrap();
        assert_eq!(checkpoint.interval, "30s");
        assert_eq!(checkpoint.mode, "exactly-once");

        let state = plan.state.as_ref().unwrap();
        assert_eq!(state.backend, "pebble");
        assert_eq!(state.ttl, "");

        let restart = plan.restart.as_ref().unwrap();
        assert_eq!(restart.kind, "fixed-delay");
        assert_eq!(restart.attempts, 3);
        assert_eq!(restart.delay, "10s");
    }

    #[test]
    fn test_non_pipeline_root_gets_defaults() {
        let mut session = SynthSession::new();
        let s = sink(&mut session);
        let src = source(&mut session, s);

        let compiled = compile_plan(&src, &CompileOptions::default()).unwrap();
        assert_eq!(compiled.plan.pipeline_name, "unnamed");
        assert_eq!(compiled.plan.default_parallelism, 1);
        assert_eq!(compiled.plan.mode, PipelineMode::Streaming);
        assert!(compiled.plan.checkpoint.is_none());
    }

    #[test]
    fn test_source_location_recorded_when_given() {
        let mut session = SynthSession::new();
        let s = sink(&mut session);
        let src = source(&mut session, s);
        let root = pipeline_named(&mut session, basic_pipeline_props("p"), src);

        let options = CompileOptions {
            source_file: Some("pipelines/orders.rs".to_string()),
        };
        let compiled = compile_plan(&root, &options).unwrap();
        for op in &compiled.plan.operators {
            let location = op.source_location.as_ref().unwrap();
            assert_eq!(location.file, "pipelines/orders.rs");
            assert_eq!(location.line, 0);
            assert_eq!(location.column, 0);
        }
    }

    #[test]
    fn test_windows_use_micro_batch_sql_and_hash_edges() {
        let mut session = SynthSession::new();
        let s = sink(&mut session);
        let window = session.element(
            OperatorProps::TumbleWindow(TumbleWindowProps {
                size: "1m".into(),
                on: "ts".into(),
                parallelism: None,
            }),
            None,
            s,
        );
        let src = source(&mut session, window.clone());
        let root = pipeline_named(&mut session, basic_pipeline_props("w"), src);

        let compiled = compile_plan(&root, &CompileOptions::default()).unwrap();
        let plan = &compiled.plan;

        let op = plan.operator(window.id.as_str()).unwrap();
        assert_eq!(op.execution_strategy, ExecutionStrategy::MicroBatchSql);
        assert!(matches!(
            op.config,
            Some(OperatorConfig::TumbleWindow(ref c)) if c.size == "1m" && c.time_column == "ts"
        ));

        let edge = plan
            .edges
            .iter()
            .find(|e| e.to_operator == window.id.as_str())
            .unwrap();
        assert_eq!(edge.shuffle, ShuffleStrategy::Hash);
        assert!(edge.partition_keys.is_empty());
    }

    #[test]
    fn test_hash_join_config_defaults() {
        let mut session = SynthSession::new();
        let left = source(&mut session, Children::None);
        let right = session.element(
            OperatorProps::KafkaSource(KafkaSourceProps {
                topic: "customers".to_string(),
                bootstrap_servers: None,
                format: None,
                schema: order_schema(),
                watermark: None,
                startup_mode: None,
                consumer_group: None,
                parallelism: None,
            }),
            Some("customers"),
            Children::None,
        );
        let join = session.element(
            OperatorProps::Join(JoinProps {
                left: left.id.clone(),
                right: right.id.clone(),
                on: "orders.id = customers.order_id".into(),
                join_type: None,
                state_ttl: None,
                parallelism: None,
            }),
            None,
            [left.clone(), right.clone()],
        );

        assert_eq!(operator_type(&join.props), OperatorType::HashJoin);
        let Some(OperatorConfig::HashJoin(config)) = operator_config(&join) else {
            panic!("expected hash join config");
        };
        assert_eq!(config.condition_sql, "orders.id = customers.order_id");
        assert_eq!(config.join_type, "inner");
        assert_eq!(config.state_ttl, "");
        assert_eq!(shuffle_strategy(&left, &join), ShuffleStrategy::Hash);
    }

    #[test]
    fn test_match_recognize_order_by_parsing() {
        assert_eq!(parse_order_by(None), Vec::<KeyValue>::new());
        assert_eq!(
            parse_order_by(Some("ts ASC")),
            vec![KeyValue::new("ts", "ASC")]
        );
        assert_eq!(
            parse_order_by(Some("ts DESC")),
            vec![KeyValue::new("ts", "DESC")]
        );
        // Only the first token names the column.
        assert_eq!(
            parse_order_by(Some("ts, id DESC")),
            vec![KeyValue::new("ts,", "DESC")]
        );
    }
}
