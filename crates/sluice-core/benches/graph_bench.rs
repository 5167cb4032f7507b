//! Pipeline graph Criterion benchmarks.
//!
//! Measures tree-to-graph lowering, topological sort, builtin validation,
//! and session id allocation over linear and fan-out topologies.
//!
//! Run with: cargo bench --bench graph_bench

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use sluice_core::operator::{
    ConsoleSinkProps, FilterProps, KafkaSourceProps, OperatorProps, PipelineProps,
};
use sluice_core::schema::{FieldDefinition, SchemaDefinition};
use sluice_core::session::SynthSession;
use sluice_core::tree::{Children, ConstructNode};
use sluice_core::PipelineGraph;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn bench_schema() -> SchemaDefinition {
    SchemaDefinition::builder()
        .field("id", FieldDefinition::bigint())
        .field("value", FieldDefinition::double())
        .build()
        .unwrap()
}

fn filter_props(index: usize) -> OperatorProps {
    OperatorProps::Filter(FilterProps {
        condition: format!("value > {index}"),
        parallelism: None,
    })
}

fn source_props() -> OperatorProps {
    OperatorProps::KafkaSource(KafkaSourceProps {
        topic: "events".to_string(),
        bootstrap_servers: None,
        format: None,
        schema: bench_schema(),
        watermark: None,
        startup_mode: None,
        consumer_group: None,
        parallelism: None,
    })
}

fn pipeline_props() -> OperatorProps {
    OperatorProps::Pipeline(PipelineProps {
        name: "bench".to_string(),
        mode: None,
        parallelism: None,
        checkpoint: None,
        state_backend: None,
        state_ttl: None,
        restart_strategy: None,
        namespace: None,
        bootstrap_servers: None,
    })
}

/// Pipeline -> Source -> Filter x n -> Sink as one linear chain.
fn build_linear_tree(filter_count: usize) -> Arc<ConstructNode> {
    let mut session = SynthSession::new();
    let mut node = session.element(
        OperatorProps::ConsoleSink(ConsoleSinkProps::default()),
        None,
        Children::None,
    );
    for i in 0..filter_count {
        node = session.element(filter_props(i), None, node);
    }
    let source = session.element(source_props(), Some("events"), node);
    session.element(pipeline_props(), None, source)
}

/// Pipeline -> Source -> {Filter -> Sink} x n fan-out.
fn build_fanout_tree(branch_count: usize) -> Arc<ConstructNode> {
    let mut session = SynthSession::new();
    let branches: Vec<Children> = (0..branch_count)
        .map(|i| {
            let sink = session.element(
                OperatorProps::ConsoleSink(ConsoleSinkProps::default()),
                None,
                Children::None,
            );
            Children::One(session.element(filter_props(i), None, sink))
        })
        .collect();
    let source = session.element(source_props(), Some("events"), Children::Many(branches));
    session.element(pipeline_props(), None, source)
}

// ---------------------------------------------------------------------------
// 1. Tree lowering
// ---------------------------------------------------------------------------

fn bench_from_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_from_tree");

    for filter_count in [8usize, 64, 512] {
        let tree = build_linear_tree(filter_count);
        group.throughput(Throughput::Elements(filter_count as u64 + 3));

        group.bench_with_input(
            BenchmarkId::new("linear", filter_count),
            &filter_count,
            |b, _| b.iter(|| PipelineGraph::from_tree(black_box(&tree))),
        );
    }

    for branch_count in [8usize, 64, 512] {
        let tree = build_fanout_tree(branch_count);
        group.throughput(Throughput::Elements(branch_count as u64 * 2 + 2));

        group.bench_with_input(
            BenchmarkId::new("fan_out", branch_count),
            &branch_count,
            |b, _| b.iter(|| PipelineGraph::from_tree(black_box(&tree))),
        );
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 2. Topological sort
// ---------------------------------------------------------------------------

fn bench_topological_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_topological_sort");

    for filter_count in [8usize, 64, 512] {
        let graph = PipelineGraph::from_tree(&build_linear_tree(filter_count));
        group.throughput(Throughput::Elements(filter_count as u64 + 3));

        group.bench_with_input(
            BenchmarkId::new("linear", filter_count),
            &filter_count,
            |b, _| b.iter(|| graph.topological_sort().unwrap()),
        );
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 3. Builtin validation
// ---------------------------------------------------------------------------

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_validate");

    for branch_count in [8usize, 64, 512] {
        let graph = PipelineGraph::from_tree(&build_fanout_tree(branch_count));
        group.throughput(Throughput::Elements(branch_count as u64 * 2 + 2));

        group.bench_with_input(
            BenchmarkId::new("fan_out", branch_count),
            &branch_count,
            |b, _| {
                b.iter(|| {
                    let diagnostics = graph.validate();
                    black_box(diagnostics)
                })
            },
        );
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 4. Session id allocation
// ---------------------------------------------------------------------------

fn bench_session_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_id_allocation");
    let element_count = 1_000u64;
    group.throughput(Throughput::Elements(element_count));

    group.bench_function("unhinted", |b| {
        b.iter_batched(
            SynthSession::new,
            |mut session| {
                for i in 0..element_count as usize {
                    black_box(session.element(filter_props(i), None, Children::None));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("hinted_with_collisions", |b| {
        b.iter_batched(
            SynthSession::new,
            |mut session| {
                for i in 0..element_count as usize {
                    black_box(session.element(
                        filter_props(i),
                        Some("orders.raw-events"),
                        Children::None,
                    ));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion groups & main
// ---------------------------------------------------------------------------

criterion_group!(lowering_benches, bench_from_tree);
criterion_group!(sort_benches, bench_topological_sort);
criterion_group!(validation_benches, bench_validate);
criterion_group!(session_benches, bench_session_ids);

criterion_main!(
    lowering_benches,
    sort_benches,
    validation_benches,
    session_benches,
);
