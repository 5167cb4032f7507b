//! Yahoo Streaming Benchmark (YSB) authored with the sluice constructors.
//!
//! Pipeline: KafkaSource -> Filter(event_type = 'view') -> Map(ad_id, event_time)
//! -> TumbleWindow(10s) -> Aggregate(COUNT(*) GROUP BY ad_id) -> KafkaSink
//!
//! # Running
//!
//! ```bash
//! cargo run -p ysb-demo
//! ```

use sluice::operator::{DataFormat, KafkaStartupMode, PipelineMode};
use sluice::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== YSB: Yahoo Streaming Benchmark ===");
    println!();

    let mut session = SynthSession::new();

    println!("[1/4] Authoring the pipeline tree...");
    let schema = SchemaDefinition::builder()
        .field("ad_id", FieldDefinition::string())
        .field("ad_type", FieldDefinition::string())
        .field("event_type", FieldDefinition::string())
        .field("event_time", FieldDefinition::bigint())
        .field("ip_address", FieldDefinition::string())
        .build()?;

    let sink = kafka_sink(
        &mut session,
        None,
        KafkaSinkProps {
            topic: "ysb-output".to_string(),
            bootstrap_servers: Some("kafka:9092".to_string()),
            format: Some(DataFormat::Json),
            key_by: vec!["ad_id".to_string()],
            parallelism: None,
        },
        (),
    );

    let mut select = FxIndexMap::default();
    select.insert("view_count".to_string(), "COUNT(*)".to_string());
    let aggregated = aggregate(
        &mut session,
        AggregateProps {
            group_by: vec!["ad_id".to_string()],
            select,
            parallelism: None,
        },
        sink,
    );

    let windowed = tumble_window(
        &mut session,
        TumbleWindowProps {
            size: "10 SECOND".to_string(),
            on: "event_time".to_string(),
            parallelism: None,
        },
        aggregated,
    );

    let mut projection = FxIndexMap::default();
    projection.insert("ad_id".to_string(), "ad_id".to_string());
    projection.insert("event_time".to_string(), "event_time".to_string());
    let projected = map(
        &mut session,
        MapProps {
            select: projection,
            parallelism: None,
        },
        windowed,
    );

    let filtered = filter(
        &mut session,
        FilterProps {
            condition: "event_type = 'view'".to_string(),
            parallelism: None,
        },
        projected,
    );

    let source = kafka_source(
        &mut session,
        None,
        KafkaSourceProps {
            topic: "ad-events".to_string(),
            bootstrap_servers: Some("kafka:9092".to_string()),
            format: Some(DataFormat::Json),
            schema,
            watermark: None,
            startup_mode: Some(KafkaStartupMode::LatestOffset),
            consumer_group: Some("ysb-benchmark".to_string()),
            parallelism: None,
        },
        filtered,
    );

    let root = pipeline(
        &mut session,
        PipelineProps {
            name: "ysb".to_string(),
            mode: Some(PipelineMode::Streaming),
            parallelism: Some(4),
            checkpoint: None,
            state_backend: None,
            state_ttl: None,
            restart_strategy: None,
            namespace: None,
            bootstrap_servers: None,
        },
        source,
    )?;

    println!("[2/4] Synthesizing the app...");
    let app = synthesize_app(&mut session, "ysb-benchmark", root, &SynthOptions::default())?;
    let artifact = &app.pipelines[0];
    println!("  pipeline: {}", artifact.name);

    println!("[3/4] Compiling the execution plan...");
    let compiled = compile_plan(&artifact.tree, &CompileOptions::default())?;
    println!("  operators: {}", compiled.plan.operators.len());
    println!("  edges:     {}", compiled.plan.edges.len());
    for edge in &compiled.plan.edges {
        println!(
            "    {} -> {} [{:?}]",
            edge.from_operator, edge.to_operator, edge.shuffle
        );
    }
    println!("  binary:    {} bytes", compiled.binary.len());

    println!("[4/4] Plan JSON:");
    println!("{}", serde_json::to_string_pretty(&compiled.plan)?);

    Ok(())
}
