//! # Execution Plan Model
//!
//! The serialized form a compiled pipeline takes on its way to the runtime:
//! a flat operator list, explicit dataflow edges with shuffle strategies,
//! and pipeline-level checkpoint/state/restart settings.
//!
//! ## Design
//!
//! - Every type here derives both serde (JSON inspection output) and rkyv
//!   (the binary wire format).
//! - Operator payloads form a closed enum, [`OperatorConfig`]; an operator
//!   the compiler cannot type carries no payload at all.
//! - Map-shaped fields are ordered [`KeyValue`] lists, so re-encoding a
//!   plan is byte-stable.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sluice_plan::{compile_plan, CompileOptions};
//!
//! let compiled = compile_plan(&tree, &CompileOptions::default())?;
//! for op in &compiled.plan.operators {
//!     println!("{} -> {:?}", op.id, op.operator_type);
//! }
//! ```

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::Serialize;

use sluice_core::schema::{FieldDefinition, PhysicalType, SchemaDefinition};

// ---- Plan-level enums ----

/// Operator tag in the serialized plan. Components without a runtime
/// operator (custom components, query clauses) map to `Unspecified`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorType {
    /// No runtime operator mapping.
    Unspecified,
    /// Kafka topic source.
    KafkaSource,
    /// Synthetic row generator.
    GeneratorSource,
    /// Kafka topic sink.
    KafkaSink,
    /// Console sink.
    ConsoleSink,
    /// Row filter.
    Filter,
    /// Projection.
    Map,
    /// Unnesting flat-map.
    FlatMap,
    /// Column rename.
    Rename,
    /// Column drop.
    Drop,
    /// Column cast.
    Cast,
    /// Stream union.
    Union,
    /// Conditional router.
    Route,
    /// Null coalescing.
    Coalesce,
    /// Computed-column append.
    AddField,
    /// Grouped aggregation.
    Aggregate,
    /// Keyed deduplication.
    Deduplicate,
    /// Per-partition top-N.
    TopN,
    /// Tumbling window.
    TumbleWindow,
    /// Sliding window.
    SlideWindow,
    /// Session window.
    SessionWindow,
    /// Two-sided hash join.
    HashJoin,
    /// Temporal (versioned-table) join.
    TemporalJoin,
    /// External-table lookup join.
    LookupJoin,
    /// Event-time interval join.
    IntervalJoin,
    /// Opaque SQL block.
    RawSql,
    /// MATCH_RECOGNIZE pattern matcher.
    MatchRecognize,
}

/// How records move along an edge between operator partitions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShuffleStrategy {
    /// Same-partition passthrough.
    Forward,
    /// Hash-partition by the edge's partition keys.
    Hash,
    /// Replicate to every partition.
    Broadcast,
}

/// Which engine path executes an operator.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStrategy {
    /// Native columnar operator.
    NativeColumnar,
    /// Micro-batched SQL evaluation.
    MicroBatchSql,
}

/// Changelog semantics of an operator's output.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangelogMode {
    /// Inserts only.
    AppendOnly,
    /// Inserts and retractions.
    Retract,
    /// Keyed upserts.
    Upsert,
}

/// Pipeline execution mode in the serialized plan.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineMode {
    /// Unbounded streaming execution.
    Streaming,
    /// Bounded batch execution.
    Batch,
}

impl From<sluice_core::operator::PipelineMode> for PipelineMode {
    fn from(mode: sluice_core::operator::PipelineMode) -> Self {
        match mode {
            sluice_core::operator::PipelineMode::Streaming => Self::Streaming,
            sluice_core::operator::PipelineMode::Batch => Self::Batch,
        }
    }
}

// ---- Plan schemas ----

/// One field of a plan schema.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct PlanField {
    /// Column name.
    pub name: String,
    /// User-facing SQL type text.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Physical storage type.
    pub data_type: PhysicalType,
    /// Whether the column may hold nulls.
    pub nullable: bool,
}

impl PlanField {
    /// Builds a plan field from a declared schema field.
    #[must_use]
    pub fn from_field(name: &str, field: &FieldDefinition) -> Self {
        Self {
            name: name.to_string(),
            sql_type: field.sql_type.clone(),
            data_type: field.data_type,
            nullable: true,
        }
    }

    /// Placeholder for a column whose type resolution cannot infer,
    /// e.g. a projected expression.
    #[must_use]
    pub fn untyped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sql_type: "STRING".to_string(),
            data_type: PhysicalType::Utf8,
            nullable: true,
        }
    }
}

/// Watermark declaration carried into the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct PlanWatermark {
    /// Event-time column.
    pub column: String,
    /// Watermark expression.
    pub expression: String,
}

/// Record schema in the serialized plan: an ordered field list plus
/// optional watermark and primary key.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct PlanSchema {
    /// Fields in declaration order.
    pub fields: Vec<PlanField>,
    /// Watermark declaration, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<PlanWatermark>,
    /// Primary key columns; empty when undeclared.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
}

impl PlanSchema {
    /// Converts a declared schema into its plan representation.
    #[must_use]
    pub fn from_definition(def: &SchemaDefinition) -> Self {
        Self {
            fields: def
                .fields
                .iter()
                .map(|(name, field)| PlanField::from_field(name, field))
                .collect(),
            watermark: def.watermark.as_ref().map(|w| PlanWatermark {
                column: w.column.clone(),
                expression: w.expression.clone(),
            }),
            primary_key: def.primary_key.clone(),
        }
    }

    /// Field names in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

// ---- Ordered map entries ----

/// Ordered string key/value pair. Stands in for map-shaped wire fields so
/// encoded plans are canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    /// Entry key.
    pub key: String,
    /// Entry value.
    pub value: String,
}

impl KeyValue {
    /// Builds an entry.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// ---- Operator config payloads ----

/// Kafka source payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct KafkaSourceConfig {
    /// Topic to consume.
    pub topic: String,
    /// Broker list; empty when unconfigured.
    pub bootstrap_servers: String,
    /// Record encoding.
    pub format: String,
    /// Declared record schema.
    pub schema: Option<PlanSchema>,
    /// Starting offset position.
    pub startup_mode: String,
    /// Consumer group id; empty when unset.
    pub consumer_group: String,
}

/// Generator source payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct GeneratorSourceConfig {
    /// Declared record schema.
    pub schema: Option<PlanSchema>,
    /// Emission rate.
    pub rows_per_second: u64,
    /// Row cap; 0 means unbounded.
    pub max_rows: u64,
}

/// Kafka sink payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct KafkaSinkConfig {
    /// Topic to produce to.
    pub topic: String,
    /// Broker list; empty when unconfigured.
    pub bootstrap_servers: String,
    /// Record encoding.
    pub format: String,
    /// Partitioning key columns.
    pub key_by: Vec<String>,
}

/// Console sink payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSinkConfig {
    /// Print cap; 0 means unlimited.
    pub max_rows: u64,
}

/// Filter payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// SQL predicate.
    pub condition_sql: String,
}

/// Projection payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    /// Output column to SQL expression, in output order.
    pub columns: Vec<KeyValue>,
}

/// Flat-map payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct FlatMapConfig {
    /// Column holding the collection to unnest.
    pub unnest_column: String,
    /// Declared fields of the unnested output.
    pub output_fields: Vec<PlanField>,
}

/// Rename payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct RenameConfig {
    /// Old name to new name, in declaration order.
    pub columns: Vec<KeyValue>,
}

/// Drop payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct DropConfig {
    /// Columns to remove.
    pub columns: Vec<String>,
}

/// Cast payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct CastConfig {
    /// Target column types; each field carries its column name.
    pub columns: Vec<PlanField>,
}

/// Union payload. The operator is keyed entirely by its edges.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct UnionConfig {}

/// A single route branch in a [`RouteConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct RouteBranchConfig {
    /// SQL predicate selecting the branch.
    pub condition_sql: String,
    /// Id of the first operator inside the branch; empty when the branch
    /// is childless.
    pub target_operator: String,
}

/// Route payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// Conditional branches in declaration order.
    pub branches: Vec<RouteBranchConfig>,
    /// Id of the default branch's first operator; empty when absent.
    pub default_operator: String,
}

/// Coalesce payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct CoalesceConfig {
    /// Column to SQL default expression.
    pub columns: Vec<KeyValue>,
}

/// Add-field payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct AddFieldConfig {
    /// New column to SQL expression, in append order.
    pub columns: Vec<KeyValue>,
    /// Declared types for new columns; each field carries its column name.
    pub types: Vec<PlanField>,
}

/// Aggregate payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct AggregateConfig {
    /// Grouping key columns.
    pub group_by: Vec<String>,
    /// Output column to aggregate expression, in output order.
    pub select: Vec<KeyValue>,
}

/// Deduplicate payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct DeduplicateConfig {
    /// Deduplication key columns.
    pub key: Vec<String>,
    /// Ordering column deciding first/last.
    pub order: String,
    /// Which duplicate survives (`first` / `last`).
    pub keep: String,
}

/// Top-N payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct TopNConfig {
    /// Partitioning columns.
    pub partition_by: Vec<String>,
    /// Ranking order; values are `ASC` / `DESC`.
    pub order_by: Vec<KeyValue>,
    /// Rows kept per partition.
    pub n: u64,
}

/// Tumbling window payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct TumbleWindowConfig {
    /// Window size.
    pub size: String,
    /// Event-time column.
    pub time_column: String,
}

/// Sliding window payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct SlideWindowConfig {
    /// Window size.
    pub size: String,
    /// Slide interval.
    pub slide: String,
    /// Event-time column.
    pub time_column: String,
}

/// Session window payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct SessionWindowConfig {
    /// Inactivity gap closing the session.
    pub gap: String,
    /// Event-time column.
    pub time_column: String,
}

/// Hash join payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct HashJoinConfig {
    /// SQL join condition.
    pub condition_sql: String,
    /// Join flavor.
    pub join_type: String,
    /// Join state time-to-live; empty when unset.
    pub state_ttl: String,
}

/// Temporal join payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct TemporalJoinConfig {
    /// SQL join condition.
    pub condition_sql: String,
    /// Event-time column the version is resolved against.
    pub as_of: String,
}

/// Async settings inside a [`LookupJoinConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct LookupAsyncConfig {
    /// Enables async lookups.
    pub enabled: bool,
    /// In-flight request capacity; 0 when unset.
    pub capacity: u32,
    /// Per-request timeout; empty when unset.
    pub timeout: String,
}

/// Cache settings inside a [`LookupJoinConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct LookupCacheConfig {
    /// Eviction policy.
    #[serde(rename = "type")]
    pub cache_type: String,
    /// Maximum cached rows.
    pub max_rows: u64,
    /// Cache entry time-to-live.
    pub ttl: String,
}

/// Lookup join payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct LookupJoinConfig {
    /// External table name.
    pub table: String,
    /// External system URL.
    pub url: String,
    /// SQL join condition.
    pub condition_sql: String,
    /// Projected columns from the lookup side.
    pub select: Vec<KeyValue>,
    /// Async lookup settings.
    #[serde(rename = "async", skip_serializing_if = "Option::is_none")]
    pub lookup_async: Option<LookupAsyncConfig>,
    /// Cache settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<LookupCacheConfig>,
}

/// Interval join payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct IntervalJoinConfig {
    /// SQL join condition.
    pub condition_sql: String,
    /// Lower event-time bound.
    pub interval_from: String,
    /// Upper event-time bound.
    pub interval_to: String,
    /// Join flavor.
    pub join_type: String,
}

/// Raw SQL payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct RawSqlConfig {
    /// SQL text, passed through unparsed.
    pub sql: String,
}

/// Pattern-match payload.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct MatchRecognizeConfig {
    /// Partitioning columns.
    pub partition_by: Vec<String>,
    /// Ordering; values are `ASC` / `DESC`.
    pub order_by: Vec<KeyValue>,
    /// Row pattern.
    pub pattern: String,
    /// Pattern variable definitions.
    pub define: Vec<KeyValue>,
    /// Output measure expressions.
    pub measures: Vec<KeyValue>,
    /// Post-match continuation strategy; empty when unset.
    pub after_match: String,
}

/// Closed per-operator payload. Variant names mirror the serialized
/// config discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub enum OperatorConfig {
    /// Kafka source settings.
    KafkaSource(KafkaSourceConfig),
    /// Generator source settings.
    GeneratorSource(GeneratorSourceConfig),
    /// Kafka sink settings.
    KafkaSink(KafkaSinkConfig),
    /// Console sink settings.
    ConsoleSink(ConsoleSinkConfig),
    /// Filter settings.
    Filter(FilterConfig),
    /// Projection settings.
    Map(MapConfig),
    /// Flat-map settings.
    FlatMap(FlatMapConfig),
    /// Rename settings.
    Rename(RenameConfig),
    /// Drop settings.
    Drop(DropConfig),
    /// Cast settings.
    Cast(CastConfig),
    /// Union settings.
    Union(UnionConfig),
    /// Route settings.
    Route(RouteConfig),
    /// Coalesce settings.
    Coalesce(CoalesceConfig),
    /// Add-field settings.
    AddField(AddFieldConfig),
    /// Aggregate settings.
    Aggregate(AggregateConfig),
    /// Deduplicate settings.
    Deduplicate(DeduplicateConfig),
    /// Top-N settings.
    TopN(TopNConfig),
    /// Tumbling window settings.
    TumbleWindow(TumbleWindowConfig),
    /// Sliding window settings.
    SlideWindow(SlideWindowConfig),
    /// Session window settings.
    SessionWindow(SessionWindowConfig),
    /// Hash join settings.
    HashJoin(HashJoinConfig),
    /// Temporal join settings.
    TemporalJoin(TemporalJoinConfig),
    /// Lookup join settings.
    LookupJoin(LookupJoinConfig),
    /// Interval join settings.
    IntervalJoin(IntervalJoinConfig),
    /// Raw SQL settings.
    RawSql(RawSqlConfig),
    /// Pattern-match settings.
    MatchRecognize(MatchRecognizeConfig),
}

// ---- Plan structure ----

/// Source position an operator was declared at, when the compiler was
/// given a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    /// Declaring file path.
    pub file: String,
    /// Line number; 0 when unknown.
    pub line: u32,
    /// Column number; 0 when unknown.
    pub column: u32,
}

/// One operator in the serialized plan.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct OperatorNode {
    /// Stable operator id, unique within the plan.
    pub id: String,
    /// Runtime operator tag.
    pub operator_type: OperatorType,
    /// Display name.
    pub name: String,
    /// Parallelism override; 0 defers to the pipeline default.
    pub parallelism: u32,
    /// Engine path.
    pub execution_strategy: ExecutionStrategy,
    /// Changelog semantics.
    pub changelog_mode: ChangelogMode,
    /// Resolved input schema, when resolution reached this operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<PlanSchema>,
    /// Resolved output schema, when resolution reached this operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<PlanSchema>,
    /// Declaring source position, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
    /// Typed payload; absent for operators without a runtime config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<OperatorConfig>,
}

/// Dataflow edge between two plan operators.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Producing operator id.
    pub from_operator: String,
    /// Consuming operator id.
    pub to_operator: String,
    /// Record movement strategy.
    pub shuffle: ShuffleStrategy,
    /// Hash-partition columns; empty unless `shuffle` partitions by key.
    pub partition_keys: Vec<String>,
}

/// Pipeline-level checkpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct CheckpointConfig {
    /// Checkpoint interval.
    pub interval: String,
    /// Consistency mode.
    pub mode: String,
}

/// Pipeline-level state settings.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct StateConfig {
    /// State backend; empty when unset.
    pub backend: String,
    /// State time-to-live; empty when unset.
    pub ttl: String,
}

/// Pipeline-level restart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct RestartConfig {
    /// Policy flavor.
    #[serde(rename = "type")]
    pub kind: String,
    /// Maximum restart attempts.
    pub attempts: u32,
    /// Delay between attempts; empty when unset.
    pub delay: String,
}

/// A fully compiled pipeline: operators, edges, and pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[rkyv(derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    /// Pipeline name.
    pub pipeline_name: String,
    /// Parallelism for operators without an override.
    pub default_parallelism: u32,
    /// Execution mode.
    pub mode: PipelineMode,
    /// Operators, one per non-structural graph node.
    pub operators: Vec<OperatorNode>,
    /// Dataflow edges.
    pub edges: Vec<Edge>,
    /// Checkpoint settings, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<CheckpointConfig>,
    /// State settings, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateConfig>,
    /// Restart settings, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<RestartConfig>,
}

impl ExecutionPlan {
    /// Looks up an operator by id.
    #[must_use]
    pub fn operator(&self, id: &str) -> Option<&OperatorNode> {
        self.operators.iter().find(|op| op.id == id)
    }

    /// Plain JSON representation for inspection and debugging tools.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
