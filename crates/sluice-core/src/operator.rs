//! # Typed Operator Props
//!
//! Closed payload types for every builtin pipeline component, plus a
//! generic key/value bag for plugin-defined components.
//!
//! [`OperatorProps`] is the tagged union stored on each construct node.
//! Builtin components resolve their structural kind through an exhaustive
//! match here; only custom components go through the session's string
//! registry. Dispatch on a missing variant is a compile error rather than a
//! silent fallthrough.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{FieldDefinition, SchemaDefinition, WatermarkSpec};
use crate::tree::{NodeId, NodeKind};
use crate::FxIndexMap;

// ---- Generic prop values ----

/// Ordered string-keyed bag of [`PropValue`]s, the escape hatch payload for
/// custom components.
pub type PropBag = FxIndexMap<String, PropValue>;

/// JSON-shaped value stored in a [`PropBag`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// String.
    Str(String),
    /// Ordered list.
    List(Vec<PropValue>),
    /// Nested ordered map.
    Map(PropBag),
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(value: Vec<PropValue>) -> Self {
        Self::List(value)
    }
}

impl From<PropBag> for PropValue {
    fn from(value: PropBag) -> Self {
        Self::Map(value)
    }
}

// ---- Shared enums ----

/// Pipeline execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// Unbounded streaming execution.
    Streaming,
    /// Bounded batch execution.
    Batch,
}

impl PipelineMode {
    /// Wire spelling (`streaming` / `batch`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Batch => "batch",
        }
    }
}

/// Checkpoint consistency mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckpointMode {
    /// Exactly-once state consistency.
    ExactlyOnce,
    /// At-least-once state consistency.
    AtLeastOnce,
}

impl CheckpointMode {
    /// Wire spelling (`exactly-once` / `at-least-once`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExactlyOnce => "exactly-once",
            Self::AtLeastOnce => "at-least-once",
        }
    }
}

/// Pipeline state backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    /// Embedded LSM store.
    Pebble,
    /// In-memory state, lost on restart.
    Memory,
}

impl StateBackend {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pebble => "pebble",
            Self::Memory => "memory",
        }
    }
}

/// Restart policy applied by the runtime on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartKind {
    /// Fixed number of attempts with a fixed delay.
    FixedDelay,
    /// Rate-limited restarts.
    FailureRate,
    /// Fail the pipeline on first error.
    NoRestart,
}

impl RestartKind {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FixedDelay => "fixed-delay",
            Self::FailureRate => "failure-rate",
            Self::NoRestart => "no-restart",
        }
    }
}

/// Record encoding for Kafka sources and sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Newline-delimited JSON.
    Json,
    /// Comma-separated values.
    Csv,
}

impl DataFormat {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Offset position a Kafka source starts consuming from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KafkaStartupMode {
    /// Start from the latest offsets.
    LatestOffset,
    /// Start from the earliest offsets.
    EarliestOffset,
    /// Resume from committed consumer-group offsets.
    GroupOffsets,
}

impl KafkaStartupMode {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LatestOffset => "latest-offset",
            Self::EarliestOffset => "earliest-offset",
            Self::GroupOffsets => "group-offsets",
        }
    }
}

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Inner join.
    Inner,
    /// Left outer join.
    Left,
    /// Right outer join.
    Right,
    /// Full outer join.
    Full,
    /// Anti join (rows without a match).
    Anti,
    /// Semi join (rows with a match, left side only).
    Semi,
}

impl JoinType {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Full => "full",
            Self::Anti => "anti",
            Self::Semi => "semi",
        }
    }
}

/// Which duplicate survives deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepPolicy {
    /// Keep the first row per key.
    First,
    /// Keep the last row per key.
    Last,
}

impl KeepPolicy {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
        }
    }
}

/// Sort direction in order-by maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending.
    #[serde(rename = "ASC")]
    Asc,
    /// Descending.
    #[serde(rename = "DESC")]
    Desc,
}

impl SortDirection {
    /// Wire spelling (`ASC` / `DESC`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Post-match continuation strategy for pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchAfterStrategy {
    /// Resume after the matched rows.
    #[serde(rename = "MATCH_RECOGNIZED")]
    MatchRecognized,
    /// Resume at the row after the match start.
    #[serde(rename = "NEXT_ROW")]
    NextRow,
}

impl MatchAfterStrategy {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MatchRecognized => "MATCH_RECOGNIZED",
            Self::NextRow => "NEXT_ROW",
        }
    }
}

// ---- Pipeline ----

/// Checkpointing declaration on a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSpec {
    /// Checkpoint interval, e.g. `30s`.
    pub interval: String,
    /// Consistency mode; defaults to exactly-once downstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<CheckpointMode>,
}

/// Restart policy declaration on a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartStrategy {
    /// Policy flavor.
    #[serde(rename = "type")]
    pub kind: RestartKind,
    /// Maximum restart attempts, where applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    /// Delay between attempts, e.g. `10s`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
}

/// Props of the pipeline root.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineProps {
    /// Pipeline name, used as the plan name.
    pub name: String,
    /// Execution mode; streaming when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<PipelineMode>,
    /// Default operator parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
    /// Checkpointing declaration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<CheckpointSpec>,
    /// State backend selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_backend: Option<StateBackend>,
    /// State time-to-live, e.g. `1h`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_ttl: Option<String>,
    /// Restart policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_strategy: Option<RestartStrategy>,
    /// Deployment namespace, filled in by the config cascade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Broker list recorded by environment overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_servers: Option<String>,
}

// ---- Sources ----

/// Props of a Kafka-topic source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaSourceProps {
    /// Topic to consume.
    pub topic: String,
    /// Broker list; may be injected by the app config cascade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_servers: Option<String>,
    /// Record encoding; JSON when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DataFormat>,
    /// Declared record schema.
    pub schema: SchemaDefinition,
    /// Source-level watermark override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkSpec>,
    /// Starting offset position; latest when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_mode: Option<KafkaStartupMode>,
    /// Consumer group id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_group: Option<String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a synthetic row generator source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorSourceProps {
    /// Declared record schema.
    pub schema: SchemaDefinition,
    /// Emission rate.
    pub rows_per_second: u64,
    /// Stop after this many rows; unbounded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- Sinks ----

/// Props of a Kafka-topic sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaSinkProps {
    /// Topic to produce to.
    pub topic: String,
    /// Broker list; may be injected by the app config cascade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_servers: Option<String>,
    /// Record encoding; JSON when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DataFormat>,
    /// Partitioning key columns.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_by: Vec<String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a console (stdout) sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSinkProps {
    /// Print at most this many rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- Row transforms ----

/// Props of a row filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterProps {
    /// SQL predicate kept rows must satisfy.
    pub condition: String,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a projection. Output columns are exactly the select keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapProps {
    /// Output column name to SQL expression, in output order.
    pub select: FxIndexMap<String, String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of an unnesting flat-map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatMapProps {
    /// Column holding the collection to unnest.
    pub unnest: String,
    /// Declared fields of the unnested output.
    #[serde(rename = "as")]
    pub as_fields: FxIndexMap<String, FieldDefinition>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a grouped aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateProps {
    /// Grouping key columns.
    pub group_by: Vec<String>,
    /// Output column name to aggregate expression, in output order.
    pub select: FxIndexMap<String, String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a stream union.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionProps {
    /// Declared input schemas, checked pairwise for compatibility.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<SchemaDefinition>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of keyed deduplication.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeduplicateProps {
    /// Deduplication key columns.
    pub key: Vec<String>,
    /// Ordering column deciding first/last.
    pub order: String,
    /// Which duplicate survives.
    pub keep: KeepPolicy,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a per-partition top-N.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopNProps {
    /// Partitioning columns.
    pub partition_by: Vec<String>,
    /// Ranking order.
    pub order_by: FxIndexMap<String, SortDirection>,
    /// Rows kept per partition.
    pub n: u64,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- Routing ----

/// Props of a conditional router. Branch wrappers are children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteProps {
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a single route branch (structural wrapper).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteBranchProps {
    /// SQL predicate selecting this branch.
    pub condition: String,
}

/// Props of the route default branch (structural wrapper).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDefaultProps {}

// ---- Field transforms ----

/// Props of a column rename.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameProps {
    /// Old column name to new column name.
    pub columns: FxIndexMap<String, String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a column drop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropProps {
    /// Columns to remove.
    pub columns: Vec<String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a column type cast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastProps {
    /// Column name to target type.
    pub columns: FxIndexMap<String, FieldDefinition>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a null-coalescing defaulting transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoalesceProps {
    /// Column name to SQL default expression.
    pub columns: FxIndexMap<String, String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a computed-column append.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFieldProps {
    /// New column name to SQL expression, in append order.
    pub columns: FxIndexMap<String, String>,
    /// Declared types for new columns; untyped placeholder when absent.
    #[serde(skip_serializing_if = "FxIndexMap::is_empty")]
    pub types: FxIndexMap<String, FieldDefinition>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- Joins ----

/// Props of a two-sided hash join.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinProps {
    /// Left input node id.
    pub left: NodeId,
    /// Right input node id.
    pub right: NodeId,
    /// SQL join condition.
    pub on: String,
    /// Join flavor; inner when unset.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub join_type: Option<JoinType>,
    /// Join state time-to-live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_ttl: Option<String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a temporal (versioned-table) join.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalJoinProps {
    /// Probe-stream input node id.
    pub stream: NodeId,
    /// Versioned-table input node id; its edge is broadcast.
    pub temporal: NodeId,
    /// SQL join condition.
    pub on: String,
    /// Event-time column the version is resolved against.
    pub as_of: String,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Async lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupAsyncSpec {
    /// Enables async lookups.
    pub enabled: bool,
    /// In-flight request capacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    /// Per-request timeout, e.g. `500ms`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Lookup cache eviction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupCacheType {
    /// Least-recently-used eviction.
    Lru,
}

impl LookupCacheType {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lru => "lru",
        }
    }
}

/// Lookup cache settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupCacheSpec {
    /// Eviction policy.
    #[serde(rename = "type")]
    pub cache_type: LookupCacheType,
    /// Maximum cached rows.
    pub max_rows: u64,
    /// Cache entry time-to-live.
    pub ttl: String,
}

/// Props of an external-table lookup join.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupJoinProps {
    /// Stream input node id.
    pub input: NodeId,
    /// External table name.
    pub table: String,
    /// External system URL.
    pub url: String,
    /// SQL join condition.
    pub on: String,
    /// Projected columns from the lookup side.
    #[serde(skip_serializing_if = "FxIndexMap::is_empty")]
    pub select: FxIndexMap<String, String>,
    /// Async lookup settings.
    #[serde(rename = "async", skip_serializing_if = "Option::is_none")]
    pub lookup_async: Option<LookupAsyncSpec>,
    /// Cache settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<LookupCacheSpec>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Relative event-time bounds of an interval join.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalBounds {
    /// Lower bound, e.g. `-5m`.
    pub from: String,
    /// Upper bound, e.g. `10s`.
    pub to: String,
}

/// Props of an event-time interval join.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalJoinProps {
    /// Left input node id.
    pub left: NodeId,
    /// Right input node id.
    pub right: NodeId,
    /// SQL join condition.
    pub on: String,
    /// Event-time bounds.
    pub interval: IntervalBounds,
    /// Join flavor; inner when unset.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub join_type: Option<JoinType>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- Windows ----

/// Props of a tumbling window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TumbleWindowProps {
    /// Window size, e.g. `1m`.
    pub size: String,
    /// Event-time column.
    pub on: String,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a sliding window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideWindowProps {
    /// Window size.
    pub size: String,
    /// Slide interval.
    pub slide: String,
    /// Event-time column.
    pub on: String,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a session window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWindowProps {
    /// Inactivity gap closing the session.
    pub gap: String,
    /// Event-time column.
    pub on: String,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- Escape hatches ----

/// Props of an opaque SQL block over one or more input streams.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSqlProps {
    /// SQL text, passed through unparsed.
    pub sql: String,
    /// Declared output schema.
    pub output_schema: SchemaDefinition,
    /// Ids of the input streams, in declaration order.
    pub input_ids: Vec<NodeId>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- Pattern matching ----

/// Props of a MATCH_RECOGNIZE pattern matcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecognizeProps {
    /// Input stream node id.
    pub input: NodeId,
    /// Row pattern, e.g. `A B+ C`.
    pub pattern: String,
    /// Pattern variable definitions.
    pub define: FxIndexMap<String, String>,
    /// Output measure expressions.
    pub measures: FxIndexMap<String, String>,
    /// Post-match continuation strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<MatchAfterStrategy>,
    /// Partitioning columns.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partition_by: Vec<String>,
    /// Ordering declaration, e.g. `ts ASC`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- Query composite ----

/// Window specification shared by query clauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSpec {
    /// Partitioning columns.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partition_by: Vec<String>,
    /// Ordering columns.
    #[serde(skip_serializing_if = "FxIndexMap::is_empty")]
    pub order_by: FxIndexMap<String, SortDirection>,
}

/// Positional argument of a window function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnArg {
    /// SQL expression or column reference.
    Sql(String),
    /// Numeric literal.
    Number(f64),
}

/// Window function application in a select clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFunctionExpr {
    /// Function name, e.g. `ROW_NUMBER`.
    pub func: String,
    /// Positional arguments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ColumnArg>,
    /// Named window reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
    /// Inline window specification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub over: Option<WindowSpec>,
}

/// Select-clause column expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnExpr {
    /// Plain SQL expression.
    Sql(String),
    /// Window function application.
    WindowFunction(WindowFunctionExpr),
}

/// Props of the query composite root.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProps {
    /// Declared output schema.
    pub output_schema: SchemaDefinition,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a query select clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectProps {
    /// Output column name to expression, in output order.
    pub columns: FxIndexMap<String, ColumnExpr>,
    /// Named window definitions.
    #[serde(skip_serializing_if = "FxIndexMap::is_empty")]
    pub windows: FxIndexMap<String, WindowSpec>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a query where clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryWhereProps {
    /// SQL predicate.
    pub condition: String,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a query group-by clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryGroupByProps {
    /// Grouping columns.
    pub columns: Vec<String>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a query having clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryHavingProps {
    /// SQL predicate over grouped rows.
    pub condition: String,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a query order-by clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOrderByProps {
    /// Ordering columns.
    pub columns: FxIndexMap<String, SortDirection>,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- View / custom ----

/// Props of a named logical view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewProps {
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

/// Props of a plugin-defined component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomProps {
    /// Component name, resolved against the session overlay.
    #[serde(skip)]
    pub component: String,
    /// Declared schema, when the component produces one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDefinition>,
    /// Arbitrary component payload.
    #[serde(flatten)]
    pub props: PropBag,
    /// Operator parallelism override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

// ---- OperatorProps ----

/// Typed payload of a construct node: one variant per builtin component
/// plus the [`CustomProps`] escape hatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperatorProps {
    /// Pipeline root.
    Pipeline(PipelineProps),
    /// Kafka source.
    KafkaSource(KafkaSourceProps),
    /// Synthetic row generator.
    GeneratorSource(GeneratorSourceProps),
    /// Kafka sink.
    KafkaSink(KafkaSinkProps),
    /// Console sink.
    ConsoleSink(ConsoleSinkProps),
    /// Row filter.
    Filter(FilterProps),
    /// Projection.
    Map(MapProps),
    /// Unnesting flat-map.
    FlatMap(FlatMapProps),
    /// Grouped aggregation.
    Aggregate(AggregateProps),
    /// Stream union.
    Union(UnionProps),
    /// Keyed deduplication.
    Deduplicate(DeduplicateProps),
    /// Per-partition top-N.
    TopN(TopNProps),
    /// Conditional router.
    Route(RouteProps),
    /// Route branch wrapper.
    RouteBranch(RouteBranchProps),
    /// Route default wrapper.
    RouteDefault(RouteDefaultProps),
    /// Column rename.
    Rename(RenameProps),
    /// Column drop.
    Drop(DropProps),
    /// Column cast.
    Cast(CastProps),
    /// Null coalescing.
    Coalesce(CoalesceProps),
    /// Computed-column append.
    AddField(AddFieldProps),
    /// Hash join.
    Join(JoinProps),
    /// Temporal join.
    TemporalJoin(TemporalJoinProps),
    /// Lookup join.
    LookupJoin(LookupJoinProps),
    /// Interval join.
    IntervalJoin(IntervalJoinProps),
    /// Tumbling window.
    TumbleWindow(TumbleWindowProps),
    /// Sliding window.
    SlideWindow(SlideWindowProps),
    /// Session window.
    SessionWindow(SessionWindowProps),
    /// Opaque SQL block.
    RawSql(RawSqlProps),
    /// Pattern matcher.
    MatchRecognize(MatchRecognizeProps),
    /// Query composite root.
    Query(QueryProps),
    /// Query select clause.
    QuerySelect(QuerySelectProps),
    /// Query where clause.
    QueryWhere(QueryWhereProps),
    /// Query group-by clause.
    QueryGroupBy(QueryGroupByProps),
    /// Query having clause.
    QueryHaving(QueryHavingProps),
    /// Query order-by clause.
    QueryOrderBy(QueryOrderByProps),
    /// Named logical view.
    View(ViewProps),
    /// Plugin-defined component.
    Custom(CustomProps),
}

impl OperatorProps {
    /// Canonical component name.
    #[must_use]
    pub fn component(&self) -> &str {
        match self {
            Self::Pipeline(_) => "Pipeline",
            Self::KafkaSource(_) => "KafkaSource",
            Self::GeneratorSource(_) => "GeneratorSource",
            Self::KafkaSink(_) => "KafkaSink",
            Self::ConsoleSink(_) => "ConsoleSink",
            Self::Filter(_) => "Filter",
            Self::Map(_) => "Map",
            Self::FlatMap(_) => "FlatMap",
            Self::Aggregate(_) => "Aggregate",
            Self::Union(_) => "Union",
            Self::Deduplicate(_) => "Deduplicate",
            Self::TopN(_) => "TopN",
            Self::Route(_) => "Route",
            Self::RouteBranch(_) => "Route.Branch",
            Self::RouteDefault(_) => "Route.Default",
            Self::Rename(_) => "Rename",
            Self::Drop(_) => "Drop",
            Self::Cast(_) => "Cast",
            Self::Coalesce(_) => "Coalesce",
            Self::AddField(_) => "AddField",
            Self::Join(_) => "Join",
            Self::TemporalJoin(_) => "TemporalJoin",
            Self::LookupJoin(_) => "LookupJoin",
            Self::IntervalJoin(_) => "IntervalJoin",
            Self::TumbleWindow(_) => "TumbleWindow",
            Self::SlideWindow(_) => "SlideWindow",
            Self::SessionWindow(_) => "SessionWindow",
            Self::RawSql(_) => "RawSQL",
            Self::MatchRecognize(_) => "MatchRecognize",
            Self::Query(_) => "Query",
            Self::QuerySelect(_) => "Query.Select",
            Self::QueryWhere(_) => "Query.Where",
            Self::QueryGroupBy(_) => "Query.GroupBy",
            Self::QueryHaving(_) => "Query.Having",
            Self::QueryOrderBy(_) => "Query.OrderBy",
            Self::View(_) => "View",
            Self::Custom(props) => &props.component,
        }
    }

    /// Statically known kind for builtin components; `None` for custom
    /// components, which resolve through the session overlay.
    #[must_use]
    pub fn builtin_kind(&self) -> Option<NodeKind> {
        let kind = match self {
            Self::Pipeline(_) => NodeKind::Pipeline,
            Self::KafkaSource(_) | Self::GeneratorSource(_) => NodeKind::Source,
            Self::KafkaSink(_) | Self::ConsoleSink(_) => NodeKind::Sink,
            Self::Join(_)
            | Self::TemporalJoin(_)
            | Self::LookupJoin(_)
            | Self::IntervalJoin(_) => NodeKind::Join,
            Self::TumbleWindow(_) | Self::SlideWindow(_) | Self::SessionWindow(_) => {
                NodeKind::Window
            }
            Self::RawSql(_) => NodeKind::RawSql,
            Self::MatchRecognize(_) => NodeKind::Cep,
            Self::View(_) => NodeKind::View,
            Self::Filter(_)
            | Self::Map(_)
            | Self::FlatMap(_)
            | Self::Aggregate(_)
            | Self::Union(_)
            | Self::Deduplicate(_)
            | Self::TopN(_)
            | Self::Route(_)
            | Self::RouteBranch(_)
            | Self::RouteDefault(_)
            | Self::Rename(_)
            | Self::Drop(_)
            | Self::Cast(_)
            | Self::Coalesce(_)
            | Self::AddField(_)
            | Self::Query(_)
            | Self::QuerySelect(_)
            | Self::QueryWhere(_)
            | Self::QueryGroupBy(_)
            | Self::QueryHaving(_)
            | Self::QueryOrderBy(_) => NodeKind::Transform,
            Self::Custom(_) => return None,
        };
        Some(kind)
    }

    /// Per-operator parallelism override, when set.
    #[must_use]
    pub fn parallelism(&self) -> Option<u32> {
        match self {
            Self::Pipeline(p) => p.parallelism,
            Self::KafkaSource(p) => p.parallelism,
            Self::GeneratorSource(p) => p.parallelism,
            Self::KafkaSink(p) => p.parallelism,
            Self::ConsoleSink(p) => p.parallelism,
            Self::Filter(p) => p.parallelism,
            Self::Map(p) => p.parallelism,
            Self::FlatMap(p) => p.parallelism,
            Self::Aggregate(p) => p.parallelism,
            Self::Union(p) => p.parallelism,
            Self::Deduplicate(p) => p.parallelism,
            Self::TopN(p) => p.parallelism,
            Self::Route(p) => p.parallelism,
            Self::RouteBranch(_) | Self::RouteDefault(_) => None,
            Self::Rename(p) => p.parallelism,
            Self::Drop(p) => p.parallelism,
            Self::Cast(p) => p.parallelism,
            Self::Coalesce(p) => p.parallelism,
            Self::AddField(p) => p.parallelism,
            Self::Join(p) => p.parallelism,
            Self::TemporalJoin(p) => p.parallelism,
            Self::LookupJoin(p) => p.parallelism,
            Self::IntervalJoin(p) => p.parallelism,
            Self::TumbleWindow(p) => p.parallelism,
            Self::SlideWindow(p) => p.parallelism,
            Self::SessionWindow(p) => p.parallelism,
            Self::RawSql(p) => p.parallelism,
            Self::MatchRecognize(p) => p.parallelism,
            Self::Query(p) => p.parallelism,
            Self::QuerySelect(p) => p.parallelism,
            Self::QueryWhere(p) => p.parallelism,
            Self::QueryGroupBy(p) => p.parallelism,
            Self::QueryHaving(p) => p.parallelism,
            Self::QueryOrderBy(p) => p.parallelism,
            Self::View(p) => p.parallelism,
            Self::Custom(p) => p.parallelism,
        }
    }

    /// Schema explicitly declared on the component, when present.
    ///
    /// This is the seed set for schema resolution: sources and custom
    /// components carrying a schema. Declared OUTPUT schemas of SQL escape
    /// hatches are construction metadata, not propagation seeds.
    #[must_use]
    pub fn declared_schema(&self) -> Option<&SchemaDefinition> {
        match self {
            Self::KafkaSource(p) => Some(&p.schema),
            Self::GeneratorSource(p) => Some(&p.schema),
            Self::Custom(p) => p.schema.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for OperatorProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.component())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds_are_static() {
        let filter = OperatorProps::Filter(FilterProps {
            condition: "x > 1".into(),
            parallelism: None,
        });
        assert_eq!(filter.builtin_kind(), Some(NodeKind::Transform));

        let raw = OperatorProps::RawSql(RawSqlProps {
            sql: "SELECT 1".into(),
            output_schema: SchemaDefinition::default(),
            input_ids: vec![],
            parallelism: None,
        });
        assert_eq!(raw.builtin_kind(), Some(NodeKind::RawSql));
        assert_eq!(raw.component(), "RawSQL");
    }

    #[test]
    fn test_custom_component_has_no_builtin_kind() {
        let custom = OperatorProps::Custom(CustomProps {
            component: "MyOperator".into(),
            schema: None,
            props: PropBag::default(),
            parallelism: Some(2),
        });
        assert_eq!(custom.builtin_kind(), None);
        assert_eq!(custom.component(), "MyOperator");
        assert_eq!(custom.parallelism(), Some(2));
    }

    #[test]
    fn test_props_serialize_to_original_shape() {
        let props = OperatorProps::TumbleWindow(TumbleWindowProps {
            size: "1m".into(),
            on: "ts".into(),
            parallelism: None,
        });
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(value, serde_json::json!({"size": "1m", "on": "ts"}));
    }

    #[test]
    fn test_prop_value_roundtrips_through_json() {
        let mut bag = PropBag::default();
        bag.insert("retries".into(), PropValue::Int(3));
        bag.insert("enabled".into(), PropValue::Bool(true));
        bag.insert(
            "tags".into(),
            PropValue::List(vec![PropValue::from("a"), PropValue::from("b")]),
        );

        let json = serde_json::to_string(&bag).unwrap();
        let back: PropBag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bag);
    }
}
