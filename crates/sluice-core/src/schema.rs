//! # Schema Definitions
//!
//! Record schemas declared on sources and carried through the pipeline:
//! an ordered field map, an optional watermark, and an optional primary
//! key. Each field pairs the user-facing SQL type text with the closed
//! [`PhysicalType`] the runtime stores it as.
//!
//! ## Example
//!
//! ```rust,ignore
//! let schema = SchemaDefinition::builder()
//!     .field("order_id", FieldDefinition::bigint())
//!     .field("amount", FieldDefinition::decimal(10, 2))
//!     .field("ts", FieldDefinition::timestamp(3))
//!     .watermark("ts", "ts - INTERVAL '5' SECOND")
//!     .primary_key(["order_id"])
//!     .build()?;
//! ```

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FxIndexMap;

/// Errors raised while building a schema definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field's SQL type text could not be mapped to a physical type.
    #[error("Invalid type '{sql_type}' for field '{field}'")]
    InvalidType {
        /// The rejected SQL type text.
        sql_type: String,
        /// The field it was declared on.
        field: String,
    },

    /// The watermark references a column the schema does not declare.
    #[error("Watermark column '{column}' is not a declared field")]
    UnknownWatermarkColumn {
        /// The missing column.
        column: String,
    },

    /// The primary key references a column the schema does not declare.
    #[error("Primary key column '{column}' is not a declared field")]
    UnknownPrimaryKeyColumn {
        /// The missing column.
        column: String,
    },
}

// ---- Physical types ----

/// Closed set of physical storage types a field can resolve to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhysicalType {
    /// Boolean.
    #[serde(rename = "BOOLEAN")]
    Bool,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// UTF-8 string.
    #[serde(rename = "STRING")]
    Utf8,
    /// Raw bytes.
    Binary,
    /// Days since the Unix epoch.
    Date32,
    /// Millisecond-precision timestamp.
    #[serde(rename = "TIMESTAMP_MS")]
    TimestampMillis,
    /// Microsecond-precision timestamp.
    #[serde(rename = "TIMESTAMP_US")]
    TimestampMicros,
    /// 128-bit fixed-point decimal.
    Decimal128,
    /// Variable-length list.
    List,
    /// Key/value map.
    Map,
    /// Nested record.
    Struct,
}

impl PhysicalType {
    /// Wire spelling used in serialized schemas and signatures.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "BOOLEAN",
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Float32 => "FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::Utf8 => "STRING",
            Self::Binary => "BINARY",
            Self::Date32 => "DATE32",
            Self::TimestampMillis => "TIMESTAMP_MS",
            Self::TimestampMicros => "TIMESTAMP_US",
            Self::Decimal128 => "DECIMAL128",
            Self::List => "LIST",
            Self::Map => "MAP",
            Self::Struct => "STRUCT",
        }
    }

    /// Maps SQL type text to a physical type. Returns `None` for
    /// unrecognized text.
    #[must_use]
    pub fn from_sql(sql_type: &str) -> Option<Self> {
        let upper = sql_type.trim().to_ascii_uppercase();
        let mapped = match upper.as_str() {
            "BOOLEAN" => Self::Bool,
            "TINYINT" => Self::Int8,
            "SMALLINT" => Self::Int16,
            "INT" | "INTEGER" => Self::Int32,
            "BIGINT" | "TIME" => Self::Int64,
            "FLOAT" => Self::Float32,
            "DOUBLE" => Self::Float64,
            "STRING" => Self::Utf8,
            "DATE" => Self::Date32,
            "BYTES" => Self::Binary,
            "TIMESTAMP" => Self::TimestampMillis,
            _ => {
                // TIMESTAMP_LTZ( must be tried before TIMESTAMP(.
                if let Some(precision) = parse_precision(&upper, "TIMESTAMP_LTZ(")
                    .or_else(|| parse_precision(&upper, "TIMESTAMP("))
                {
                    if precision <= 3 {
                        Self::TimestampMillis
                    } else {
                        Self::TimestampMicros
                    }
                } else if upper.starts_with("DECIMAL(") {
                    Self::Decimal128
                } else if upper.starts_with("VARCHAR(") || upper.starts_with("CHAR(") {
                    Self::Utf8
                } else if upper.starts_with("ARRAY<") {
                    Self::List
                } else if upper.starts_with("MAP<") {
                    Self::Map
                } else if upper.starts_with("ROW<") {
                    Self::Struct
                } else {
                    return None;
                }
            }
        };
        Some(mapped)
    }
}

fn parse_precision(upper: &str, prefix: &str) -> Option<u32> {
    let rest = upper.strip_prefix(prefix)?;
    let inner = rest.strip_suffix(')')?;
    inner.trim().parse().ok()
}

// ---- Field definitions ----

/// A single schema field: SQL type text plus its physical type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// User-facing SQL type text, e.g. `DECIMAL(10, 2)`.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Physical storage type.
    pub data_type: PhysicalType,
}

impl FieldDefinition {
    fn new(sql_type: impl Into<String>, data_type: PhysicalType) -> Self {
        Self {
            sql_type: sql_type.into(),
            data_type,
        }
    }

    /// `BOOLEAN` field.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new("BOOLEAN", PhysicalType::Bool)
    }

    /// `TINYINT` field.
    #[must_use]
    pub fn tinyint() -> Self {
        Self::new("TINYINT", PhysicalType::Int8)
    }

    /// `SMALLINT` field.
    #[must_use]
    pub fn smallint() -> Self {
        Self::new("SMALLINT", PhysicalType::Int16)
    }

    /// `INT` field.
    #[must_use]
    pub fn int() -> Self {
        Self::new("INT", PhysicalType::Int32)
    }

    /// `BIGINT` field.
    #[must_use]
    pub fn bigint() -> Self {
        Self::new("BIGINT", PhysicalType::Int64)
    }

    /// `FLOAT` field.
    #[must_use]
    pub fn float() -> Self {
        Self::new("FLOAT", PhysicalType::Float32)
    }

    /// `DOUBLE` field.
    #[must_use]
    pub fn double() -> Self {
        Self::new("DOUBLE", PhysicalType::Float64)
    }

    /// `STRING` field.
    #[must_use]
    pub fn string() -> Self {
        Self::new("STRING", PhysicalType::Utf8)
    }

    /// `DATE` field.
    #[must_use]
    pub fn date() -> Self {
        Self::new("DATE", PhysicalType::Date32)
    }

    /// `TIME` field, stored as a 64-bit integer.
    #[must_use]
    pub fn time() -> Self {
        Self::new("TIME", PhysicalType::Int64)
    }

    /// `BYTES` field.
    #[must_use]
    pub fn bytes() -> Self {
        Self::new("BYTES", PhysicalType::Binary)
    }

    /// `DECIMAL(precision, scale)` field.
    #[must_use]
    pub fn decimal(precision: u32, scale: u32) -> Self {
        Self::new(
            format!("DECIMAL({precision}, {scale})"),
            PhysicalType::Decimal128,
        )
    }

    /// `TIMESTAMP(precision)` field. Millisecond storage up to precision
    /// 3, microsecond above.
    #[must_use]
    pub fn timestamp(precision: u32) -> Self {
        let data_type = if precision <= 3 {
            PhysicalType::TimestampMillis
        } else {
            PhysicalType::TimestampMicros
        };
        Self::new(format!("TIMESTAMP({precision})"), data_type)
    }

    /// `TIMESTAMP_LTZ(precision)` field.
    #[must_use]
    pub fn timestamp_ltz(precision: u32) -> Self {
        let data_type = if precision <= 3 {
            PhysicalType::TimestampMillis
        } else {
            PhysicalType::TimestampMicros
        };
        Self::new(format!("TIMESTAMP_LTZ({precision})"), data_type)
    }

    /// `VARCHAR(length)` field.
    #[must_use]
    pub fn varchar(length: u32) -> Self {
        Self::new(format!("VARCHAR({length})"), PhysicalType::Utf8)
    }

    /// `CHAR(length)` field.
    #[must_use]
    pub fn fixed_char(length: u32) -> Self {
        Self::new(format!("CHAR({length})"), PhysicalType::Utf8)
    }

    /// `ARRAY<element>` field.
    #[must_use]
    pub fn array_of(element: &Self) -> Self {
        Self::new(format!("ARRAY<{}>", element.sql_type), PhysicalType::List)
    }

    /// `MAP<key, value>` field.
    #[must_use]
    pub fn map_of(key: &Self, value: &Self) -> Self {
        Self::new(
            format!("MAP<{}, {}>", key.sql_type, value.sql_type),
            PhysicalType::Map,
        )
    }

    /// `ROW<name type, ...>` field.
    #[must_use]
    pub fn row_of<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Self)>,
    {
        let inner = fields
            .into_iter()
            .map(|(name, field)| format!("{name} {}", field.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(format!("ROW<{inner}>"), PhysicalType::Struct)
    }

    /// Parses SQL type text into a field definition, keeping the original
    /// text as the SQL spelling.
    #[must_use]
    pub fn from_sql(sql_type: &str) -> Option<Self> {
        PhysicalType::from_sql(sql_type).map(|data_type| Self::new(sql_type, data_type))
    }
}

// ---- Watermark ----

/// Watermark declaration: the event-time column and the generating
/// expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkSpec {
    /// Event-time column.
    pub column: String,
    /// Watermark expression, e.g. `ts - INTERVAL '5' SECOND`.
    pub expression: String,
}

// ---- Schema definition ----

/// A validated record schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    /// Declared fields in declaration order.
    pub fields: FxIndexMap<String, FieldDefinition>,
    /// Optional watermark declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkSpec>,
    /// Optional primary key columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
}

impl SchemaDefinition {
    /// Starts a new schema builder.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Order-insensitive structural signature used for union
    /// compatibility checks: sorted `name:TYPE` pairs joined by commas.
    #[must_use]
    pub fn signature(&self) -> String {
        let mut pairs: Vec<String> = self
            .fields
            .iter()
            .map(|(name, field)| format!("{name}:{}", field.data_type.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs.join(",")
    }

    /// Field names in sorted order, as used in diagnostics.
    #[must_use]
    pub fn sorted_field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ---- Builder ----

enum FieldEntry {
    Typed(FieldDefinition),
    Sql(String),
}

/// Staged schema builder. Fields declared as SQL text are parsed and
/// validated at [`build`](SchemaBuilder::build) time.
#[derive(Default)]
pub struct SchemaBuilder {
    fields: FxIndexMap<String, FieldEntry>,
    watermark: Option<WatermarkSpec>,
    primary_key: Vec<String>,
}

impl SchemaBuilder {
    /// Declares a typed field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), FieldEntry::Typed(definition));
        self
    }

    /// Declares a field by SQL type text, parsed at build time.
    #[must_use]
    pub fn field_sql(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldEntry::Sql(sql_type.into()));
        self
    }

    /// Declares the watermark.
    #[must_use]
    pub fn watermark(mut self, column: impl Into<String>, expression: impl Into<String>) -> Self {
        self.watermark = Some(WatermarkSpec {
            column: column.into(),
            expression: expression.into(),
        });
        self
    }

    /// Declares the primary key columns.
    #[must_use]
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Validates and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidType`] when a SQL-text field does not
    /// parse, and [`SchemaError::UnknownWatermarkColumn`] /
    /// [`SchemaError::UnknownPrimaryKeyColumn`] when declarations reference
    /// undeclared fields.
    pub fn build(self) -> Result<SchemaDefinition, SchemaError> {
        let mut fields = FxIndexMap::default();
        for (name, entry) in self.fields {
            let definition = match entry {
                FieldEntry::Typed(definition) => definition,
                FieldEntry::Sql(sql_type) => FieldDefinition::from_sql(&sql_type)
                    .ok_or_else(|| SchemaError::InvalidType {
                        sql_type: sql_type.clone(),
                        field: name.clone(),
                    })?,
            };
            fields.insert(name, definition);
        }

        if let Some(watermark) = &self.watermark {
            if !fields.contains_key(&watermark.column) {
                return Err(SchemaError::UnknownWatermarkColumn {
                    column: watermark.column.clone(),
                });
            }
        }

        for column in &self.primary_key {
            if !fields.contains_key(column) {
                return Err(SchemaError::UnknownPrimaryKeyColumn {
                    column: column.clone(),
                });
            }
        }

        Ok(SchemaDefinition {
            fields,
            watermark: self.watermark,
            primary_key: self.primary_key,
        })
    }
}
