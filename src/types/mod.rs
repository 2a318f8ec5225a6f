//! Type definitions for the BigQuery REST API.
//!
//! Only the parts of the resources this crate reads or writes are modelled. Table
//! schemas are forwarded verbatim, so every field BigQuery accepts on a
//! `TableFieldSchema` is carried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::errors::{InsertErrorDetail, RowInsertErrors, ServiceErrorItem};

/// Column description of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Top-level columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TableFieldSchema>>,

    /// Type system of an external source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_type_info: Option<ForeignTypeInfo>,
}

/// Foreign type system marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignTypeInfo {
    /// Type system name, e.g. `HIVE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_system: Option<String>,
}

/// A single column, possibly with nested fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFieldSchema {
    /// Column name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Column type (`STRING`, `INT64`, `RECORD`, ...).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// `NULLABLE`, `REQUIRED` or `REPEATED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Nested columns of a `RECORD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TableFieldSchema>>,

    /// Column description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Policy tags attached to the column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_tags: Option<NameList>,

    /// Deprecated categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<NameList>,

    /// Data policies attached to the column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_policies: Option<Vec<DataPolicyOption>>,

    /// Collation specification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,

    /// Default value SQL expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value_expression: Option<String>,

    /// Type definition in the foreign type system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_type_definition: Option<String>,

    /// Maximum length of `STRING`/`BYTES` values (int64 as string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<String>,

    /// Precision of `NUMERIC`/`BIGNUMERIC` values (int64 as string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<String>,

    /// Scale of `NUMERIC`/`BIGNUMERIC` values (int64 as string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,

    /// Element type of a `RANGE` column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_element_type: Option<RangeElementType>,

    /// Rounding mode for `NUMERIC` values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounding_mode: Option<String>,
}

/// `{ "names": [...] }` wrapper used by policy tags and categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameList {
    /// Resource names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
}

/// Reference to a data policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPolicyOption {
    /// Data policy resource name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Element type of a `RANGE` column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeElementType {
    /// `DATE`, `DATETIME` or `TIMESTAMP`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
}

/// Identifies a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    /// Dataset id.
    pub dataset_id: String,

    /// Owning project; defaults to the request's project when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Identifies a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    /// Owning project.
    pub project_id: String,
    /// Dataset id.
    pub dataset_id: String,
    /// Table id.
    pub table_id: String,
}

/// Dataset resource as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Resource kind (`bigquery#dataset`).
    #[serde(default)]
    pub kind: String,

    /// Fully-qualified id.
    #[serde(default)]
    pub id: String,

    /// Entity tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Reference of the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_reference: Option<DatasetReference>,

    /// Geographic location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Table resource as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Resource kind (`bigquery#table`).
    #[serde(default)]
    pub kind: String,

    /// Fully-qualified id.
    #[serde(default)]
    pub id: String,

    /// Entity tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Reference of the table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_reference: Option<TableReference>,

    /// Current schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,

    /// Row count (int64 as string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_rows: Option<String>,
}

/// Body of a dataset creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatasetRequest {
    /// Reference of the new dataset.
    pub dataset_reference: DatasetReference,
}

/// Full table definition sent on table creation and update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition<'a> {
    /// Table being created or updated.
    pub table_reference: TableReference,
    /// Desired schema.
    pub schema: &'a TableSchema,
}

/// Body of an `insertAll` call.
#[derive(Debug, Serialize)]
pub struct InsertAllRequest<'a, R: Serialize> {
    /// Rows, each wrapped as `{"json": row}`.
    pub rows: Vec<InsertRow<'a, R>>,
}

impl<'a, R: Serialize> InsertAllRequest<'a, R> {
    /// Wraps every row.
    pub fn new(rows: &'a [R]) -> Self {
        Self {
            rows: rows.iter().map(|json| InsertRow { json }).collect(),
        }
    }
}

/// One row of an `insertAll` body.
#[derive(Debug, Serialize)]
pub struct InsertRow<'a, R: Serialize> {
    /// Row content.
    pub json: &'a R,
}

/// Response of an `insertAll` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllResponse {
    /// Resource kind.
    #[serde(default)]
    pub kind: String,

    /// Rows that were rejected, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_errors: Option<Vec<RowInsertErrors>>,
}

/// Default server-side wait of a query call, in milliseconds.
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 100_000;

/// Value of a named query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Sent as `BOOL`.
    Bool(bool),
    /// Sent as `STRING`.
    String(String),
    /// Sent as `INT64`.
    Number(serde_json::Number),
    /// Sent as `TIMESTAMP`.
    Timestamp(DateTime<Utc>),
    /// Any other JSON value; rejected when the query is built.
    Other(Value),
}

impl ParameterValue {
    /// Name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Bool(_) => "boolean",
            ParameterValue::String(_) => "string",
            ParameterValue::Number(_) => "number",
            ParameterValue::Timestamp(_) => "timestamp",
            ParameterValue::Other(Value::Null) => "null",
            ParameterValue::Other(Value::Array(_)) => "array",
            ParameterValue::Other(Value::Object(_)) => "object",
            ParameterValue::Other(_) => "unknown",
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

macro_rules! number_parameter {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParameterValue {
                fn from(value: $ty) -> Self {
                    ParameterValue::Number(value.into())
                }
            }
        )*
    };
}

number_parameter!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        match serde_json::Number::from_f64(value) {
            Some(n) => ParameterValue::Number(n),
            None => ParameterValue::Other(Value::Null),
        }
    }
}

impl From<DateTime<Utc>> for ParameterValue {
    fn from(value: DateTime<Utc>) -> Self {
        ParameterValue::Timestamp(value)
    }
}

impl From<Value> for ParameterValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => ParameterValue::Bool(b),
            Value::String(s) => ParameterValue::String(s),
            Value::Number(n) => ParameterValue::Number(n),
            other => ParameterValue::Other(other),
        }
    }
}

/// Options of a query call.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Named parameters in declaration order.
    pub parameters: Vec<(String, ParameterValue)>,
    /// Maximum rows in the first result page.
    pub max_results: Option<u32>,
    /// Server-side wait; [`DEFAULT_QUERY_TIMEOUT_MS`] when unset.
    pub timeout_ms: Option<u64>,
}

impl QueryOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named parameter.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Sets the maximum rows of the first page.
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Sets the server-side wait in milliseconds.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Body of a `queries` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// SQL text.
    pub query: String,
    /// Maximum rows in the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    /// Server-side wait in milliseconds.
    pub timeout_ms: u64,
    /// Typed named parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_parameters: Option<Vec<QueryParameter>>,
    /// Always `false`: standard SQL only.
    pub use_legacy_sql: bool,
    /// Always `true`.
    pub use_query_cache: bool,
}

/// Typed named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParameter {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub parameter_type: QueryParameterType,
    /// Parameter value rendered as a string.
    pub parameter_value: QueryParameterValue,
}

/// Scalar type of a query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameterType {
    /// `BOOL`, `STRING`, `INT64` or `TIMESTAMP`.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Value of a query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameterValue {
    /// String rendering of the value.
    pub value: String,
}

/// Job reference attached to a query response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    /// Project that ran the job.
    #[serde(default)]
    pub project_id: String,
    /// Job id.
    #[serde(default)]
    pub job_id: String,
    /// Processing location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Typed result of a `queries` call.
///
/// Rows are kept in BigQuery's `{"f": [{"v": ...}]}` form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Resource kind (`bigquery#queryResponse`).
    #[serde(default)]
    pub kind: String,
    /// Result schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    /// Job that produced the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,
    /// Total rows (int64 as string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<String>,
    /// Rows of the first page.
    #[serde(default)]
    pub rows: Vec<Value>,
    /// Token of the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Whether the query finished within the wait.
    #[serde(default)]
    pub job_complete: bool,
    /// Whether the result came from cache.
    #[serde(default)]
    pub cache_hit: bool,
}
