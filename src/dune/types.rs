//! Wire types for the Dune execution API.
//!
//! Defines the request/response payloads and the result set shared by the
//! query runner and the migration generator.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{ExportError, Result};

/// A single result row: column name to scalar value, in API order.
pub type Row = Map<String, Value>;

/// Query parameters sent as `query_parameters` on execution.
pub type QueryParams = Map<String, Value>;

/// A request to run one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    /// Dune query id.
    pub query_id: u64,
    /// Optional query parameters.
    pub params: Option<QueryParams>,
}

impl ExecutionRequest {
    /// Creates a request without parameters.
    pub fn new(query_id: u64) -> Self {
        Self {
            query_id,
            params: None,
        }
    }

    /// Attaches query parameters. An empty map is treated as no parameters.
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = if params.is_empty() { None } else { Some(params) };
        self
    }

    /// Builds the JSON body for the execute endpoint.
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        if let Some(params) = &self.params {
            body.insert("query_parameters".to_string(), Value::Object(params.clone()));
        }
        Value::Object(body)
    }
}

/// Execution state reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionState {
    Pending,
    Executing,
    Completed,
    Failed,
    Cancelled,
    /// Any state string this client does not recognize. Never terminal.
    Unknown(String),
    /// The response carried no state at all.
    #[default]
    Missing,
}

impl ExecutionState {
    /// Returns the wire name of the state.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "QUERY_STATE_PENDING",
            Self::Executing => "QUERY_STATE_EXECUTING",
            Self::Completed => "QUERY_STATE_COMPLETED",
            Self::Failed => "QUERY_STATE_FAILED",
            Self::Cancelled => "QUERY_STATE_CANCELLED",
            Self::Unknown(raw) => raw,
            Self::Missing => "UNKNOWN",
        }
    }

    /// Returns true if no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl From<String> for ExecutionState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "QUERY_STATE_PENDING" => Self::Pending,
            "QUERY_STATE_EXECUTING" => Self::Executing,
            "QUERY_STATE_COMPLETED" => Self::Completed,
            "QUERY_STATE_FAILED" => Self::Failed,
            "QUERY_STATE_CANCELLED" => Self::Cancelled,
            "UNKNOWN" => Self::Missing,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<ExecutionState> for String {
    fn from(state: ExecutionState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response of `POST /query/{id}/execute`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionResponse {
    pub execution_id: Option<String>,
    #[serde(default)]
    pub state: ExecutionState,
}

/// Response of `GET /execution/{id}/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionStatus {
    #[serde(default)]
    pub execution_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<u64>,
    #[serde(default)]
    pub state: ExecutionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_ended_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_set_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_set_row_count: Option<u64>,
}

impl ExecutionStatus {
    /// Creates a status carrying only a state, for tests and mocks.
    pub fn with_state(execution_id: impl Into<String>, state: ExecutionState) -> Self {
        Self {
            execution_id: execution_id.into(),
            state,
            ..Default::default()
        }
    }
}

/// Reads an optional count from a JSON number or `null`.
///
/// Decodes through `Value`: fields of a flattened struct are buffered first,
/// and exact-precision numbers only decode from that buffer as `Value`.
fn optional_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected an unsigned count, got {value}"))),
    }
}

/// Result metadata attached to a result set.
///
/// Only the fields present in the response are written back; anything not
/// modelled here lands in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_types: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub row_count: Option<u64>,
    #[serde(
        default,
        deserialize_with = "optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub result_set_bytes: Option<u64>,
    #[serde(
        default,
        deserialize_with = "optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_row_count: Option<u64>,
    #[serde(
        default,
        deserialize_with = "optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub datapoint_count: Option<u64>,
    #[serde(
        default,
        deserialize_with = "optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub pending_time_millis: Option<u64>,
    #[serde(
        default,
        deserialize_with = "optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_time_millis: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ordered rows returned by one execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultSet {
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResultMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultSet {
    /// Creates a result set from rows without metadata.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Column names in the order of the first row.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Response of `GET /execution/{id}/results`, also the format of saved
/// result files.
///
/// Fields this client does not model are kept in `extra` so a saved file
/// round-trips without loss.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub query_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_execution_finished: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ExecutionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_ended_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultSet>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExecutionResults {
    /// Wraps a result set in an otherwise empty envelope.
    pub fn from_result_set(result: ResultSet) -> Self {
        Self {
            result: Some(result),
            ..Default::default()
        }
    }

    /// Parses a results document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExportError::data_shape(format!("Invalid results document: {e}")))
    }

    /// Serializes to pretty JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ExportError::data_shape(format!("Failed to serialize results: {e}")))
    }

    /// Returns the rows, or a data shape error if `result.rows` is absent.
    pub fn rows(&self) -> Result<&[Row]> {
        self.result
            .as_ref()
            .map(|r| r.rows.as_slice())
            .ok_or_else(|| ExportError::data_shape("Document has no 'result.rows'"))
    }

    /// Number of rows, zero when there is no result.
    pub fn row_count(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.rows.len())
    }

    /// Column names of the first row, empty when there are no rows.
    pub fn columns(&self) -> Vec<String> {
        self.result
            .as_ref()
            .map(ResultSet::columns)
            .unwrap_or_default()
    }
}
