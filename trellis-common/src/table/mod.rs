//! Tabular data collaborator.
//!
//! The layout engine only reads cells through [`DataTable`]; storage and typing belong
//! to the caller. [`MemoryTable`] is a serde-friendly implementation used by the CLI and
//! tests, and `RecordBatch` is adapted in [`record_batch`].

pub mod record_batch;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{EnumString, VariantNames};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColumnType {
    Number,
    String,
    Boolean,
    Date,
    #[strum(serialize = "datetime")]
    DateTime,
}

impl ColumnType {
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::DateTime)
    }

    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            ColumnType::Number | ColumnType::Date | ColumnType::DateTime
        )
    }
}

/// Role of a column relative to the data column it follows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, VariantNames,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ColumnRole {
    Domain,
    Data,
    Interval,
    Annotation,
    AnnotationText,
    Certainty,
    Emphasis,
    Scope,
    Style,
    Tooltip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Boolean(bool),
    String(String),
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::String(s) => write!(f, "{s}"),
        }
    }
}

/// Read access to a typed table. Dates and datetimes are exposed as epoch milliseconds.
pub trait DataTable {
    fn num_rows(&self) -> usize;

    fn num_columns(&self) -> usize;

    fn value(&self, row: usize, col: usize) -> Option<CellValue>;

    fn column_type(&self, col: usize) -> ColumnType;

    fn column_role(&self, col: usize) -> Option<ColumnRole>;

    fn column_label(&self, col: usize) -> String;

    fn formatted_value(&self, row: usize, col: usize) -> Option<String> {
        self.value(row, col).map(|v| v.to_string())
    }

    fn number(&self, row: usize, col: usize) -> Option<f64> {
        self.value(row, col).and_then(|v| v.as_f64())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryColumn {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub role: Option<ColumnRole>,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub formatted: Option<Vec<Option<String>>>,
}

impl MemoryColumn {
    pub fn new(label: impl Into<String>, column_type: ColumnType, values: Vec<Value>) -> Self {
        Self {
            label: label.into(),
            column_type,
            role: None,
            values,
            formatted: None,
        }
    }

    pub fn numbers(label: impl Into<String>, values: &[Option<f64>]) -> Self {
        Self::new(
            label,
            ColumnType::Number,
            values
                .iter()
                .map(|v| v.map(Value::from).unwrap_or(Value::Null))
                .collect(),
        )
    }

    pub fn strings(label: impl Into<String>, values: &[&str]) -> Self {
        Self::new(
            label,
            ColumnType::String,
            values.iter().map(|v| Value::from(*v)).collect(),
        )
    }

    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = Some(role);
        self
    }

    fn cell(&self, row: usize) -> Option<CellValue> {
        let raw = self.values.get(row)?;
        match (self.column_type, raw) {
            (_, Value::Null) => None,
            (ColumnType::Number, Value::Number(n)) => n.as_f64().map(CellValue::Number),
            (ColumnType::Number, Value::String(s)) => {
                s.trim().parse::<f64>().ok().map(CellValue::Number)
            }
            (ColumnType::Boolean, Value::Bool(b)) => Some(CellValue::Boolean(*b)),
            (ColumnType::String, Value::String(s)) => Some(CellValue::String(s.clone())),
            (ColumnType::String, other) => Some(CellValue::String(other.to_string())),
            (ColumnType::Date | ColumnType::DateTime, Value::Number(n)) => {
                n.as_f64().map(CellValue::Number)
            }
            (ColumnType::Date | ColumnType::DateTime, Value::String(s)) => {
                parse_epoch_millis(s).map(CellValue::Number)
            }
            _ => None,
        }
    }
}

/// Parses RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` and plain `YYYY-MM-DD` dates (UTC).
pub fn parse_epoch_millis(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis() as f64);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
}

/// Column-major in-memory table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryTable {
    pub columns: Vec<MemoryColumn>,
}

impl MemoryTable {
    pub fn new(columns: Vec<MemoryColumn>) -> Self {
        Self { columns }
    }
}

impl DataTable for MemoryTable {
    fn num_rows(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    fn num_columns(&self) -> usize {
        self.columns.len()
    }

    fn value(&self, row: usize, col: usize) -> Option<CellValue> {
        self.columns.get(col)?.cell(row)
    }

    fn column_type(&self, col: usize) -> ColumnType {
        self.columns
            .get(col)
            .map(|c| c.column_type)
            .unwrap_or(ColumnType::Number)
    }

    fn column_role(&self, col: usize) -> Option<ColumnRole> {
        self.columns.get(col).and_then(|c| c.role)
    }

    fn column_label(&self, col: usize) -> String {
        self.columns
            .get(col)
            .map(|c| c.label.clone())
            .unwrap_or_default()
    }

    fn formatted_value(&self, row: usize, col: usize) -> Option<String> {
        let column = self.columns.get(col)?;
        if let Some(formatted) = column
            .formatted
            .as_ref()
            .and_then(|f| f.get(row).cloned().flatten())
        {
            return Some(formatted);
        }
        column.cell(row).map(|v| v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_table_cells() {
        let table: MemoryTable = serde_json::from_value(json!({
            "columns": [
                {"label": "Year", "type": "string", "values": ["2004", "2005"]},
                {"label": "Sales", "type": "number", "values": [1000, null]},
                {"type": "number", "role": "interval", "values": [900, 950]},
                {"type": "string", "role": "annotationText", "values": ["a", "b"]},
                {"type": "date", "values": ["2000-01-01", 86400000]},
            ]
        }))
        .unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 5);
        assert_eq!(table.number(0, 1), Some(1000.0));
        assert_eq!(table.number(1, 1), None);
        assert_eq!(table.column_role(2), Some(ColumnRole::Interval));
        assert_eq!(table.column_role(3), Some(ColumnRole::AnnotationText));
        assert_eq!(table.value(0, 0), Some(CellValue::String("2004".into())));
        assert_eq!(table.number(0, 4), Some(946_684_800_000.0));
        assert_eq!(table.number(1, 4), Some(86_400_000.0));
        assert_eq!(table.column_label(1), "Sales");
    }

    #[test]
    fn test_role_names() {
        assert_eq!(
            "annotationText".parse::<ColumnRole>(),
            Ok(ColumnRole::AnnotationText)
        );
        assert_eq!("datetime".parse::<ColumnType>(), Ok(ColumnType::DateTime));
    }
}
