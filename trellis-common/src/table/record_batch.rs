//! [`DataTable`] over an Arrow `RecordBatch`.
//!
//! Column roles come from the field metadata key `role`.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, TimeUnit,
    UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;

use super::{CellValue, ColumnRole, ColumnType, DataTable};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn column_type_of(data_type: &DataType) -> ColumnType {
    match data_type {
        DataType::Boolean => ColumnType::Boolean,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => ColumnType::String,
        DataType::Date32 | DataType::Date64 => ColumnType::Date,
        DataType::Timestamp(_, _) => ColumnType::DateTime,
        _ => ColumnType::Number,
    }
}

macro_rules! primitive_at {
    ($array:expr, $row:expr, $t:ty) => {
        Some(CellValue::Number($array.as_primitive::<$t>().value($row) as f64))
    };
}

fn cell_at(array: &ArrayRef, row: usize) -> Option<CellValue> {
    if row >= array.len() || array.is_null(row) {
        return None;
    }
    match array.data_type() {
        DataType::Float64 => primitive_at!(array, row, Float64Type),
        DataType::Float32 => primitive_at!(array, row, Float32Type),
        DataType::Int8 => primitive_at!(array, row, Int8Type),
        DataType::Int16 => primitive_at!(array, row, Int16Type),
        DataType::Int32 => primitive_at!(array, row, Int32Type),
        DataType::Int64 => primitive_at!(array, row, Int64Type),
        DataType::UInt8 => primitive_at!(array, row, UInt8Type),
        DataType::UInt16 => primitive_at!(array, row, UInt16Type),
        DataType::UInt32 => primitive_at!(array, row, UInt32Type),
        DataType::UInt64 => primitive_at!(array, row, UInt64Type),
        DataType::Boolean => Some(CellValue::Boolean(array.as_boolean().value(row))),
        DataType::Utf8 => Some(CellValue::String(
            array.as_string::<i32>().value(row).to_string(),
        )),
        DataType::LargeUtf8 => Some(CellValue::String(
            array.as_string::<i64>().value(row).to_string(),
        )),
        DataType::Utf8View => Some(CellValue::String(
            array.as_string_view().value(row).to_string(),
        )),
        DataType::Date32 => {
            let days = array
                .as_primitive::<arrow::datatypes::Date32Type>()
                .value(row);
            Some(CellValue::Number(days as f64 * MILLIS_PER_DAY))
        }
        DataType::Date64 => {
            let millis = array
                .as_primitive::<arrow::datatypes::Date64Type>()
                .value(row);
            Some(CellValue::Number(millis as f64))
        }
        DataType::Timestamp(unit, _) => {
            let raw = match unit {
                TimeUnit::Second => array
                    .as_primitive::<arrow::datatypes::TimestampSecondType>()
                    .value(row),
                TimeUnit::Millisecond => array
                    .as_primitive::<arrow::datatypes::TimestampMillisecondType>()
                    .value(row),
                TimeUnit::Microsecond => array
                    .as_primitive::<arrow::datatypes::TimestampMicrosecondType>()
                    .value(row),
                TimeUnit::Nanosecond => array
                    .as_primitive::<arrow::datatypes::TimestampNanosecondType>()
                    .value(row),
            };
            let millis = match unit {
                TimeUnit::Second => raw as f64 * 1000.0,
                TimeUnit::Millisecond => raw as f64,
                TimeUnit::Microsecond => raw as f64 / 1000.0,
                TimeUnit::Nanosecond => raw as f64 / 1_000_000.0,
            };
            Some(CellValue::Number(millis))
        }
        _ => None,
    }
}

impl DataTable for RecordBatch {
    fn num_rows(&self) -> usize {
        RecordBatch::num_rows(self)
    }

    fn num_columns(&self) -> usize {
        RecordBatch::num_columns(self)
    }

    fn value(&self, row: usize, col: usize) -> Option<CellValue> {
        if col >= RecordBatch::num_columns(self) {
            return None;
        }
        cell_at(self.column(col), row)
    }

    fn column_type(&self, col: usize) -> ColumnType {
        self.schema()
            .fields()
            .get(col)
            .map(|f| column_type_of(f.data_type()))
            .unwrap_or(ColumnType::Number)
    }

    fn column_role(&self, col: usize) -> Option<ColumnRole> {
        self.schema()
            .fields()
            .get(col)
            .and_then(|f| f.metadata().get("role").cloned())
            .and_then(|role| role.parse().ok())
    }

    fn column_label(&self, col: usize) -> String {
        self.schema()
            .fields()
            .get(col)
            .map(|f| f.name().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Date32Array, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_record_batch_table() {
        let interval = Field::new("lo", DataType::Int32, true).with_metadata(HashMap::from([(
            "role".to_string(),
            "interval".to_string(),
        )]));
        let schema = Schema::new(vec![
            Field::new("category", DataType::Utf8, false),
            Field::new("value", DataType::Float64, true),
            interval,
            Field::new("day", DataType::Date32, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["a", "b"])),
                Arc::new(Float64Array::from(vec![Some(1.5), None])),
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(Date32Array::from(vec![1, 2])),
            ],
        )
        .unwrap();

        assert_eq!(DataTable::num_rows(&batch), 2);
        assert_eq!(batch.column_type(0), ColumnType::String);
        assert_eq!(batch.column_type(3), ColumnType::Date);
        assert_eq!(batch.column_role(2), Some(ColumnRole::Interval));
        assert_eq!(batch.column_role(1), None);
        assert_eq!(batch.number(0, 1), Some(1.5));
        assert_eq!(batch.number(1, 1), None);
        assert_eq!(batch.number(1, 2), Some(2.0));
        assert_eq!(batch.number(0, 3), Some(MILLIS_PER_DAY));
        assert_eq!(batch.value(0, 0), Some(CellValue::String("a".into())));
        assert_eq!(batch.column_label(1), "value");
    }
}
