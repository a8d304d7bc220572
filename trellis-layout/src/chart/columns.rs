//! Column roles and series discovery.

use serde::Serialize;
use trellis_common::options::Options;
use trellis_common::table::{ColumnRole, ColumnType, DataTable};
use trellis_common::types::Orientation;

use crate::datum::curve::CurveType;
use crate::datum::intervals::{IntervalColumn, IntervalStyle};
use crate::datum::series::SeriesType;
use crate::error::LayoutError;

/// Most columns a bubble series reads: x, y, color and size.
const BUBBLE_COLUMNS: usize = 4;

/// A data column and the role columns that follow it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataColumn {
    pub index: usize,
    pub intervals: Vec<IntervalColumn>,
    /// Columns with the `annotation` role
    pub annotations: Vec<usize>,
    /// Every other attached role column
    pub attached: Vec<(ColumnRole, usize)>,
}

impl DataColumn {
    fn new(index: usize) -> Self {
        Self {
            index,
            intervals: vec![],
            annotations: vec![],
            attached: vec![],
        }
    }
}

/// The table's columns grouped by role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnLayout {
    pub domain: usize,
    pub domain_annotations: Vec<usize>,
    pub domain_attached: Vec<(ColumnRole, usize)>,
    pub data: Vec<DataColumn>,
}

fn role_of(table: &dyn DataTable, col: usize) -> ColumnRole {
    table.column_role(col).unwrap_or(if col == 0 {
        ColumnRole::Domain
    } else {
        ColumnRole::Data
    })
}

fn invalid_role(index: usize, role: ColumnRole) -> LayoutError {
    LayoutError::InvalidRoleSequence {
        index,
        role: format!("{role:?}"),
    }
}

/// Groups the table's columns: the first column is the domain, data columns start a
/// group and role columns join the group before them.
pub fn read_columns(
    table: &dyn DataTable,
    options: &Options,
) -> Result<ColumnLayout, LayoutError> {
    if table.num_columns() > 0 && role_of(table, 0) != ColumnRole::Domain {
        return Err(invalid_role(0, role_of(table, 0)));
    }

    let mut layout = ColumnLayout {
        domain: 0,
        domain_annotations: vec![],
        domain_attached: vec![],
        data: vec![],
    };
    for col in 1..table.num_columns() {
        let role = role_of(table, col);
        match role {
            ColumnRole::Domain => return Err(invalid_role(col, role)),
            ColumnRole::Data => {
                layout.data.push(DataColumn::new(col));
                continue;
            }
            _ => {}
        }
        match (role, layout.data.last_mut()) {
            (ColumnRole::Interval, Some(data)) => {
                let column_type = table.column_type(col);
                if column_type != ColumnType::Number {
                    return Err(LayoutError::MixedColumnTypes {
                        column: table.column_label(col),
                        expected: ColumnType::Number,
                        found: column_type,
                    });
                }
                let style = IntervalStyle::for_column(options, &table.column_label(col));
                data.intervals.push(IntervalColumn { index: col, style });
            }
            (ColumnRole::Annotation, Some(data)) => data.annotations.push(col),
            (ColumnRole::Annotation, None) => layout.domain_annotations.push(col),
            (ColumnRole::AnnotationText | ColumnRole::Tooltip, None) => {
                layout.domain_attached.push((role, col))
            }
            (_, Some(data)) => data.attached.push((role, col)),
            (_, None) => return Err(invalid_role(col, role)),
        }
    }
    Ok(layout)
}

/// One series: its kind, the data columns it consumes and its per-series options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDefinition {
    pub index: usize,
    pub label: String,
    pub series_type: SeriesType,
    pub target_axis_index: usize,
    pub columns: Vec<usize>,
    pub intervals: Vec<IntervalColumn>,
    pub annotations: Vec<usize>,
    pub attached_columns: Vec<(ColumnRole, usize)>,
    pub curve_type: CurveType,
    pub interpolate_nulls: bool,
}

/// Splits the data columns into series and checks them against the chart options.
pub fn build_series(
    table: &dyn DataTable,
    options: &Options,
    columns: &ColumnLayout,
    orientation: Orientation,
) -> Result<Vec<SeriesDefinition>, LayoutError> {
    let default_type: SeriesType = options.infer_enum(&["seriesType"], SeriesType::default());
    let focus_target = options.infer_str(&["focusTarget"], "datum");
    let interpolate_nulls = options.infer_bool(&["interpolateNulls"], false);

    let mut series = vec![];
    let mut cursor = 0;
    while cursor < columns.data.len() {
        let index = series.len();
        let type_path = format!("series.{index}.type");
        let series_type = options.infer_enum(&[type_path.as_str()], default_type);

        let remaining = columns.data.len() - cursor;
        let needed = series_type.data_columns();
        if remaining < needed {
            return Err(LayoutError::MissingSeriesColumns {
                series_type: series_type.to_string(),
                needed,
                found: remaining,
            });
        }
        if series_type.is_xy() {
            if orientation == Orientation::Vertical {
                return Err(LayoutError::UnsupportedOrientation {
                    orientation: "vertical".to_string(),
                    series_type: series_type.to_string(),
                });
            }
            if focus_target == "category" {
                return Err(LayoutError::IncompatibleFocusTarget {
                    focus_target,
                    series_type: series_type.to_string(),
                });
            }
        }

        let take = match series_type {
            SeriesType::Bubble => remaining.min(BUBBLE_COLUMNS),
            _ => needed,
        };
        let group = &columns.data[cursor..cursor + take];
        for (position, data) in group.iter().enumerate() {
            // The bubble color column may hold category names
            if series_type == SeriesType::Bubble && position == 2 {
                continue;
            }
            let found = table.column_type(data.index);
            if found != ColumnType::Number {
                return Err(LayoutError::MixedColumnTypes {
                    column: table.column_label(data.index),
                    expected: ColumnType::Number,
                    found,
                });
            }
        }
        if series_type == SeriesType::Scatter {
            let found = table.column_type(columns.domain);
            if !found.is_continuous() {
                return Err(LayoutError::MixedColumnTypes {
                    column: table.column_label(columns.domain),
                    expected: ColumnType::Number,
                    found,
                });
            }
        }

        let prefix = format!("series.{index}");
        let first = &group[0];
        series.push(SeriesDefinition {
            index,
            label: table.column_label(first.index),
            series_type,
            target_axis_index: options
                .infer_usize(&[format!("{prefix}.targetAxisIndex")], 0)
                .min(1),
            columns: group.iter().map(|d| d.index).collect(),
            intervals: first.intervals.clone(),
            annotations: group.iter().flat_map(|d| d.annotations.clone()).collect(),
            attached_columns: group.iter().flat_map(|d| d.attached.clone()).collect(),
            curve_type: options.infer_enum(
                &[format!("{prefix}.curveType"), "curveType".to_string()],
                CurveType::None,
            ),
            interpolate_nulls,
        });
        cursor += take;
    }

    if series.is_empty() {
        return Err(LayoutError::MissingSeriesColumns {
            series_type: default_type.to_string(),
            needed: default_type.data_columns(),
            found: 0,
        });
    }
    tracing::debug!("built {} series", series.len());
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_common::table::{MemoryColumn, MemoryTable};

    fn table(columns: Vec<MemoryColumn>) -> MemoryTable {
        MemoryTable::new(columns)
    }

    #[test]
    fn test_roles_attach_to_preceding_column() {
        let table = table(vec![
            MemoryColumn::strings("year", &["2000"]),
            MemoryColumn::strings("note", &["launch"]).with_role(ColumnRole::Annotation),
            MemoryColumn::numbers("sales", &[Some(1.0)]),
            MemoryColumn::numbers("lo", &[Some(0.5)]).with_role(ColumnRole::Interval),
            MemoryColumn::numbers("hi", &[Some(1.5)]).with_role(ColumnRole::Interval),
            MemoryColumn::strings("tip", &["t"]).with_role(ColumnRole::Tooltip),
            MemoryColumn::numbers("cost", &[Some(2.0)]),
        ]);
        let layout = read_columns(&table, &Options::empty()).unwrap();
        assert_eq!(layout.domain_annotations, vec![1]);
        assert_eq!(layout.data.len(), 2);
        assert_eq!(
            layout.data[0].intervals.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert_eq!(layout.data[0].attached, vec![(ColumnRole::Tooltip, 5)]);
        assert_eq!(layout.data[1].index, 6);
    }

    #[test]
    fn test_invalid_role_sequences() {
        let orphan = table(vec![
            MemoryColumn::strings("year", &["2000"]),
            MemoryColumn::numbers("lo", &[Some(0.5)]).with_role(ColumnRole::Interval),
        ]);
        assert_eq!(
            read_columns(&orphan, &Options::empty()),
            Err(LayoutError::InvalidRoleSequence {
                index: 1,
                role: "Interval".to_string()
            })
        );

        let data_first = table(vec![
            MemoryColumn::numbers("sales", &[Some(1.0)]).with_role(ColumnRole::Data)
        ]);
        assert!(matches!(
            read_columns(&data_first, &Options::empty()),
            Err(LayoutError::InvalidRoleSequence { index: 0, .. })
        ));
    }

    #[test]
    fn test_series_types_consume_columns() {
        let table = table(vec![
            MemoryColumn::strings("day", &["mon"]),
            MemoryColumn::numbers("low", &[Some(1.0)]),
            MemoryColumn::numbers("open", &[Some(2.0)]),
            MemoryColumn::numbers("close", &[Some(3.0)]),
            MemoryColumn::numbers("high", &[Some(4.0)]),
            MemoryColumn::numbers("avg", &[Some(2.5)]),
        ]);
        let options = Options::new(json!({
            "seriesType": "candlesticks",
            "series": {"1": {"type": "line", "targetAxisIndex": 3, "curveType": "function"}}
        }));
        let columns = read_columns(&table, &options).unwrap();
        let series = build_series(&table, &options, &columns, Orientation::Horizontal).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].series_type, SeriesType::Candlesticks);
        assert_eq!(series[0].columns, vec![1, 2, 3, 4]);
        assert_eq!(series[1].series_type, SeriesType::Line);
        assert_eq!(series[1].target_axis_index, 1);
        assert_eq!(series[1].curve_type, CurveType::Function);
    }

    #[test]
    fn test_series_errors() {
        let table = table(vec![
            MemoryColumn::strings("day", &["mon"]),
            MemoryColumn::numbers("low", &[Some(1.0)]),
            MemoryColumn::numbers("open", &[Some(2.0)]),
        ]);
        let define = |options: serde_json::Value,
                      orientation: Orientation|
         -> Result<Vec<SeriesDefinition>, LayoutError> {
            let options = Options::new(options);
            let columns = read_columns(&table, &options)?;
            build_series(&table, &options, &columns, orientation)
        };

        assert_eq!(
            define(json!({"seriesType": "candlesticks"}), Orientation::Horizontal),
            Err(LayoutError::MissingSeriesColumns {
                series_type: "candlesticks".to_string(),
                needed: 4,
                found: 2,
            })
        );
        assert!(matches!(
            define(json!({"seriesType": "bubble"}), Orientation::Vertical),
            Err(LayoutError::UnsupportedOrientation { .. })
        ));
        assert!(matches!(
            define(
                json!({"seriesType": "bubble", "focusTarget": "category"}),
                Orientation::Horizontal
            ),
            Err(LayoutError::IncompatibleFocusTarget { .. })
        ));
        // A string domain cannot carry scatter x values
        assert!(matches!(
            define(json!({"seriesType": "scatter"}), Orientation::Horizontal),
            Err(LayoutError::MixedColumnTypes { .. })
        ));
    }
}
