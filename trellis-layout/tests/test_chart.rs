use float_cmp::assert_approx_eq;
use serde_json::json;
use trellis_common::options::Options;
use trellis_common::table::{
    parse_epoch_millis, ColumnRole, ColumnType, MemoryColumn, MemoryTable,
};
use trellis_layout::axis::AxisSide;
use trellis_layout::chart::{ChartDefiner, ChartDefinition, ChartSize, LayoutStep};
use trellis_layout::datum::{IntervalShape, ScaledMark};
use trellis_layout::error::LayoutError;
use trellis_text::measurement::FixedAdvanceMeasurer;

fn define(
    table: &MemoryTable,
    options: serde_json::Value,
) -> Result<ChartDefinition, LayoutError> {
    define_sized(table, options, 500.0, 300.0)
}

fn define_sized(
    table: &MemoryTable,
    options: serde_json::Value,
    width: f64,
    height: f64,
) -> Result<ChartDefinition, LayoutError> {
    let options = Options::new(options);
    let measurer = FixedAdvanceMeasurer::default();
    ChartDefiner::new(table, &options, &measurer, ChartSize { width, height }).define()
}

fn marks(chart: &ChartDefinition, series: usize) -> Vec<ScaledMark> {
    chart.series[series]
        .scaled
        .datums
        .iter()
        .flatten()
        .map(|d| d.mark.clone())
        .collect()
}

/// Pixel y of `value` on the primary target axis of a column chart.
fn y_of(chart: &ChartDefinition, value: f64) -> f64 {
    let (min, max) = chart.target_axes[0].view_window;
    let area = chart.chart_area;
    area.bottom() - (value - min) / (max - min) * area.height
}

#[test]
fn percent_stacked_areas_fill_the_axis() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("quarter", &["Q1", "Q2"]),
        MemoryColumn::numbers("east", &[Some(1.0), Some(3.0)]),
        MemoryColumn::numbers("west", &[Some(3.0), Some(1.0)]),
    ]);
    let chart = define(&table, json!({"seriesType": "area", "isStacked": "percent"})).unwrap();
    let (min, max) = chart.target_axes[0].view_window;
    assert_approx_eq!(f64, min, 0.0);
    assert!(max >= 100.0);

    let ScaledMark::Area { top, base } = marks(&chart, 0)[0] else {
        panic!("expected an area vertex");
    };
    assert_approx_eq!(f64, top.y, y_of(&chart, 25.0), epsilon = 1e-6);
    assert_approx_eq!(f64, base.y, y_of(&chart, 0.0), epsilon = 1e-6);

    let ScaledMark::Area { top, base } = marks(&chart, 1)[0] else {
        panic!("expected an area vertex");
    };
    assert_approx_eq!(f64, top.y, y_of(&chart, 100.0), epsilon = 1e-6);
    assert_approx_eq!(f64, base.y, y_of(&chart, 25.0), epsilon = 1e-6);
}

#[test]
fn interval_columns_become_sticks() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("month", &["jan", "feb"]),
        MemoryColumn::numbers("temp", &[Some(10.0), Some(20.0)]),
        MemoryColumn::numbers("low", &[Some(5.0), Some(15.0)]).with_role(ColumnRole::Interval),
        MemoryColumn::numbers("high", &[Some(12.0), Some(80.0)]).with_role(ColumnRole::Interval),
    ]);
    let chart = define(&table, json!({})).unwrap();
    // The interval high widens the axis
    assert!(chart.target_axes[0].view_window.1 >= 80.0);

    // One stick per interval column, each running from the value to the interval
    let datum = chart.series[0].scaled.datums[1].as_ref().unwrap();
    assert_eq!(datum.intervals.len(), 2);
    let IntervalShape::Stick { segment, column_index } = &datum.intervals[0] else {
        panic!("expected a stick");
    };
    assert_eq!(*column_index, 2);
    assert_approx_eq!(f64, segment.from.y, y_of(&chart, 15.0), epsilon = 1e-6);
    assert_approx_eq!(f64, segment.to.y, y_of(&chart, 20.0), epsilon = 1e-6);
    let IntervalShape::Stick { segment, column_index } = &datum.intervals[1] else {
        panic!("expected a stick");
    };
    assert_eq!(*column_index, 3);
    assert_approx_eq!(f64, segment.from.y, y_of(&chart, 20.0), epsilon = 1e-6);
    assert_approx_eq!(f64, segment.to.y, y_of(&chart, 80.0), epsilon = 1e-6);
}

#[test]
fn log_axis_stacks_raw_values() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("region", &["north"]),
        MemoryColumn::numbers("retail", &[Some(10.0)]),
        MemoryColumn::numbers("online", &[Some(90.0)]),
    ]);
    let options = json!({
        "seriesType": "bars",
        "isStacked": "absolute",
        "vAxis": {"scaleType": "log", "viewWindow": {"min": 1, "max": 1000}}
    });
    let chart = define(&table, options).unwrap();
    // Three decades over the chart area height
    let area = chart.chart_area;
    let y = |value: f64| area.bottom() - value.log10() / 3.0 * area.height;

    let ScaledMark::Bar { rect } = marks(&chart, 1)[0] else {
        panic!("expected a bar");
    };
    // 10 + 90 stacks to 100, not to 10^(1 + log10(90))
    assert_approx_eq!(f64, rect.bottom(), y(10.0), epsilon = 1e-6);
    assert_approx_eq!(f64, rect.top, y(100.0), epsilon = 1e-6);
}

#[test]
fn value_axis_labels_never_overlap() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("store", &["a", "b"]),
        MemoryColumn::numbers("revenue", &[Some(120_000.0), Some(960_000.0)]),
    ]);
    let options = json!({"seriesType": "bars", "orientation": "vertical"});
    let chart = define_sized(&table, options, 600.0, 300.0).unwrap();
    let layout = &chart.target_axes[0].layout;
    assert_eq!(layout.side, AxisSide::Bottom);

    let measurer = FixedAdvanceMeasurer::default();
    let boxes = layout.label_boxes(&measurer, &chart.chart_area);
    assert!(boxes.len() >= 3, "{boxes:?}");
    for pair in boxes.windows(2) {
        assert!(!pair[0].1.intersects(&pair[1].1), "{boxes:?}");
    }
}

#[test]
fn candlesticks_mark_direction() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("day", &["mon", "tue"]),
        MemoryColumn::numbers("low", &[Some(20.0), Some(31.0)]),
        MemoryColumn::numbers("open", &[Some(28.0), Some(38.0)]),
        MemoryColumn::numbers("close", &[Some(38.0), Some(55.0)]),
        MemoryColumn::numbers("high", &[Some(45.0), Some(66.0)]),
    ]);
    let chart = define(&table, json!({"seriesType": "candlesticks"})).unwrap();
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.division.unwrap().num_subdivisions, 1);
    for mark in marks(&chart, 0) {
        let ScaledMark::Candlestick { body, wick, rising } = mark else {
            panic!("expected a candlestick");
        };
        assert!(rising);
        // The wick runs through the middle of the body
        assert_approx_eq!(f64, wick.from.x, body.center().x, epsilon = 1e-6);
    }
}

#[test]
fn scatter_uses_a_continuous_domain() {
    let table = MemoryTable::new(vec![
        MemoryColumn::numbers("x", &[Some(1.0), Some(2.0), Some(3.0)]),
        MemoryColumn::numbers("y", &[Some(2.0), Some(4.0), Some(6.0)]),
    ]);
    let chart = define(&table, json!({"seriesType": "scatter"})).unwrap();
    let (min, max) = chart.domain_view_window.unwrap();
    assert!(min <= 1.0 && max >= 3.0);
    let xs: Vec<f64> = marks(&chart, 0).iter().map(|m| m.anchor().x).collect();
    assert_eq!(xs.len(), 3);
    assert!(xs.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn bubbles_scale_radius_by_size() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("id", &["a", "b", "c"]),
        MemoryColumn::numbers("x", &[Some(1.0), Some(2.0), Some(3.0)]),
        MemoryColumn::numbers("y", &[Some(5.0), Some(6.0), Some(7.0)]),
        MemoryColumn::strings("region", &["n", "s", "n"]),
        MemoryColumn::numbers("size", &[Some(10.0), Some(20.0), Some(30.0)]),
    ]);
    let chart = define(&table, json!({"seriesType": "bubble"})).unwrap();
    assert_eq!(chart.series.len(), 1);
    let radii: Vec<f64> = marks(&chart, 0)
        .iter()
        .map(|m| match m {
            ScaledMark::Bubble { radius, .. } => *radius,
            _ => panic!("expected a bubble"),
        })
        .collect();
    assert_eq!(radii, vec![5.0, 17.5, 30.0]);
    // y values only; the size column must not stretch the axis to 30
    assert!(chart.target_axes[0].view_window.1 < 30.0);
}

#[test]
fn date_domain_is_a_time_axis() {
    let table = MemoryTable::new(vec![
        MemoryColumn::new(
            "day",
            ColumnType::Date,
            vec![json!("2020-01-01"), json!("2020-01-15"), json!("2020-02-01")],
        ),
        MemoryColumn::numbers("visits", &[Some(3.0), Some(9.0), Some(4.0)]),
    ]);
    let chart = define(&table, json!({})).unwrap();
    let (min, max) = chart.domain_view_window.unwrap();
    assert!(min <= parse_epoch_millis("2020-01-01").unwrap());
    assert!(max >= parse_epoch_millis("2020-02-01").unwrap());
    assert!(!chart.domain_axis.decorations.major_gridlines.is_empty());
}

#[test]
fn second_target_axis_goes_right() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("year", &["2001", "2002"]),
        MemoryColumn::numbers("revenue", &[Some(1000.0), Some(1500.0)]),
        MemoryColumn::numbers("margin", &[Some(0.1), Some(0.2)]),
    ]);
    let options = json!({"series": {"1": {"targetAxisIndex": 1}}, "legend": "none"});
    let chart = define(&table, options).unwrap();
    assert_eq!(chart.target_axes.len(), 2);
    assert_eq!(chart.target_axes[0].layout.side, AxisSide::Left);
    assert_eq!(chart.target_axes[1].index, 1);
    assert_eq!(chart.target_axes[1].layout.side, AxisSide::Right);
    assert!(chart.target_axes[1].view_window.1 < 1.0);
    assert!(chart.legend.is_none());
}

#[test]
fn domain_annotations_draw_full_height_lines() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("year", &["2001", "2002"]),
        MemoryColumn::strings("event", &["launch", "recall"])
            .with_role(ColumnRole::Annotation),
        MemoryColumn::numbers("sales", &[Some(3.0), Some(5.0)]),
    ]);
    let chart = define(&table, json!({})).unwrap();
    assert_eq!(chart.annotations.len(), 2);
    let stem = chart.annotations[1].stem.unwrap();
    assert_approx_eq!(f64, stem.from.y, chart.chart_area.top);
    assert_approx_eq!(f64, stem.to.y, chart.chart_area.bottom());
    assert_eq!(chart.annotations[1].labels[0].text, "recall");
}

#[test]
fn configuration_errors_abort_the_pass() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("year", &["2001"]),
        MemoryColumn::strings("sales", &["many"]),
    ]);
    assert!(matches!(
        define(&table, json!({})),
        Err(LayoutError::MixedColumnTypes { .. })
    ));

    let table = MemoryTable::new(vec![MemoryColumn::strings("year", &["2001"])]);
    assert!(matches!(
        define(&table, json!({})),
        Err(LayoutError::MissingSeriesColumns { found: 0, .. })
    ));

    let table = MemoryTable::new(vec![
        MemoryColumn::new("t", ColumnType::DateTime, vec![json!("2020-01-01T00:00:00")]),
        MemoryColumn::numbers("v", &[Some(1.0)]),
    ]);
    assert_eq!(
        define(&table, json!({"hAxis": {"timezone": "Mars/Olympus"}})).err(),
        Some(LayoutError::InvalidTimezone("Mars/Olympus".to_string()))
    );
}

#[test]
fn definition_serializes_to_json() {
    let table = MemoryTable::new(vec![
        MemoryColumn::strings("year", &["2001", "2002"]),
        MemoryColumn::numbers("sales", &[Some(3.0), Some(5.0)]),
    ]);
    let chart = define(&table, json!({"seriesType": "bars", "title": "Sales"})).unwrap();
    let value = serde_json::to_value(&chart).unwrap();
    assert_eq!(value["steps"].as_array().unwrap().len(), LayoutStep::ORDER.len());
    assert_eq!(value["steps"][0], json!("read_columns"));
    assert_eq!(value["series"][0]["series_type"], json!("bars"));
    assert_eq!(value["series"][0]["scaled"]["datums"][0]["mark"]["type"], json!("bar"));
    assert_eq!(value["title"]["text"], json!("Sales"));
}
