//! The chart-definition pipeline.
//!
//! [`ChartDefiner::define`] runs the [`LayoutStep`]s strictly in order. Every step takes
//! what the earlier steps produced and returns owned state for the later ones, so a pass
//! either completes or stops at the first configuration error. Re-layout builds a new
//! definer from scratch.

pub mod columns;
pub mod furniture;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::Display;
use trellis_common::options::Options;
use trellis_common::table::{ColumnType, DataTable};
use trellis_common::types::{Orientation, Rect};
use trellis_scales::decorations::time::TimeUnit;
use trellis_text::measurement::TextMeasurer;

use crate::annotation::{
    AnnotationAnchor, AnnotationDefiner, AnnotationLayout, AnnotationOptions, AnnotationStyle,
};
use crate::axis::{
    AxisDefiner, AxisKind, AxisLayout, AxisOptions, AxisSide, CategoryAxis, DomainAxis,
    ResolvedAxis, ScaleType,
};
use crate::collision::{CollisionResolver, FurnitureTree};
use crate::datum::curve::CurveType;
use crate::datum::intervals::{build_interval_marks, IntervalColumn};
use crate::datum::series::{BubbleSizing, ScaleContext, SeriesLayout, SeriesType};
use crate::datum::stacking::{StackingMode, StackingState};
use crate::datum::{NonScaledDatum, ScaledMark, ScaledSeries};
use crate::division::{continuous_slot_width, DivisionDefinition, DivisionOptions};
use crate::error::LayoutError;
use columns::{ColumnLayout, SeriesDefinition};
use furniture::{LegendLayout, TitleLayout};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStep {
    ReadColumns,
    BuildSeries,
    AccumulateRanges,
    ResolveAxes,
    CalcDivisions,
    ScaleSeries,
    CalcDecorations,
    PlaceAnnotations,
    ResolveCollisions,
}

impl LayoutStep {
    pub const ORDER: [LayoutStep; 9] = [
        LayoutStep::ReadColumns,
        LayoutStep::BuildSeries,
        LayoutStep::AccumulateRanges,
        LayoutStep::ResolveAxes,
        LayoutStep::CalcDivisions,
        LayoutStep::ScaleSeries,
        LayoutStep::CalcDecorations,
        LayoutStep::PlaceAnnotations,
        LayoutStep::ResolveCollisions,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetAxisDefinition {
    pub index: usize,
    pub view_window: (f64, f64),
    pub baseline: Option<f64>,
    pub layout: AxisLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    #[serde(flatten)]
    pub definition: SeriesDefinition,
    pub scaled: ScaledSeries,
}

/// Pixel geometry of a whole chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDefinition {
    pub width: f64,
    pub height: f64,
    pub orientation: Orientation,
    pub chart_area: Rect,
    pub title: Option<TitleLayout>,
    pub legend: Option<LegendLayout>,
    pub color_bar: Option<Rect>,
    pub stacking: StackingMode,
    pub domain_axis: AxisLayout,
    /// View window of a continuous domain axis
    pub domain_view_window: Option<(f64, f64)>,
    pub target_axes: Vec<TargetAxisDefinition>,
    pub division: Option<DivisionDefinition>,
    pub series: Vec<ChartSeries>,
    pub annotations: Vec<AnnotationLayout>,
    pub steps: Vec<LayoutStep>,
}

enum DomainSource {
    Categories(Vec<String>),
    Continuous(AxisDefiner),
}

/// Value-space state once every series has been accumulated.
struct Accumulated {
    domain: DomainSource,
    /// Domain value of each row, `None` where a continuous domain cell is missing
    domain_values: Vec<Option<f64>>,
    targets: IndexMap<usize, AxisDefiner>,
    datums: Vec<Vec<NonScaledDatum>>,
    stacking: StackingMode,
    sizing: BubbleSizing,
}

struct ResolvedAxes {
    chart_area: Rect,
    title: Option<TitleLayout>,
    legend: Option<LegendLayout>,
    color_bar: Option<Rect>,
    domain: DomainAxis,
    targets: IndexMap<usize, ResolvedAxis>,
}

struct Divisions {
    division: Option<DivisionDefinition>,
    /// Subdivision index of each series
    subdivisions: Vec<usize>,
}

pub struct ChartDefiner<'a> {
    table: &'a dyn DataTable,
    options: &'a Options,
    measurer: &'a dyn TextMeasurer,
    size: ChartSize,
    orientation: Orientation,
}

impl<'a> ChartDefiner<'a> {
    pub fn new(
        table: &'a dyn DataTable,
        options: &'a Options,
        measurer: &'a dyn TextMeasurer,
        size: ChartSize,
    ) -> Self {
        Self {
            table,
            options,
            measurer,
            size,
            orientation: options.infer_enum(&["orientation"], Orientation::Horizontal),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[tracing::instrument(skip_all)]
    pub fn define(&self) -> Result<ChartDefinition, LayoutError> {
        let mut steps = Vec::with_capacity(LayoutStep::ORDER.len());

        let columns = columns::read_columns(self.table, self.options)?;
        steps.push(LayoutStep::ReadColumns);

        let series =
            columns::build_series(self.table, self.options, &columns, self.orientation)?;
        steps.push(LayoutStep::BuildSeries);

        let Accumulated {
            domain,
            domain_values,
            targets,
            datums,
            stacking,
            sizing,
        } = self.accumulate_ranges(&columns, &series)?;
        steps.push(LayoutStep::AccumulateRanges);

        let axes = self.resolve_axes(&series, domain, targets)?;
        steps.push(LayoutStep::ResolveAxes);

        let divisions = self.calc_divisions(&series, &axes, &domain_values, stacking);
        steps.push(LayoutStep::CalcDivisions);

        let scaled = self.scale_series(&series, &datums, &axes, &divisions, sizing);
        steps.push(LayoutStep::ScaleSeries);

        let (mut domain_layout, mut target_layouts) = self.calc_decorations(&axes)?;
        steps.push(LayoutStep::CalcDecorations);

        let annotations =
            self.place_annotations(&columns, &series, &domain_values, &datums, &scaled, &axes);
        steps.push(LayoutStep::PlaceAnnotations);

        self.resolve_collisions(&axes, &mut domain_layout, &mut target_layouts);
        steps.push(LayoutStep::ResolveCollisions);

        tracing::debug!(
            "defined {} series and {} annotations",
            series.len(),
            annotations.len()
        );
        let target_axes = axes
            .targets
            .iter()
            .zip(target_layouts)
            .map(|((index, axis), layout)| TargetAxisDefinition {
                index: *index,
                view_window: axis.view_window(),
                baseline: axis.baseline(),
                layout,
            })
            .collect();
        let domain_view_window = match &axes.domain {
            DomainAxis::Continuous(axis) => Some(axis.view_window()),
            DomainAxis::Discrete(_) => None,
        };
        Ok(ChartDefinition {
            width: self.size.width,
            height: self.size.height,
            orientation: self.orientation,
            chart_area: axes.chart_area,
            title: axes.title,
            legend: axes.legend,
            color_bar: axes.color_bar,
            stacking,
            domain_axis: domain_layout,
            domain_view_window,
            target_axes,
            division: divisions.division,
            series: series
                .into_iter()
                .zip(scaled)
                .map(|(definition, scaled)| ChartSeries { definition, scaled })
                .collect(),
            annotations,
            steps,
        })
    }

    fn domain_axis_options(&self) -> AxisOptions {
        let prefix = match self.orientation {
            Orientation::Horizontal => "hAxis",
            Orientation::Vertical => "vAxis",
        };
        AxisOptions::from_options(self.options, &[prefix])
    }

    fn target_axis_options(&self, index: usize) -> AxisOptions {
        let (prefix, fallback) = match self.orientation {
            Orientation::Horizontal => ("vAxes", "vAxis"),
            Orientation::Vertical => ("hAxes", "hAxis"),
        };
        AxisOptions::from_options(
            self.options,
            &[format!("{prefix}.{index}"), fallback.to_string()],
        )
    }

    #[tracing::instrument(skip_all)]
    fn accumulate_ranges(
        &self,
        columns: &ColumnLayout,
        series: &[SeriesDefinition],
    ) -> Result<Accumulated, LayoutError> {
        let table = self.table;
        let orientation = self.orientation;

        // Bubble charts run along their x column rather than the label column
        let domain_column = series
            .iter()
            .find(|s| s.series_type == SeriesType::Bubble)
            .map_or(columns.domain, |s| s.columns[0]);
        let continuous =
            |kind: AxisKind| AxisDefiner::new(orientation, kind, self.domain_axis_options());
        let mut domain = match table.column_type(domain_column) {
            ColumnType::String | ColumnType::Boolean => DomainSource::Categories(
                (0..table.num_rows())
                    .map(|row| table.formatted_value(row, domain_column).unwrap_or_default())
                    .collect(),
            ),
            ColumnType::Number => DomainSource::Continuous(continuous(AxisKind::Numeric)),
            ColumnType::Date => DomainSource::Continuous(
                continuous(AxisKind::Time).with_granularity(Some(TimeUnit::Day)),
            ),
            ColumnType::DateTime => DomainSource::Continuous(continuous(AxisKind::Time)),
        };
        let domain_values: Vec<Option<f64>> = (0..table.num_rows())
            .map(|row| match domain {
                DomainSource::Categories(_) => Some(row as f64),
                DomainSource::Continuous(_) => table.number(row, domain_column),
            })
            .collect();
        if let DomainSource::Continuous(definer) = &mut domain {
            definer.extend_range_to_include(domain_values.iter().flatten().copied());
        }

        let mut targets: IndexMap<usize, AxisDefiner> = IndexMap::new();
        for index in std::iter::once(0).chain(series.iter().map(|s| s.target_axis_index)) {
            targets.entry(index).or_insert_with(|| {
                AxisDefiner::new(
                    orientation.flip(),
                    AxisKind::Numeric,
                    self.target_axis_options(index),
                )
            });
        }
        targets.sort_keys();

        let stacking = StackingMode::from_options(self.options);
        let stacks = |s: &SeriesDefinition| stacking.is_stacked() && s.series_type.is_stackable();
        let mut state = StackingState::new(stacking);
        if matches!(stacking, StackingMode::Relative | StackingMode::Percent) {
            for s in series.iter().filter(|s| stacks(s)) {
                for (row, domain) in domain_values.iter().enumerate() {
                    let value = table.number(row, s.columns[0]);
                    if let (Some(domain), Some(value)) = (domain, value) {
                        state.add_to_total(s.target_axis_index, *domain, value);
                    }
                }
            }
        }

        let mut datums = Vec::with_capacity(series.len());
        for s in series {
            let Some(definer) = targets.get_mut(&s.target_axis_index) else {
                continue;
            };
            let value_columns = match s.series_type {
                SeriesType::Bubble => &s.columns[1..],
                _ => &s.columns[..],
            };
            let mut series_datums = vec![];
            for (row, domain) in domain_values.iter().enumerate() {
                let Some(domain) = *domain else {
                    continue;
                };
                let values: Vec<Option<f64>> = value_columns
                    .iter()
                    .map(|col| table.number(row, *col))
                    .collect();
                let stack = match values.first().copied().flatten() {
                    Some(value) if stacks(s) => {
                        Some(state.stack(s.target_axis_index, domain, value))
                    }
                    _ => None,
                };
                let interval_values: Vec<(IntervalColumn, Option<f64>)> = s
                    .intervals
                    .iter()
                    .map(|c| (*c, table.number(row, c.index)))
                    .collect();
                let intervals =
                    build_interval_marks(values.first().copied().flatten(), &interval_values);
                let datum = NonScaledDatum::new(row, domain, values)
                    .with_stack(stack)
                    .with_intervals(intervals);
                match s.series_type {
                    // Color and size are not target values
                    SeriesType::Bubble => definer.extend_range_to_include(datum.target()),
                    _ => definer.extend_range_to_include(datum.target_extent()),
                }
                series_datums.push(datum);
            }
            if s.series_type.grows_from_baseline()
                && definer.options().scale_type == ScaleType::Linear
            {
                let baseline = definer.options().baseline.unwrap_or(0.0);
                definer.extend_range_to_include_number(baseline);
            }
            datums.push(series_datums);
        }

        let sizes = series
            .iter()
            .zip(&datums)
            .filter(|(s, _)| s.series_type == SeriesType::Bubble)
            .flat_map(|(_, datums)| datums.iter())
            .filter_map(|d| d.values.get(2).copied().flatten());
        let sizing = BubbleSizing::from_options(self.options).with_size_range(sizes);

        Ok(Accumulated {
            domain,
            domain_values,
            targets,
            datums,
            stacking,
            sizing,
        })
    }

    #[tracing::instrument(skip_all)]
    fn resolve_axes(
        &self,
        series: &[SeriesDefinition],
        domain: DomainSource,
        targets: IndexMap<usize, AxisDefiner>,
    ) -> Result<ResolvedAxes, LayoutError> {
        let ChartSize { width, height } = self.size;
        let area = furniture::chart_area(self.options, width, height);
        let labels: Vec<String> = series.iter().map(|s| s.label.clone()).collect();

        let domain_extent = self.orientation.extent(&area);
        let domain = match domain {
            DomainSource::Categories(labels) => DomainAxis::Discrete(CategoryAxis::new(
                self.orientation,
                labels,
                domain_extent,
                self.domain_axis_options(),
            )),
            DomainSource::Continuous(definer) => {
                DomainAxis::Continuous(definer.resolve(domain_extent, self.measurer)?)
            }
        };

        // Values grow upward on vertical target axes
        let target_screen = match self.orientation {
            Orientation::Horizontal => (area.bottom(), area.top),
            Orientation::Vertical => (area.left, area.right()),
        };
        let targets = targets
            .into_iter()
            .map(|(index, definer)| Ok((index, definer.resolve(target_screen, self.measurer)?)))
            .collect::<Result<IndexMap<_, _>, LayoutError>>()?;

        Ok(ResolvedAxes {
            chart_area: area,
            title: furniture::title(self.options, self.measurer, &area),
            legend: furniture::legend(
                self.options,
                self.measurer,
                &labels,
                &area,
                (width, height),
            ),
            color_bar: furniture::color_bar(self.options, &area, height),
            domain,
            targets,
        })
    }

    #[tracing::instrument(skip_all)]
    fn calc_divisions(
        &self,
        series: &[SeriesDefinition],
        axes: &ResolvedAxes,
        domain_values: &[Option<f64>],
        stacking: StackingMode,
    ) -> Divisions {
        let needs_slots = series
            .iter()
            .any(|s| s.series_type.is_bar_like() || s.series_type == SeriesType::SteppedArea);
        if !needs_slots {
            return Divisions {
                division: None,
                subdivisions: vec![0; series.len()],
            };
        }

        // Stacked bars on one target axis share a subdivision
        let key = |s: &SeriesDefinition| {
            if stacking.is_stacked() {
                s.target_axis_index
            } else {
                s.index
            }
        };
        let keys: Vec<usize> = series
            .iter()
            .filter(|s| s.series_type.is_bar_like())
            .map(key)
            .unique()
            .collect();
        let subdivisions = series
            .iter()
            .map(|s| keys.iter().position(|k| *k == key(s)).unwrap_or(0))
            .collect();

        let slot_width = match &axes.domain {
            DomainAxis::Discrete(axis) => axis.slot_width(),
            DomainAxis::Continuous(axis) => {
                let (start, end) = self.orientation.extent(&axes.chart_area);
                let fallback = (end - start).abs() / domain_values.len().max(1) as f64;
                let positions = domain_values
                    .iter()
                    .flatten()
                    .map(|v| axis.calc_position_for_numeric_value(*v));
                continuous_slot_width(positions, fallback)
            }
        };
        let division = DivisionDefinition::calculate(
            slot_width,
            keys.len(),
            &DivisionOptions::from_options(self.options),
        );
        tracing::debug!(
            "slot width {slot_width}, {} subdivisions of {}px",
            division.num_subdivisions,
            division.subdivision_width
        );
        Divisions {
            division: Some(division),
            subdivisions,
        }
    }

    #[tracing::instrument(skip_all)]
    fn scale_series(
        &self,
        series: &[SeriesDefinition],
        datums: &[Vec<NonScaledDatum>],
        axes: &ResolvedAxes,
        divisions: &Divisions,
        sizing: BubbleSizing,
    ) -> Vec<ScaledSeries> {
        series
            .iter()
            .zip(datums)
            .zip(&divisions.subdivisions)
            .map(|((s, datums), subdivision)| {
                let uses_slots =
                    s.series_type.is_bar_like() || s.series_type == SeriesType::SteppedArea;
                let context = ScaleContext {
                    orientation: self.orientation,
                    domain: &axes.domain,
                    target: &axes.targets[&s.target_axis_index],
                    division: divisions.division.as_ref().filter(|_| uses_slots),
                    subdivision: *subdivision,
                };
                let layout = SeriesLayout::new(s.series_type, context, sizing);
                let mut scaled = ScaledSeries::new(
                    datums.iter().map(|d| layout.scale(d)).collect(),
                    s.interpolate_nulls,
                );
                if s.series_type == SeriesType::Line && s.curve_type == CurveType::Function {
                    scaled.apply_curve();
                }
                scaled
            })
            .collect()
    }

    #[tracing::instrument(skip_all)]
    fn calc_decorations(
        &self,
        axes: &ResolvedAxes,
    ) -> Result<(AxisLayout, Vec<AxisLayout>), LayoutError> {
        let domain_side = match self.orientation {
            Orientation::Horizontal => AxisSide::Bottom,
            Orientation::Vertical => AxisSide::Left,
        };
        let domain = axes.domain.compute_decorations(self.measurer, domain_side)?;
        let targets = axes
            .targets
            .iter()
            .map(|(index, axis)| {
                let side = match (self.orientation, *index) {
                    (Orientation::Horizontal, 0) => AxisSide::Left,
                    (Orientation::Horizontal, _) => AxisSide::Right,
                    (Orientation::Vertical, 0) => AxisSide::Bottom,
                    (Orientation::Vertical, _) => AxisSide::Top,
                };
                axis.compute_decorations(self.measurer, side)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((domain, targets))
    }

    #[tracing::instrument(skip_all)]
    fn place_annotations(
        &self,
        columns: &ColumnLayout,
        series: &[SeriesDefinition],
        domain_values: &[Option<f64>],
        datums: &[Vec<NonScaledDatum>],
        scaled: &[ScaledSeries],
        axes: &ResolvedAxes,
    ) -> Vec<AnnotationLayout> {
        let definer = AnnotationDefiner::new(self.orientation, axes.chart_area, self.measurer);
        let high_end = match self.orientation {
            Orientation::Horizontal => axes.chart_area.top,
            Orientation::Vertical => axes.chart_area.right(),
        };
        let mut annotations = vec![];

        if let Some((_, primary)) = axes.targets.first() {
            let options = AnnotationOptions::for_domain(self.options);
            let base = primary.calc_position_for_numeric_value(primary.base_value());
            for (row, domain) in domain_values.iter().enumerate() {
                let Some(domain) = domain else {
                    continue;
                };
                let position = axes.domain.position(*domain);
                for &col in &columns.domain_annotations {
                    let Some(text) = self.table.formatted_value(row, col) else {
                        continue;
                    };
                    let texts = [text];
                    annotations.push(match options.style {
                        AnnotationStyle::Line => definer
                            .line_annotation(row, col, &texts, position, high_end, &options),
                        AnnotationStyle::Point => {
                            let anchor = AnnotationAnchor {
                                domain: position,
                                target: base,
                                base,
                                bar: None,
                            };
                            definer.point_annotation(row, col, &texts, anchor, &options)
                        }
                    });
                }
            }
        }

        for ((s, datums), scaled) in series.iter().zip(datums).zip(scaled) {
            let Some(&column_index) = s.annotations.first() else {
                continue;
            };
            let options = AnnotationOptions::for_series(self.options, s.index);
            let target = &axes.targets[&s.target_axis_index];
            for (datum, scaled_datum) in datums.iter().zip(&scaled.datums) {
                let Some(scaled_datum) = scaled_datum else {
                    continue;
                };
                let texts: Vec<String> = s
                    .annotations
                    .iter()
                    .filter_map(|col| self.table.formatted_value(datum.row, *col))
                    .collect();
                if texts.is_empty() {
                    continue;
                }
                let (domain, anchor_target) = self.orientation.split(scaled_datum.mark.anchor());
                let layout = match options.style {
                    AnnotationStyle::Line => definer.line_annotation(
                        datum.row,
                        column_index,
                        &texts,
                        domain,
                        high_end,
                        &options,
                    ),
                    AnnotationStyle::Point => {
                        let base_value = datum
                            .stack
                            .map_or_else(|| target.base_value(), |stack| stack.from);
                        // Bars anchor at their far end rather than their center
                        let (end, bar) = match scaled_datum.mark {
                            ScaledMark::Bar { rect } => {
                                let end = datum.end_value().map_or(anchor_target, |v| {
                                    target.calc_position_for_numeric_value(v)
                                });
                                (end, Some(rect))
                            }
                            _ => (anchor_target, None),
                        };
                        let anchor = AnnotationAnchor {
                            domain,
                            target: end,
                            base: target.calc_position_for_numeric_value(base_value),
                            bar,
                        };
                        definer.point_annotation(
                            datum.row,
                            column_index,
                            &texts,
                            anchor,
                            &options,
                        )
                    }
                };
                annotations.push(layout);
            }
        }
        annotations
    }

    #[tracing::instrument(skip_all)]
    fn resolve_collisions(
        &self,
        axes: &ResolvedAxes,
        domain: &mut AxisLayout,
        targets: &mut [AxisLayout],
    ) {
        let tree = FurnitureTree::new(furniture::furniture_boxes(
            axes.title.as_ref(),
            axes.legend.as_ref(),
            axes.color_bar.as_ref(),
        ));
        CollisionResolver::new(axes.chart_area, self.measurer).resolve(domain, targets, &tree);
    }
}
