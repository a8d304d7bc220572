//! Annotation label and stem placement.
//!
//! Geometry is computed in (domain, target) pixel pairs and converted to x/y through the
//! chart [`Orientation`], so the same code serves column and bar layouts. Labels are
//! stacked along the target direction.

use serde::Serialize;
use strum::{EnumString, VariantNames};
use trellis_common::options::Options;
use trellis_common::types::{Orientation, Rect, Segment};
use trellis_text::measurement::TextMeasurer;
use trellis_text::types::TextStyle;

pub const DEFAULT_STEM_LENGTH: f64 = 5.0;

/// Gap between a line-style stem and its labels.
const LINE_LABEL_OFFSET: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum AnnotationStyle {
    Point,
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationOptions {
    pub style: AnnotationStyle,
    pub stem_length: f64,
    pub high_contrast: bool,
    pub always_outside: bool,
    pub text_style: TextStyle,
}

impl AnnotationOptions {
    /// Options for annotations of data column series `series`.
    pub fn for_series(options: &Options, series: usize) -> Self {
        let prefixes = [
            format!("series.{series}.annotations"),
            "annotations".to_string(),
        ];
        Self::read(options, &prefixes, AnnotationStyle::Point)
    }

    /// Options for annotations attached to the domain column.
    pub fn for_domain(options: &Options) -> Self {
        let prefixes = ["annotations.domain".to_string(), "annotations".to_string()];
        Self::read(options, &prefixes, AnnotationStyle::Line)
    }

    fn read(options: &Options, prefixes: &[String], default_style: AnnotationStyle) -> Self {
        let paths = |key: &str| -> Vec<String> {
            prefixes.iter().map(|p| format!("{p}.{key}")).collect()
        };
        let font_size = options.infer_f64(&paths("textStyle.fontSize"), 12.0);
        let text_style = TextStyle::default().with_font_size(font_size);
        let text_style = if options.infer_bool(&paths("textStyle.bold"), false) {
            text_style.bold()
        } else {
            text_style
        };
        Self {
            style: options.infer_enum(&paths("style"), default_style),
            stem_length: options
                .infer_f64(&paths("stem.length"), DEFAULT_STEM_LENGTH)
                .max(0.0),
            high_contrast: options.infer_bool(&paths("highContrast"), true),
            always_outside: options.infer_bool(&paths("alwaysOutside"), false),
            text_style,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationLabel {
    pub text: String,
    pub rect: Rect,
    /// Drawn in a color that contrasts with the bar it sits on
    pub high_contrast: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationLayout {
    pub row: usize,
    pub column_index: usize,
    pub style: AnnotationStyle,
    pub stem: Option<Segment>,
    pub labels: Vec<AnnotationLabel>,
}

/// Where a point annotation attaches, in (domain, target) pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationAnchor {
    pub domain: f64,
    /// End of the mark, where the stem starts
    pub target: f64,
    /// Pixel position of the value the mark grows from
    pub base: f64,
    /// The bar the annotation belongs to, if any
    pub bar: Option<Rect>,
}

pub struct AnnotationDefiner<'a> {
    orientation: Orientation,
    chart_area: Rect,
    measurer: &'a dyn TextMeasurer,
}

impl<'a> AnnotationDefiner<'a> {
    pub fn new(orientation: Orientation, chart_area: Rect, measurer: &'a dyn TextMeasurer) -> Self {
        Self {
            orientation,
            chart_area,
            measurer,
        }
    }

    /// Label extents along (domain, target).
    fn extents(&self, text: &str, style: &TextStyle) -> (f64, f64) {
        let bounds = self.measurer.measure(text, style);
        match self.orientation {
            Orientation::Horizontal => (bounds.width, bounds.height),
            Orientation::Vertical => (bounds.height, bounds.width),
        }
    }

    fn domain_extent(&self) -> (f64, f64) {
        self.orientation.extent(&self.chart_area)
    }

    /// Target pixel extent of the chart area, ordered `(min, max)`.
    fn target_extent(&self) -> (f64, f64) {
        self.orientation.cross_extent(&self.chart_area)
    }

    /// Centers a label of `extent` on `position`, kept inside the chart area.
    fn clamp_domain(&self, position: f64, extent: f64) -> f64 {
        let (lo, hi) = self.domain_extent();
        let start = position - extent / 2.0;
        if extent >= hi - lo {
            lo
        } else {
            start.clamp(lo, hi - extent)
        }
    }

    pub fn point_annotation(
        &self,
        row: usize,
        column_index: usize,
        texts: &[String],
        anchor: AnnotationAnchor,
        options: &AnnotationOptions,
    ) -> AnnotationLayout {
        let extents: Vec<(f64, f64)> = texts
            .iter()
            .map(|t| self.extents(t, &options.text_style))
            .collect();

        if let (Some(bar), [text]) = (anchor.bar, texts) {
            let bounds = self.measurer.measure(text, &options.text_style);
            if !options.always_outside && bounds.width <= bar.width && bounds.height <= bar.height
            {
                let center = bar.center();
                return AnnotationLayout {
                    row,
                    column_index,
                    style: AnnotationStyle::Point,
                    stem: None,
                    labels: vec![AnnotationLabel {
                        text: text.clone(),
                        rect: Rect::new(
                            center.x - bounds.width / 2.0,
                            center.y - bounds.height / 2.0,
                            bounds.width,
                            bounds.height,
                        ),
                        high_contrast: options.high_contrast,
                    }],
                };
            }
        }

        // Away from the base; marks sitting on the base point toward smaller pixels
        let mut direction = if anchor.target == anchor.base {
            match self.orientation {
                Orientation::Horizontal => -1.0,
                Orientation::Vertical => 1.0,
            }
        } else {
            (anchor.target - anchor.base).signum()
        };
        let total: f64 = extents.iter().map(|(_, te)| te).sum::<f64>() + options.stem_length;
        let (lo, hi) = self.target_extent();
        let far = anchor.target + direction * total;
        if far < lo || far > hi {
            tracing::trace!("flipping annotation on row {row}");
            direction = -direction;
        }

        let stem_end = anchor.target + direction * options.stem_length;
        let stem = self
            .orientation
            .segment(anchor.domain, anchor.target, anchor.domain, stem_end);
        let mut cursor = stem_end;
        let labels = texts
            .iter()
            .zip(extents)
            .map(|(text, (de, te))| {
                let d0 = self.clamp_domain(anchor.domain, de);
                let t1 = cursor + direction * te;
                let rect = self.orientation.rect(d0, d0 + de, cursor, t1);
                cursor = t1;
                AnnotationLabel {
                    text: text.clone(),
                    rect,
                    high_contrast: false,
                }
            })
            .collect();

        AnnotationLayout {
            row,
            column_index,
            style: AnnotationStyle::Point,
            stem: (options.stem_length > 0.0).then_some(stem),
            labels,
        }
    }

    /// A stem across the whole chart area at `domain`, labels stacked down from the end
    /// where values are largest (`high_end`).
    pub fn line_annotation(
        &self,
        row: usize,
        column_index: usize,
        texts: &[String],
        domain: f64,
        high_end: f64,
        options: &AnnotationOptions,
    ) -> AnnotationLayout {
        let (lo, hi) = self.target_extent();
        let stem = self.orientation.segment(domain, lo, domain, hi);
        let inward = if high_end <= lo { 1.0 } else { -1.0 };
        let line_offset = self
            .measurer
            .measure("", &options.text_style)
            .line_height;
        let (area_d0, area_d1) = self.domain_extent();

        let labels = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let (de, te) = self.extents(text, &options.text_style);
                let t0 = high_end + inward * (i as f64 * line_offset);
                // Flip to the left of the stem when the label would run off the area
                let mut d0 = domain + LINE_LABEL_OFFSET;
                if d0 + de > area_d1 {
                    d0 = (domain - LINE_LABEL_OFFSET - de).max(area_d0);
                }
                AnnotationLabel {
                    text: text.clone(),
                    rect: self.orientation.rect(d0, d0 + de, t0, t0 + inward * te),
                    high_contrast: false,
                }
            })
            .collect();

        AnnotationLayout {
            row,
            column_index,
            style: AnnotationStyle::Line,
            stem: Some(stem),
            labels,
        }
    }
}
