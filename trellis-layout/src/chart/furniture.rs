//! Title, legend and color bar boxes around the chart area.

use serde::Serialize;
use strum::{EnumString, VariantNames};
use trellis_common::options::Options;
use trellis_common::types::Rect;
use trellis_text::measurement::TextMeasurer;
use trellis_text::types::TextStyle;

use crate::axis::LABEL_GAP;
use crate::collision::{Furniture, FurnitureKind};

const TITLE_FONT_SIZE: f64 = 14.0;
const LEGEND_FONT_SIZE: f64 = 12.0;
pub const COLOR_BAR_HEIGHT: f64 = 12.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, EnumString, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum LegendPosition {
    #[default]
    Right,
    Left,
    Top,
    Bottom,
    None,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, EnumString, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum ColorBarPosition {
    #[default]
    Top,
    Bottom,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleLayout {
    pub text: String,
    pub rect: Rect,
    pub text_style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub swatch: Rect,
    pub text: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendLayout {
    pub position: LegendPosition,
    pub rect: Rect,
    pub text_style: TextStyle,
    pub entries: Vec<LegendEntry>,
}

/// Resolves `chartArea.{left,top,width,height}`, each absolute or a percentage of the
/// chart size. Missing sides default to a 15% margin.
pub fn chart_area(options: &Options, width: f64, height: f64) -> Rect {
    let resolve = |path: &str, total: f64, default: f64| {
        options
            .infer_size(&[path])
            .map(|size| size.resolve(total))
            .unwrap_or(default * total)
    };
    let left = resolve("chartArea.left", width, 0.15);
    let top = resolve("chartArea.top", height, 0.15);
    let area_width = resolve("chartArea.width", width, 0.7).clamp(0.0, (width - left).max(0.0));
    let area_height =
        resolve("chartArea.height", height, 0.7).clamp(0.0, (height - top).max(0.0));
    Rect::new(left, top, area_width, area_height)
}

/// The chart title, left aligned with the chart area and centered in the top margin.
pub fn title(options: &Options, measurer: &dyn TextMeasurer, area: &Rect) -> Option<TitleLayout> {
    let text = options.infer_opt_str(&["title"]).filter(|t| !t.is_empty())?;
    let text_style = TextStyle::default()
        .with_font_size(options.infer_f64(&["titleTextStyle.fontSize"], TITLE_FONT_SIZE));
    let text_style = if options.infer_bool(&["titleTextStyle.bold"], true) {
        text_style.bold()
    } else {
        text_style
    };
    let bounds = measurer.measure(&text, &text_style);
    let top = ((area.top - bounds.height) / 2.0).max(0.0);
    Some(TitleLayout {
        text,
        rect: Rect::new(area.left, top, bounds.width, bounds.height),
        text_style,
    })
}

/// Legend entries in a column beside the chart area or in a row above or below it.
pub fn legend(
    options: &Options,
    measurer: &dyn TextMeasurer,
    labels: &[String],
    area: &Rect,
    (width, height): (f64, f64),
) -> Option<LegendLayout> {
    let position = options.infer_enum(&["legend.position", "legend"], LegendPosition::Right);
    if position == LegendPosition::None || labels.is_empty() {
        return None;
    }
    let text_style = TextStyle::default()
        .with_font_size(options.infer_f64(&["legend.textStyle.fontSize"], LEGEND_FONT_SIZE));
    let swatch = text_style.font_size;
    let sizes: Vec<(f64, f64)> = labels
        .iter()
        .map(|label| {
            let bounds = measurer.measure(label, &text_style);
            (swatch + LABEL_GAP + bounds.width, bounds.line_height)
        })
        .collect();
    let row_height = sizes.iter().map(|(_, h)| *h).fold(swatch, f64::max);

    let vertical = matches!(position, LegendPosition::Right | LegendPosition::Left);
    let origin = match position {
        LegendPosition::Right => (area.right() + 2.0 * LABEL_GAP, area.top),
        LegendPosition::Left => (LABEL_GAP, area.top),
        LegendPosition::Top => (area.left, (area.top - row_height - LABEL_GAP).max(0.0)),
        _ => (area.left, (height - row_height - LABEL_GAP).max(0.0)),
    };

    let (mut x, mut y) = origin;
    let mut entries = vec![];
    let mut bounds: Option<Rect> = None;
    for (label, (entry_width, _)) in labels.iter().zip(&sizes) {
        // Entries that would leave the chart are dropped
        if x + entry_width > width || y + row_height > height {
            break;
        }
        let swatch_rect = Rect::new(x, y + (row_height - swatch) / 2.0, swatch, swatch);
        let text_rect = Rect::new(
            x + swatch + LABEL_GAP,
            y,
            entry_width - swatch - LABEL_GAP,
            row_height,
        );
        let entry_rect = swatch_rect.union(&text_rect);
        bounds = Some(bounds.map_or(entry_rect, |b| b.union(&entry_rect)));
        entries.push(LegendEntry {
            label: label.clone(),
            swatch: swatch_rect,
            text: text_rect,
        });
        if vertical {
            y += row_height + LABEL_GAP;
        } else {
            x += entry_width + 2.0 * LABEL_GAP;
        }
    }

    Some(LegendLayout {
        position,
        rect: bounds?,
        text_style,
        entries,
    })
}

/// Gradient bar for `colorAxis`, right aligned with the chart area.
pub fn color_bar(options: &Options, area: &Rect, height: f64) -> Option<Rect> {
    options.lookup("colorAxis")?;
    let position = options.infer_enum(&["colorAxis.legend.position"], ColorBarPosition::Top);
    let width = area.width / 2.0;
    let top = match position {
        ColorBarPosition::Top => area.top - COLOR_BAR_HEIGHT - 2.0 * LABEL_GAP,
        ColorBarPosition::Bottom => height - COLOR_BAR_HEIGHT - LABEL_GAP,
        ColorBarPosition::None => return None,
    };
    Some(Rect::new(
        area.right() - width,
        top.max(0.0),
        width,
        COLOR_BAR_HEIGHT,
    ))
}

/// Collision boxes of whatever furniture is present.
pub fn furniture_boxes(
    title: Option<&TitleLayout>,
    legend: Option<&LegendLayout>,
    color_bar: Option<&Rect>,
) -> Vec<Furniture> {
    let title = title.map(|t| Furniture {
        kind: FurnitureKind::Title,
        rect: t.rect,
    });
    let legend = legend.map(|l| Furniture {
        kind: FurnitureKind::Legend,
        rect: l.rect,
    });
    let color_bar = color_bar.map(|rect| Furniture {
        kind: FurnitureKind::ColorBar,
        rect: *rect,
    });
    title.into_iter().chain(legend).chain(color_bar).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use serde_json::json;
    use trellis_text::measurement::FixedAdvanceMeasurer;

    #[test]
    fn test_chart_area_defaults_and_overrides() {
        let area = chart_area(&Options::empty(), 400.0, 200.0);
        assert_approx_eq!(f64, area.left, 60.0);
        assert_approx_eq!(f64, area.top, 30.0);
        assert_approx_eq!(f64, area.width, 280.0);
        assert_approx_eq!(f64, area.height, 140.0);

        let options = Options::new(json!({"chartArea": {"left": 50, "width": "50%"}}));
        let area = chart_area(&options, 400.0, 200.0);
        assert_approx_eq!(f64, area.left, 50.0);
        assert_approx_eq!(f64, area.width, 200.0);
    }

    #[test]
    fn test_title_is_bold_and_centered_in_margin() {
        let measurer = FixedAdvanceMeasurer::default();
        let area = Rect::new(60.0, 30.0, 280.0, 140.0);
        let options = Options::new(json!({"title": "Sales"}));
        let title = title(&options, &measurer, &area).unwrap();
        // 5 bold graphemes at 7.7px, 14px tall
        assert_approx_eq!(f64, title.rect.left, 60.0);
        assert_approx_eq!(f64, title.rect.top, 8.0);
        assert_approx_eq!(f64, title.rect.width, 38.5, epsilon = 1e-9);
        assert!(super::title(&Options::new(json!({"title": ""})), &measurer, &area).is_none());
    }

    #[test]
    fn test_legend_positions() {
        let measurer = FixedAdvanceMeasurer::default();
        let area = Rect::new(60.0, 30.0, 280.0, 140.0);
        let labels = vec!["a".to_string(), "bb".to_string()];

        let right = legend(&Options::empty(), &measurer, &labels, &area, (400.0, 200.0)).unwrap();
        assert_eq!(right.position, LegendPosition::Right);
        assert_eq!(right.entries.len(), 2);
        assert_approx_eq!(f64, right.rect.left, 348.0);
        // Second entry sits one row plus a gap below the first
        assert_approx_eq!(f64, right.entries[1].swatch.top - right.entries[0].swatch.top, 18.4);

        let options = Options::new(json!({"legend": {"position": "top"}}));
        let top = legend(&options, &measurer, &labels, &area, (400.0, 200.0)).unwrap();
        assert_approx_eq!(f64, top.entries[0].swatch.top, top.entries[1].swatch.top);
        assert!(top.rect.bottom() <= area.top);

        let none = Options::new(json!({"legend": "none"}));
        assert!(legend(&none, &measurer, &labels, &area, (400.0, 200.0)).is_none());
    }

    #[test]
    fn test_color_bar_requires_color_axis() {
        let area = Rect::new(60.0, 30.0, 280.0, 140.0);
        assert!(color_bar(&Options::empty(), &area, 200.0).is_none());
        let options = Options::new(json!({"colorAxis": {"colors": ["red", "blue"]}}));
        let bar = color_bar(&options, &area, 200.0).unwrap();
        assert_eq!(bar, Rect::new(200.0, 10.0, 140.0, 12.0));
    }
}
