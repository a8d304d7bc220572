use serde::{Deserialize, Serialize};
use strum::{EnumString, VariantNames};

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LabelAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// One visual mark on an axis: a gridline, a tick, a label, or a combination.
///
/// The boolean flags are fixed by the constructor used; only the label can change after
/// construction (the collision resolver clears labels it cannot place).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDecoration {
    value: f64,
    position: f64,
    has_line: bool,
    has_tick: bool,
    is_tick_heavy: bool,
    label: Option<String>,
    label_alignment: LabelAlignment,
}

impl AxisDecoration {
    fn new(
        value: f64,
        position: f64,
        has_line: bool,
        has_tick: bool,
        is_tick_heavy: bool,
        label: Option<String>,
        label_alignment: LabelAlignment,
    ) -> Self {
        Self {
            value,
            position: position.round(),
            has_line,
            has_tick,
            is_tick_heavy,
            label,
            label_alignment,
        }
    }

    pub fn tick_only(value: f64, position: f64) -> Self {
        Self::new(value, position, false, true, false, None, LabelAlignment::Center)
    }

    pub fn line_only(value: f64, position: f64) -> Self {
        Self::new(value, position, true, false, false, None, LabelAlignment::Center)
    }

    pub fn line_and_tick(value: f64, position: f64) -> Self {
        Self::new(value, position, true, true, false, None, LabelAlignment::Center)
    }

    pub fn labeled_line(value: f64, position: f64, label: impl Into<String>) -> Self {
        Self::new(
            value,
            position,
            true,
            true,
            false,
            Some(label.into()),
            LabelAlignment::Center,
        )
    }

    pub fn labeled_tick(value: f64, position: f64, label: impl Into<String>) -> Self {
        Self::new(
            value,
            position,
            false,
            true,
            false,
            Some(label.into()),
            LabelAlignment::Center,
        )
    }

    /// A label with no line and no tick, e.g. a merged time-range label.
    pub fn label_only(value: f64, position: f64, label: impl Into<String>) -> Self {
        Self::new(
            value,
            position,
            false,
            false,
            false,
            Some(label.into()),
            LabelAlignment::Center,
        )
    }

    /// A heavy tick with a label that starts at the position and extends forward,
    /// used for the leading boundary of calendar units.
    pub fn left_aligned_label(value: f64, position: f64, label: impl Into<String>) -> Self {
        Self::new(
            value,
            position,
            true,
            true,
            true,
            Some(label.into()),
            LabelAlignment::Left,
        )
    }

    /// The baseline: a heavy line without a label.
    pub fn heavy_line(value: f64, position: f64) -> Self {
        Self::new(value, position, true, true, true, None, LabelAlignment::Center)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn has_line(&self) -> bool {
        self.has_line
    }

    pub fn has_tick(&self) -> bool {
        self.has_tick
    }

    pub fn is_tick_heavy(&self) -> bool {
        self.is_tick_heavy
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn label_alignment(&self) -> LabelAlignment {
        self.label_alignment
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }
}

/// Full output of a decoration supplier for one axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decorations {
    pub major_gridlines: Vec<AxisDecoration>,
    pub minor_gridlines: Option<Vec<AxisDecoration>>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Decorations {
    pub fn new(major_gridlines: Vec<AxisDecoration>) -> Self {
        Self {
            major_gridlines,
            ..Default::default()
        }
    }

    pub fn with_minor_gridlines(mut self, minor_gridlines: Vec<AxisDecoration>) -> Self {
        self.minor_gridlines = Some(minor_gridlines);
        self
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn labels(&self) -> Vec<&str> {
        self.major_gridlines.iter().filter_map(|d| d.label()).collect()
    }

    pub fn tick_count(&self) -> usize {
        self.major_gridlines.iter().filter(|d| d.has_tick()).count()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    pub fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }
}

/// Axis-aligned rectangle in screen pixels (y grows downward).
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Builds a rectangle from two opposite corners given in any order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            left: x0.min(x1),
            top: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// True when the interiors overlap; touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right() <= self.right()
            && other.top >= self.top
            && other.bottom() <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn inset(&self, amount: f64) -> Rect {
        Rect::new(
            self.left + amount,
            self.top + amount,
            (self.width - 2.0 * amount).max(0.0),
            (self.height - 2.0 * amount).max(0.0),
        )
    }
}

/// Direction in which the domain axis runs.
///
/// `Horizontal` is the column-chart layout (domain along x, values along y); `Vertical`
/// is the bar-chart layout. Layout code works in (domain, target) pixel pairs and only
/// converts to (x, y) through [`Orientation::to_xy`].
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn to_xy(self, domain: f64, target: f64) -> Point {
        match self {
            Orientation::Horizontal => Point::new(domain, target),
            Orientation::Vertical => Point::new(target, domain),
        }
    }

    /// Inverse of [`Orientation::to_xy`]: `(domain, target)` of a screen point.
    pub fn split(self, point: Point) -> (f64, f64) {
        match self {
            Orientation::Horizontal => (point.x, point.y),
            Orientation::Vertical => (point.y, point.x),
        }
    }

    /// Rectangle spanning `[domain0, domain1] x [target0, target1]`.
    pub fn rect(self, domain0: f64, domain1: f64, target0: f64, target1: f64) -> Rect {
        let a = self.to_xy(domain0, target0);
        let b = self.to_xy(domain1, target1);
        Rect::from_corners(a.x, a.y, b.x, b.y)
    }

    pub fn segment(self, domain0: f64, target0: f64, domain1: f64, target1: f64) -> Segment {
        Segment::new(self.to_xy(domain0, target0), self.to_xy(domain1, target1))
    }

    /// The orientation of the value axis that pairs with a domain axis of this orientation.
    pub fn flip(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// Pixel extent `(start, end)` of the given area along this orientation.
    pub fn extent(self, area: &Rect) -> (f64, f64) {
        match self {
            Orientation::Horizontal => (area.left, area.right()),
            Orientation::Vertical => (area.top, area.bottom()),
        }
    }

    /// Pixel extent of the given area across this orientation.
    pub fn cross_extent(self, area: &Rect) -> (f64, f64) {
        self.flip().extent(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoration_flags() {
        let d = AxisDecoration::labeled_line(10.0, 12.4, "10");
        assert!(d.has_line());
        assert!(d.has_tick());
        assert!(!d.is_tick_heavy());
        assert_eq!(d.position(), 12.0);
        assert_eq!(d.label(), Some("10"));

        let d = AxisDecoration::label_only(0.0, 5.6, "2000-2010");
        assert!(!d.has_line());
        assert!(!d.has_tick());
        assert_eq!(d.position(), 6.0);

        let d = AxisDecoration::left_aligned_label(0.0, 0.0, "Jan");
        assert_eq!(d.label_alignment(), LabelAlignment::Left);
        assert!(d.is_tick_heavy());
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let c = Rect::new(10.0, 0.0, 5.0, 5.0);
        assert!(a.intersects(&b));
        // Shared edge only
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&c), Rect::new(0.0, 0.0, 15.0, 10.0));
    }

    #[test]
    fn test_orientation_swap() {
        assert_eq!(Orientation::Horizontal.to_xy(1.0, 2.0), Point::new(1.0, 2.0));
        assert_eq!(Orientation::Vertical.to_xy(1.0, 2.0), Point::new(2.0, 1.0));
        assert_eq!(Orientation::Vertical.split(Point::new(2.0, 1.0)), (1.0, 2.0));
        let r = Orientation::Vertical.rect(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r, Rect::new(50.0, 10.0, 50.0, 10.0));
        assert_eq!("vertical".parse::<Orientation>(), Ok(Orientation::Vertical));
    }
}
