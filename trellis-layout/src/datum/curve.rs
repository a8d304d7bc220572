use serde::Serialize;
use strum::{EnumString, VariantNames};
use trellis_common::types::Point;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, EnumString, VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum CurveType {
    #[default]
    None,
    /// Smooth Catmull-Rom curve through every point
    Function,
}

/// Bezier handles on either side of a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlPoints {
    pub before: Point,
    pub after: Point,
}

/// Catmull-Rom handles for a run of points. End points reuse themselves as the missing
/// neighbor, so the curve leaves them along the chord.
pub fn catmull_rom_control_points(points: &[Point]) -> Vec<ControlPoints> {
    (0..points.len())
        .map(|i| {
            let prev = points[i.saturating_sub(1)];
            let next = points[(i + 1).min(points.len() - 1)];
            let current = points[i];
            let dx = (next.x - prev.x) / 6.0;
            let dy = (next.y - prev.y) / 6.0;
            ControlPoints {
                before: Point::new(current.x - dx, current.y - dy),
                after: Point::new(current.x + dx, current.y + dy),
            }
        })
        .collect()
}
