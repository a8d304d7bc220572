//! Removes axis labels that would be drawn over chart furniture or each other.

use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;
use trellis_common::types::Rect;
use trellis_text::measurement::TextMeasurer;

use crate::axis::AxisLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FurnitureKind {
    Title,
    Legend,
    ColorBar,
}

/// A piece of chart furniture and the box it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Furniture {
    pub kind: FurnitureKind,
    pub rect: Rect,
}

impl RTreeObject for Furniture {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        envelope_of(&self.rect)
    }
}

fn envelope_of(rect: &Rect) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.left, rect.top], [rect.right(), rect.bottom()])
}

#[derive(Debug, Clone)]
pub struct FurnitureTree {
    rtree: RTree<Furniture>,
}

impl FurnitureTree {
    pub fn new(furniture: Vec<Furniture>) -> Self {
        let furniture = furniture.into_iter().filter(|f| !f.rect.is_empty()).collect();
        Self {
            rtree: RTree::bulk_load(furniture),
        }
    }

    pub fn size(&self) -> usize {
        self.rtree.size()
    }

    /// True when `rect` overlaps the interior of any furniture box. Envelope queries
    /// include touching edges, so hits are rechecked strictly.
    pub fn intersects(&self, rect: &Rect) -> bool {
        self.rtree
            .locate_in_envelope_intersecting(&envelope_of(rect))
            .any(|f| f.rect.intersects(rect))
    }
}

/// Two-pass label filter over resolved axis layouts.
pub struct CollisionResolver<'a> {
    chart_area: Rect,
    measurer: &'a dyn TextMeasurer,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(chart_area: Rect, measurer: &'a dyn TextMeasurer) -> Self {
        Self {
            chart_area,
            measurer,
        }
    }

    /// Pass 1 clears labels on any axis that overlap furniture. Pass 2 clears domain axis
    /// labels that overlap the first or last label of a target axis. Cleared decorations
    /// keep their lines and ticks.
    #[tracing::instrument(skip_all)]
    pub fn resolve(
        &self,
        domain: &mut AxisLayout,
        targets: &mut [AxisLayout],
        furniture: &FurnitureTree,
    ) {
        let mut cleared = 0;
        for layout in std::iter::once(&mut *domain).chain(targets.iter_mut()) {
            cleared += self.clear_where(layout, |rect| furniture.intersects(rect));
        }

        let end_boxes: Vec<Rect> = targets
            .iter()
            .flat_map(|t| t.end_label_boxes(self.measurer, &self.chart_area))
            .collect();
        cleared += self.clear_where(domain, |rect| end_boxes.iter().any(|b| b.intersects(rect)));

        domain.collision_filtered = true;
        for target in targets.iter_mut() {
            target.collision_filtered = true;
        }
        tracing::debug!("collision resolver cleared {cleared} labels");
    }

    fn clear_where(&self, layout: &mut AxisLayout, collides: impl Fn(&Rect) -> bool) -> usize {
        let hits: Vec<usize> = layout
            .label_boxes(self.measurer, &self.chart_area)
            .into_iter()
            .filter(|(_, rect)| collides(rect))
            .map(|(i, _)| i)
            .collect();
        for i in &hits {
            layout.decorations.major_gridlines[*i].set_label(None);
        }
        hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisSide;
    use trellis_common::types::{AxisDecoration, Decorations, Orientation};
    use trellis_text::measurement::FixedAdvanceMeasurer;
    use trellis_text::types::TextStyle;

    fn layout(side: AxisSide, orientation: Orientation, ticks: &[(f64, &str)]) -> AxisLayout {
        AxisLayout {
            side,
            orientation,
            decorations: Decorations::new(
                ticks
                    .iter()
                    .map(|(p, l)| AxisDecoration::labeled_line(*p, *p, *l))
                    .collect(),
            ),
            baseline: None,
            title: None,
            text_style: TextStyle::default(),
            collision_filtered: false,
        }
    }

    #[test]
    fn test_furniture_tree_strict_intersection() {
        let tree = FurnitureTree::new(vec![
            Furniture {
                kind: FurnitureKind::Legend,
                rect: Rect::new(400.0, 0.0, 100.0, 300.0),
            },
            Furniture {
                kind: FurnitureKind::Title,
                rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            },
        ]);
        assert_eq!(tree.size(), 1);
        assert!(tree.intersects(&Rect::new(390.0, 10.0, 20.0, 10.0)));
        // Touching the left edge only
        assert!(!tree.intersects(&Rect::new(380.0, 10.0, 20.0, 10.0)));
    }

    #[test]
    fn test_two_passes() {
        let measurer = FixedAdvanceMeasurer::default();
        let area = Rect::new(50.0, 20.0, 400.0, 200.0);
        let mut domain = layout(
            AxisSide::Bottom,
            Orientation::Horizontal,
            &[(52.0, "2000"), (250.0, "2001"), (448.0, "2002")],
        );
        let mut targets = vec![layout(
            AxisSide::Left,
            Orientation::Vertical,
            &[(220.0, "0"), (120.0, "50"), (20.0, "100")],
        )];
        // Legend covers the right end of the domain axis labels
        let furniture = FurnitureTree::new(vec![Furniture {
            kind: FurnitureKind::Legend,
            rect: Rect::new(450.0, 20.0, 100.0, 240.0),
        }]);

        CollisionResolver::new(area, &measurer).resolve(&mut domain, &mut targets, &furniture);

        assert!(domain.collision_filtered);
        assert!(targets[0].collision_filtered);
        // "2002" spans 436..460 and hits the legend
        assert_eq!(domain.decorations.labels(), vec!["2001"]);
        assert!(domain.decorations.major_gridlines[2].has_line());
        assert_eq!(targets[0].decorations.labels(), vec!["0", "50", "100"]);
    }
}
