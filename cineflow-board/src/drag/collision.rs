//! Geometry and nearest-corner collision detection

use crate::types::{Stage, TaskId};
use serde::{Deserialize, Serialize};

/// A point in layout coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Vector from `origin` to this point
    pub fn delta_from(&self, origin: &Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    /// This point moved by `delta`
    pub fn offset(&self, delta: &Point) -> Point {
        Point::new(self.x + delta.x, self.y + delta.y)
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
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

    /// Zero-sized rect at a point
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    /// Corners: top-left, top-right, bottom-left, bottom-right
    pub fn corners(&self) -> [Point; 4] {
        let right = self.left + self.width;
        let bottom = self.top + self.height;
        [
            Point::new(self.left, self.top),
            Point::new(right, self.top),
            Point::new(self.left, bottom),
            Point::new(right, bottom),
        ]
    }

    /// The rect moved by `delta`
    pub fn translate(&self, delta: &Point) -> Rect {
        Rect::new(
            self.left + delta.x,
            self.top + delta.y,
            self.width,
            self.height,
        )
    }
}

/// Something a card can be dropped on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    /// A column's body (empty space, or an empty column)
    Column(Stage),
    /// Another card
    Task(TaskId),
}

impl DropTarget {
    /// The card under the pointer, if the target is a card
    pub fn task(&self) -> Option<&TaskId> {
        match self {
            DropTarget::Task(id) => Some(id),
            DropTarget::Column(_) => None,
        }
    }
}

/// A drop target with its measured rect
#[derive(Debug, Clone, PartialEq)]
pub struct Droppable {
    pub target: DropTarget,
    pub rect: Rect,
}

/// Measured rects of the rendered board, as reported by the view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    droppables: Vec<Droppable>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column body
    pub fn with_column(mut self, stage: Stage, rect: Rect) -> Self {
        self.droppables.push(Droppable {
            target: DropTarget::Column(stage),
            rect,
        });
        self
    }

    /// Add a card
    pub fn with_task(mut self, id: impl Into<TaskId>, rect: Rect) -> Self {
        self.droppables.push(Droppable {
            target: DropTarget::Task(id.into()),
            rect,
        });
        self
    }

    /// All drop targets
    pub fn droppables(&self) -> &[Droppable] {
        &self.droppables
    }

    /// Measured rect of a card
    pub fn task_rect(&self, id: &TaskId) -> Option<Rect> {
        self.droppables
            .iter()
            .find(|d| d.target.task() == Some(id))
            .map(|d| d.rect)
    }
}

/// Mean distance between matching corners of two rects
fn corner_distance(a: &Rect, b: &Rect) -> f64 {
    a.corners()
        .iter()
        .zip(b.corners().iter())
        .map(|(p, q)| p.distance(q))
        .sum::<f64>()
        / 4.0
}

/// Pick the droppable whose corners are nearest the active rect's corners.
/// Ties go to the earliest droppable.
pub fn closest_corners<'a>(active: &Rect, droppables: &'a [Droppable]) -> Option<&'a DropTarget> {
    droppables
        .iter()
        .map(|d| (corner_distance(active, &d.rect), &d.target))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, target)| target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_columns() -> Layout {
        Layout::new()
            .with_column(Stage::Ideation, Rect::new(0.0, 0.0, 300.0, 800.0))
            .with_column(Stage::Scripting, Rect::new(324.0, 0.0, 300.0, 800.0))
            .with_task("t1", Rect::new(12.0, 12.0, 276.0, 180.0))
            .with_task("t2", Rect::new(12.0, 204.0, 276.0, 180.0))
    }

    #[test]
    fn test_corners_and_translate() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.corners()[3], Point::new(40.0, 60.0));
        let moved = rect.translate(&Point::new(5.0, -5.0));
        assert_eq!(moved.corners()[0], Point::new(15.0, 15.0));
    }

    #[test]
    fn test_card_over_its_own_slot_hits_itself() {
        let layout = two_columns();
        let active = layout.task_rect(&"t1".into()).unwrap();
        assert_eq!(
            closest_corners(&active, layout.droppables()),
            Some(&DropTarget::Task("t1".into()))
        );
    }

    #[test]
    fn test_card_moved_down_hits_next_card() {
        let layout = two_columns();
        let active = layout
            .task_rect(&"t1".into())
            .unwrap()
            .translate(&Point::new(0.0, 170.0));
        assert_eq!(
            closest_corners(&active, layout.droppables()),
            Some(&DropTarget::Task("t2".into()))
        );
    }

    #[test]
    fn test_card_moved_into_empty_column_hits_column() {
        let layout = two_columns();
        let active = Rect::new(324.0, 0.0, 300.0, 800.0).translate(&Point::new(2.0, 2.0));
        assert_eq!(
            closest_corners(&active, layout.droppables()),
            Some(&DropTarget::Column(Stage::Scripting))
        );
    }

    #[test]
    fn test_no_droppables() {
        assert_eq!(closest_corners(&Rect::default(), &[]), None);
    }

    #[test]
    fn test_tie_goes_to_first() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let layout = Layout::new().with_task("a", rect).with_task("b", rect);
        assert_eq!(
            closest_corners(&rect, layout.droppables()),
            Some(&DropTarget::Task("a".into()))
        );
    }
}
