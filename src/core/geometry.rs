use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle `[x1, y1, x2, y2]`.
///
/// A box with no positive width or height is treated as empty: it contributes
/// nothing to unions and never intersects anything.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    pub const EMPTY: BBox = BBox {
        x1: 0,
        y1: 0,
        x2: 0,
        y2: 0,
    };

    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    pub fn width(&self) -> i64 {
        (self.x2 as i64 - self.x1 as i64).max(0)
    }

    pub fn height(&self) -> i64 {
        (self.y2 as i64 - self.y1 as i64).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width().saturating_mul(self.height())
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.x1 as f64 + self.x2 as f64) * 0.5,
            (self.y1 as f64 + self.y2 as f64) * 0.5,
        )
    }

    /// Smallest box covering both; an empty side is ignored.
    pub fn union(&self, other: &Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => BBox::EMPTY,
            (true, false) => *other,
            (false, true) => *self,
            (false, false) => Self {
                x1: self.x1.min(other.x1),
                y1: self.y1.min(other.y1),
                x2: self.x2.max(other.x2),
                y2: self.y2.max(other.y2),
            },
        }
    }

    /// Overlapping rectangle, or `None` when the boxes share no positive area.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let inter = Self {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        if inter.is_empty() {
            None
        } else {
            Some(inter)
        }
    }

    pub fn intersection_area(&self, other: &Self) -> i64 {
        self.intersection(other).map(|b| b.area()).unwrap_or(0)
    }

    pub fn iou(&self, other: &Self) -> f64 {
        let inter_area = self.intersection_area(other);
        if inter_area == 0 {
            return 0.0;
        }
        let union = self.area() as f64 + other.area() as f64 - inter_area as f64;
        if union <= 0.0 {
            0.0
        } else {
            inter_area as f64 / union
        }
    }

    pub fn center_distance(&self, other: &Self) -> f64 {
        self.center().euclidean(&other.center())
    }

    /// True when every coordinate differs by at most `epsilon` pixels.
    pub fn approx_eq(&self, other: &Self, epsilon: i32) -> bool {
        let close = |a: i32, b: i32| (a as i64 - b as i64).abs() <= epsilon as i64;
        close(self.x1, other.x1)
            && close(self.y1, other.y1)
            && close(self.x2, other.x2)
            && close(self.y2, other.y2)
    }
}

impl Default for BBox {
    fn default() -> Self {
        BBox::EMPTY
    }
}

impl From<[i32; 4]> for BBox {
    fn from(coords: [i32; 4]) -> Self {
        let [x1, y1, x2, y2] = coords;
        Self { x1, y1, x2, y2 }
    }
}

impl From<BBox> for [i32; 4] {
    fn from(bbox: BBox) -> Self {
        [bbox.x1, bbox.y1, bbox.x2, bbox.y2]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn euclidean(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn manhattan(&self, other: &Self) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Union of all non-empty boxes, `BBox::EMPTY` when there are none.
pub fn union_all<'a, I>(boxes: I) -> BBox
where
    I: IntoIterator<Item = &'a BBox>,
{
    boxes
        .into_iter()
        .fold(BBox::EMPTY, |acc, bbox| acc.union(bbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn computes_iou() {
        let a = BBox::new(0, 0, 10, 10);
        let b = BBox::new(5, 5, 15, 15);
        assert_eq!(a.iou(&b), 25.0 / 175.0);
    }

    #[test]
    fn iou_identity_disjoint_and_symmetry() {
        let a = BBox::new(10, 20, 110, 220);
        let b = BBox::new(60, 50, 300, 400);
        let far = BBox::new(500, 500, 600, 600);
        assert_eq!(a.iou(&a), 1.0);
        assert_eq!(a.iou(&far), 0.0);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = BBox::new(0, 0, 10, 10);
        let b = BBox::new(10, 0, 20, 10);
        assert_eq!(a.intersection(&b), None);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn union_skips_empty_boxes() {
        let boxes = [
            BBox::EMPTY,
            BBox::new(10, 10, 20, 20),
            BBox::new(5, 30, 8, 40),
        ];
        assert_eq!(union_all(&boxes), BBox::new(5, 10, 20, 40));
        assert!(union_all(&[BBox::EMPTY]).is_empty());
    }

    #[test]
    fn approx_eq_uses_per_coordinate_epsilon() {
        let a = BBox::new(100, 200, 300, 400);
        assert!(a.approx_eq(&BBox::new(101, 199, 300, 401), 1));
        assert!(!a.approx_eq(&BBox::new(102, 200, 300, 400), 1));
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let wide = BBox::new(-2_000_000_000, 0, 2_000_000_000, 10);
        assert_eq!(wide.width(), 4_000_000_000);
        assert_eq!(wide.area(), 40_000_000_000);

        let huge = BBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(huge.area(), i64::MAX);
        assert!(huge.iou(&huge) > 0.0);
        assert!(!huge.approx_eq(&BBox::new(i32::MAX, i32::MAX, i32::MIN, i32::MIN), 1));
    }

    #[test]
    fn deserializes_from_coordinate_array() {
        let bbox: BBox = serde_json::from_str("[1, 2, 30, 40]").unwrap();
        assert_eq!(bbox, BBox::new(1, 2, 30, 40));
        assert_eq!(serde_json::to_string(&bbox).unwrap(), "[1,2,30,40]");
    }
}
