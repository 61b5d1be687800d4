use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

/// Known lines of the playing field.
///
/// Vertical lines run across the pitch (`x = const`), horizontal lines run
/// along it (`y = const`). Offsets are in field units.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumCount,
)]
pub enum FieldLine {
    LeftTry,
    Left5m,
    Left22m,
    Left10m,
    Halfway,
    Right10m,
    Right22m,
    Right5m,
    RightTry,
    TopTouch,
    Top5m,
    Top15m,
    Bottom15m,
    Bottom5m,
    BottomTouch,
}

impl FieldLine {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::iter().nth(idx)
    }

    #[inline]
    pub fn is_vertical(self) -> bool {
        self.index() <= FieldLine::RightTry.index()
    }

    /// Offset of the line along its axis.
    pub fn offset(self) -> f64 {
        match self {
            FieldLine::LeftTry => 83.0,
            FieldLine::Left5m => 104.0,
            FieldLine::Left22m => 178.0,
            FieldLine::Left10m => 257.0,
            FieldLine::Halfway => 300.0,
            FieldLine::Right10m => 343.0,
            FieldLine::Right22m => 421.0,
            FieldLine::Right5m => 495.0,
            FieldLine::RightTry => 517.0,
            FieldLine::TopTouch => 14.0,
            FieldLine::Top5m => 34.0,
            FieldLine::Top15m => 78.0,
            FieldLine::Bottom15m => 252.0,
            FieldLine::Bottom5m => 295.0,
            FieldLine::BottomTouch => 317.0,
        }
    }

    /// The line in field coordinates.
    pub fn equation(self) -> LineEquation {
        let (a, b) = if self.is_vertical() {
            (1.0, 0.0)
        } else {
            (0.0, 1.0)
        };

        LineEquation {
            label: Some(self),
            a,
            b,
            c: -self.offset(),
            endpoints: None,
        }
    }

    pub fn catalogue() -> impl Iterator<Item = LineEquation> {
        Self::iter().map(Self::equation)
    }
}

/// A line in general form `a*x + b*y + c = 0`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LineEquation {
    pub label: Option<FieldLine>,
    pub a: f64,
    pub b: f64,
    pub c: f64,

    // pixel endpoints, footage lines only
    pub endpoints: Option<[na::Point2<f64>; 2]>,
}

impl LineEquation {
    /// Returns `None` for the zero vector.
    pub fn new(a: f64, b: f64, c: f64) -> Option<Self> {
        if a == 0.0 && b == 0.0 && c == 0.0 {
            return None;
        }

        Some(Self {
            label: None,
            a,
            b,
            c,
            endpoints: None,
        })
    }

    pub fn through(p1: na::Point2<f64>, p2: na::Point2<f64>) -> Option<Self> {
        let a = p1.y - p2.y;
        let b = p2.x - p1.x;
        let c = p1.x * p2.y - p2.x * p1.y;

        let mut eq = Self::new(a, b, c)?;
        eq.endpoints = Some([p1, p2]);

        Some(eq)
    }

    #[inline]
    pub fn labeled(mut self, label: FieldLine) -> Self {
        self.label = Some(label);
        self
    }

    #[inline]
    pub fn coefficients(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    /// `y` on this line at `x`, `None` for vertical lines.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        if self.b == 0.0 {
            return None;
        }

        Some(-(self.c + self.a * x) / self.b)
    }

    pub fn intersect(&self, other: &LineEquation) -> Option<na::Point2<f64>> {
        intersect(self.coefficients(), other.coefficients())
    }
}

/// Intersection of two general-form lines, `None` when parallel.
pub fn intersect([a1, b1, c1]: [f64; 3], [a2, b2, c2]: [f64; 3]) -> Option<na::Point2<f64>> {
    let denom = a1 * b2 - a2 * b1;

    if denom == 0.0 {
        return None;
    }

    let x = (b1 * c2 - b2 * c1) / denom;
    let y = (a2 * c1 - a1 * c2) / denom;

    if !x.is_finite() || !y.is_finite() {
        return None;
    }

    Some(na::Point2::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_shape() {
        assert_eq!(FieldLine::COUNT, 15);

        let lines: Vec<_> = FieldLine::catalogue().collect();
        assert_eq!(lines.len(), 15);
        assert_eq!(lines.iter().filter(|l| l.a == 1.0 && l.b == 0.0).count(), 9);
        assert_eq!(lines.iter().filter(|l| l.a == 0.0 && l.b == 1.0).count(), 6);

        for (idx, line) in FieldLine::iter().enumerate() {
            assert_eq!(FieldLine::from_index(idx), Some(line));
        }
        assert_eq!(FieldLine::from_index(15), None);
    }

    #[test]
    fn test_try_line_meets_touch_line() {
        let try_line = FieldLine::LeftTry.equation();
        let touch = FieldLine::TopTouch.equation();

        assert_eq!(try_line.coefficients(), [1.0, 0.0, -83.0]);
        assert_eq!(touch.coefficients(), [0.0, 1.0, -14.0]);

        let p = try_line.intersect(&touch).unwrap();
        assert!((p.x - 83.0).abs() < 1e-12);
        assert!((p.y - 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_lines_do_not_intersect() {
        let a = FieldLine::Halfway.equation();
        let b = FieldLine::Left22m.equation();

        assert!(a.intersect(&b).is_none());
        assert!(a.intersect(&a).is_none());
    }

    #[test]
    fn test_through_points() {
        let eq = LineEquation::through(na::Point2::new(0.0, 0.0), na::Point2::new(10.0, 10.0))
            .unwrap();
        assert_eq!(eq.coefficients(), [-10.0, 10.0, 0.0]);
        assert_eq!(eq.y_at(4.0), Some(4.0));
        assert!(eq.label.is_none());

        let p = na::Point2::new(3.0, 3.0);
        assert!(LineEquation::through(p, p).is_none());
    }

    #[test]
    fn test_vertical_line_has_no_y() {
        assert_eq!(FieldLine::Halfway.equation().y_at(1.0), None);
        assert_eq!(FieldLine::TopTouch.equation().y_at(123.0), Some(14.0));
    }
}
