use serde::{Deserialize, Serialize};

/// Divisor applied to the straight-line span when offsetting curve control
/// points (an offset of two thirds of the span).
const CURVE_PULL: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Face of a shape that a connector attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[serde(alias = "l")]
    Left,
    #[serde(alias = "r")]
    Right,
    #[serde(alias = "u", alias = "top")]
    Up,
    #[serde(alias = "d", alias = "bottom")]
    Down,
}

/// Which end of a connector a binding refers to. `End` carries the arrowhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Start,
    End,
}

/// Absolute or relative repositioning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    To(Point),
    By { dx: f32, dy: f32 },
}

impl Motion {
    pub fn apply(self, point: Point) -> Point {
        match self {
            Motion::To(target) => target,
            Motion::By { dx, dy } => point.offset(dx, dy),
        }
    }

    /// Relative form of this motion for something currently at `from`.
    pub fn delta_from(self, from: Point) -> (f32, f32) {
        match self {
            Motion::To(target) => (target.x - from.x, target.y - from.y),
            Motion::By { dx, dy } => (dx, dy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// Cubic Bézier from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CubicPath {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl CubicPath {
    /// Curve whose control points leave each endpoint through the face it is
    /// attached to, so the curve approaches both shapes from the right side.
    pub fn between(start: Point, start_side: Option<Side>, end: Point, end_side: Option<Side>) -> Self {
        let span_x = (end.x - start.x).abs();
        let span_y = (end.y - start.y).abs();
        Self {
            start,
            c1: control_point(start, start_side, span_x, span_y),
            c2: control_point(end, end_side, span_x, span_y),
            end,
        }
    }

    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            start: self.start.lerp(other.start, t),
            c1: self.c1.lerp(other.c1, t),
            c2: self.c2.lerp(other.c2, t),
            end: self.end.lerp(other.end, t),
        }
    }

    pub fn to_svg_d(&self) -> String {
        format!(
            "M {:.2} {:.2} C {:.2} {:.2}, {:.2} {:.2}, {:.2} {:.2}",
            self.start.x,
            self.start.y,
            self.c1.x,
            self.c1.y,
            self.c2.x,
            self.c2.y,
            self.end.x,
            self.end.y
        )
    }
}

fn control_point(point: Point, side: Option<Side>, span_x: f32, span_y: f32) -> Point {
    match side {
        Some(Side::Left) => point.offset(-span_x / CURVE_PULL, 0.0),
        Some(Side::Right) => point.offset(span_x / CURVE_PULL, 0.0),
        Some(Side::Up) => point.offset(0.0, -span_y / CURVE_PULL),
        Some(Side::Down) | None => point.offset(0.0, span_y / CURVE_PULL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_applies_absolute_and_relative() {
        let p = Point::new(10.0, 20.0);
        assert_eq!(Motion::To(Point::new(1.0, 2.0)).apply(p), Point::new(1.0, 2.0));
        assert_eq!(Motion::By { dx: 5.0, dy: -5.0 }.apply(p), Point::new(15.0, 15.0));
        assert_eq!(Motion::To(Point::new(0.0, 0.0)).delta_from(p), (-10.0, -20.0));
    }

    #[test]
    fn side_tokens_accept_short_and_long_forms() {
        let sides: Vec<Side> = serde_json::from_str(r#"["l", "down", "top", "right"]"#).unwrap();
        assert_eq!(sides, vec![Side::Left, Side::Down, Side::Up, Side::Right]);
        assert!(serde_json::from_str::<Side>(r#""sideways""#).is_err());
    }

    #[test]
    fn curve_pulls_control_points_along_attached_faces() {
        let path = CubicPath::between(
            Point::new(0.0, 0.0),
            Some(Side::Right),
            Point::new(90.0, 30.0),
            Some(Side::Left),
        );
        assert_eq!(path.c1, Point::new(60.0, 0.0));
        assert_eq!(path.c2, Point::new(30.0, 30.0));
    }

    #[test]
    fn curve_defaults_to_downward_pull() {
        let path = CubicPath::between(Point::new(0.0, 0.0), None, Point::new(0.0, 60.0), Some(Side::Up));
        assert_eq!(path.c1, Point::new(0.0, 40.0));
        assert_eq!(path.c2, Point::new(0.0, 20.0));
    }

    #[test]
    fn curve_lerp_hits_both_ends() {
        let a = CubicPath::between(Point::new(0.0, 0.0), None, Point::new(10.0, 10.0), None);
        let b = CubicPath::between(Point::new(20.0, 0.0), None, Point::new(30.0, 10.0), None);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5).start, Point::new(10.0, 0.0));
    }
}
