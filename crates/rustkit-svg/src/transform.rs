//! 2D affine transforms and the SVG `transform` attribute.

use std::f32::consts::PI;

/// 2D affine transform matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Matrix elements [a, b, c, d, e, f]
    /// Represents: [a c e]
    ///             [b d f]
    ///             [0 0 1]
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Post-multiply a translation.
    pub fn translate(self, tx: f32, ty: f32) -> Self {
        self.multiply(&Self::new(1.0, 0.0, 0.0, 1.0, tx, ty))
    }

    /// Post-multiply a scale.
    pub fn scale(self, sx: f32, sy: f32) -> Self {
        self.multiply(&Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0))
    }

    /// Post-multiply a rotation (radians).
    pub fn rotate(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        self.multiply(&Self::new(cos, sin, -sin, cos, 0.0, 0.0))
    }

    pub fn skew_x(self, angle: f32) -> Self {
        self.multiply(&Self::new(1.0, 0.0, angle.tan(), 1.0, 0.0, 0.0))
    }

    pub fn skew_y(self, angle: f32) -> Self {
        self.multiply(&Self::new(1.0, angle.tan(), 0.0, 1.0, 0.0, 0.0))
    }

    /// `self * other`: `other` applies first.
    pub fn multiply(&self, other: &Transform2D) -> Self {
        Transform2D {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Transform a point.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Parse a `transform` attribute.
    ///
    /// Parsing stops at the first malformed function; the functions before
    /// it still apply.
    pub fn parse(s: &str) -> Self {
        let mut result = Self::identity();
        let mut rest = s.trim_start_matches(separator);
        while !rest.is_empty() {
            match parse_transform_function(rest) {
                Some((func, tail)) => {
                    result = result.multiply(&func);
                    rest = tail.trim_start_matches(separator);
                }
                None => break,
            }
        }
        result
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

fn separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

fn parse_transform_function(s: &str) -> Option<(Transform2D, &str)> {
    let open = s.find('(')?;
    let close = open + s[open..].find(')')?;

    let name = s[..open].trim();
    let args = s[open + 1..close]
        .split(separator)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<f32>().ok())
        .collect::<Option<Vec<f32>>>()?;
    let degrees = |i: usize| args.get(i).copied().unwrap_or(0.0) * PI / 180.0;

    let transform = match (name, args.len()) {
        ("translate", 1 | 2) => {
            Transform2D::identity().translate(args[0], args.get(1).copied().unwrap_or(0.0))
        }
        ("scale", 1 | 2) => {
            Transform2D::identity().scale(args[0], args.get(1).copied().unwrap_or(args[0]))
        }
        ("rotate", 1) => Transform2D::identity().rotate(degrees(0)),
        ("rotate", 3) => Transform2D::identity()
            .translate(args[1], args[2])
            .rotate(degrees(0))
            .translate(-args[1], -args[2]),
        ("skewX", 1) => Transform2D::identity().skew_x(degrees(0)),
        ("skewY", 1) => Transform2D::identity().skew_y(degrees(0)),
        ("matrix", 6) => Transform2D::new(args[0], args[1], args[2], args[3], args[4], args[5]),
        _ => return None,
    };

    Some((transform, &s[close + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4
    }

    #[test]
    fn test_transform_identity() {
        let t = Transform2D::identity();
        assert!(t.is_identity());
        assert_eq!(t.apply(10.0, 20.0), (10.0, 20.0));
    }

    #[test]
    fn test_transform_parse() {
        let t = Transform2D::parse("translate(10, 20) scale(2)");
        assert_eq!(t.apply(1.0, 1.0), (12.0, 22.0));

        let t = Transform2D::parse("rotate(90)");
        assert!(close(t.apply(1.0, 0.0), (0.0, 1.0)));

        let t = Transform2D::parse("rotate(180 5 5)");
        assert!(close(t.apply(0.0, 0.0), (10.0, 10.0)));

        let t = Transform2D::parse("matrix(1 0 0 1 3 4)");
        assert_eq!(t.apply(0.0, 0.0), (3.0, 4.0));
    }

    #[test]
    fn test_transform_parse_stops_at_garbage() {
        let t = Transform2D::parse("translate(5) wobble(1) translate(100)");
        assert_eq!(t.apply(0.0, 0.0), (5.0, 0.0));

        assert!(Transform2D::parse("").is_identity());
        assert!(Transform2D::parse("translate(a)").is_identity());
        assert!(Transform2D::parse("matrix(1 2 3)").is_identity());
    }
}
