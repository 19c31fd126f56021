/// 2D geometry primitives for pose analysis.
///
/// All functions operate on pixel-space coordinates in f64 and return
/// `None` for degenerate input (zero-length vectors, coincident points)
/// instead of a numeric sentinel, so invalid geometry can never leak into
/// downstream aggregates.

/// A point in 2D pixel space. Image convention: y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Angle in degrees at vertex `b` between rays b->a and b->c.
///
/// Computed via the dot-product/arccos formula with the cosine clamped to
/// [-1, 1] to guard against floating-point overshoot. `None` if either ray
/// has zero length.
pub fn angle_at_vertex(a: Point, b: Point, c: Point) -> Option<f64> {
    let (v1x, v1y) = (a.x - b.x, a.y - b.y);
    let (v2x, v2y) = (c.x - b.x, c.y - b.y);

    let mag1 = v1x.hypot(v1y);
    let mag2 = v2x.hypot(v2y);
    if mag1 == 0.0 || mag2 == 0.0 {
        return None;
    }

    let cos = ((v1x * v2x + v1y * v2y) / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Angle in degrees between vector b->a and the downward vertical axis.
///
/// 0 when `a` is directly below `b`, 180 when directly above (image y grows
/// downward). `None` on zero-length input.
pub fn angle_to_vertical(a: Point, b: Point) -> Option<f64> {
    let (vx, vy) = (a.x - b.x, a.y - b.y);
    let mag = vx.hypot(vy);
    if mag == 0.0 {
        return None;
    }

    // Dot product with the unit vector (0, 1).
    let cos = (vy / mag).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`.
///
/// Uses the 2D cross-product magnitude divided by |a - b|. `None` when the
/// line is undefined (`a` and `b` coincide).
pub fn distance_point_to_line(p: Point, a: Point, b: Point) -> Option<f64> {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let denom = abx.hypot(aby);
    if denom == 0.0 {
        return None;
    }

    let (apx, apy) = (p.x - a.x, p.y - a.y);
    Some((abx * apy - aby * apx).abs() / denom)
}
