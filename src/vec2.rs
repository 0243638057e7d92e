/// Point, offset or velocity in physical coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Self) -> f64 {
        other.sub(self).length()
    }

    pub fn midpoint(self, other: Self) -> Self {
        self.add(other).scale(0.5)
    }

    /// Distance to the closed segment `a`–`b`. The projection parameter is
    /// clamped to the endpoints; a zero-length panel is treated as point `a`.
    pub fn distance_to_segment(self, a: Self, b: Self) -> f64 {
        let ab = b.sub(a);
        let len_sq = ab.dot(ab);
        let t = if len_sq > 0.0 {
            (self.sub(a).dot(ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.distance(a.add(ab.scale(t)))
    }
}

/// R-tree point type.
impl From<Vec2> for [f64; 2] {
    fn from(p: Vec2) -> Self {
        [p.x, p.y]
    }
}
