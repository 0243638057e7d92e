use crate::error::{FlowError, FlowResult};
use std::ops::Range;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GridKind {
    Cell,
    FaceX,
    FaceY,
}

impl FromStr for GridKind {
    type Err = FlowError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "center" | "cell" => Ok(Self::Cell),
            "xface" => Ok(Self::FaceX),
            "yface" => Ok(Self::FaceY),
            other => Err(FlowError::UnknownGridKind(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Bounds {
    pub const fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    pub fn diagonal(&self) -> f64 {
        (self.xmax - self.xmin).hypot(self.ymax - self.ymin)
    }
}

/// Uniform 2D grid with one guard layer on every side that is not a face-normal direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid2 {
    kind: GridKind,
    nx: usize,
    ny: usize,
    xmin: f64,
    ymin: f64,
    dx: f64,
    dy: f64,
}

impl Grid2 {
    pub fn new(kind: GridKind, nx: usize, ny: usize, bounds: Bounds) -> FlowResult<Self> {
        if nx < 2 || ny < 2 {
            return Err(FlowError::GridTooSmall { nx, ny });
        }
        if !(bounds.xmax > bounds.xmin) {
            return Err(FlowError::InvalidExtent {
                axis: 'x',
                min: bounds.xmin,
                max: bounds.xmax,
            });
        }
        if !(bounds.ymax > bounds.ymin) {
            return Err(FlowError::InvalidExtent {
                axis: 'y',
                min: bounds.ymin,
                max: bounds.ymax,
            });
        }
        Ok(Self {
            kind,
            nx,
            ny,
            xmin: bounds.xmin,
            ymin: bounds.ymin,
            dx: (bounds.xmax - bounds.xmin) / nx as f64,
            dy: (bounds.ymax - bounds.ymin) / ny as f64,
        })
    }

    /// Same physical domain, different staggering.
    pub fn with_kind(&self, kind: GridKind) -> Self {
        Self { kind, ..*self }
    }

    pub fn kind(&self) -> GridKind {
        self.kind
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            self.xmin,
            self.xmin + self.nx as f64 * self.dx,
            self.ymin,
            self.ymin + self.ny as f64 * self.dy,
        )
    }

    pub fn normal_x(&self) -> bool {
        self.kind == GridKind::FaceX
    }

    pub fn normal_y(&self) -> bool {
        self.kind == GridKind::FaceY
    }

    pub fn width(&self) -> usize {
        if self.normal_x() {
            self.nx + 1
        } else {
            self.nx + 2
        }
    }

    pub fn height(&self) -> usize {
        if self.normal_y() {
            self.ny + 1
        } else {
            self.ny + 2
        }
    }

    pub fn size(&self) -> usize {
        self.width() * self.height()
    }

    pub fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.width() && j < self.height());
        j * self.width() + i
    }

    /// Points updated by interior stencils: cells 1..=n, or faces 1..n for the normal direction.
    pub fn interior_i(&self) -> Range<usize> {
        if self.normal_x() {
            1..self.nx
        } else {
            1..self.nx + 1
        }
    }

    pub fn interior_j(&self) -> Range<usize> {
        if self.normal_y() {
            1..self.ny
        } else {
            1..self.ny + 1
        }
    }

    pub fn coords(&self, i: usize, j: usize) -> (f64, f64) {
        let x = if self.normal_x() {
            self.xmin + i as f64 * self.dx
        } else {
            self.xmin + (i as f64 - 0.5) * self.dx
        };
        let y = if self.normal_y() {
            self.ymin + j as f64 * self.dy
        } else {
            self.ymin + (j as f64 - 0.5) * self.dy
        };
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn unit() -> Bounds {
        Bounds::new(0.0, 1.0, 0.0, 2.0)
    }

    #[test]
    fn storage_shapes_follow_staggering() {
        let cell = Grid2::new(GridKind::Cell, 4, 5, unit()).unwrap();
        assert_eq!((cell.width(), cell.height()), (6, 7));
        let fx = cell.with_kind(GridKind::FaceX);
        assert_eq!((fx.width(), fx.height()), (5, 7));
        let fy = cell.with_kind(GridKind::FaceY);
        assert_eq!((fy.width(), fy.height()), (6, 6));
    }

    #[test]
    fn coords_place_guards_outside_domain() {
        let cell = Grid2::new(GridKind::Cell, 4, 4, unit()).unwrap();
        let (x0, y0) = cell.coords(0, 0);
        assert_close(x0, -0.125, 1e-12);
        assert_close(y0, -0.25, 1e-12);
        let fx = cell.with_kind(GridKind::FaceX);
        let (x, y) = fx.coords(4, 1);
        assert_close(x, 1.0, 1e-12);
        assert_close(y, 0.25, 1e-12);
    }

    #[test]
    fn interior_ranges_skip_guards_and_boundary_faces() {
        let cell = Grid2::new(GridKind::Cell, 4, 3, unit()).unwrap();
        assert_eq!(cell.interior_i(), 1..5);
        assert_eq!(cell.with_kind(GridKind::FaceX).interior_i(), 1..4);
        assert_eq!(cell.with_kind(GridKind::FaceY).interior_j(), 1..3);
    }

    #[test]
    fn rejects_tiny_grids_and_bad_extents() {
        assert!(matches!(
            Grid2::new(GridKind::Cell, 1, 4, unit()),
            Err(FlowError::GridTooSmall { nx: 1, ny: 4 })
        ));
        assert!(matches!(
            Grid2::new(GridKind::Cell, 4, 4, Bounds::new(1.0, 0.0, 0.0, 1.0)),
            Err(FlowError::InvalidExtent { axis: 'x', .. })
        ));
    }

    #[test]
    fn parses_grid_tags() {
        assert_eq!("center".parse::<GridKind>().unwrap(), GridKind::Cell);
        assert_eq!("yface".parse::<GridKind>().unwrap(), GridKind::FaceY);
        assert!(matches!(
            "zface".parse::<GridKind>(),
            Err(FlowError::UnknownGridKind(tag)) if tag == "zface"
        ));
    }
}
