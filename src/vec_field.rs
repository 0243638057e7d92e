use crate::{Field2, Grid2, Vec2};

/// Two cell-centered components sharing one grid, e.g. the interface normal.
#[derive(Clone, Debug, PartialEq)]
pub struct VecField2 {
    x: Field2,
    y: Field2,
}

impl VecField2 {
    pub fn new(x: Field2, y: Field2) -> Self {
        assert_eq!(x.grid(), y.grid(), "vector components must share a grid");
        Self { x, y }
    }

    pub fn get(&self, i: usize, j: usize) -> Vec2 {
        Vec2::new(self.x.get(i, j), self.y.get(i, j))
    }

    pub fn grid(&self) -> Grid2 {
        self.x.grid()
    }

    pub fn x(&self) -> &Field2 {
        &self.x
    }

    pub fn y(&self) -> &Field2 {
        &self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Bounds, GridKind};

    fn grid(nx: usize) -> Grid2 {
        Grid2::new(GridKind::Cell, nx, 2, Bounds::new(0.0, 1.0, 0.0, 1.0)).unwrap()
    }

    #[test]
    fn get_pairs_components() {
        let x = Field2::from_fn("nx", grid(3), |i, _| i as f64);
        let y = Field2::from_fn("ny", grid(3), |_, j| j as f64);
        let field = VecField2::new(x, y);
        assert_eq!(field.get(2, 1), Vec2::new(2.0, 1.0));
        assert_eq!(field.grid(), grid(3));
    }

    #[test]
    #[should_panic(expected = "vector components must share a grid")]
    fn mismatched_components_panic() {
        VecField2::new(Field2::new("nx", grid(3), 0.0), Field2::new("ny", grid(4), 0.0));
    }
}
