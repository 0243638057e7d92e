use crate::boundary::{self, BoundaryConfig, Side};
use crate::error::{FlowError, FlowResult};
use crate::grid::{Grid2, GridKind};

/// Whether the guard layer agrees with the interior and the boundary record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Stale,
    Valid,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field2 {
    name: &'static str,
    grid: Grid2,
    data: Vec<f64>,
    bc: BoundaryConfig,
    guards: GuardState,
}

impl Field2 {
    pub fn new(name: &'static str, grid: Grid2, fill: f64) -> Self {
        Self {
            name,
            grid,
            data: vec![fill; grid.size()],
            bc: BoundaryConfig::default(),
            guards: GuardState::Stale,
        }
    }

    pub fn from_fn(name: &'static str, grid: Grid2, f: impl Fn(usize, usize) -> f64) -> Self {
        let width = grid.width();
        let data = (0..grid.size())
            .map(|n| {
                let i = n % width;
                let j = n / width;
                f(i, j)
            })
            .collect();
        Self {
            name,
            grid,
            data,
            bc: BoundaryConfig::default(),
            guards: GuardState::Stale,
        }
    }

    pub fn with_bc(mut self, bc: BoundaryConfig) -> Self {
        self.set_bc(bc);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn grid(&self) -> Grid2 {
        self.grid
    }

    pub fn bc(&self) -> &BoundaryConfig {
        &self.bc
    }

    pub fn set_bc(&mut self, bc: BoundaryConfig) {
        self.bc = bc;
        self.guards = GuardState::Stale;
    }

    pub fn bc_mut(&mut self) -> &mut BoundaryConfig {
        self.guards = GuardState::Stale;
        &mut self.bc
    }

    pub fn guards(&self) -> GuardState {
        self.guards
    }

    pub fn require_guards(&self, operation: &'static str) -> FlowResult<()> {
        match self.guards {
            GuardState::Valid => Ok(()),
            GuardState::Stale => Err(FlowError::stale(self.name, operation)),
        }
    }

    pub fn require_kind(&self, kind: GridKind) -> FlowResult<()> {
        if self.grid.kind() == kind {
            Ok(())
        } else {
            Err(FlowError::GridMismatch {
                name: self.name,
                expected: kind,
                found: self.grid.kind(),
            })
        }
    }

    pub fn fill_guard_cells(&mut self) -> FlowResult<()> {
        boundary::fill_guard_cells(&self.grid, &mut self.data, &self.bc)?;
        self.guards = GuardState::Valid;
        Ok(())
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.grid.idx(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.grid.idx(i, j);
        self.data[idx] = value;
        self.guards = GuardState::Stale;
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        self.guards = GuardState::Stale;
        &mut self.data
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|slot| *slot = value);
        self.guards = GuardState::Stale;
    }

    pub fn fill_with_index(&mut self, f: impl Fn(usize, usize) -> f64) {
        let width = self.grid.width();
        for (n, value) in self.data.iter_mut().enumerate() {
            *value = f(n % width, n / width);
        }
        self.guards = GuardState::Stale;
    }

    pub fn update_with_index(&mut self, f: impl Fn(usize, usize, f64) -> f64) {
        let width = self.grid.width();
        for (n, value) in self.data.iter_mut().enumerate() {
            *value = f(n % width, n / width, *value);
        }
        self.guards = GuardState::Stale;
    }

    /// Copies values and guard state; the boundary record is kept.
    pub fn copy_from(&mut self, other: &Self) {
        self.assert_same_grid(other);
        self.data.copy_from_slice(&other.data);
        self.guards = other.guards;
    }

    /// Scales the boundary layer of `side` over interior rows. The layer is
    /// boundary data, so the guard state is left unchanged.
    pub fn scale_boundary(&mut self, side: Side, factor: f64) {
        let grid = self.grid;
        if side.is_x() {
            let i = if side.is_low() { 0 } else { grid.width() - 1 };
            for j in 1..grid.height() - 1 {
                self.data[grid.idx(i, j)] *= factor;
            }
        } else {
            let j = if side.is_low() { 0 } else { grid.height() - 1 };
            for i in 1..grid.width() - 1 {
                self.data[grid.idx(i, j)] *= factor;
            }
        }
    }

    pub fn min_max(&self) -> (f64, f64) {
        let mut iter = self.data.iter().filter(|value| value.is_finite());
        let Some(first) = iter.next() else {
            return (0.0, 0.0);
        };
        let mut min_value = *first;
        let mut max_value = *first;
        for value in iter {
            if *value < min_value {
                min_value = *value;
            }
            if *value > max_value {
                max_value = *value;
            }
        }
        (min_value, max_value)
    }

    pub fn interior_min_max(&self) -> (f64, f64) {
        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;
        for j in self.grid.interior_j() {
            for i in self.grid.interior_i() {
                let value = self.get(i, j);
                min_value = min_value.min(value);
                max_value = max_value.max(value);
            }
        }
        (min_value, max_value)
    }

    pub fn interior_dot(&self, other: &Self) -> f64 {
        self.assert_same_grid(other);
        let mut sum = 0.0;
        for j in self.grid.interior_j() {
            for i in self.grid.interior_i() {
                sum += self.get(i, j) * other.get(i, j);
            }
        }
        sum
    }

    pub fn interior_sum(&self) -> f64 {
        let mut sum = 0.0;
        for j in self.grid.interior_j() {
            for i in self.grid.interior_i() {
                sum += self.get(i, j);
            }
        }
        sum
    }

    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.assert_same_grid(other);
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    fn assert_same_grid(&self, other: &Self) {
        assert_eq!(self.grid, other.grid, "field grid mismatch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundarySide;
    use crate::grid::Bounds;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn cell_grid() -> Grid2 {
        Grid2::new(GridKind::Cell, 3, 2, Bounds::new(0.0, 3.0, 0.0, 2.0)).unwrap()
    }

    #[test]
    fn from_fn_maps_coords() {
        let field = Field2::from_fn("s", cell_grid(), |i, j| (i + j * 10) as f64);
        assert_close(field.get(2, 1), 12.0, 1e-12);
    }

    #[test]
    fn writes_mark_guards_stale_until_refilled() {
        let mut field = Field2::new("s", cell_grid(), 1.0);
        assert!(matches!(
            field.require_guards("test"),
            Err(FlowError::StaleGuards { name: "s", .. })
        ));
        field.fill_guard_cells().unwrap();
        assert!(field.require_guards("test").is_ok());
        field.set(1, 1, 3.0);
        assert_eq!(field.guards(), GuardState::Stale);
        field.fill_guard_cells().unwrap();
        assert_close(field.get(0, 1), 3.0, 1e-12);
    }

    #[test]
    fn scale_boundary_keeps_guard_state() {
        let grid = cell_grid().with_kind(GridKind::FaceX);
        let mut field = Field2::new("u", grid, 2.0)
            .with_bc(BoundaryConfig::uniform(BoundarySide::dirichlet(2.0)));
        field.fill_guard_cells().unwrap();
        field.scale_boundary(Side::Right, 0.5);
        assert_eq!(field.guards(), GuardState::Valid);
        assert_close(field.get(3, 1), 1.0, 1e-12);
        assert_close(field.get(3, 0), 2.0, 1e-12);
        assert_close(field.get(0, 1), 2.0, 1e-12);
    }

    #[test]
    fn interior_reductions_skip_guards() {
        let mut field = Field2::from_fn("s", cell_grid(), |i, j| (i + j) as f64);
        field.set(0, 0, -100.0);
        let (lo, hi) = field.interior_min_max();
        assert_close(lo, 2.0, 1e-12);
        assert_close(hi, 5.0, 1e-12);
        let (lo_all, _) = field.min_max();
        assert_close(lo_all, -100.0, 1e-12);
        assert_close(field.interior_sum(), 2.0 + 3.0 + 4.0 + 3.0 + 4.0 + 5.0, 1e-12);
    }

    #[test]
    fn require_kind_reports_mismatch() {
        let field = Field2::new("u", cell_grid(), 0.0);
        assert!(matches!(
            field.require_kind(GridKind::FaceX),
            Err(FlowError::GridMismatch { name: "u", .. })
        ));
    }
}
