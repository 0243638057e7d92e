use crate::error::{FlowError, FlowResult};
use crate::grid::Grid2;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Bottom, Side::Top];

    fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Top => 3,
        }
    }

    pub fn is_x(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    pub fn is_low(self) -> bool {
        matches!(self, Side::Left | Side::Bottom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryKind {
    Neumann,
    Dirichlet,
    Outflow,
    Periodic,
    Projection,
    PassThrough,
}

impl FromStr for BoundaryKind {
    type Err = FlowError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "neumann" => Ok(Self::Neumann),
            "dirichlet" => Ok(Self::Dirichlet),
            "outflow" => Ok(Self::Outflow),
            "periodic" => Ok(Self::Periodic),
            "projection" => Ok(Self::Projection),
            "none" => Ok(Self::PassThrough),
            other => Err(FlowError::UnknownBoundaryKind(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BoundaryValue {
    Uniform(f64),
    Profile(Vec<f64>),
}

impl BoundaryValue {
    pub fn at(&self, k: usize) -> f64 {
        match self {
            BoundaryValue::Uniform(value) => *value,
            BoundaryValue::Profile(values) => values[k],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoundarySide {
    pub kind: BoundaryKind,
    pub value: BoundaryValue,
}

impl BoundarySide {
    pub fn new(kind: BoundaryKind, value: f64) -> Self {
        Self {
            kind,
            value: BoundaryValue::Uniform(value),
        }
    }

    pub fn neumann(value: f64) -> Self {
        Self::new(BoundaryKind::Neumann, value)
    }

    pub fn dirichlet(value: f64) -> Self {
        Self::new(BoundaryKind::Dirichlet, value)
    }

    pub fn outflow(value: f64) -> Self {
        Self::new(BoundaryKind::Outflow, value)
    }

    pub fn periodic() -> Self {
        Self::new(BoundaryKind::Periodic, 0.0)
    }

    pub fn projection() -> Self {
        Self::new(BoundaryKind::Projection, 0.0)
    }

    pub fn pass_through() -> Self {
        Self::new(BoundaryKind::PassThrough, 0.0)
    }
}

/// Boundary record of one field, one entry per domain side.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryConfig {
    sides: [BoundarySide; 4],
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self::uniform(BoundarySide::neumann(0.0))
    }
}

impl BoundaryConfig {
    pub fn uniform(side: BoundarySide) -> Self {
        Self {
            sides: [side.clone(), side.clone(), side.clone(), side],
        }
    }

    pub fn with(mut self, side: Side, record: BoundarySide) -> Self {
        self.set(side, record);
        self
    }

    pub fn side(&self, side: Side) -> &BoundarySide {
        &self.sides[side.index()]
    }

    pub fn set(&mut self, side: Side, record: BoundarySide) {
        self.sides[side.index()] = record;
    }

    pub fn kind(&self, side: Side) -> BoundaryKind {
        self.side(side).kind
    }

    pub fn set_kind(&mut self, side: Side, kind: BoundaryKind) {
        self.sides[side.index()].kind = kind;
    }

    pub fn set_value(&mut self, side: Side, value: BoundaryValue) {
        self.sides[side.index()].value = value;
    }

    /// Same kinds with every value set to zero.
    pub fn homogeneous(&self) -> Self {
        let mut out = self.clone();
        for side in &mut out.sides {
            side.value = BoundaryValue::Uniform(0.0);
        }
        out
    }

    pub fn all_kind(&self, kind: BoundaryKind) -> bool {
        self.sides.iter().all(|side| side.kind == kind)
    }

    pub fn has_kind(&self, kind: BoundaryKind) -> bool {
        self.sides.iter().any(|side| side.kind == kind)
    }
}

pub(crate) fn layer_index(grid: &Grid2, side: Side, layer: usize, k: usize) -> usize {
    let w = grid.width();
    let h = grid.height();
    match side {
        Side::Left => grid.idx(layer, k),
        Side::Right => grid.idx(w - 1 - layer, k),
        Side::Bottom => grid.idx(k, layer),
        Side::Top => grid.idx(k, h - 1 - layer),
    }
}

/// Layer 0 is the guard (or boundary face), layer 1 the first interior point.
pub(crate) fn fill_guard_cells(
    grid: &Grid2,
    data: &mut [f64],
    bc: &BoundaryConfig,
) -> FlowResult<()> {
    for side in Side::ALL {
        let record = bc.side(side);
        let (len, normal, delta) = if side.is_x() {
            (grid.height(), grid.normal_x(), grid.dx())
        } else {
            (grid.width(), grid.normal_y(), grid.dy())
        };
        if let BoundaryValue::Profile(values) = &record.value {
            if values.len() != len {
                return Err(FlowError::ProfileLength {
                    side,
                    provided: values.len(),
                    expected: len,
                });
            }
        }
        match record.kind {
            BoundaryKind::PassThrough => {}
            BoundaryKind::Neumann => {
                for k in 0..len {
                    let inner = data[layer_index(grid, side, 1, k)];
                    data[layer_index(grid, side, 0, k)] = record.value.at(k) * delta + inner;
                }
            }
            BoundaryKind::Dirichlet | BoundaryKind::Outflow => {
                for k in 0..len {
                    let value = record.value.at(k);
                    let guard = if normal {
                        value
                    } else {
                        2.0 * value - data[layer_index(grid, side, 1, k)]
                    };
                    data[layer_index(grid, side, 0, k)] = guard;
                }
            }
            BoundaryKind::Periodic => {
                if normal {
                    return Err(FlowError::UnsupportedBoundary {
                        kind: record.kind,
                        side,
                        grid: grid.kind(),
                    });
                }
                let mirror = match side {
                    Side::Left => Side::Right,
                    Side::Right => Side::Left,
                    Side::Bottom => Side::Top,
                    Side::Top => Side::Bottom,
                };
                for k in 0..len {
                    let wrapped = data[layer_index(grid, mirror, 1, k)];
                    data[layer_index(grid, side, 0, k)] = wrapped;
                }
            }
            BoundaryKind::Projection => {
                for k in 0..len {
                    let first = data[layer_index(grid, side, 1, k)];
                    let second = data[layer_index(grid, side, 2, k)];
                    data[layer_index(grid, side, 0, k)] = 2.0 * first - second;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Bounds, GridKind};

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn grid(kind: GridKind) -> Grid2 {
        Grid2::new(kind, 4, 3, Bounds::new(0.0, 1.0, 0.0, 1.0)).unwrap()
    }

    fn ramp(grid: &Grid2) -> Vec<f64> {
        (0..grid.size())
            .map(|n| {
                let i = n % grid.width();
                let j = n / grid.width();
                (i + 10 * j) as f64
            })
            .collect()
    }

    #[test]
    fn dirichlet_reflects_on_cells_and_pins_faces() {
        let bc = BoundaryConfig::uniform(BoundarySide::dirichlet(1.0));
        let cell = grid(GridKind::Cell);
        let mut data = ramp(&cell);
        fill_guard_cells(&cell, &mut data, &bc).unwrap();
        let inner = data[cell.idx(1, 2)];
        assert_close(data[cell.idx(0, 2)], 2.0 - inner, 1e-12);

        let face = grid(GridKind::FaceX);
        let mut data = ramp(&face);
        fill_guard_cells(&face, &mut data, &bc).unwrap();
        assert_close(data[face.idx(0, 2)], 1.0, 1e-12);
        assert_close(data[face.idx(4, 2)], 1.0, 1e-12);
        let below = data[face.idx(2, 1)];
        assert_close(data[face.idx(2, 0)], 2.0 - below, 1e-12);
    }

    #[test]
    fn neumann_projection_and_periodic_rules() {
        let cell = grid(GridKind::Cell);
        let bc = BoundaryConfig::default()
            .with(Side::Left, BoundarySide::neumann(2.0))
            .with(Side::Right, BoundarySide::projection())
            .with(Side::Bottom, BoundarySide::periodic())
            .with(Side::Top, BoundarySide::periodic());
        let mut data = ramp(&cell);
        fill_guard_cells(&cell, &mut data, &bc).unwrap();
        assert_close(data[cell.idx(0, 1)], 2.0 * 0.25 + 11.0, 1e-12);
        assert_close(data[cell.idx(5, 1)], 2.0 * 14.0 - 13.0, 1e-12);
        assert_close(data[cell.idx(2, 0)], 32.0, 1e-12);
        assert_close(data[cell.idx(2, 4)], 12.0, 1e-12);
    }

    #[test]
    fn pass_through_leaves_storage() {
        let cell = grid(GridKind::FaceY);
        let bc = BoundaryConfig::uniform(BoundarySide::pass_through());
        let mut data = ramp(&cell);
        let before = data.clone();
        fill_guard_cells(&cell, &mut data, &bc).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn periodic_on_face_normal_side_is_rejected() {
        let face = grid(GridKind::FaceX);
        let bc = BoundaryConfig::default().with(Side::Left, BoundarySide::periodic());
        let mut data = ramp(&face);
        let err = fill_guard_cells(&face, &mut data, &bc).unwrap_err();
        assert!(matches!(
            err,
            FlowError::UnsupportedBoundary {
                kind: BoundaryKind::Periodic,
                side: Side::Left,
                grid: GridKind::FaceX
            }
        ));
    }

    #[test]
    fn profile_length_is_checked() {
        let cell = grid(GridKind::Cell);
        let mut bc = BoundaryConfig::default();
        bc.set_kind(Side::Right, BoundaryKind::Outflow);
        bc.set_value(Side::Right, BoundaryValue::Profile(vec![0.0; 3]));
        let mut data = ramp(&cell);
        let err = fill_guard_cells(&cell, &mut data, &bc).unwrap_err();
        assert!(matches!(
            err,
            FlowError::ProfileLength {
                provided: 3,
                expected: 5,
                ..
            }
        ));
    }

    #[test]
    fn parses_boundary_tags() {
        assert_eq!(
            "none".parse::<BoundaryKind>().unwrap(),
            BoundaryKind::PassThrough
        );
        assert!("slip".parse::<BoundaryKind>().is_err());
    }
}
