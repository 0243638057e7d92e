//! Third-order WENO transport of cell-centered scalars on the MAC velocity.

use crate::error::FlowResult;
use crate::grid::GridKind;
use crate::{Field2, MacVelocity2};

const WENO_EPS: f64 = 1e-15;
const PAD: usize = 2;

fn smoothness(s1: f64, s2: f64, s3: f64, s4: f64, s5: f64) -> [f64; 3] {
    [
        13.0 / 12.0 * (s1 - 2.0 * s2 + s3).powi(2) + 0.25 * (s1 - 4.0 * s2 + 3.0 * s3).powi(2),
        13.0 / 12.0 * (s2 - 2.0 * s3 + s4).powi(2) + 0.25 * (s2 - s4).powi(2),
        13.0 / 12.0 * (s3 - 2.0 * s4 + s5).powi(2) + 0.25 * (3.0 * s3 - 4.0 * s4 + s5).powi(2),
    ]
}

fn blend(ideal: [f64; 3], is: [f64; 3], candidates: [f64; 3]) -> f64 {
    let a = [
        ideal[0] / (WENO_EPS + is[0]).powi(2),
        ideal[1] / (WENO_EPS + is[1]).powi(2),
        ideal[2] / (WENO_EPS + is[2]).powi(2),
    ];
    let total = a[0] + a[1] + a[2];
    (a[0] * candidates[0] + a[1] * candidates[1] + a[2] * candidates[2]) / total
}

/// Face value between `s3` and `s4` for flow in the positive direction.
fn upwind_from_low(s: [f64; 5]) -> f64 {
    let [s1, s2, s3, s4, s5] = s;
    blend(
        [0.1, 0.6, 0.3],
        smoothness(s1, s2, s3, s4, s5),
        [
            (2.0 * s1 - 7.0 * s2 + 11.0 * s3) / 6.0,
            (-s2 + 5.0 * s3 + 2.0 * s4) / 6.0,
            (2.0 * s3 + 5.0 * s4 - s5) / 6.0,
        ],
    )
}

/// Face value between `s2` and `s3` for flow in the negative direction.
fn upwind_from_high(s: [f64; 5]) -> f64 {
    let [s1, s2, s3, s4, s5] = s;
    blend(
        [0.3, 0.6, 0.1],
        smoothness(s1, s2, s3, s4, s5),
        [
            (-s1 + 5.0 * s2 + 2.0 * s3) / 6.0,
            (2.0 * s2 + 5.0 * s3 - s4) / 6.0,
            (11.0 * s3 - 7.0 * s4 + 2.0 * s5) / 6.0,
        ],
    )
}

/// `line[3]` is the cell itself; returns (high-face flux, low-face flux).
fn face_values(line: [f64; 7], low_vel: f64, high_vel: f64) -> (f64, f64) {
    let window = |start: usize| -> [f64; 5] {
        [
            line[start],
            line[start + 1],
            line[start + 2],
            line[start + 3],
            line[start + 4],
        ]
    };
    let high = if high_vel > 0.0 {
        upwind_from_low(window(1))
    } else {
        upwind_from_high(window(2))
    };
    let low = if low_vel > 0.0 {
        upwind_from_low(window(0))
    } else {
        upwind_from_high(window(1))
    };
    (high, low)
}

/// Copy of `s` with two extra layers per side, filled by linear extrapolation.
struct Padded {
    width: usize,
    data: Vec<f64>,
}

impl Padded {
    fn new(s: &Field2) -> Self {
        let grid = s.grid();
        let width = grid.width() + 2 * PAD;
        let height = grid.height() + 2 * PAD;
        let mut data = vec![0.0; width * height];
        for j in 0..grid.height() {
            for i in 0..grid.width() {
                data[(j + PAD) * width + i + PAD] = s.get(i, j);
            }
        }
        let at = |i: usize, j: usize| j * width + i;
        for j in PAD..height - PAD {
            data[at(1, j)] = 2.0 * data[at(2, j)] - data[at(3, j)];
            data[at(0, j)] = 2.0 * data[at(1, j)] - data[at(2, j)];
            data[at(width - 2, j)] = 2.0 * data[at(width - 3, j)] - data[at(width - 4, j)];
            data[at(width - 1, j)] = 2.0 * data[at(width - 2, j)] - data[at(width - 3, j)];
        }
        for i in 0..width {
            data[at(i, 1)] = 2.0 * data[at(i, 2)] - data[at(i, 3)];
            data[at(i, 0)] = 2.0 * data[at(i, 1)] - data[at(i, 2)];
            data[at(i, height - 2)] = 2.0 * data[at(i, height - 3)] - data[at(i, height - 4)];
            data[at(i, height - 1)] = 2.0 * data[at(i, height - 2)] - data[at(i, height - 3)];
        }
        Self { width, data }
    }

    fn row(&self, i: usize, j: usize) -> [f64; 7] {
        let base = (j + PAD) * self.width + i + PAD;
        let mut out = [0.0; 7];
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = self.data[base + k - 3];
        }
        out
    }

    fn column(&self, i: usize, j: usize) -> [f64; 7] {
        let mut out = [0.0; 7];
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = self.data[(j + PAD + k - 3) * self.width + i + PAD];
        }
        out
    }
}

fn advect_weno3(
    s: &mut Field2,
    velocity: &MacVelocity2,
    dt: f64,
    active: impl Fn(usize, usize) -> bool,
) -> FlowResult<()> {
    s.require_kind(GridKind::Cell)?;
    s.require_guards("weno3 advection")?;
    velocity.require_guards("weno3 advection")?;
    let grid = s.grid();
    let (dx, dy) = (grid.dx(), grid.dy());
    let padded = Padded::new(s);
    let u = velocity.u();
    let v = velocity.v();
    let mut updates = Vec::with_capacity(grid.nx() * grid.ny());
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            if !active(i, j) {
                continue;
            }
            let (ul, ur) = (u.get(i - 1, j), u.get(i, j));
            let (vl, vr) = (v.get(i, j - 1), v.get(i, j));
            let (frx, flx) = face_values(padded.row(i, j), ul, ur);
            let (fry, fly) = face_values(padded.column(i, j), vl, vr);
            let value = s.get(i, j)
                - dt * (frx * ur - flx * ul) / dx
                - dt * (fry * vr - fly * vl) / dy;
            updates.push((i, j, value));
        }
    }
    for (i, j, value) in updates {
        s.set(i, j, value);
    }
    Ok(())
}

/// Advances `s` only where the body occupies the cell (φ ≤ 0).
pub fn advect_dynamic_grid(
    s: &mut Field2,
    phi: &Field2,
    velocity: &MacVelocity2,
    dt: f64,
) -> FlowResult<()> {
    phi.require_kind(GridKind::Cell)?;
    advect_weno3(s, velocity, dt, |i, j| phi.get(i, j) <= 0.0)
}

pub fn advect_solid(s: &mut Field2, velocity: &MacVelocity2, dt: f64) -> FlowResult<()> {
    advect_weno3(s, velocity, dt, |_, _| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryConfig, BoundarySide};
    use crate::grid::{Bounds, Grid2};
    use crate::Vec2;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn setup(nx: usize, ny: usize, flow: Vec2) -> (Grid2, MacVelocity2) {
        let grid = Grid2::new(GridKind::Cell, nx, ny, Bounds::new(0.0, 1.0, 0.0, 1.0)).unwrap();
        let mut velocity = MacVelocity2::new(grid, ("velx", "vely"), flow);
        velocity.fill_guard_cells().unwrap();
        (grid, velocity)
    }

    fn scalar(grid: Grid2, f: impl Fn(f64, f64) -> f64) -> Field2 {
        let mut s = Field2::from_fn("s", grid, |i, j| {
            let (x, y) = grid.coords(i, j);
            f(x, y)
        })
        .with_bc(BoundaryConfig::uniform(BoundarySide::projection()));
        s.fill_guard_cells().unwrap();
        s
    }

    #[test]
    fn constant_field_is_unchanged() {
        let (grid, velocity) = setup(16, 12, Vec2::new(0.7, -0.4));
        let mut s = scalar(grid, |_, _| 3.25);
        advect_solid(&mut s, &velocity, 0.01).unwrap();
        for value in s.data() {
            assert_eq!(*value, 3.25);
        }
    }

    #[test]
    fn linear_field_translates_exactly() {
        let (grid, velocity) = setup(20, 20, Vec2::new(1.0, 0.3));
        let mut s = scalar(grid, |x, y| 2.0 * x + 3.0 * y + 1.0);
        let dt = 0.01;
        advect_solid(&mut s, &velocity, dt).unwrap();
        for j in grid.interior_j() {
            for i in grid.interior_i() {
                let (x, y) = grid.coords(i, j);
                let expected = 2.0 * (x - dt) + 3.0 * (y - 0.3 * dt) + 1.0;
                assert_close(s.get(i, j), expected, 1e-10);
            }
        }
    }

    #[test]
    fn smooth_bump_translates_with_flow() {
        let (grid, velocity) = setup(100, 4, Vec2::new(1.0, 0.0));
        let bump = |x: f64| (-(x - 0.4).powi(2) / 0.01).exp();
        let mut s = scalar(grid, |x, _| bump(x));
        let dt = 0.2 * grid.dx();
        let steps = 10;
        for _ in 0..steps {
            advect_solid(&mut s, &velocity, dt).unwrap();
            s.fill_guard_cells().unwrap();
        }
        let shift = dt * steps as f64;
        for i in grid.interior_i() {
            let (x, _) = grid.coords(i, 2);
            assert_close(s.get(i, 2), bump(x - shift), 2e-2);
        }
    }

    #[test]
    fn dynamic_grid_only_moves_body_cells() {
        let (grid, velocity) = setup(12, 12, Vec2::new(1.0, 0.0));
        let phi = scalar(grid, |x, _| x - 0.5);
        let mut s = scalar(grid, |x, y| x * x + y);
        let before = s.clone();
        advect_dynamic_grid(&mut s, &phi, &velocity, 0.01).unwrap();
        for j in grid.interior_j() {
            for i in grid.interior_i() {
                if phi.get(i, j) > 0.0 {
                    assert_eq!(s.get(i, j), before.get(i, j));
                } else {
                    assert!(s.get(i, j) < before.get(i, j));
                }
            }
        }
    }

    #[test]
    fn stale_guards_are_rejected() {
        let (grid, velocity) = setup(8, 8, Vec2::new(1.0, 0.0));
        let mut s = scalar(grid, |x, _| x);
        s.set(2, 2, 0.0);
        assert!(advect_solid(&mut s, &velocity, 0.01).is_err());
    }
}
