use crate::boundary::{BoundaryConfig, BoundarySide};
use crate::error::FlowResult;
use crate::grid::{Grid2, GridKind};
use crate::{Field2, VecField2};

const SIGN_EPS: f64 = 1e-14;

/// Pseudo-time step for redistancing: half the cell diagonal.
pub fn redistance_dtau(grid: Grid2) -> f64 {
    0.5 * grid.dx().hypot(grid.dy())
}

fn godunov_gradient(phi: &Field2, i: usize, j: usize, sign: f64) -> f64 {
    let grid = phi.grid();
    let (dx, dy) = (grid.dx(), grid.dy());
    let center = phi.get(i, j);
    let a = (center - phi.get(i - 1, j)) / dx;
    let b = (phi.get(i + 1, j) - center) / dx;
    let c = (center - phi.get(i, j - 1)) / dy;
    let d = (phi.get(i, j + 1) - center) / dy;
    if sign > 0.0 {
        let gx = a.max(0.0).powi(2).max(b.min(0.0).powi(2));
        let gy = c.max(0.0).powi(2).max(d.min(0.0).powi(2));
        (gx + gy).sqrt() - 1.0
    } else if sign < 0.0 {
        let gx = a.min(0.0).powi(2).max(b.max(0.0).powi(2));
        let gy = c.min(0.0).powi(2).max(d.max(0.0).powi(2));
        (gx + gy).sqrt() - 1.0
    } else {
        0.0
    }
}

fn straddles_interface(phi0: &Field2, i: usize, j: usize) -> bool {
    let center = phi0.get(i, j);
    [
        phi0.get(i - 1, j),
        phi0.get(i + 1, j),
        phi0.get(i, j - 1),
        phi0.get(i, j + 1),
    ]
    .iter()
    .any(|neighbor| center * neighbor < 0.0)
}

/// One upwind sweep of `∂φ/∂τ = sign(φ₀)(1 − |∇φ|)`.
///
/// Cells whose `phi0` neighbours change sign are reset to `phi0`. Only the
/// interior is written; the caller refills guards. Returns the largest
/// change of any interior cell.
pub fn redistance(phi: &mut Field2, phi0: &Field2, dtau: f64) -> FlowResult<f64> {
    phi.require_kind(GridKind::Cell)?;
    phi.require_guards("redistancing")?;
    phi0.require_guards("redistancing")?;
    let grid = phi.grid();
    let mut updates = Vec::with_capacity(grid.nx() * grid.ny());
    let mut residual: f64 = 0.0;
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            let old = phi.get(i, j);
            let s0 = phi0.get(i, j);
            let value = if straddles_interface(phi0, i, j) {
                s0
            } else {
                let sign = s0 / (s0.abs() + SIGN_EPS);
                old - dtau * sign * godunov_gradient(phi, i, j, s0)
            };
            residual = residual.max((value - old).abs());
            updates.push((i, j, value));
        }
    }
    for (i, j, value) in updates {
        phi.set(i, j, value);
    }
    Ok(residual)
}

/// Runs a fixed number of sweeps against the field as it was on entry,
/// refilling guards after each. Returns the residual of every sweep.
pub fn redistance_iterations(phi: &mut Field2, iterations: usize) -> FlowResult<Vec<f64>> {
    let phi0 = phi.clone();
    let dtau = redistance_dtau(phi.grid());
    let mut history = Vec::with_capacity(iterations);
    for sweep in 0..iterations {
        let residual = redistance(phi, &phi0, dtau)?;
        phi.fill_guard_cells()?;
        log::debug!("redistance sweep {sweep}: residual {residual:.3e}");
        history.push(residual);
    }
    Ok(history)
}

/// Outward unit normal `∇φ/|∇φ|` by centered differences; zero where the
/// gradient vanishes. Guard cells copy the nearest interior normal.
pub fn normal_vectors(phi: &Field2) -> FlowResult<VecField2> {
    phi.require_kind(GridKind::Cell)?;
    phi.require_guards("normal vectors")?;
    let grid = phi.grid();
    let (dx, dy) = (grid.dx(), grid.dy());
    let interior_i = grid.interior_i();
    let interior_j = grid.interior_j();
    let component = |along_x: bool| {
        Field2::from_fn(if along_x { "adfx" } else { "adfy" }, grid, |i, j| {
            if !interior_i.contains(&i) || !interior_j.contains(&j) {
                return 0.0;
            }
            let gx = (phi.get(i + 1, j) - phi.get(i - 1, j)) / (2.0 * dx);
            let gy = (phi.get(i, j + 1) - phi.get(i, j - 1)) / (2.0 * dy);
            let mag = gx.hypot(gy);
            if mag <= SIGN_EPS {
                0.0
            } else if along_x {
                gx / mag
            } else {
                gy / mag
            }
        })
        .with_bc(BoundaryConfig::uniform(BoundarySide::neumann(0.0)))
    };
    let mut nx = component(true);
    let mut ny = component(false);
    nx.fill_guard_cells()?;
    ny.fill_guard_cells()?;
    Ok(VecField2::new(nx, ny))
}
