//! Normal-direction extension of cell data from the body (φ ≤ 0) into the
//! surrounding fluid band.

use crate::boundary::{BoundaryConfig, BoundarySide};
use crate::error::FlowResult;
use crate::grid::Grid2;
use crate::{Field2, Vec2, VecField2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Extension<'a> {
    /// Hold values constant along the normal.
    Constant,
    /// Grow linearly with the given normal-derivative target.
    Linear(&'a Field2),
}

/// Pseudo-time step used by every extension sweep.
pub fn extrapolation_dtau(grid: Grid2) -> f64 {
    0.5 * grid.dx().min(grid.dy())
}

fn upwind_normal_derivative(s: &Field2, n: Vec2, i: usize, j: usize) -> f64 {
    let grid = s.grid();
    let center = s.get(i, j);
    let sxm = (center - s.get(i - 1, j)) / grid.dx();
    let sxp = (s.get(i + 1, j) - center) / grid.dx();
    let sym = (center - s.get(i, j - 1)) / grid.dy();
    let syp = (s.get(i, j + 1) - center) / grid.dy();
    n.x.max(0.0) * sxm + n.x.min(0.0) * sxp + n.y.max(0.0) * sym + n.y.min(0.0) * syp
}

/// `n·∇s` with differences upwinded by the normal; guards copy the boundary.
pub fn directional_derivative(s: &Field2, normals: &VecField2) -> FlowResult<Field2> {
    s.require_guards("directional derivative")?;
    let grid = s.grid();
    let mut ddsn = Field2::new("ddsn", grid, 0.0)
        .with_bc(BoundaryConfig::uniform(BoundarySide::neumann(0.0)));
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            ddsn.set(i, j, upwind_normal_derivative(s, normals.get(i, j), i, j));
        }
    }
    ddsn.fill_guard_cells()?;
    Ok(ddsn)
}

/// One pseudo-time sweep over fluid cells; returns the largest change.
fn extrapolation_sweep(
    s: &mut Field2,
    phi: &Field2,
    normals: &VecField2,
    extension: Extension<'_>,
) -> FlowResult<f64> {
    s.require_guards("extrapolation")?;
    let grid = s.grid();
    let dtau = extrapolation_dtau(grid);
    let mut updates = Vec::new();
    let mut residual: f64 = 0.0;
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            if phi.get(i, j) <= 0.0 {
                continue;
            }
            let transport = upwind_normal_derivative(s, normals.get(i, j), i, j);
            let rate = match extension {
                Extension::Constant => -transport,
                Extension::Linear(target) => target.get(i, j) - transport,
            };
            let change = dtau * rate;
            residual = residual.max(change.abs());
            updates.push((i, j, s.get(i, j) + change));
        }
    }
    for (i, j, value) in updates {
        s.set(i, j, value);
    }
    Ok(residual)
}

/// One sweep of `∂s/∂τ + n·∇s = 0`.
pub fn constant_extrapolation(
    s: &mut Field2,
    phi: &Field2,
    normals: &VecField2,
) -> FlowResult<f64> {
    extrapolation_sweep(s, phi, normals, Extension::Constant)
}

/// One sweep of `∂s/∂τ + n·∇s = target`.
pub fn linear_extrapolation(
    s: &mut Field2,
    phi: &Field2,
    normals: &VecField2,
    target: &Field2,
) -> FlowResult<f64> {
    extrapolation_sweep(s, phi, normals, Extension::Linear(target))
}

/// Fixed number of sweeps with a guard refill after each one.
pub fn extrapolate(
    s: &mut Field2,
    phi: &Field2,
    normals: &VecField2,
    extension: Extension<'_>,
    iterations: usize,
) -> FlowResult<Vec<f64>> {
    let mut history = Vec::with_capacity(iterations);
    for sweep in 0..iterations {
        let residual = match extension {
            Extension::Constant => constant_extrapolation(s, phi, normals)?,
            Extension::Linear(target) => linear_extrapolation(s, phi, normals, target)?,
        };
        s.fill_guard_cells()?;
        log::debug!("extrapolate `{}` sweep {sweep}: residual {residual:.3e}", s.name());
        history.push(residual);
    }
    Ok(history)
}
