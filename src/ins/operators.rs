//! Staggered-grid stencils of the fractional-step cycle.

use crate::config::TimeStepping;
use crate::error::FlowResult;
use crate::{Field2, MacVelocity2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredictorParams {
    pub dt: f64,
    pub re: f64,
    /// 1 when pressure accumulates across steps, 0 otherwise.
    pub ip: f64,
    pub stepping: TimeStepping,
    /// Whether `history` holds the previous step's right-hand side.
    pub has_history: bool,
}

/// Convection plus diffusion on interior x-faces.
pub fn momentum_rhs_x(velocity: &MacVelocity2, re: f64, out: &mut Field2) {
    let (u, v) = (velocity.u(), velocity.v());
    let grid = u.grid();
    let (dx, dy) = (grid.dx(), grid.dy());
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            let up = u.get(i, j);
            let (ue, uw) = (u.get(i + 1, j), u.get(i - 1, j));
            let (un, us) = (u.get(i, j + 1), u.get(i, j - 1));
            let (vnw, vne) = (v.get(i, j), v.get(i + 1, j));
            let (vsw, vse) = (v.get(i, j - 1), v.get(i + 1, j - 1));
            let conv = ((up + ue).powi(2) - (uw + up).powi(2)) / (4.0 * dx)
                + ((up + un) * (vnw + vne) - (us + up) * (vsw + vse)) / (4.0 * dy);
            let lap = (ue - 2.0 * up + uw) / (dx * dx) + (un - 2.0 * up + us) / (dy * dy);
            out.set(i, j, lap / re - conv);
        }
    }
}

/// Convection plus diffusion on interior y-faces.
pub fn momentum_rhs_y(velocity: &MacVelocity2, re: f64, out: &mut Field2) {
    let (u, v) = (velocity.u(), velocity.v());
    let grid = v.grid();
    let (dx, dy) = (grid.dx(), grid.dy());
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            let vp = v.get(i, j);
            let (ve, vw) = (v.get(i + 1, j), v.get(i - 1, j));
            let (vn, vs) = (v.get(i, j + 1), v.get(i, j - 1));
            let (une, use_) = (u.get(i, j + 1), u.get(i, j));
            let (unw, usw) = (u.get(i - 1, j + 1), u.get(i - 1, j));
            let conv = ((vp + ve) * (use_ + une) - (vw + vp) * (usw + unw)) / (4.0 * dx)
                + ((vp + vn).powi(2) - (vs + vp).powi(2)) / (4.0 * dy);
            let lap = (ve - 2.0 * vp + vw) / (dx * dx) + (vn - 2.0 * vp + vs) / (dy * dy);
            out.set(i, j, lap / re - conv);
        }
    }
}

/// Explicit provisional velocity. Euler, or Adams-Bashforth 2 once a
/// previous right-hand side exists; `history` receives this step's one.
pub fn predictor(
    velocity: &mut MacVelocity2,
    history: &mut MacVelocity2,
    pressure: &Field2,
    params: PredictorParams,
) -> FlowResult<()> {
    velocity.require_guards("predictor")?;
    pressure.require_guards("predictor")?;
    let mut rhs_x = Field2::new(history.u().name(), history.u().grid(), 0.0)
        .with_bc(history.u().bc().clone());
    let mut rhs_y = Field2::new(history.v().name(), history.v().grid(), 0.0)
        .with_bc(history.v().bc().clone());
    momentum_rhs_x(velocity, params.re, &mut rhs_x);
    momentum_rhs_y(velocity, params.re, &mut rhs_y);
    let old_x = std::mem::replace(history.u_mut(), rhs_x);
    let old_y = std::mem::replace(history.v_mut(), rhs_y);

    let (a, b) = match params.stepping {
        TimeStepping::Ab2 if params.has_history => (1.5, -0.5),
        _ => (1.0, 0.0),
    };
    let dt = params.dt;
    let scale = dt * params.ip;

    let new_x = history.u();
    let grid = new_x.grid();
    let (ri, rj) = (grid.interior_i(), grid.interior_j());
    let dx = grid.dx();
    velocity.u_mut().update_with_index(|i, j, value| {
        if !ri.contains(&i) || !rj.contains(&j) {
            return value;
        }
        let explicit = a * new_x.get(i, j) + b * old_x.get(i, j);
        let gradp = (pressure.get(i + 1, j) - pressure.get(i, j)) / dx;
        value + dt * explicit - scale * gradp
    });

    let new_y = history.v();
    let grid = new_y.grid();
    let (ri, rj) = (grid.interior_i(), grid.interior_j());
    let dy = grid.dy();
    velocity.v_mut().update_with_index(|i, j, value| {
        if !ri.contains(&i) || !rj.contains(&j) {
            return value;
        }
        let explicit = a * new_y.get(i, j) + b * old_y.get(i, j);
        let gradp = (pressure.get(i, j + 1) - pressure.get(i, j)) / dy;
        value + dt * explicit - scale * gradp
    });
    Ok(())
}

/// Cell-centred divergence times `scale`, guards refilled.
pub fn divergence(velocity: &MacVelocity2, out: &mut Field2, scale: f64) -> FlowResult<()> {
    velocity.require_guards("divergence")?;
    let (u, v) = (velocity.u(), velocity.v());
    let grid = out.grid();
    let (dx, dy) = (grid.dx(), grid.dy());
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            let div = (u.get(i, j) - u.get(i - 1, j)) / dx + (v.get(i, j) - v.get(i, j - 1)) / dy;
            out.set(i, j, div * scale);
        }
    }
    out.fill_guard_cells()
}

/// Subtracts `dt ∇δp` on every face between two cells of the same row
/// (or column), boundary faces included.
pub fn corrector(velocity: &mut MacVelocity2, delp: &Field2, dt: f64) -> FlowResult<()> {
    delp.require_guards("corrector")?;
    let (u, v) = velocity.components_mut();
    let dx = u.grid().dx();
    let rows = u.grid().interior_j();
    u.update_with_index(|i, j, value| {
        if rows.contains(&j) {
            value - dt * (delp.get(i + 1, j) - delp.get(i, j)) / dx
        } else {
            value
        }
    });
    let dy = v.grid().dy();
    let columns = v.grid().interior_i();
    v.update_with_index(|i, j, value| {
        if columns.contains(&i) {
            value - dt * (delp.get(i, j + 1) - delp.get(i, j)) / dy
        } else {
            value
        }
    });
    Ok(())
}

/// `p ← ip·p + δp`, guards refilled.
pub fn update_pressure(pressure: &mut Field2, delp: &Field2, ip: f64) -> FlowResult<()> {
    pressure.update_with_index(|i, j, value| ip * value + delp.get(i, j));
    pressure.fill_guard_cells()
}
