//! Boundary mass fluxes and the convective outflow condition.

use crate::boundary::{layer_index, BoundaryKind, BoundaryValue, Side};
use crate::{Field2, MacVelocity2};

/// Outflow and Neumann sides let mass leave; every other kind prescribes it.
pub fn is_open(kind: BoundaryKind) -> bool {
    matches!(kind, BoundaryKind::Outflow | BoundaryKind::Neumann)
}

/// The component normal to `side`.
fn normal_component(velocity: &MacVelocity2, side: Side) -> &Field2 {
    if side.is_x() {
        velocity.u()
    } else {
        velocity.v()
    }
}

fn boundary_faces(field: &Field2, side: Side) -> Vec<f64> {
    let grid = field.grid();
    match side {
        Side::Left => grid.interior_j().map(|j| field.get(0, j)).collect(),
        Side::Right => grid
            .interior_j()
            .map(|j| field.get(grid.width() - 1, j))
            .collect(),
        Side::Bottom => grid.interior_i().map(|i| field.get(i, 0)).collect(),
        Side::Top => grid
            .interior_i()
            .map(|i| field.get(i, grid.height() - 1))
            .collect(),
    }
}

/// Volume flux entering the domain through `side`.
pub fn inward_flux(velocity: &MacVelocity2, side: Side) -> f64 {
    let field = normal_component(velocity, side);
    let grid = field.grid();
    let width = if side.is_x() { grid.dy() } else { grid.dx() };
    let sum: f64 = boundary_faces(field, side).iter().sum();
    let sign = if side.is_low() { 1.0 } else { -1.0 };
    sign * sum * width
}

/// Flux entering through sides whose normal component is prescribed.
pub fn qin(velocity: &MacVelocity2) -> f64 {
    Side::ALL
        .into_iter()
        .filter(|&side| !is_open(normal_component(velocity, side).bc().kind(side)))
        .map(|side| inward_flux(velocity, side))
        .sum()
}

/// Flux leaving through outflow and Neumann sides.
pub fn qout(velocity: &MacVelocity2) -> f64 {
    Side::ALL
        .into_iter()
        .filter(|&side| is_open(normal_component(velocity, side).bc().kind(side)))
        .map(|side| -inward_flux(velocity, side))
        .sum()
}

/// Multiplies the boundary faces of every open side by `factor`.
pub fn rescale_outflow(velocity: &mut MacVelocity2, factor: f64) {
    for side in Side::ALL {
        let field = if side.is_x() {
            velocity.u_mut()
        } else {
            velocity.v_mut()
        };
        if is_open(field.bc().kind(side)) {
            field.scale_boundary(side, factor);
        }
    }
}

/// Mean normal velocity over the interior boundary faces of `side`.
pub fn convective_velocity(velocity: &MacVelocity2, side: Side) -> f64 {
    let faces = boundary_faces(normal_component(velocity, side), side);
    if faces.is_empty() {
        0.0
    } else {
        faces.iter().sum::<f64>() / faces.len() as f64
    }
}

/// Replaces the value of every outflow side of the normal component with a
/// one-sided convective update of the current boundary faces.
pub fn update_outflow_bc(velocity: &mut MacVelocity2, dt: f64) {
    for side in Side::ALL {
        let c = convective_velocity(velocity, side);
        let field = if side.is_x() {
            velocity.u_mut()
        } else {
            velocity.v_mut()
        };
        if field.bc().kind(side) != BoundaryKind::Outflow {
            continue;
        }
        let grid = field.grid();
        let (len, delta) = if side.is_x() {
            (grid.height(), grid.dx())
        } else {
            (grid.width(), grid.dy())
        };
        let data = field.data();
        let profile = (0..len)
            .map(|k| {
                let boundary = data[layer_index(&grid, side, 0, k)];
                let inner = data[layer_index(&grid, side, 1, k)];
                let gradient = if side.is_low() {
                    inner - boundary
                } else {
                    boundary - inner
                };
                boundary - c * dt * gradient / delta
            })
            .collect();
        field
            .bc_mut()
            .set_value(side, BoundaryValue::Profile(profile));
    }
}
