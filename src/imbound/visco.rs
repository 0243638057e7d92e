use super::{ImmersedBoundary, Mapper};
use crate::body::Body;
use crate::boundary::{BoundaryConfig, BoundarySide};
use crate::error::FlowResult;
use crate::extrapolation::{directional_derivative, extrapolate, Extension};
use crate::level_set::{normal_vectors, redistance_iterations};
use crate::mapping::SearchReport;
use crate::weno::{advect_dynamic_grid, advect_solid};
use crate::{Domain, Field2, MacVelocity2, Scalars};

const SINGULAR_DET: f64 = 1e-12;

/// Solid viscosity mask `μ_s (1 + erf(−φ / 2Δx)) / 2`: μ_s inside, 0 in the fluid.
pub fn solid_props(phi: &Field2, mu_s: f64) -> Field2 {
    let width = 2.0 * phi.grid().dx();
    let mut mask = Field2::from_fn("xmus", phi.grid(), |i, j| {
        0.5 * mu_s * (1.0 + libm::erf(-phi.get(i, j) / width))
    });
    mask.set_bc(phi.bc().clone());
    mask
}

/// Components `[τ11, τ12, τ21, τ22]` of `A Aᵀ − I`, with `A` the inverse of
/// the reference-map gradient. Near-singular gradients give zero stress.
pub fn solid_stress(marker_x: &Field2, marker_y: &Field2) -> FlowResult<[Field2; 4]> {
    marker_x.require_guards("solid stress")?;
    marker_y.require_guards("solid stress")?;
    let grid = marker_x.grid();
    let (dx, dy) = (grid.dx(), grid.dy());
    let neumann = BoundaryConfig::uniform(BoundarySide::neumann(0.0));
    let mut tau = [
        Field2::new("tau11", grid, 0.0).with_bc(neumann.clone()),
        Field2::new("tau12", grid, 0.0).with_bc(neumann.clone()),
        Field2::new("tau21", grid, 0.0).with_bc(neumann.clone()),
        Field2::new("tau22", grid, 0.0).with_bc(neumann),
    ];
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            let a1 = (marker_x.get(i + 1, j) - marker_x.get(i - 1, j)) / (2.0 * dx);
            let a2 = (marker_x.get(i, j + 1) - marker_x.get(i, j - 1)) / (2.0 * dy);
            let a3 = (marker_y.get(i + 1, j) - marker_y.get(i - 1, j)) / (2.0 * dx);
            let a4 = (marker_y.get(i, j + 1) - marker_y.get(i, j - 1)) / (2.0 * dy);
            let det = a1 * a4 - a2 * a3;
            if det.abs() <= SINGULAR_DET {
                continue;
            }
            let (b1, b2, b3, b4) = (a4 / det, -a2 / det, -a3 / det, a1 / det);
            let shear = b1 * b3 + b2 * b4;
            tau[0].set(i, j, b1 * b1 + b2 * b2 - 1.0);
            tau[1].set(i, j, shear);
            tau[2].set(i, j, shear);
            tau[3].set(i, j, b3 * b3 + b4 * b4 - 1.0);
        }
    }
    for component in &mut tau {
        component.fill_guard_cells()?;
    }
    Ok(tau)
}

/// Adds `dt · ∇·(μ τ) / Re_s` to the interior faces of `velocity`.
pub fn solid_ustar(
    velocity: &mut MacVelocity2,
    mask: &Field2,
    tau: &[Field2; 4],
    dt: f64,
    re_s: f64,
) -> FlowResult<()> {
    mask.require_guards("solid forcing")?;
    for component in tau {
        component.require_guards("solid forcing")?;
    }
    let grid = mask.grid();
    let (dx, dy) = (grid.dx(), grid.dy());
    let m = |i: usize, j: usize| mask.get(i, j);
    let t = |k: usize, i: usize, j: usize| tau[k].get(i, j);
    let (u, v) = velocity.components_mut();

    let ugrid = u.grid();
    let mut du = Vec::new();
    for j in ugrid.interior_j() {
        for i in ugrid.interior_i() {
            let txp = m(i + 1, j) * t(0, i + 1, j);
            let txm = m(i, j) * t(0, i, j);
            let typ = 0.25 * (m(i, j + 1) + m(i + 1, j + 1)) * (t(1, i, j + 1) + t(1, i + 1, j + 1));
            let tym = 0.25 * (m(i, j - 1) + m(i + 1, j - 1)) * (t(1, i, j - 1) + t(1, i + 1, j - 1));
            let force = (txp - txm) / (dx * re_s) + (typ - tym) / (2.0 * dy * re_s);
            du.push((i, j, u.get(i, j) + dt * force));
        }
    }
    for (i, j, value) in du {
        u.set(i, j, value);
    }

    let vgrid = v.grid();
    let mut dv = Vec::new();
    for j in vgrid.interior_j() {
        for i in vgrid.interior_i() {
            let txp = 0.25 * (m(i + 1, j) + m(i + 1, j + 1)) * (t(2, i + 1, j) + t(2, i + 1, j + 1));
            let txm = 0.25 * (m(i - 1, j) + m(i - 1, j + 1)) * (t(2, i - 1, j) + t(2, i - 1, j + 1));
            let typ = m(i, j + 1) * t(3, i, j + 1);
            let tym = m(i, j) * t(3, i, j);
            let force = (txp - txm) / (2.0 * dx * re_s) + (typ - tym) / (dy * re_s);
            dv.push((i, j, v.get(i, j) + dt * force));
        }
    }
    for (i, j, value) in dv {
        v.set(i, j, value);
    }
    Ok(())
}

/// Viscoelastic solid carried by a reference map `(marker_x, marker_y)`.
#[derive(Clone, Debug)]
pub struct ViscoForcing {
    lset_redistance: usize,
    extrap_solid: usize,
    markers_ready: bool,
}

impl ViscoForcing {
    pub fn new(lset_redistance: usize, extrap_solid: usize) -> Self {
        Self {
            lset_redistance,
            extrap_solid,
            markers_ready: false,
        }
    }

    fn reset_markers(domain: &mut Domain) -> FlowResult<()> {
        let grid = domain.cell_grid();
        domain.marker_x.fill_with_index(|i, j| grid.coords(i, j).0);
        domain.marker_y.fill_with_index(|i, j| grid.coords(i, j).1);
        domain.marker_x.fill_guard_cells()?;
        domain.marker_y.fill_guard_cells()
    }
}

impl ImmersedBoundary for ViscoForcing {
    fn map_to_grid(
        &mut self,
        mapper: &Mapper,
        bodies: &[Body],
        domain: &mut Domain,
    ) -> FlowResult<SearchReport> {
        let (_, report) = mapper.map_bodies(bodies, &mut domain.phi)?;
        if !self.markers_ready {
            Self::reset_markers(domain)?;
            self.markers_ready = true;
        }
        Ok(report)
    }

    fn force_flow(
        &mut self,
        _bodies: &[Body],
        domain: &mut Domain,
        scalars: &Scalars,
    ) -> FlowResult<()> {
        domain.phi.require_guards("solid forcing")?;
        let mut mask = solid_props(&domain.phi, scalars.mu_s);
        mask.fill_guard_cells()?;
        let mut tau = solid_stress(&domain.marker_x, &domain.marker_y)?;
        let normals = normal_vectors(&domain.phi)?;
        for component in &mut tau {
            extrapolate(
                component,
                &domain.phi,
                &normals,
                Extension::Constant,
                self.extrap_solid,
            )?;
        }
        solid_ustar(&mut domain.velocity, &mask, &tau, scalars.dt, scalars.re_s)
    }

    fn advect(&mut self, domain: &mut Domain, scalars: &Scalars) -> FlowResult<()> {
        let dt = scalars.dt;
        advect_dynamic_grid(&mut domain.marker_x, &domain.phi, &domain.velocity, dt)?;
        domain.marker_x.fill_guard_cells()?;
        advect_dynamic_grid(&mut domain.marker_y, &domain.phi, &domain.velocity, dt)?;
        domain.marker_y.fill_guard_cells()?;

        let normals = normal_vectors(&domain.phi)?;
        for marker in [&mut domain.marker_x, &mut domain.marker_y] {
            let mut ddsn = directional_derivative(marker, &normals)?;
            extrapolate(
                &mut ddsn,
                &domain.phi,
                &normals,
                Extension::Constant,
                self.extrap_solid,
            )?;
            extrapolate(
                marker,
                &domain.phi,
                &normals,
                Extension::Linear(&ddsn),
                self.extrap_solid,
            )?;
        }

        advect_solid(&mut domain.phi, &domain.velocity, dt)?;
        domain.phi.fill_guard_cells()?;
        redistance_iterations(&mut domain.phi, self.lset_redistance)?;
        Ok(())
    }
}
