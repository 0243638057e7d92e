use crate::boundary::BoundaryConfig;
use crate::error::FlowResult;
use crate::grid::{Bounds, Grid2, GridKind};
use crate::{Field2, Vec2};

/// Face-centered velocity: `u` on x-faces, `v` on y-faces.
#[derive(Clone, Debug, PartialEq)]
pub struct MacVelocity2 {
    u: Field2,
    v: Field2,
}

impl MacVelocity2 {
    pub fn new(cell_grid: Grid2, names: (&'static str, &'static str), initial: Vec2) -> Self {
        Self {
            u: Field2::new(names.0, cell_grid.with_kind(GridKind::FaceX), initial.x),
            v: Field2::new(names.1, cell_grid.with_kind(GridKind::FaceY), initial.y),
        }
    }

    pub fn u(&self) -> &Field2 {
        &self.u
    }

    pub fn v(&self) -> &Field2 {
        &self.v
    }

    pub fn u_mut(&mut self) -> &mut Field2 {
        &mut self.u
    }

    pub fn v_mut(&mut self) -> &mut Field2 {
        &mut self.v
    }

    pub fn components_mut(&mut self) -> (&mut Field2, &mut Field2) {
        (&mut self.u, &mut self.v)
    }

    pub fn set_bc(&mut self, u_bc: BoundaryConfig, v_bc: BoundaryConfig) {
        self.u.set_bc(u_bc);
        self.v.set_bc(v_bc);
    }

    pub fn fill_guard_cells(&mut self) -> FlowResult<()> {
        self.u.fill_guard_cells()?;
        self.v.fill_guard_cells()
    }

    pub fn require_guards(&self, operation: &'static str) -> FlowResult<()> {
        self.u.require_guards(operation)?;
        self.v.require_guards(operation)
    }
}

/// Named fields of one simulation on a staggered (MAC) layout.
///
/// Every field starts with a homogeneous Neumann record and stale guards;
/// the driver installs its boundary records and fills guards before the
/// first step.
#[derive(Clone, Debug)]
pub struct Domain {
    grid: Grid2,
    pub velocity: MacVelocity2,
    pub history: MacVelocity2,
    pub pressure: Field2,
    pub delp: Field2,
    pub divergence: Field2,
    pub phi: Field2,
    pub marker_x: Field2,
    pub marker_y: Field2,
}

impl Domain {
    pub fn new(nx: usize, ny: usize, bounds: Bounds) -> FlowResult<Self> {
        let grid = Grid2::new(GridKind::Cell, nx, ny, bounds)?;
        Ok(Self {
            grid,
            velocity: MacVelocity2::new(grid, ("velx", "vely"), Vec2::zero()),
            history: MacVelocity2::new(grid, ("hvarx", "hvary"), Vec2::zero()),
            pressure: Field2::new("pres", grid, 0.0),
            delp: Field2::new("delp", grid, 0.0),
            divergence: Field2::new("divv", grid, 0.0),
            phi: Field2::new("ibmf", grid, 0.0),
            marker_x: Field2::new("ibmx", grid, 0.0),
            marker_y: Field2::new("ibmy", grid, 0.0),
        })
    }

    pub fn cell_grid(&self) -> Grid2 {
        self.grid
    }

    pub fn xface_grid(&self) -> Grid2 {
        self.grid.with_kind(GridKind::FaceX)
    }

    /// Refills every field's guard layer from its current boundary record.
    pub fn fill_all_guard_cells(&mut self) -> FlowResult<()> {
        self.velocity.fill_guard_cells()?;
        self.history.fill_guard_cells()?;
        for field in [
            &mut self.pressure,
            &mut self.delp,
            &mut self.divergence,
            &mut self.phi,
            &mut self.marker_x,
            &mut self.marker_y,
        ] {
            field.fill_guard_cells()?;
        }
        Ok(())
    }
}
