//! Immersed-boundary coupling between body polygons and the flow fields.

mod rigid;
mod visco;

pub use rigid::RigidForcing;
pub use visco::{solid_props, solid_stress, solid_ustar, ViscoForcing};

use crate::body::Body;
use crate::config::{IbType, MappingType, SimulationConfig};
use crate::error::FlowResult;
use crate::mapping::{self, SearchOptions, SearchPool, SearchReport};
use crate::{Domain, Field2, Scalars};
use std::time::{Duration, Instant};

/// Capabilities every forcing strategy provides.
pub trait ImmersedBoundary {
    /// Writes φ for the current body positions into `domain.phi`.
    fn map_to_grid(
        &mut self,
        mapper: &Mapper,
        bodies: &[Body],
        domain: &mut Domain,
    ) -> FlowResult<SearchReport>;

    /// Modifies the provisional velocity.
    fn force_flow(
        &mut self,
        bodies: &[Body],
        domain: &mut Domain,
        scalars: &Scalars,
    ) -> FlowResult<()>;

    /// Moves interface-bound fields with the flow.
    fn advect(&mut self, domain: &mut Domain, scalars: &Scalars) -> FlowResult<()>;
}

#[derive(Clone, Debug)]
pub struct Mapper {
    pub mapping: MappingType,
    pub options: SearchOptions,
    pool: SearchPool,
}

impl Mapper {
    pub fn new(mapping: MappingType, options: SearchOptions) -> Self {
        Self {
            mapping,
            options,
            pool: SearchPool::default(),
        }
    }

    /// Maps every body separately and stores their union (pointwise minimum)
    /// in `phi`. Guard cells of every returned field are refilled with the
    /// boundary record of `phi`.
    pub fn map_bodies(
        &self,
        bodies: &[Body],
        phi: &mut Field2,
    ) -> FlowResult<(Vec<Field2>, SearchReport)> {
        let mut per_body = Vec::with_capacity(bodies.len());
        let mut report = SearchReport::default();
        for body in bodies {
            let mut field = Field2::new(phi.name(), phi.grid(), 0.0).with_bc(phi.bc().clone());
            let single = mapping::search(self.mapping, body, &mut field, &self.options, &self.pool)?;
            field.fill_guard_cells()?;
            report.iterations += single.iterations;
            per_body.push(field);
        }
        phi.fill_with_index(|i, j| {
            per_body
                .iter()
                .map(|field| field.get(i, j))
                .fold(f64::INFINITY, f64::min)
        });
        phi.fill_guard_cells()?;
        Ok((per_body, report))
    }
}

/// Closed set of forcing strategies.
#[derive(Clone, Debug)]
pub enum Forcing {
    Stub,
    Rigid(RigidForcing),
    Visco(ViscoForcing),
}

impl ImmersedBoundary for Forcing {
    fn map_to_grid(
        &mut self,
        mapper: &Mapper,
        bodies: &[Body],
        domain: &mut Domain,
    ) -> FlowResult<SearchReport> {
        match self {
            Forcing::Stub => Ok(SearchReport::default()),
            Forcing::Rigid(rigid) => rigid.map_to_grid(mapper, bodies, domain),
            Forcing::Visco(visco) => visco.map_to_grid(mapper, bodies, domain),
        }
    }

    fn force_flow(
        &mut self,
        bodies: &[Body],
        domain: &mut Domain,
        scalars: &Scalars,
    ) -> FlowResult<()> {
        match self {
            Forcing::Stub => Ok(()),
            Forcing::Rigid(rigid) => rigid.force_flow(bodies, domain, scalars),
            Forcing::Visco(visco) => visco.force_flow(bodies, domain, scalars),
        }
    }

    fn advect(&mut self, domain: &mut Domain, scalars: &Scalars) -> FlowResult<()> {
        match self {
            Forcing::Stub => Ok(()),
            Forcing::Rigid(rigid) => rigid.advect(domain, scalars),
            Forcing::Visco(visco) => visco.advect(domain, scalars),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImBoundDiagnostics {
    pub mapping_iterations: usize,
    pub mapping_time: Duration,
    pub force_time: Duration,
    pub advection_time: Duration,
}

/// Owns the bodies and dispatches to the configured forcing strategy.
#[derive(Clone, Debug)]
pub struct ImBound {
    bodies: Vec<Body>,
    forcing: Forcing,
    mapper: Mapper,
    verbose: bool,
    diagnostics: ImBoundDiagnostics,
}

impl ImBound {
    pub fn new(config: &SimulationConfig, bodies: Vec<Body>) -> Self {
        let mapper = Mapper::new(config.mapping_type, SearchOptions::from(config));
        let forcing = if !config.with_ib {
            log::warn!("immersed boundary disabled (with_ib = false); using stub forcing");
            Forcing::Stub
        } else if bodies.is_empty() {
            log::warn!("immersed boundary has no bodies; using stub forcing");
            Forcing::Stub
        } else {
            match config.ib_type {
                IbType::Rigid => Forcing::Rigid(RigidForcing::default()),
                IbType::Visco => {
                    Forcing::Visco(ViscoForcing::new(config.lset_redistance, config.extrap_solid))
                }
            }
        };
        Self {
            bodies,
            forcing,
            mapper,
            verbose: config.verbose,
            diagnostics: ImBoundDiagnostics::default(),
        }
    }

    pub fn stub() -> Self {
        Self {
            bodies: Vec::new(),
            forcing: Forcing::Stub,
            mapper: Mapper::new(MappingType::default(), SearchOptions::default()),
            verbose: false,
            diagnostics: ImBoundDiagnostics::default(),
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.forcing, Forcing::Stub)
    }

    /// Rigid bodies are re-mapped from their polygons every step; the
    /// viscoelastic interface is carried by advection instead.
    pub fn is_rigid(&self) -> bool {
        matches!(self.forcing, Forcing::Rigid(_))
    }

    pub fn diagnostics(&self) -> ImBoundDiagnostics {
        self.diagnostics
    }

    pub fn advance_bodies(&mut self, time: f64) {
        for body in &mut self.bodies {
            body.advance(time);
        }
    }

    pub fn map_to_grid(&mut self, domain: &mut Domain) -> FlowResult<()> {
        let start = Instant::now();
        let report = self
            .forcing
            .map_to_grid(&self.mapper, &self.bodies, domain)?;
        self.diagnostics.mapping_iterations = report.iterations;
        self.diagnostics.mapping_time = start.elapsed();
        if self.verbose {
            log::info!(
                "mapped {} bodies ({:?}): {} query iterations in {:.3?}",
                self.bodies.len(),
                self.mapper.mapping,
                report.iterations,
                self.diagnostics.mapping_time
            );
        }
        Ok(())
    }

    pub fn force_flow(&mut self, domain: &mut Domain, scalars: &Scalars) -> FlowResult<()> {
        let start = Instant::now();
        self.forcing.force_flow(&self.bodies, domain, scalars)?;
        self.diagnostics.force_time = start.elapsed();
        Ok(())
    }

    pub fn advect(&mut self, domain: &mut Domain, scalars: &Scalars) -> FlowResult<()> {
        let start = Instant::now();
        self.forcing.advect(domain, scalars)?;
        self.diagnostics.advection_time = start.elapsed();
        if self.verbose {
            log::info!(
                "advected interface fields in {:.3?}",
                self.diagnostics.advection_time
            );
        }
        Ok(())
    }
}
