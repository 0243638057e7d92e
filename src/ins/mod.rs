//! Fractional-step incompressible Navier-Stokes integrator on the MAC grid.

pub mod mass_balance;
pub mod operators;

use crate::boundary::{BoundaryConfig, BoundaryKind, Side};
use crate::config::{SimulationConfig, TimeStepping};
use crate::error::FlowResult;
use crate::imbound::ImBound;
use crate::poisson::PoissonSolver;
use crate::{Domain, Scalars};
use operators::PredictorParams;
use std::time::{Duration, Instant};

/// Per-step diagnostics of the last completed cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
    pub u_min: f64,
    pub u_max: f64,
    pub v_min: f64,
    pub v_max: f64,
    pub p_min: f64,
    pub p_max: f64,
    pub div_min: f64,
    pub div_max: f64,
    pub poisson_iterations: usize,
    pub poisson_residual: f64,
    pub qin: f64,
    pub qout: f64,
    /// `|Qin − Qout|` after the outflow rescale.
    pub mass_imbalance: f64,
    pub poisson_time: Duration,
    pub step_time: Duration,
}

/// Outflow and Neumann sides normal to the component stop being refilled
/// once the pressure correction has written their boundary faces.
pub fn corrector_bc(star: &BoundaryConfig, normal: [Side; 2]) -> BoundaryConfig {
    let mut bc = star.clone();
    for side in normal {
        if mass_balance::is_open(bc.kind(side)) {
            bc.set_kind(side, BoundaryKind::PassThrough);
        }
    }
    bc
}

pub struct IncompNsBuilder {
    time_stepping: TimeStepping,
    pressure_correct: bool,
    verbose: bool,
    poisson: Option<Box<dyn PoissonSolver>>,
    imbound: Option<ImBound>,
}

impl IncompNsBuilder {
    pub fn poisson(mut self, solver: Box<dyn PoissonSolver>) -> Self {
        self.poisson = Some(solver);
        self
    }

    pub fn imbound(mut self, imbound: ImBound) -> Self {
        self.imbound = Some(imbound);
        self
    }

    /// Captures the velocity boundary records currently installed on
    /// `domain` as the predictor configuration.
    pub fn build(self, domain: &Domain) -> IncompNs {
        let stepper = match (self.poisson, self.imbound) {
            (Some(poisson), Some(imbound)) => {
                let star_u = domain.velocity.u().bc().clone();
                let star_v = domain.velocity.v().bc().clone();
                let corrector = [
                    corrector_bc(&star_u, [Side::Left, Side::Right]),
                    corrector_bc(&star_v, [Side::Bottom, Side::Top]),
                ];
                Some(Stepper {
                    poisson,
                    imbound,
                    time_stepping: self.time_stepping,
                    ip: if self.pressure_correct { 1.0 } else { 0.0 },
                    verbose: self.verbose,
                    star: [star_u, star_v],
                    corrector,
                    has_history: false,
                })
            }
            (poisson, imbound) => {
                if poisson.is_none() {
                    log::warn!("incompressible solver has no poisson backend; advance() is a no-op");
                }
                if imbound.is_none() {
                    log::warn!("incompressible solver has no immersed boundary; advance() is a no-op");
                }
                None
            }
        };
        IncompNs {
            stepper,
            stats: Stats::default(),
        }
    }
}

struct Stepper {
    poisson: Box<dyn PoissonSolver>,
    imbound: ImBound,
    time_stepping: TimeStepping,
    ip: f64,
    verbose: bool,
    star: [BoundaryConfig; 2],
    corrector: [BoundaryConfig; 2],
    has_history: bool,
}

impl Stepper {
    fn step(&mut self, domain: &mut Domain, scalars: &Scalars) -> FlowResult<Stats> {
        let start = Instant::now();
        let dt = scalars.dt;

        let [star_u, star_v] = &self.star;
        domain.velocity.set_bc(star_u.clone(), star_v.clone());
        mass_balance::update_outflow_bc(&mut domain.velocity, dt);
        domain.velocity.fill_guard_cells()?;
        domain.pressure.fill_guard_cells()?;
        let qin = mass_balance::qin(&domain.velocity);

        let params = PredictorParams {
            dt,
            re: scalars.re,
            ip: self.ip,
            stepping: self.time_stepping,
            has_history: self.has_history,
        };
        operators::predictor(
            &mut domain.velocity,
            &mut domain.history,
            &domain.pressure,
            params,
        )?;
        self.has_history = true;
        domain.velocity.fill_guard_cells()?;

        self.imbound.force_flow(domain, scalars)?;
        domain.velocity.fill_guard_cells()?;

        let qout_star = mass_balance::qout(&domain.velocity);
        let dirichlet_pressure = domain.pressure.bc().has_kind(BoundaryKind::Dirichlet)
            || domain.delp.bc().has_kind(BoundaryKind::Dirichlet);
        if !dirichlet_pressure && qout_star > 0.0 {
            mass_balance::rescale_outflow(&mut domain.velocity, qin / qout_star);
        }
        let qout = mass_balance::qout(&domain.velocity);

        operators::divergence(&domain.velocity, &mut domain.divergence, 1.0 / dt)?;
        let poisson_start = Instant::now();
        let report = self.poisson.solve(&domain.divergence, &mut domain.delp)?;
        let poisson_time = poisson_start.elapsed();

        let [corr_u, corr_v] = &self.corrector;
        domain.velocity.set_bc(corr_u.clone(), corr_v.clone());
        operators::corrector(&mut domain.velocity, &domain.delp, dt)?;
        domain.velocity.fill_guard_cells()?;
        operators::update_pressure(&mut domain.pressure, &domain.delp, self.ip)?;

        operators::divergence(&domain.velocity, &mut domain.divergence, 1.0)?;

        let (u_min, u_max) = domain.velocity.u().interior_min_max();
        let (v_min, v_max) = domain.velocity.v().interior_min_max();
        let (p_min, p_max) = domain.pressure.interior_min_max();
        let (div_min, div_max) = domain.divergence.interior_min_max();
        let stats = Stats {
            u_min,
            u_max,
            v_min,
            v_max,
            p_min,
            p_max,
            div_min,
            div_max,
            poisson_iterations: report.iterations,
            poisson_residual: report.residual,
            qin,
            qout,
            mass_imbalance: (qin - qout).abs(),
            poisson_time,
            step_time: start.elapsed(),
        };
        if self.verbose {
            log::info!(
                "ins: poisson {} iterations (residual {:.3e}) in {:.3?}, div [{:.3e}, {:.3e}]",
                stats.poisson_iterations,
                stats.poisson_residual,
                stats.poisson_time,
                stats.div_min,
                stats.div_max
            );
        }
        Ok(stats)
    }
}

/// Predictor, immersed-boundary forcing, outflow rescale, projection.
///
/// Built without a Poisson backend or an immersed-boundary handle it is a
/// stub: `advance` returns immediately and leaves the domain untouched.
pub struct IncompNs {
    stepper: Option<Stepper>,
    stats: Stats,
}

impl IncompNs {
    pub fn builder(config: &SimulationConfig) -> IncompNsBuilder {
        IncompNsBuilder {
            time_stepping: config.time_stepping,
            pressure_correct: config.pressure_correct,
            verbose: config.verbose,
            poisson: None,
            imbound: None,
        }
    }

    pub fn is_stub(&self) -> bool {
        self.stepper.is_none()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn imbound(&self) -> Option<&ImBound> {
        self.stepper.as_ref().map(|stepper| &stepper.imbound)
    }

    pub fn imbound_mut(&mut self) -> Option<&mut ImBound> {
        self.stepper.as_mut().map(|stepper| &mut stepper.imbound)
    }

    /// Advances the velocity and pressure of `domain` by `scalars.dt`.
    pub fn advance(&mut self, domain: &mut Domain, scalars: &Scalars) -> FlowResult<()> {
        let Some(stepper) = self.stepper.as_mut() else {
            return Ok(());
        };
        self.stats = stepper.step(domain, scalars)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Body, Kinematics};
    use crate::boundary::BoundarySide;
    use crate::config::{IbType, MappingType, PoissonConfig};
    use crate::grid::Bounds;
    use crate::poisson::{solver_from_config, ConjugateGradient};
    use crate::Vec2;

    fn walls() -> BoundaryConfig {
        BoundaryConfig::uniform(BoundarySide::dirichlet(0.0))
    }

    fn channel(nx: usize, ny: usize) -> Domain {
        let mut domain = Domain::new(nx, ny, Bounds::new(0.0, 6.0, 0.0, 2.0)).unwrap();
        domain.velocity.set_bc(
            walls()
                .with(Side::Left, BoundarySide::dirichlet(1.0))
                .with(Side::Right, BoundarySide::outflow(1.0)),
            walls().with(Side::Right, BoundarySide::neumann(0.0)),
        );
        domain.velocity.u_mut().fill(1.0);
        domain.fill_all_guard_cells().unwrap();
        domain
    }

    fn cavity(n: usize) -> Domain {
        let mut domain = Domain::new(n, n, Bounds::new(0.0, 1.0, 0.0, 1.0)).unwrap();
        domain.velocity.set_bc(
            walls().with(Side::Top, BoundarySide::dirichlet(1.0)),
            walls(),
        );
        domain.fill_all_guard_cells().unwrap();
        domain
    }

    fn solver(config: &SimulationConfig, domain: &Domain) -> IncompNs {
        IncompNs::builder(config)
            .poisson(solver_from_config(&config.poisson))
            .imbound(ImBound::stub())
            .build(domain)
    }

    #[test]
    fn missing_collaborators_make_a_stub() {
        let config = SimulationConfig::default();
        let mut domain = cavity(8);
        let before_u = domain.velocity.u().clone();

        let mut no_poisson = IncompNs::builder(&config)
            .imbound(ImBound::stub())
            .build(&domain);
        assert!(no_poisson.is_stub());
        assert!(no_poisson.imbound().is_none());
        no_poisson.advance(&mut domain, &Scalars::default()).unwrap();
        assert_eq!(domain.velocity.u(), &before_u);
        assert_eq!(no_poisson.stats(), Stats::default());

        let no_imbound = IncompNs::builder(&config)
            .poisson(Box::new(ConjugateGradient::new(10, 1e-6)))
            .build(&domain);
        assert!(no_imbound.is_stub());
        assert!(!solver(&config, &domain).is_stub());
    }

    #[test]
    fn corrector_record_opens_outflow_sides() {
        let star = walls()
            .with(Side::Left, BoundarySide::dirichlet(1.0))
            .with(Side::Right, BoundarySide::outflow(0.0))
            .with(Side::Top, BoundarySide::neumann(0.0));
        let bc = corrector_bc(&star, [Side::Left, Side::Right]);
        assert_eq!(bc.kind(Side::Left), BoundaryKind::Dirichlet);
        assert_eq!(bc.kind(Side::Right), BoundaryKind::PassThrough);
        assert_eq!(bc.kind(Side::Top), BoundaryKind::Neumann);
        assert_eq!(bc.kind(Side::Bottom), BoundaryKind::Dirichlet);
    }

    #[test]
    fn channel_conserves_mass_through_outflow() {
        let config = SimulationConfig {
            poisson: PoissonConfig {
                maxiter: 400,
                ..PoissonConfig::default()
            },
            ..SimulationConfig::default()
        };
        let mut domain = channel(120, 40);
        let mut ins = solver(&config, &domain);
        let mut scalars = Scalars::new(0.01, 1.0, 100.0);
        for _ in 0..2 {
            ins.advance(&mut domain, &scalars).unwrap();
            scalars.advance();
            let stats = ins.stats();
            assert!(stats.qin > 0.0);
            assert!(
                stats.mass_imbalance < 1e-10,
                "imbalance {}",
                stats.mass_imbalance
            );
            let u = domain.velocity.u();
            let dy = u.grid().dy();
            let inflow: f64 = (1..=40).map(|j| u.get(0, j) * dy).sum();
            let outflow: f64 = (1..=40).map(|j| u.get(120, j) * dy).sum();
            assert!((inflow - outflow).abs() < 1e-10);
        }
    }

    #[test]
    fn lid_driven_cavity_projects_to_zero_divergence() {
        let config = SimulationConfig::default();
        let mut domain = cavity(40);
        let mut ins = solver(&config, &domain);
        let mut scalars = Scalars::new(0.001, 1.0, 100.0);
        for _ in 0..3 {
            ins.advance(&mut domain, &scalars).unwrap();
            scalars.advance();
            let stats = ins.stats();
            assert!(stats.poisson_iterations > 0);
            assert!(stats.div_max <= 1e-10 && stats.div_min >= -1e-10);
            assert_eq!(stats.qin, 0.0);
        }
        assert!(ins.stats().u_max > 0.0);
    }

    #[test]
    fn ab2_starts_with_an_euler_step() {
        let euler = SimulationConfig {
            time_stepping: TimeStepping::Euler,
            ..SimulationConfig::default()
        };
        let ab2 = SimulationConfig::default();
        let scalars = Scalars::new(0.002, 1.0, 50.0);
        let mut a = cavity(12);
        let mut b = cavity(12);
        let mut ins_a = solver(&euler, &a);
        let mut ins_b = solver(&ab2, &b);
        ins_a.advance(&mut a, &scalars).unwrap();
        ins_b.advance(&mut b, &scalars).unwrap();
        assert_eq!(a.velocity, b.velocity);
        ins_a.advance(&mut a, &scalars).unwrap();
        ins_b.advance(&mut b, &scalars).unwrap();
        assert!(a.velocity.u().max_abs_diff(b.velocity.u()) > 0.0);
    }

    #[test]
    fn rigid_cylinder_forces_channel_flow() {
        let config = SimulationConfig {
            with_ib: true,
            ib_type: IbType::Rigid,
            mapping_type: MappingType::Classical,
            ..SimulationConfig::default()
        };
        let mut domain = channel(48, 16);
        domain
            .phi
            .set_bc(BoundaryConfig::uniform(BoundarySide::projection()));
        let body = Body::circle(Vec2::new(1.5, 1.0), 0.4, 48, Kinematics::Fixed).unwrap();
        let mut imbound = ImBound::new(&config, vec![body]);
        imbound.map_to_grid(&mut domain).unwrap();
        let mut ins = IncompNs::builder(&config)
            .poisson(solver_from_config(&config.poisson))
            .imbound(imbound)
            .build(&domain);
        let scalars = Scalars::new(0.01, 1.0, 100.0);
        ins.advance(&mut domain, &scalars).unwrap();
        let stats = ins.stats();
        assert!(stats.mass_imbalance < 1e-10);
        assert!(ins.imbound().is_some_and(|ib| !ib.is_stub()));
        // face (12, 8) sits at x = 1.5, y = 0.9375 inside the cylinder; the
        // projection only partly restores the stream there.
        let inside = domain.velocity.u().get(12, 8);
        assert!(inside.is_finite() && inside < 0.8, "u inside body = {inside}");
    }
}
