use anyhow::{Context, Result};
use ib_flow_sim::{
    poisson, Body, BoundaryConfig, BoundarySide, Bounds, Domain, ImBound, IncompNs, Kinematics,
    MacVelocity2, Scalars, Side, SimulationConfig, Stats, Vec2,
};

#[derive(Clone, Copy, Debug)]
struct ChannelSetup {
    nx: usize,
    ny: usize,
    bounds: Bounds,
    inflow: f64,
    cylinder_center: Vec2,
    cylinder_radius: f64,
    cylinder_points: usize,
}

impl ChannelSetup {
    fn new() -> Self {
        Self {
            nx: 160,
            ny: 40,
            bounds: Bounds::new(0.0, 8.0, 0.0, 2.0),
            inflow: 1.0,
            cylinder_center: Vec2::new(2.0, 1.0),
            cylinder_radius: 0.25,
            cylinder_points: 80,
        }
    }
}

fn load_config() -> Result<SimulationConfig> {
    match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_path(&path)
            .with_context(|| format!("loading simulation config from {path}")),
        None => Ok(SimulationConfig {
            with_ib: true,
            ..SimulationConfig::default()
        }),
    }
}

fn init_domain(setup: ChannelSetup) -> Result<Domain> {
    let mut domain = Domain::new(setup.nx, setup.ny, setup.bounds)?;
    let walls = BoundaryConfig::uniform(BoundarySide::dirichlet(0.0));
    domain.velocity.set_bc(
        walls
            .clone()
            .with(Side::Left, BoundarySide::dirichlet(setup.inflow))
            .with(Side::Right, BoundarySide::outflow(setup.inflow)),
        walls.with(Side::Right, BoundarySide::neumann(0.0)),
    );
    let outlet = BoundaryConfig::default().with(Side::Right, BoundarySide::dirichlet(0.0));
    domain.pressure.set_bc(outlet.clone());
    domain.delp.set_bc(outlet);
    domain
        .phi
        .set_bc(BoundaryConfig::uniform(BoundarySide::projection()));
    domain.velocity.u_mut().fill(setup.inflow);
    domain.fill_all_guard_cells()?;
    Ok(domain)
}

fn cfl_number(velocity: &MacVelocity2, dt: f64) -> f64 {
    let (umin, umax) = velocity.u().interior_min_max();
    let (vmin, vmax) = velocity.v().interior_min_max();
    let grid = velocity.u().grid();
    let umag = umin.abs().max(umax.abs());
    let vmag = vmin.abs().max(vmax.abs());
    dt * (umag / grid.dx() + vmag / grid.dy())
}

fn log_stats(scalars: &Scalars, stats: &Stats, cfl: f64) {
    log::info!(
        "step {:5} t={:.4} cfl={:.3} | u [{:.4}, {:.4}] v [{:.4}, {:.4}] p [{:.4}, {:.4}]",
        scalars.nstep,
        scalars.time,
        cfl,
        stats.u_min,
        stats.u_max,
        stats.v_min,
        stats.v_max,
        stats.p_min,
        stats.p_max
    );
    log::info!(
        "            div [{:.3e}, {:.3e}] poisson {} it res {:.3e} | qin {:.5} qout {:.5} | {:.3?}",
        stats.div_min,
        stats.div_max,
        stats.poisson_iterations,
        stats.poisson_residual,
        stats.qin,
        stats.qout,
        stats.step_time
    );
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = load_config()?;
    config.validate()?;
    let setup = ChannelSetup::new();
    let mut domain = init_domain(setup)?;

    let cylinder = Body::circle(
        setup.cylinder_center,
        setup.cylinder_radius,
        setup.cylinder_points,
        Kinematics::Fixed,
    )?;
    let mut imbound = ImBound::new(&config, vec![cylinder]);
    imbound.map_to_grid(&mut domain)?;

    let mut ins = IncompNs::builder(&config)
        .poisson(poisson::solver_from_config(&config.poisson))
        .imbound(imbound)
        .build(&domain);
    if ins.is_stub() {
        anyhow::bail!("incompressible solver is not fully wired");
    }

    let mut scalars = Scalars::new(0.005, 2.0, 100.0);
    log::info!(
        "channel {}x{} dx={:.4} re={} dt={} tmax={} ib={:?} mapping={:?}",
        setup.nx,
        setup.ny,
        domain.cell_grid().dx(),
        scalars.re,
        scalars.dt,
        scalars.tmax,
        config.ib_type,
        config.mapping_type
    );
    while !scalars.is_finished() {
        if let Some(imbound) = ins.imbound_mut().filter(|imbound| imbound.is_rigid()) {
            imbound.advance_bodies(scalars.time);
            imbound.map_to_grid(&mut domain)?;
        }
        ins.advance(&mut domain, &scalars)?;
        if let Some(imbound) = ins.imbound_mut() {
            imbound.advect(&mut domain, &scalars)?;
        }
        scalars.advance();
        log_stats(
            &scalars,
            &ins.stats(),
            cfl_number(&domain.velocity, scalars.dt),
        );
    }
    Ok(())
}
