//! Pressure-Poisson backends: `∇²x = b` over interior cells, with guard
//! cells supplied by the solution field's boundary record.

use crate::boundary::{BoundaryKind, Side};
use crate::config::{PoissonConfig, PoissonKind};
use crate::error::FlowResult;
use crate::grid::{Grid2, GridKind};
use crate::Field2;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoissonReport {
    pub iterations: usize,
    /// L2 norm of `b − ∇²x` over interior cells.
    pub residual: f64,
}

pub trait PoissonSolver {
    fn solve(&mut self, rhs: &Field2, solution: &mut Field2) -> FlowResult<PoissonReport>;
}

pub fn solver_from_config(config: &PoissonConfig) -> Box<dyn PoissonSolver> {
    match config.solver {
        PoissonKind::Cg => Box::new(ConjugateGradient::new(config.maxiter, config.tol)),
        PoissonKind::Jacobi => Box::new(Jacobi::new(config.maxiter, config.tol)),
    }
}

/// Five-point Laplacian of `x` into the interior of `out`. Guards of `x`
/// must be current.
fn apply_laplacian_into(x: &Field2, out: &mut Field2) {
    let grid = x.grid();
    let idx2 = 1.0 / (grid.dx() * grid.dx());
    let idy2 = 1.0 / (grid.dy() * grid.dy());
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            let c = x.get(i, j);
            let value = (x.get(i + 1, j) - 2.0 * c + x.get(i - 1, j)) * idx2
                + (x.get(i, j + 1) - 2.0 * c + x.get(i, j - 1)) * idy2;
            out.set(i, j, value);
        }
    }
}

fn pure_neumann(field: &Field2) -> bool {
    field.bc().all_kind(BoundaryKind::Neumann)
}

fn remove_interior_mean(field: &mut Field2) {
    let grid = field.grid();
    let mean = field.interior_sum() / (grid.nx() * grid.ny()) as f64;
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            field.set(i, j, field.get(i, j) - mean);
        }
    }
}

/// Diagonal of `−∇²` after folding in how each side's guard depends on
/// the adjacent interior cell.
fn inverse_diagonal(solution: &Field2) -> Field2 {
    let grid = solution.grid();
    let bc = solution.bc();
    let idx2 = 1.0 / (grid.dx() * grid.dx());
    let idy2 = 1.0 / (grid.dy() * grid.dy());
    let guard_weight = |side: Side| match bc.kind(side) {
        BoundaryKind::Neumann => 1.0,
        BoundaryKind::Dirichlet | BoundaryKind::Outflow => -1.0,
        BoundaryKind::Projection => 2.0,
        BoundaryKind::Periodic | BoundaryKind::PassThrough => 0.0,
    };
    let (nx, ny) = (grid.nx(), grid.ny());
    let mut inv = Field2::new("inv_diag", grid, 0.0);
    for j in grid.interior_j() {
        for i in grid.interior_i() {
            let mut diag = 2.0 * idx2 + 2.0 * idy2;
            if i == 1 {
                diag -= guard_weight(Side::Left) * idx2;
            }
            if i == nx {
                diag -= guard_weight(Side::Right) * idx2;
            }
            if j == 1 {
                diag -= guard_weight(Side::Bottom) * idy2;
            }
            if j == ny {
                diag -= guard_weight(Side::Top) * idy2;
            }
            inv.set(i, j, if diag > 0.0 { 1.0 / diag } else { 0.0 });
        }
    }
    inv
}

struct CgScratch {
    grid: Grid2,
    inv_diag: Field2,
    r: Field2,
    z: Field2,
    p: Field2,
    ap: Field2,
}

impl CgScratch {
    fn new(solution: &Field2) -> Self {
        let grid = solution.grid();
        Self {
            grid,
            inv_diag: inverse_diagonal(solution),
            r: Field2::new("r", grid, 0.0),
            z: Field2::new("z", grid, 0.0),
            p: Field2::new("p", grid, 0.0).with_bc(solution.bc().homogeneous()),
            ap: Field2::new("ap", grid, 0.0),
        }
    }

    fn precondition(&mut self) -> f64 {
        let grid = self.grid;
        let mut rz = 0.0;
        for j in grid.interior_j() {
            for i in grid.interior_i() {
                let z = self.r.get(i, j) * self.inv_diag.get(i, j);
                self.z.set(i, j, z);
                rz += z * self.r.get(i, j);
            }
        }
        rz
    }
}

/// Jacobi-preconditioned conjugate gradients on `−∇²`.
///
/// The starting residual uses the real boundary values of `solution`;
/// search directions use the homogeneous version of the same record.
pub struct ConjugateGradient {
    maxiter: usize,
    tol: f64,
    scratch: Option<CgScratch>,
}

impl ConjugateGradient {
    pub fn new(maxiter: usize, tol: f64) -> Self {
        Self {
            maxiter,
            tol,
            scratch: None,
        }
    }
}

impl PoissonSolver for ConjugateGradient {
    fn solve(&mut self, rhs: &Field2, solution: &mut Field2) -> FlowResult<PoissonReport> {
        solution.require_kind(GridKind::Cell)?;
        let grid = solution.grid();
        let fresh = match &self.scratch {
            Some(scratch) => {
                scratch.grid != grid || scratch.p.bc() != &solution.bc().homogeneous()
            }
            None => true,
        };
        if fresh {
            self.scratch = Some(CgScratch::new(solution));
        }
        let Some(s) = self.scratch.as_mut() else {
            return Ok(PoissonReport::default());
        };

        solution.fill_guard_cells()?;
        apply_laplacian_into(solution, &mut s.ap);
        s.r.fill(0.0);
        for j in grid.interior_j() {
            for i in grid.interior_i() {
                s.r.set(i, j, rhs.get(i, j) - s.ap.get(i, j));
            }
        }
        if pure_neumann(solution) {
            remove_interior_mean(&mut s.r);
        }

        let mut residual = s.r.interior_dot(&s.r).sqrt();
        let mut iterations = 0;
        if residual <= self.tol {
            return Ok(PoissonReport {
                iterations,
                residual,
            });
        }
        let mut rz_old = s.precondition();
        s.p.copy_from(&s.z);
        while iterations < self.maxiter {
            iterations += 1;
            s.p.fill_guard_cells()?;
            apply_laplacian_into(&s.p, &mut s.ap);
            // p is built from b − ∇²x, the negated residual of −∇²x = −b.
            let denom = -s.p.interior_dot(&s.ap);
            if denom.abs() < 1e-300 {
                break;
            }
            let alpha = rz_old / denom;
            for j in grid.interior_j() {
                for i in grid.interior_i() {
                    solution.set(i, j, solution.get(i, j) - alpha * s.p.get(i, j));
                    s.r.set(i, j, s.r.get(i, j) + alpha * s.ap.get(i, j));
                }
            }
            residual = s.r.interior_dot(&s.r).sqrt();
            if residual <= self.tol {
                break;
            }
            let rz_new = s.precondition();
            let beta = rz_new / rz_old;
            for j in grid.interior_j() {
                for i in grid.interior_i() {
                    s.p.set(i, j, s.z.get(i, j) + beta * s.p.get(i, j));
                }
            }
            rz_old = rz_new;
        }
        solution.fill_guard_cells()?;
        log::debug!("poisson cg: {iterations} iterations, residual {residual:.3e}");
        Ok(PoissonReport {
            iterations,
            residual,
        })
    }
}

/// Point Jacobi relaxation; slow but dependency-free of any Krylov state.
pub struct Jacobi {
    maxiter: usize,
    tol: f64,
}

impl Jacobi {
    pub fn new(maxiter: usize, tol: f64) -> Self {
        Self { maxiter, tol }
    }
}

impl PoissonSolver for Jacobi {
    fn solve(&mut self, rhs: &Field2, solution: &mut Field2) -> FlowResult<PoissonReport> {
        solution.require_kind(GridKind::Cell)?;
        let grid = solution.grid();
        let mut b = rhs.clone();
        if pure_neumann(solution) {
            remove_interior_mean(&mut b);
        }
        let idx2 = 1.0 / (grid.dx() * grid.dx());
        let idy2 = 1.0 / (grid.dy() * grid.dy());
        let diag = 2.0 * idx2 + 2.0 * idy2;
        let mut lap = Field2::new("lap", grid, 0.0);
        let mut next = solution.clone();
        let mut iterations = 0;
        let mut residual = f64::INFINITY;
        solution.fill_guard_cells()?;
        while iterations < self.maxiter {
            apply_laplacian_into(solution, &mut lap);
            let mut sum_sq = 0.0;
            for j in grid.interior_j() {
                for i in grid.interior_i() {
                    let r = b.get(i, j) - lap.get(i, j);
                    sum_sq += r * r;
                    next.set(i, j, solution.get(i, j) - r / diag);
                }
            }
            residual = sum_sq.sqrt();
            if residual <= self.tol {
                break;
            }
            iterations += 1;
            solution.copy_from(&next);
            solution.fill_guard_cells()?;
        }
        Ok(PoissonReport {
            iterations,
            residual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryConfig, BoundarySide};
    use crate::grid::Bounds;
    use std::f64::consts::PI;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn grid(n: usize) -> Grid2 {
        Grid2::new(GridKind::Cell, n, n, Bounds::new(0.0, 1.0, 0.0, 1.0)).unwrap()
    }

    fn residual_of(rhs: &Field2, x: &Field2) -> f64 {
        let mut lap = Field2::new("lap", x.grid(), 0.0);
        apply_laplacian_into(x, &mut lap);
        let grid = x.grid();
        let mut worst: f64 = 0.0;
        for j in grid.interior_j() {
            for i in grid.interior_i() {
                worst = worst.max((rhs.get(i, j) - lap.get(i, j)).abs());
            }
        }
        worst
    }

    #[test]
    fn cg_solves_neumann_problem() {
        let grid = grid(24);
        let rhs = Field2::from_fn("divv", grid, |i, j| {
            let (x, y) = grid.coords(i, j);
            (2.0 * PI * x).cos() * (PI * y).cos()
        });
        let mut x = Field2::new("delp", grid, 0.0);
        let mut solver = ConjugateGradient::new(2000, 1e-10);
        let report = solver.solve(&rhs, &mut x).unwrap();
        assert!(report.iterations > 0 && report.iterations < 2000);
        assert!(report.residual <= 1e-10);
        assert!(residual_of(&rhs, &x) < 1e-9);
        assert!(x.require_guards("check").is_ok());
    }

    #[test]
    fn cg_honours_dirichlet_values() {
        let grid = grid(16);
        let rhs = Field2::new("divv", grid, 0.0);
        let mut x = Field2::new("pres", grid, 0.0)
            .with_bc(BoundaryConfig::uniform(BoundarySide::dirichlet(1.5)));
        let mut solver = ConjugateGradient::new(2000, 1e-11);
        solver.solve(&rhs, &mut x).unwrap();
        for j in grid.interior_j() {
            for i in grid.interior_i() {
                assert_close(x.get(i, j), 1.5, 1e-9);
            }
        }
    }

    #[test]
    fn jacobi_and_cg_agree_on_mixed_boundaries() {
        let grid = grid(8);
        let bc = BoundaryConfig::default().with(Side::Right, BoundarySide::dirichlet(0.0));
        let rhs = Field2::from_fn("divv", grid, |i, j| (i as f64 - 4.0) * 0.3 + j as f64 * 0.1);
        let mut a = Field2::new("delp", grid, 0.0).with_bc(bc.clone());
        let mut b = Field2::new("delp", grid, 0.0).with_bc(bc);
        ConjugateGradient::new(500, 1e-12).solve(&rhs, &mut a).unwrap();
        let report = Jacobi::new(20000, 1e-10).solve(&rhs, &mut b).unwrap();
        assert!(report.residual <= 1e-10);
        for j in grid.interior_j() {
            for i in grid.interior_i() {
                assert_close(a.get(i, j), b.get(i, j), 1e-8);
            }
        }
    }

    #[test]
    fn boxed_solver_follows_config() {
        let grid = grid(6);
        let rhs = Field2::new("divv", grid, 0.0);
        let mut x = Field2::new("delp", grid, 0.0);
        let mut solver = solver_from_config(&PoissonConfig::default());
        let report = solver.solve(&rhs, &mut x).unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(report.residual, 0.0);
    }
}
