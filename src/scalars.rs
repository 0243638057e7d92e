/// Time-stepping state and nondimensional groups shared by every stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scalars {
    pub dt: f64,
    pub time: f64,
    pub tmax: f64,
    pub nstep: usize,
    /// Fluid Reynolds number.
    pub re: f64,
    /// Solid Reynolds number of the viscoelastic body.
    pub re_s: f64,
    /// Solid-to-fluid viscosity ratio.
    pub mu_s: f64,
}

impl Default for Scalars {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            time: 0.0,
            tmax: 1.0,
            nstep: 0,
            re: 100.0,
            re_s: 10.0,
            mu_s: 1.0,
        }
    }
}

impl Scalars {
    pub fn new(dt: f64, tmax: f64, re: f64) -> Self {
        Self {
            dt,
            tmax,
            re,
            ..Self::default()
        }
    }

    pub fn advance(&mut self) {
        self.time += self.dt;
        self.nstep += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.time >= self.tmax - 0.5 * self.dt
    }
}
