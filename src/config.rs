use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IbType {
    #[default]
    Rigid,
    Visco,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
    Classical,
    #[default]
    #[serde(alias = "ann")]
    Accelerated,
    #[serde(alias = "shapely")]
    Polygon,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeStepping {
    Euler,
    #[default]
    Ab2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoissonKind {
    #[default]
    Cg,
    Jacobi,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoissonConfig {
    #[serde(default)]
    pub solver: PoissonKind,
    #[serde(default = "default_maxiter")]
    pub maxiter: usize,
    #[serde(default = "default_tol")]
    pub tol: f64,
}

impl Default for PoissonConfig {
    fn default() -> Self {
        Self {
            solver: PoissonKind::default(),
            maxiter: default_maxiter(),
            tol: default_tol(),
        }
    }
}

/// Options consumed by the immersed-boundary and integrator stages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    #[serde(default)]
    pub with_ib: bool,
    #[serde(default)]
    pub ib_type: IbType,
    #[serde(default)]
    pub mapping_type: MappingType,
    /// Redistancing sweeps after each interface advection.
    #[serde(default = "default_lset_redistance")]
    pub lset_redistance: usize,
    /// Pseudo-time sweeps for every extrapolation pass.
    #[serde(default = "default_extrap_solid")]
    pub extrap_solid: usize,
    #[serde(default)]
    pub time_stepping: TimeStepping,
    #[serde(default = "default_true")]
    pub pressure_correct: bool,
    /// Nearest edges examined by the accelerated search.
    #[serde(default = "default_nquery_trees")]
    pub nquery_trees: usize,
    #[serde(default = "default_nthreads")]
    pub nthreads: usize,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub poisson: PoissonConfig,
}

fn default_lset_redistance() -> usize {
    3
}

fn default_extrap_solid() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_nquery_trees() -> usize {
    2
}

fn default_nthreads() -> usize {
    1
}

fn default_maxiter() -> usize {
    2000
}

fn default_tol() -> f64 {
    1e-9
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            with_ib: false,
            ib_type: IbType::default(),
            mapping_type: MappingType::default(),
            lset_redistance: default_lset_redistance(),
            extrap_solid: default_extrap_solid(),
            time_stepping: TimeStepping::default(),
            pressure_correct: true,
            nquery_trees: default_nquery_trees(),
            nthreads: default_nthreads(),
            verbose: false,
            poisson: PoissonConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nquery_trees == 0 {
            return Err(ConfigError::invalid("nquery_trees", "must be at least 1"));
        }
        if self.nthreads == 0 {
            return Err(ConfigError::invalid("nthreads", "must be at least 1"));
        }
        if self.poisson.maxiter == 0 {
            return Err(ConfigError::invalid("poisson.maxiter", "must be at least 1"));
        }
        if !(self.poisson.tol > 0.0 && self.poisson.tol.is_finite()) {
            return Err(ConfigError::invalid(
                "poisson.tol",
                format!("must be positive and finite, got {}", self.poisson.tol),
            ));
        }
        Ok(())
    }
}
