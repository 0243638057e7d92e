use crate::boundary::{BoundaryKind, Side};
use crate::config::ConfigError;
use crate::grid::GridKind;
use thiserror::Error;

pub type FlowResult<T> = Result<T, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("grid must have at least 2x2 interior cells, got {nx}x{ny}")]
    GridTooSmall { nx: usize, ny: usize },

    #[error("invalid domain extent [{min}, {max}] along {axis}")]
    InvalidExtent { axis: char, min: f64, max: f64 },

    #[error("unknown grid kind `{0}`")]
    UnknownGridKind(String),

    #[error("unknown boundary kind `{0}`")]
    UnknownBoundaryKind(String),

    #[error("{kind:?} boundary is not supported on the {side:?} side of a {grid:?} grid")]
    UnsupportedBoundary {
        kind: BoundaryKind,
        side: Side,
        grid: GridKind,
    },

    #[error("boundary profile on the {side:?} side has {provided} values, expected {expected}")]
    ProfileLength {
        side: Side,
        provided: usize,
        expected: usize,
    },

    #[error("field `{name}` has stale guard cells; refill before {operation}")]
    StaleGuards {
        name: &'static str,
        operation: &'static str,
    },

    #[error("field `{name}` lives on a {found:?} grid, expected {expected:?}")]
    GridMismatch {
        name: &'static str,
        expected: GridKind,
        found: GridKind,
    },

    #[error("polygon needs at least 3 points, got {0}")]
    DegeneratePolygon(usize),

    #[error("failed to build search worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FlowError {
    pub fn stale(name: &'static str, operation: &'static str) -> Self {
        Self::StaleGuards { name, operation }
    }
}
