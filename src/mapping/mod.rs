//! Signed distance from a body polygon to every point of a cell-centered grid.
//!
//! All strategies share one convention: φ < 0 inside the polygon and |φ| is
//! the distance to the nearest edge.

mod accelerated;
mod classical;
mod polygon;

pub use accelerated::{accelerated_search, EdgeIndex};
pub use classical::classical_search;
pub use polygon::polygon_search;

use crate::body::Body;
use crate::config::{MappingType, SimulationConfig};
use crate::error::FlowResult;
use crate::{Field2, Vec2};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub nquery_trees: usize,
    pub nthreads: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for SearchOptions {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            nquery_trees: config.nquery_trees,
            nthreads: config.nthreads,
        }
    }
}

/// Worker pool for the polygon search, built on first use and shared by
/// clones. Its size is fixed by the first `nthreads` it sees.
#[derive(Clone, Debug, Default)]
pub struct SearchPool {
    pool: Arc<OnceLock<ThreadPool>>,
}

impl SearchPool {
    /// Returns `None` for serial searches.
    pub fn get(&self, nthreads: usize) -> FlowResult<Option<&ThreadPool>> {
        if nthreads <= 1 {
            return Ok(None);
        }
        if self.pool.get().is_none() {
            let pool = ThreadPoolBuilder::new().num_threads(nthreads).build()?;
            log::debug!("built polygon search pool with {nthreads} threads");
            let _ = self.pool.set(pool);
        }
        Ok(self.pool.get())
    }
}

/// Number of point/edge evaluations performed by one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchReport {
    pub iterations: usize,
}

pub fn search(
    mapping: MappingType,
    body: &Body,
    phi: &mut Field2,
    options: &SearchOptions,
    pool: &SearchPool,
) -> FlowResult<SearchReport> {
    match mapping {
        MappingType::Classical => Ok(classical_search(body, phi)),
        MappingType::Accelerated => Ok(accelerated_search(body, phi, options.nquery_trees)),
        MappingType::Polygon => polygon_search(body, phi, pool.get(options.nthreads)?),
    }
}

/// Half-open rule: an edge counts when `p.y` lies in `[ymin, ymax)` and the
/// crossing is at or to the right of `p.x`.
pub(crate) fn crosses_ray(p: Vec2, a: Vec2, b: Vec2) -> bool {
    let spans = (a.y <= p.y && p.y < b.y) || (b.y <= p.y && p.y < a.y);
    if !spans {
        return false;
    }
    let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
    x_cross >= p.x
}
