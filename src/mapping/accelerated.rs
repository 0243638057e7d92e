use super::{crosses_ray, SearchReport};
use crate::body::Body;
use crate::{Field2, Vec2};
use rstar::primitives::GeomWithData;
use rstar::RTree;

type Midpoint = GeomWithData<[f64; 2], usize>;

/// Spatial lookup over the edges of one polygon.
///
/// Distances come from the `k` edges whose midpoints are nearest to the query
/// point, so they are approximate. Parity is exact: edges are kept sorted by
/// midpoint height, and an edge can only straddle the ray when its midpoint
/// lies within half the longest panel of the query height.
pub struct EdgeIndex {
    edges: Vec<(Vec2, Vec2)>,
    tree: RTree<Midpoint>,
    by_height: Vec<(f64, usize)>,
    half_span: f64,
}

impl EdgeIndex {
    pub fn new(body: &Body) -> Self {
        let edges: Vec<(Vec2, Vec2)> = body.edges().collect();
        let midpoints = edges
            .iter()
            .enumerate()
            .map(|(k, (a, b))| Midpoint::new(a.midpoint(*b).into(), k))
            .collect();
        let tree = RTree::bulk_load(midpoints);
        let mut by_height: Vec<(f64, usize)> = edges
            .iter()
            .enumerate()
            .map(|(k, (a, b))| (0.5 * (a.y + b.y), k))
            .collect();
        by_height.sort_by(|l, r| l.0.total_cmp(&r.0));
        let half_span = 0.5 * body.max_panel_length();
        Self {
            edges,
            tree,
            by_height,
            half_span,
        }
    }

    /// Returns the approximate distance and the number of edges examined.
    pub fn nearest_distance(&self, p: Vec2, k: usize) -> (f64, usize) {
        let mut dist = f64::INFINITY;
        let mut examined = 0;
        let query: [f64; 2] = p.into();
        for midpoint in self.tree.nearest_neighbor_iter(&query).take(k) {
            let (a, b) = self.edges[midpoint.data];
            dist = dist.min(p.distance_to_segment(a, b));
            examined += 1;
        }
        (dist, examined)
    }

    /// Returns the number of rightward crossings and the number of edges examined.
    pub fn crossings(&self, p: Vec2) -> (usize, usize) {
        let lo = self
            .by_height
            .partition_point(|(mid, _)| *mid < p.y - self.half_span);
        let hi = self
            .by_height
            .partition_point(|(mid, _)| *mid <= p.y + self.half_span);
        let candidates = &self.by_height[lo..hi.max(lo)];
        let count = candidates
            .iter()
            .filter(|(_, k)| {
                let (a, b) = self.edges[*k];
                crosses_ray(p, a, b)
            })
            .count();
        (count, candidates.len())
    }
}

pub fn accelerated_search(body: &Body, phi: &mut Field2, nquery_trees: usize) -> SearchReport {
    let grid = phi.grid();
    let index = EdgeIndex::new(body);
    let k = nquery_trees.max(1);
    let mut iterations = 0;
    let width = grid.width();
    for (n, slot) in phi.data_mut().iter_mut().enumerate() {
        let (x, y) = grid.coords(n % width, n / width);
        let p = Vec2::new(x, y);
        let (dist, near) = index.nearest_distance(p, k);
        let (crossings, traced) = index.crossings(p);
        iterations += near + traced;
        *slot = if crossings % 2 == 1 { -dist } else { dist };
    }
    SearchReport { iterations }
}
