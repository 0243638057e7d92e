use super::{crosses_ray, SearchReport};
use crate::body::Body;
use crate::{Field2, Vec2};

/// Brute force over every (point, edge) pair.
pub fn classical_search(body: &Body, phi: &mut Field2) -> SearchReport {
    let grid = phi.grid();
    let edges: Vec<(Vec2, Vec2)> = body.edges().collect();
    phi.fill_with_index(|i, j| {
        let (x, y) = grid.coords(i, j);
        let p = Vec2::new(x, y);
        let mut dist = f64::INFINITY;
        let mut crossings = 0usize;
        for &(a, b) in &edges {
            dist = dist.min(p.distance_to_segment(a, b));
            if crosses_ray(p, a, b) {
                crossings += 1;
            }
        }
        if crossings % 2 == 1 {
            -dist
        } else {
            dist
        }
    });
    SearchReport {
        iterations: grid.size() * edges.len(),
    }
}
