use super::SearchReport;
use crate::body::Body;
use crate::error::FlowResult;
use crate::grid::Grid2;
use crate::Field2;
use geo::{Contains, Coord, EuclideanDistance, LineString, Point, Polygon};
use rayon::prelude::*;
use rayon::ThreadPool;

fn body_polygon(body: &Body) -> Polygon<f64> {
    let ring: LineString<f64> = body
        .points()
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    Polygon::new(ring, Vec::new())
}

fn fill_block(grid: Grid2, polygon: &Polygon<f64>, first_row: usize, block: &mut [f64]) {
    let width = grid.width();
    for (n, slot) in block.iter_mut().enumerate() {
        let (x, y) = grid.coords(n % width, first_row + n / width);
        let p = Point::new(x, y);
        let dist = p.euclidean_distance(polygon.exterior());
        *slot = if polygon.contains(&p) { -dist } else { dist };
    }
}

/// Ground-truth search through `geo`: polygon containment for the sign and
/// exact distance to the exterior ring. Row blocks are independent; when a
/// pool is given they are spread over its threads.
pub fn polygon_search(
    body: &Body,
    phi: &mut Field2,
    pool: Option<&ThreadPool>,
) -> FlowResult<SearchReport> {
    let grid = phi.grid();
    let polygon = body_polygon(body);
    let nedges = body.points().len();
    let width = grid.width();
    let data = phi.data_mut();
    match pool {
        Some(pool) => {
            let rows_per_block = grid.height().div_ceil(pool.current_num_threads().max(1));
            pool.install(|| {
                data.par_chunks_mut(rows_per_block * width)
                    .enumerate()
                    .for_each(|(block, rows)| {
                        fill_block(grid, &polygon, block * rows_per_block, rows);
                    });
            });
        }
        None => fill_block(grid, &polygon, 0, data),
    }
    Ok(SearchReport {
        iterations: grid.size() * nedges,
    })
}
