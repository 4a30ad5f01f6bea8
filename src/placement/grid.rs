use std::collections::{HashMap, HashSet};

use super::types::Point;

/// Widest run of cells a circle may cover on one axis before it is kept in
/// the linear overflow list instead.
const MAX_CELL_SPAN: f32 = 64.0;

/// Uniform spatial hash over circles, used to keep candidate collision checks
/// local instead of scanning every placed label.
pub(crate) struct SpatialGrid {
    cell: f32,
    /// Maps grid cell (ix, iy) to indices into the caller's circle list.
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Circles too large (or with a non-finite extent) to hash. Every query
    /// sees them.
    overflow: Vec<usize>,
}

enum Span {
    Cells(i32, i32, i32, i32),
    Everything,
    Nothing,
}

impl SpatialGrid {
    pub(crate) fn new(cell: f32) -> Self {
        let cell = if cell.is_finite() { cell.max(8.0) } else { 8.0 };
        Self {
            cell,
            cells: HashMap::new(),
            overflow: Vec::new(),
        }
    }

    fn span(&self, center: Point, reach: f32) -> Span {
        if !center.is_finite() {
            return Span::Nothing;
        }
        let reach = reach.max(0.0);
        let x0 = ((center.x - reach) / self.cell).floor();
        let y0 = ((center.y - reach) / self.cell).floor();
        let x1 = ((center.x + reach) / self.cell).floor();
        let y1 = ((center.y + reach) / self.cell).floor();
        let in_range = |v: f32| v.is_finite() && v.abs() < i32::MAX as f32 / 2.0;
        if !(in_range(x0) && in_range(y0) && in_range(x1) && in_range(y1))
            || x1 - x0 >= MAX_CELL_SPAN
            || y1 - y0 >= MAX_CELL_SPAN
        {
            return Span::Everything;
        }
        Span::Cells(x0 as i32, y0 as i32, x1 as i32, y1 as i32)
    }

    /// Register the circle at `idx` under every cell its bounding box touches.
    pub(crate) fn insert(&mut self, idx: usize, center: Point, radius: f32) {
        match self.span(center, radius) {
            Span::Cells(x0, y0, x1, y1) => {
                for ix in x0..=x1 {
                    for iy in y0..=y1 {
                        self.cells.entry((ix, iy)).or_default().push(idx);
                    }
                }
            }
            Span::Everything => self.overflow.push(idx),
            Span::Nothing => {}
        }
    }

    /// Indices of circles whose bounding box could lie within `reach` of `center`.
    pub(crate) fn query(&self, center: Point, reach: f32) -> impl Iterator<Item = usize> + '_ {
        let hashed: Box<dyn Iterator<Item = usize> + '_> = match self.span(center, reach) {
            Span::Cells(x0, y0, x1, y1) => Box::new(
                (x0..=x1)
                    .flat_map(move |ix| (y0..=y1).map(move |iy| (ix, iy)))
                    .flat_map(move |key| {
                        self.cells
                            .get(&key)
                            .map(|v| v.as_slice())
                            .unwrap_or(&[])
                            .iter()
                            .copied()
                    }),
            ),
            Span::Everything => Box::new(self.cells.values().flatten().copied()),
            Span::Nothing => Box::new(std::iter::empty()),
        };
        let mut seen = HashSet::new();
        self.overflow
            .iter()
            .copied()
            .chain(hashed)
            .filter(move |idx| seen.insert(*idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_finds_nearby_circle() {
        let mut grid = SpatialGrid::new(50.0);
        grid.insert(0, Point::new(20.0, 20.0), 10.0);
        let hits: Vec<usize> = grid.query(Point::new(35.0, 20.0), 8.0).collect();
        assert!(hits.contains(&0), "grid should find the overlapping circle");
    }

    #[test]
    fn query_misses_distant_circle() {
        let mut grid = SpatialGrid::new(50.0);
        grid.insert(0, Point::new(20.0, 20.0), 10.0);
        let hits: Vec<usize> = grid.query(Point::new(400.0, 400.0), 8.0).collect();
        assert!(hits.is_empty(), "grid should not find a distant circle");
    }

    #[test]
    fn query_reports_each_index_once() {
        let mut grid = SpatialGrid::new(10.0);
        grid.insert(3, Point::new(0.0, 0.0), 25.0);
        let hits: Vec<usize> = grid.query(Point::new(0.0, 0.0), 25.0).collect();
        assert_eq!(hits, vec![3]);
    }

    #[test]
    fn huge_and_infinite_circles_skip_the_hash() {
        let mut grid = SpatialGrid::new(50.0);
        grid.insert(0, Point::new(0.0, 0.0), f32::INFINITY);
        grid.insert(1, Point::new(10.0, 10.0), 1.0e6);
        grid.insert(2, Point::new(900.0, 900.0), 5.0);
        assert!(grid.cells.values().flatten().all(|idx| *idx == 2));

        let mut near: Vec<usize> = grid.query(Point::new(-4000.0, 0.0), 5.0).collect();
        near.sort_unstable();
        assert_eq!(near, vec![0, 1]);
    }

    #[test]
    fn unbounded_query_sees_every_circle() {
        let mut grid = SpatialGrid::new(50.0);
        grid.insert(4, Point::new(0.0, 0.0), 5.0);
        grid.insert(7, Point::new(5000.0, -5000.0), 5.0);
        let mut hits: Vec<usize> = grid.query(Point::new(0.0, 0.0), f32::INFINITY).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![4, 7]);
        assert_eq!(grid.query(Point::new(f32::NAN, 0.0), 5.0).count(), 0);
    }

    #[test]
    fn circles_spanning_negative_cells_are_found() {
        let mut grid = SpatialGrid::new(50.0);
        grid.insert(1, Point::new(-5.0, -5.0), 2.0);
        let hits: Vec<usize> = grid.query(Point::new(1.0, 1.0), 10.0).collect();
        assert_eq!(hits, vec![1]);
    }
}
