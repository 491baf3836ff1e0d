//! Bucketed spatial index for "nearest living X" queries.
//!
//! Rebuilt once per step from agent positions. Entries are candidates only:
//! callers re-check aliveness and exact distance against the arena.

use crate::agents::{AgentId, AgentKind};
use crate::habitat::Point;

/// Spatial index over a `width x height` area split into square buckets
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    cell_size: f64,
    cols: usize,
    rows: usize,
    /// cells[row][col] holds the agents whose position fell in that bucket
    cells: Vec<Vec<Vec<(AgentId, AgentKind)>>>,
}

impl SpatialIndex {
    /// Create an index covering `[0, width] x [0, height]`
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            10.0
        };
        let cols = ((width.max(cell_size) / cell_size).ceil() as usize).max(1);
        let rows = ((height.max(cell_size) / cell_size).ceil() as usize).max(1);

        Self {
            cell_size,
            cols,
            rows,
            cells: vec![vec![Vec::new(); cols]; rows],
        }
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        for row in &mut self.cells {
            for cell in row {
                cell.clear();
            }
        }
    }

    #[inline]
    fn bucket(&self, point: Point) -> (usize, usize) {
        let col = (point.x / self.cell_size).floor();
        let row = (point.y / self.cell_size).floor();
        let col = if col.is_finite() { col.max(0.0) as usize } else { 0 };
        let row = if row.is_finite() { row.max(0.0) as usize } else { 0 };
        (col.min(self.cols - 1), row.min(self.rows - 1))
    }

    /// Insert an agent at the given position
    #[inline]
    pub fn insert(&mut self, point: Point, id: AgentId, kind: AgentKind) {
        let (col, row) = self.bucket(point);
        self.cells[row][col].push((id, kind));
    }

    /// Candidates of one kind in every bucket overlapping the query circle
    pub fn query_radius(&self, center: Point, radius: f64, kind: AgentKind) -> Vec<AgentId> {
        let mut results = Vec::new();
        let radius = radius.max(0.0);

        let (col_min, row_min) = self.bucket(center.offset(-radius, -radius));
        let (col_max, row_max) = self.bucket(center.offset(radius, radius));

        for row in row_min..=row_max {
            for col in col_min..=col_max {
                results.extend(
                    self.cells[row][col]
                        .iter()
                        .filter(|(_, k)| *k == kind)
                        .map(|(id, _)| *id),
                );
            }
        }

        results
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.cells.iter().flatten().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
