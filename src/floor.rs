//! Floor grid drawn around the reconstruction volume

use crate::error::SceneError;
use ndarray::{s, Array2, ArrayView2};
use std::ops::Range;

/// Height of the grid above the ground plane
pub const FLOOR_Z_OFFSET: i32 = 3;

/// Divisions used by the scene at startup
pub const DEFAULT_DIVISIONS: i32 = 4;

/// Four polylines outlining the square floor of the reconstruction volume
///
/// All points live in one `N x 3` array (x, y, z per row); each polyline is a
/// contiguous row range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorGrid {
    points: Array2<i32>,
    edges: [Range<usize>; 4],
    spacing: i32,
}

impl FloorGrid {
    /// Build the grid for a volume `reconstruction_width` wide
    ///
    /// Points are spaced `reconstruction_width / (2 * divisions)` apart
    /// (integer division) and the square spans +/- `spacing * divisions`.
    /// Edges, in order: x = -e (y ascending), y = +e (x ascending),
    /// x = +e (y ascending), y = -e (x ascending).
    pub fn build(reconstruction_width: i32, divisions: i32) -> Result<Self, SceneError> {
        if divisions <= 0 {
            return Err(SceneError::InvalidGrid(format!(
                "divisions must be positive, got {divisions}"
            )));
        }
        let spacing = (reconstruction_width / 2) / divisions;
        if spacing <= 0 {
            return Err(SceneError::InvalidGrid(format!(
                "width {reconstruction_width} too small for {divisions} divisions"
            )));
        }
        let extent = spacing * divisions;
        let per_edge = (2 * divisions + 1) as usize;

        let steps: Vec<i32> = (0..per_edge as i32).map(|k| -extent + k * spacing).collect();
        let mut points = Array2::<i32>::zeros((4 * per_edge, 3));

        for (edge, fixed) in [(0, -extent), (1, extent), (2, extent), (3, -extent)] {
            for (k, &step) in steps.iter().enumerate() {
                let row = edge * per_edge + k;
                // edges 0 and 2 run along y, edges 1 and 3 along x
                let (x, y) = if edge % 2 == 0 { (fixed, step) } else { (step, fixed) };
                points[[row, 0]] = x;
                points[[row, 1]] = y;
                points[[row, 2]] = FLOOR_Z_OFFSET;
            }
        }

        let edges = [
            0..per_edge,
            per_edge..2 * per_edge,
            2 * per_edge..3 * per_edge,
            3 * per_edge..4 * per_edge,
        ];

        tracing::debug!(
            "Floor grid: spacing {}, extent {}, {} points",
            spacing,
            extent,
            points.nrows()
        );

        Ok(Self {
            points,
            edges,
            spacing,
        })
    }

    /// Distance between neighbouring points
    pub fn spacing(&self) -> i32 {
        self.spacing
    }

    /// Points of polyline `index` (0..4) as an `n x 3` view
    pub fn edge(&self, index: usize) -> Option<ArrayView2<'_, i32>> {
        let rows = self.edges.get(index)?.clone();
        Some(self.points.slice(s![rows, ..]))
    }

    /// Points of polyline `index` as `[x, y, z]` triples
    pub fn edge_points(&self, index: usize) -> Option<Vec<[i32; 3]>> {
        let edge = self.edge(index)?;
        Some(edge.rows().into_iter().map(|r| [r[0], r[1], r[2]]).collect())
    }

    /// Every point of the grid, polyline after polyline
    pub fn points(&self) -> ArrayView2<'_, i32> {
        self.points.view()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_shape() {
        let grid = FloorGrid::build(128, 4).unwrap();
        assert_eq!(grid.spacing(), 16);
        assert_eq!(grid.edge_count(), 4);
        assert_eq!(grid.points().nrows(), 36);
        for e in 0..4 {
            assert_eq!(grid.edge(e).unwrap().nrows(), 9);
        }
        assert!(grid.edge(4).is_none());
        assert!(grid.edge_points(usize::MAX).is_none());
    }

    #[test]
    fn test_edges_trace_closed_square() {
        let grid = FloorGrid::build(128, 4).unwrap();
        let e0 = grid.edge_points(0).unwrap();
        let e1 = grid.edge_points(1).unwrap();
        let e2 = grid.edge_points(2).unwrap();
        let e3 = grid.edge_points(3).unwrap();

        assert_eq!(e0[0], [-64, -64, FLOOR_Z_OFFSET]);
        assert_eq!(e0[8], [-64, 64, FLOOR_Z_OFFSET]);
        assert_eq!(e1[0], [-64, 64, FLOOR_Z_OFFSET]);
        assert_eq!(e1[8], [64, 64, FLOOR_Z_OFFSET]);
        assert_eq!(e2[8], [64, 64, FLOOR_Z_OFFSET]);
        assert_eq!(e3[0], [-64, -64, FLOOR_Z_OFFSET]);
        assert_eq!(e3[8], [64, -64, FLOOR_Z_OFFSET]);
        assert_eq!(e0[1][1] - e0[0][1], 16);
    }

    #[test]
    fn test_width_rounds_down() {
        let grid = FloorGrid::build(130, 4).unwrap();
        assert_eq!(grid.spacing(), 16);
        assert_eq!(grid.edge_points(2).unwrap()[0], [64, -64, FLOOR_Z_OFFSET]);
    }

    #[test]
    fn test_invalid_grid() {
        assert!(matches!(FloorGrid::build(128, 0), Err(SceneError::InvalidGrid(_))));
        assert!(matches!(FloorGrid::build(6, 4), Err(SceneError::InvalidGrid(_))));
        assert!(matches!(FloorGrid::build(-100, 4), Err(SceneError::InvalidGrid(_))));
    }
}
