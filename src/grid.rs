//! Serpentine grid generation for a single area.
//!
//! Columns are visited in increasing `i`. Within a column `j` runs either
//! upwards or downwards, alternating from one column to the next so the stage
//! never has to fly back across the area. [`StartDirection`] only decides which
//! column parity starts ascending.
//!
//! ```text
//!  Up:    j ^  2 . 3   . 8        Down:  j ^  0 . 5   . 6
//!           |  1 . 4   . 7                 |  1 . 4   . 7
//!           |  0 . 5   . 6                 |  2 . 3   . 8
//!           +------------> i               +------------> i
//! ```

use serde::Serialize;

use crate::area::{AreaParams, AreaSpec};
use crate::error::CitsResult;

/// A grid point in area-local coordinates, before the frame transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalPoint {
    /// Column index, `0 <= i < nx`.
    pub i: u32,
    /// Row index, `0 <= j < ny`.
    pub j: u32,
    /// `x_dev + i * dx`.
    pub local_x: f64,
    /// `y_dev + j * dy`.
    pub local_y: f64,
}

/// Lazy serpentine walk over an area.
#[derive(Debug, Clone)]
pub struct SerpentineIter {
    area: AreaSpec,
    // Next column to emit from; `nx` once exhausted.
    column: u32,
    // Position within the current column, counted in emission order.
    step: u32,
    remaining: usize,
}

impl SerpentineIter {
    /// Start a walk over `area`.
    pub fn new(area: AreaSpec) -> Self {
        Self {
            area,
            column: 0,
            step: 0,
            remaining: area.point_count(),
        }
    }
}

impl Iterator for SerpentineIter {
    type Item = LocalPoint;

    fn next(&mut self) -> Option<LocalPoint> {
        if self.remaining == 0 {
            return None;
        }

        let i = self.column;
        let ny = self.area.ny();
        let j = if self.area.start_direction().ascending_at(i) {
            self.step
        } else {
            ny - 1 - self.step
        };

        self.step += 1;
        if self.step == ny {
            self.step = 0;
            self.column += 1;
        }
        self.remaining -= 1;

        let (local_x, local_y) = self.area.local_position(i, j);
        Some(LocalPoint {
            i,
            j,
            local_x,
            local_y,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SerpentineIter {}

impl std::iter::FusedIterator for SerpentineIter {}

/// All points of `area` in serpentine order.
pub fn generate(area: &AreaSpec) -> Vec<LocalPoint> {
    SerpentineIter::new(*area).collect()
}

/// Validate raw parameters, then generate. Nothing is produced on failure.
pub fn generate_params(params: &AreaParams) -> CitsResult<Vec<LocalPoint>> {
    let area = AreaSpec::new(*params)?;
    Ok(generate(&area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn area(nx: u32, ny: u32, direction: i32) -> AreaSpec {
        AreaSpec::new(AreaParams::new(10.0, 10.0, 5.0, 5.0, nx, ny).with_start_direction(direction))
            .unwrap()
    }

    #[test]
    fn test_two_by_two_example() {
        let coords: Vec<(f64, f64)> = generate(&area(2, 2, 1))
            .iter()
            .map(|p| (p.local_x, p.local_y))
            .collect();
        assert_eq!(coords, vec![(10.0, 10.0), (10.0, 15.0), (15.0, 15.0), (15.0, 10.0)]);
    }

    #[test]
    fn test_down_start_flips_parity() {
        let indices: Vec<(u32, u32)> = generate(&area(3, 3, -1)).iter().map(|p| (p.i, p.j)).collect();
        assert_eq!(
            indices,
            vec![
                (0, 2),
                (0, 1),
                (0, 0),
                (1, 0),
                (1, 1),
                (1, 2),
                (2, 2),
                (2, 1),
                (2, 0)
            ]
        );
    }

    #[test]
    fn test_every_index_exactly_once() {
        for &(nx, ny) in &[(1, 1), (1, 7), (7, 1), (4, 5), (17, 3)] {
            for &direction in &[1, -1] {
                let points = generate(&area(nx, ny, direction));
                assert_eq!(points.len(), (nx * ny) as usize);

                let unique: HashSet<(u32, u32)> = points.iter().map(|p| (p.i, p.j)).collect();
                assert_eq!(unique.len(), points.len());
                assert!(points.iter().all(|p| p.i < nx && p.j < ny));
            }
        }
    }

    #[test]
    fn test_columns_monotonic_and_alternating() {
        for &direction in &[1, -1] {
            let points = generate(&area(6, 4, direction));
            let mut previous_ascending = None;
            for column in points.chunks(4) {
                assert!(column.iter().all(|p| p.i == column[0].i));
                let ascending = column.windows(2).all(|w| w[1].j == w[0].j + 1);
                let descending = column.windows(2).all(|w| w[0].j == w[1].j + 1);
                assert!(ascending ^ descending);
                if let Some(prev) = previous_ascending {
                    assert_ne!(prev, ascending);
                }
                previous_ascending = Some(ascending);
            }
        }
    }

    #[test]
    fn test_iterator_size_hint() {
        let mut iter = SerpentineIter::new(area(3, 2, 1));
        assert_eq!(iter.len(), 6);
        iter.next();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.by_ref().count(), 5);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_generate_params_rejects_before_emitting() {
        let err = generate_params(&AreaParams::new(0.0, 0.0, 0.0, 1.0, 2, 2)).unwrap_err();
        assert_eq!(err.field(), Some("dx"));
    }
}
