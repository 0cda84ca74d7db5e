//! Measurement plans: one ordered point sequence across every area.
//!
//! A [`MeasurementPlan`] is what the hardware side walks, strictly in order,
//! one stage move per [`GridPoint`]. Composition is all-or-nothing: every area
//! is validated before the first point is generated, so a caller can never
//! receive a truncated plan.
//!
//! # Example
//!
//! ```rust
//! use sxm_cits::{compose, AreaParams, ScanFrame};
//!
//! let frame = ScanFrame::new(0.0, 0.0, 500.0, 0.0);
//! let areas = [AreaParams::new(10.0, 10.0, 5.0, 5.0, 2, 2)];
//! let plan = compose(&frame, &areas).unwrap();
//!
//! let xy: Vec<(f64, f64)> = plan.points().iter().map(|p| (p.x, p.y)).collect();
//! assert_eq!(xy, vec![(10.0, 10.0), (10.0, 15.0), (15.0, 15.0), (15.0, 10.0)]);
//! ```

use std::ops::Range;

use serde::Serialize;

use crate::area::{AreaParams, AreaSpec, StartDirection};
use crate::error::{CitsError, CitsResult};
use crate::frame::ScanFrame;
use crate::grid::SerpentineIter;

/// Margin trimmed off the scan range for full-frame CITS (0.4%).
pub const DEFAULT_SAFE_MARGIN: f64 = 0.004;

/// One measurement location in absolute stage coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    /// Index of the originating area in the operator's list.
    pub area_index: usize,
    /// Column index within the area.
    pub i: u32,
    /// Row index within the area.
    pub j: u32,
    /// Absolute stage X (nm).
    pub x: f64,
    /// Absolute stage Y (nm).
    pub y: f64,
}

/// The full ordered point sequence for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementPlan {
    frame: ScanFrame,
    areas: Vec<AreaSpec>,
    points: Vec<GridPoint>,
    total_points: usize,
}

impl MeasurementPlan {
    /// Frame the plan was built against.
    pub fn frame(&self) -> &ScanFrame {
        &self.frame
    }

    /// Areas in visit order.
    pub fn areas(&self) -> &[AreaSpec] {
        &self.areas
    }

    /// Points in emission order.
    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    /// `Σ nx * ny` over all areas.
    pub fn total_points(&self) -> usize {
        self.total_points
    }

    /// Iterate points in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, GridPoint> {
        self.points.iter()
    }

    /// Index range into [`points`](Self::points) for each area.
    pub fn area_ranges(&self) -> Vec<Range<usize>> {
        let mut start = 0;
        self.areas
            .iter()
            .map(|area| {
                let end = start + area.point_count();
                let range = start..end;
                start = end;
                range
            })
            .collect()
    }

    /// Points belonging to area `area_index`; empty if out of range.
    pub fn points_for_area(&self, area_index: usize) -> &[GridPoint] {
        self.area_ranges()
            .get(area_index)
            .map_or(&[][..], |range| &self.points[range.clone()])
    }

    /// Total stage travel from the first point to the last (nm).
    pub fn path_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum()
    }
}

impl<'a> IntoIterator for &'a MeasurementPlan {
    type Item = &'a GridPoint;
    type IntoIter = std::slice::Iter<'a, GridPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Validate every area, then compose them in order into one plan.
pub fn compose(frame: &ScanFrame, areas: &[AreaParams]) -> CitsResult<MeasurementPlan> {
    let specs = areas
        .iter()
        .map(|params| AreaSpec::new(*params))
        .collect::<CitsResult<Vec<_>>>()?;
    compose_specs(frame, specs)
}

/// Compose already-validated areas into one plan.
pub fn compose_specs(frame: &ScanFrame, areas: Vec<AreaSpec>) -> CitsResult<MeasurementPlan> {
    let total_points: usize = areas.iter().map(AreaSpec::point_count).sum();
    if areas.is_empty() || total_points == 0 {
        return Err(CitsError::EmptyPlan);
    }

    let mut points = Vec::with_capacity(total_points);
    for (area_index, area) in areas.iter().enumerate() {
        tracing::debug!(
            area_index,
            nx = area.nx(),
            ny = area.ny(),
            x_dev = area.x_dev(),
            y_dev = area.y_dev(),
            "Generating local CITS area"
        );
        points.extend(SerpentineIter::new(*area).map(|local| {
            let (x, y) = frame.to_absolute(local.local_x, local.local_y);
            GridPoint {
                area_index,
                i: local.i,
                j: local.j,
                x,
                y,
            }
        }));
    }

    tracing::info!(
        areas = areas.len(),
        total_points,
        angle = frame.angle,
        "Composed CITS measurement plan"
    );

    Ok(MeasurementPlan {
        frame: *frame,
        areas,
        points,
        total_points,
    })
}

/// Full-frame CITS grid: `nx * ny` points evenly spread over the scan window,
/// shrunk by `safe_margin` (a fraction of the range).
///
/// An axis with a single point sits on the center line.
pub fn standard_area(
    frame: &ScanFrame,
    nx: u32,
    ny: u32,
    direction: StartDirection,
    safe_margin: f64,
) -> CitsResult<AreaSpec> {
    let effective_range = frame.range * (1.0 - safe_margin);
    let (x_dev, dx) = axis_layout(effective_range, nx);
    let (y_dev, dy) = axis_layout(effective_range, ny);

    AreaSpec::new(AreaParams {
        x_dev,
        y_dev,
        dx,
        dy,
        nx,
        ny,
        start_direction: direction.as_i32(),
    })
}

fn axis_layout(effective_range: f64, count: u32) -> (f64, f64) {
    if count <= 1 {
        (0.0, effective_range)
    } else {
        (-effective_range / 2.0, effective_range / f64::from(count - 1))
    }
}

/// [`standard_area`] with the default margin, composed into a plan.
pub fn standard_plan(
    frame: &ScanFrame,
    nx: u32,
    ny: u32,
    direction: StartDirection,
) -> CitsResult<MeasurementPlan> {
    let area = standard_area(frame, nx, ny, direction, DEFAULT_SAFE_MARGIN)?;
    compose_specs(frame, vec![area])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn test_single_area_example() {
        let frame = ScanFrame::new(0.0, 0.0, 500.0, 0.0);
        let plan = compose(&frame, &[AreaParams::new(10.0, 10.0, 5.0, 5.0, 2, 2)]).unwrap();
        let xy: Vec<(f64, f64)> = plan.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(xy, vec![(10.0, 10.0), (10.0, 15.0), (15.0, 15.0), (15.0, 10.0)]);
        assert_eq!(plan.total_points(), 4);
    }

    #[test]
    fn test_rotated_example() {
        let frame = ScanFrame::new(0.0, 0.0, 500.0, 90.0);
        let plan = compose(&frame, &[AreaParams::new(10.0, 10.0, 5.0, 5.0, 2, 2)]).unwrap();
        let first = plan.points()[0];
        assert_close((first.x, first.y), (-10.0, 10.0));
        let last = plan.points()[3];
        assert_close((last.x, last.y), (-10.0, 15.0));
    }

    #[test]
    fn test_two_areas_tagged_in_order() {
        let frame = ScanFrame::new(100.0, -100.0, 500.0, 30.0);
        let areas = [
            AreaParams::new(0.0, 0.0, 1.0, 1.0, 2, 2),
            AreaParams::new(50.0, 50.0, 2.0, 2.0, 3, 1),
        ];
        let plan = compose(&frame, &areas).unwrap();

        assert_eq!(plan.total_points(), 7);
        assert_eq!(plan.points().len(), 7);
        assert!(plan.points()[..4].iter().all(|p| p.area_index == 0));
        assert!(plan.points()[4..].iter().all(|p| p.area_index == 1));
        assert_eq!(plan.area_ranges(), vec![0..4, 4..7]);
        assert_eq!(plan.points_for_area(1).len(), 3);
        assert!(plan.points_for_area(2).is_empty());
    }

    #[test]
    fn test_empty_plan_rejected() {
        let frame = ScanFrame::default();
        assert_eq!(compose(&frame, &[]).unwrap_err(), CitsError::EmptyPlan);
        assert_eq!(compose_specs(&frame, Vec::new()).unwrap_err(), CitsError::EmptyPlan);
    }

    #[test]
    fn test_any_invalid_area_fails_whole_plan() {
        let frame = ScanFrame::default();
        let areas = [
            AreaParams::new(0.0, 0.0, 1.0, 1.0, 2, 2),
            AreaParams::new(0.0, 0.0, 1.0, 1.0, 2, 2).with_start_direction(2),
        ];
        let err = compose(&frame, &areas).unwrap_err();
        assert_eq!(err.field(), Some("start_direction"));
    }

    #[test]
    fn test_path_length_of_serpentine() {
        let frame = ScanFrame::default();
        let plan = compose(&frame, &[AreaParams::new(0.0, 0.0, 1.0, 1.0, 3, 3)]).unwrap();
        // Two column sweeps of 2 per column, plus two single steps between columns.
        assert!((plan.path_length() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_standard_area_spans_margin() {
        let frame = ScanFrame::new(0.0, 0.0, 1000.0, 0.0);
        let area = standard_area(&frame, 5, 3, StartDirection::Up, DEFAULT_SAFE_MARGIN).unwrap();
        assert!((area.x_dev() + 498.0).abs() < 1e-9);
        assert!((area.dx() - 249.0).abs() < 1e-9);
        assert!((area.dy() - 498.0).abs() < 1e-9);
        let (x, y) = area.local_position(4, 2);
        assert_close((x, y), (498.0, 498.0));
    }

    #[test]
    fn test_standard_area_single_point_is_center() {
        let frame = ScanFrame::new(5.0, 5.0, 200.0, 45.0);
        let plan = standard_plan(&frame, 1, 1, StartDirection::Down).unwrap();
        let p = plan.points()[0];
        assert_close((p.x, p.y), (5.0, 5.0));
    }

    #[test]
    fn test_standard_plan_down_starts_at_top() {
        let frame = ScanFrame::new(0.0, 0.0, 1000.0, 0.0);
        let plan = standard_plan(&frame, 2, 2, StartDirection::Down).unwrap();
        let first = plan.points()[0];
        assert_eq!((first.i, first.j), (0, 1));
        assert!(first.y > 0.0 && first.x < 0.0);
    }

    #[test]
    #[traced_test]
    fn test_compose_logs_summary() {
        let frame = ScanFrame::default();
        compose(&frame, &[AreaParams::new(0.0, 0.0, 1.0, 1.0, 2, 2)]).unwrap();
        assert!(logs_contain("Composed CITS measurement plan"));
        assert!(logs_contain("Generating local CITS area"));
    }
}
