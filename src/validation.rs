//! Pre-flight checks on area descriptors.
//!
//! [`validate`] is the gate every [`AreaSpec`] passes through. It is also meant
//! to be called directly on operator input so mistakes surface before a run
//! is committed. Checks run in a fixed order and the first violation wins,
//! which keeps error messages reproducible.
//!
//! [`check_within_frame`] is advisory: it reports areas whose corners leave
//! the scan window, without failing composition.

use serde::Serialize;

use crate::area::{AreaParams, AreaSpec};
use crate::error::{CitsError, CitsResult};
use crate::frame::ScanFrame;

/// Maximum points along either axis of a single area.
pub const MAX_POINTS_PER_AXIS: u32 = 512;
/// Maximum points in a single area.
pub const MAX_AREA_POINTS: usize = (MAX_POINTS_PER_AXIS as usize) * (MAX_POINTS_PER_AXIS as usize);

/// Validate an area descriptor.
///
/// Order: `dx > 0`, `dy > 0`, `nx` in range, `ny` in range, start direction,
/// then finite offsets.
pub fn validate(params: &AreaParams) -> CitsResult<()> {
    check_positive("dx", params.dx, "dx > 0")?;
    check_positive("dy", params.dy, "dy > 0")?;
    check_count("nx", params.nx, "1 <= nx <= 512")?;
    check_count("ny", params.ny, "1 <= ny <= 512")?;

    if params.start_direction != 1 && params.start_direction != -1 {
        return Err(CitsError::InvalidArea {
            field: "start_direction",
            value: params.start_direction.to_string(),
            constraint: "start_direction in {+1, -1}",
        });
    }

    check_finite("x_dev", params.x_dev)?;
    check_finite("y_dev", params.y_dev)
}

/// Validate a list of descriptors, reporting the first failure with its index.
pub fn validate_all(areas: &[AreaParams]) -> Result<(), (usize, CitsError)> {
    areas
        .iter()
        .enumerate()
        .try_for_each(|(index, params)| validate(params).map_err(|e| (index, e)))
}

fn check_positive(field: &'static str, value: f64, constraint: &'static str) -> CitsResult<()> {
    // NaN compares false, so it fails here as well.
    if !(value.is_finite() && value > 0.0) {
        return Err(CitsError::InvalidArea {
            field,
            value: value.to_string(),
            constraint,
        });
    }
    Ok(())
}

fn check_count(field: &'static str, value: u32, constraint: &'static str) -> CitsResult<()> {
    if !(1..=MAX_POINTS_PER_AXIS).contains(&value) {
        return Err(CitsError::InvalidArea {
            field,
            value: value.to_string(),
            constraint,
        });
    }
    Ok(())
}

fn check_finite(field: &'static str, value: f64) -> CitsResult<()> {
    if !value.is_finite() {
        return Err(CitsError::InvalidArea {
            field,
            value: value.to_string(),
            constraint: "finite offset",
        });
    }
    Ok(())
}

/// Result of checking one area against the scan window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Containment {
    /// Position of the area in the operator's list.
    pub area_index: usize,
    /// True when every corner lies inside the window.
    pub inside: bool,
    /// Absolute coordinates of the corners that fall outside.
    pub outside_corners: Vec<(f64, f64)>,
}

/// Check that the four corners of `area`, after the frame transform, lie
/// inside the axis-aligned square `center ± range / 2`.
pub fn check_within_frame(frame: &ScanFrame, area_index: usize, area: &AreaSpec) -> Containment {
    let half = frame.range / 2.0;
    let (min_x, max_x) = (frame.center_x - half, frame.center_x + half);
    let (min_y, max_y) = (frame.center_y - half, frame.center_y + half);

    let outside_corners: Vec<(f64, f64)> = area
        .local_corners()
        .iter()
        .map(|&(lx, ly)| frame.to_absolute(lx, ly))
        .filter(|&(x, y)| x < min_x || x > max_x || y < min_y || y > max_y)
        .collect();

    if !outside_corners.is_empty() {
        tracing::warn!(
            area_index,
            outside = outside_corners.len(),
            "Local CITS area extends beyond the scan frame"
        );
    }

    Containment {
        area_index,
        inside: outside_corners.is_empty(),
        outside_corners,
    }
}

/// [`check_within_frame`] for every area, in order.
pub fn check_all_within_frame(frame: &ScanFrame, areas: &[AreaSpec]) -> Vec<Containment> {
    areas
        .iter()
        .enumerate()
        .map(|(index, area)| check_within_frame(frame, index, area))
        .collect()
}

/// Outcome of checking one operator-entered area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaReport {
    /// Position in the operator's list.
    pub area_index: usize,
    /// First invariant violation, if any.
    pub error: Option<String>,
    /// Frame containment, for areas that passed validation.
    pub containment: Option<Containment>,
}

/// Pre-flight report over a frame and a list of areas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Frame range violation, if any.
    pub frame_error: Option<String>,
    /// One entry per area, in order.
    pub areas: Vec<AreaReport>,
    /// True when the frame and every area passed. Containment is advisory
    /// and does not affect this flag.
    pub valid: bool,
}

/// Check the frame and every area without stopping at the first failure.
pub fn report(frame: &ScanFrame, areas: &[AreaParams]) -> ValidationReport {
    let frame_error = frame.check_ranges().err().map(|e| e.to_string());
    let areas: Vec<AreaReport> = areas
        .iter()
        .enumerate()
        .map(|(area_index, params)| match AreaSpec::new(*params) {
            Ok(area) => AreaReport {
                area_index,
                error: None,
                containment: Some(check_within_frame(frame, area_index, &area)),
            },
            Err(e) => AreaReport {
                area_index,
                error: Some(e.to_string()),
                containment: None,
            },
        })
        .collect();

    let valid = frame_error.is_none() && areas.iter().all(|a| a.error.is_none());
    ValidationReport {
        frame_error,
        areas,
        valid,
    }
}
