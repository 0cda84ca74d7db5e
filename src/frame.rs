//! Scan frame geometry and the frame transform.
//!
//! A [`ScanFrame`] is the per-run snapshot of the microscope's scan window:
//! where it is centered on the stage, how large it is, and how far it is
//! rotated. Local-area offsets are expressed relative to that center in the
//! rotated frame; [`to_absolute`] and [`to_relative`] convert between the two.
//!
//! Angles are in degrees and positive angles rotate counter-clockwise. The
//! rotation lives in [`rotate`] alone, so a driver reporting the opposite
//! handedness only has to negate the angle at the boundary.

use serde::{Deserialize, Serialize};

use crate::error::{CitsError, CitsResult};

/// Stage travel limit on X and Y in nanometers.
pub const STAGE_LIMIT_NM: f64 = 8000.0;
/// Smallest and largest scan range the instrument accepts, in nanometers.
pub const RANGE_LIMITS_NM: (f64, f64) = (0.1, 5000.0);
/// Scan angle limits in degrees.
pub const ANGLE_LIMITS_DEG: (f64, f64) = (-180.0, 180.0);
/// Aspect ratio limits.
pub const ASPECT_RATIO_LIMITS: (f64, f64) = (0.1, 10.0);

/// Immutable snapshot of the scan window for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanFrame {
    /// Scan center on the stage, X (nm).
    pub center_x: f64,
    /// Scan center on the stage, Y (nm).
    pub center_y: f64,
    /// Side length of the scan square (nm).
    pub range: f64,
    /// Rotation in degrees, counter-clockwise positive.
    pub angle: f64,
    /// Scan lines per image. Informational for plan building; drives the
    /// scan-line distribution.
    #[serde(default = "default_total_lines")]
    pub total_lines: u32,
    /// Fast-axis to slow-axis extent ratio.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f64,
}

fn default_total_lines() -> u32 {
    500
}

fn default_aspect_ratio() -> f64 {
    1.0
}

impl Default for ScanFrame {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            range: 500.0,
            angle: 0.0,
            total_lines: default_total_lines(),
            aspect_ratio: default_aspect_ratio(),
        }
    }
}

impl ScanFrame {
    /// Frame with the given center, range and angle, default line count and
    /// aspect ratio.
    pub fn new(center_x: f64, center_y: f64, range: f64, angle: f64) -> Self {
        Self {
            center_x,
            center_y,
            range,
            angle,
            ..Self::default()
        }
    }

    /// Set the scan line count.
    pub fn with_total_lines(mut self, total_lines: u32) -> Self {
        self.total_lines = total_lines;
        self
    }

    /// Set the aspect ratio.
    pub fn with_aspect_ratio(mut self, aspect_ratio: f64) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// See [`to_absolute`].
    pub fn to_absolute(&self, x_dev: f64, y_dev: f64) -> (f64, f64) {
        to_absolute(self, x_dev, y_dev)
    }

    /// See [`to_relative`].
    pub fn to_relative(&self, x: f64, y: f64) -> (f64, f64) {
        to_relative(self, x, y)
    }

    /// Check every parameter against the instrument's documented ranges.
    ///
    /// Fields are checked in declaration order and the first violation is
    /// returned.
    pub fn check_ranges(&self) -> CitsResult<()> {
        check_range(
            "center_x",
            self.center_x,
            -STAGE_LIMIT_NM,
            STAGE_LIMIT_NM,
            "-8000 <= center_x <= 8000",
        )?;
        check_range(
            "center_y",
            self.center_y,
            -STAGE_LIMIT_NM,
            STAGE_LIMIT_NM,
            "-8000 <= center_y <= 8000",
        )?;
        check_range(
            "range",
            self.range,
            RANGE_LIMITS_NM.0,
            RANGE_LIMITS_NM.1,
            "0.1 <= range <= 5000",
        )?;
        check_range(
            "angle",
            self.angle,
            ANGLE_LIMITS_DEG.0,
            ANGLE_LIMITS_DEG.1,
            "-180 <= angle <= 180",
        )?;
        if self.total_lines == 0 {
            return Err(CitsError::InvalidFrame {
                field: "total_lines",
                value: "0".to_string(),
                constraint: "total_lines >= 1",
            });
        }
        check_range(
            "aspect_ratio",
            self.aspect_ratio,
            ASPECT_RATIO_LIMITS.0,
            ASPECT_RATIO_LIMITS.1,
            "0.1 <= aspect_ratio <= 10",
        )
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
    constraint: &'static str,
) -> CitsResult<()> {
    // NaN fails both comparisons, so it is rejected here too.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(CitsError::InvalidFrame {
            field,
            value: value.to_string(),
            constraint,
        })
    }
}

/// Rotate `(x, y)` about the origin by `angle_deg`, counter-clockwise.
pub fn rotate(x: f64, y: f64, angle_deg: f64) -> (f64, f64) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Convert an offset from the scan center into absolute stage coordinates.
pub fn to_absolute(frame: &ScanFrame, x_dev: f64, y_dev: f64) -> (f64, f64) {
    let (x, y) = rotate(x_dev, y_dev, frame.angle);
    (x + frame.center_x, y + frame.center_y)
}

/// Convert absolute stage coordinates back into an offset from the scan
/// center, in the frame's rotated axes. Exact inverse of [`to_absolute`].
pub fn to_relative(frame: &ScanFrame, x: f64, y: f64) -> (f64, f64) {
    rotate(x - frame.center_x, y - frame.center_y, -frame.angle)
}

/// Unit vectors of the slow and fast scan axes for a given scan angle.
///
/// The slow axis makes `angle_deg` with +X; the fast axis is the slow axis
/// rotated a further 90°.
pub fn scan_axes(angle_deg: f64) -> ((f64, f64), (f64, f64)) {
    (rotate(1.0, 0.0, angle_deg), rotate(0.0, 1.0, angle_deg))
}
