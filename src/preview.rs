//! Plot-ready preview geometry.
//!
//! The projector turns a frame and a plan into plain coordinates that any
//! plotting layer can draw: the rotated frame outline, two short axis
//! indicators and one marker per point. It is a pure function of its inputs,
//! cheap enough to rerun on every parameter edit.

use serde::Serialize;

use crate::automove::AutoMoveRoute;
use crate::frame::{rotate, ScanFrame};
use crate::plan::MeasurementPlan;

/// Axis indicator length as a fraction of the scan range.
pub const DEFAULT_AXIS_FRACTION: f64 = 1.0 / 3.0;

/// A point in plot space (same units as the stage).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl From<(f64, f64)> for PlotPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Which frame axis an indicator follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    /// The frame's rotated X direction.
    X,
    /// The frame's rotated Y direction.
    Y,
}

/// A segment from the frame center along one rotated axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisIndicator {
    /// Axis the segment follows.
    pub axis: Axis,
    /// Frame center.
    pub start: PlotPoint,
    /// Tip of the indicator.
    pub end: PlotPoint,
}

/// Corner flag on a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Corner {
    /// Local index `(0, 0)`.
    Start,
    /// Local index `(nx - 1, ny - 1)`.
    End,
}

/// One drawable point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointMarker {
    /// Originating area.
    pub area_index: usize,
    /// Colour slot; equal to `area_index`.
    pub hue_index: usize,
    /// Colour wheel angle for this area, see [`hue_degrees`].
    pub hue_degrees: f64,
    /// Column index within the area.
    pub i: u32,
    /// Row index within the area.
    pub j: u32,
    /// Plot X.
    pub x: f64,
    /// Plot Y.
    pub y: f64,
    /// Set on the `(0, 0)` and `(nx-1, ny-1)` points.
    pub corner: Option<Corner>,
}

/// Everything needed to draw a preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewGeometry {
    /// Frame rectangle: bottom-left, bottom-right, top-right, top-left.
    pub outline: [PlotPoint; 4],
    /// X then Y indicator.
    pub axes: [AxisIndicator; 2],
    /// One per plan point, in plan order.
    pub markers: Vec<PointMarker>,
    /// Sum of the plan's area sizes.
    pub total_points: usize,
}

/// Evenly spread hue for area `index` of `count`, in degrees `[0, 360)`.
pub fn hue_degrees(index: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    360.0 * (index % count) as f64 / count as f64
}

/// Corners of the frame rectangle in stage coordinates.
///
/// The X half extent is scaled by the aspect ratio; with the default ratio
/// of 1 the outline is a square of side `range`.
pub fn frame_outline(frame: &ScanFrame) -> [PlotPoint; 4] {
    let half_y = frame.range / 2.0;
    let half_x = half_y * frame.aspect_ratio;
    [(-half_x, -half_y), (half_x, -half_y), (half_x, half_y), (-half_x, half_y)]
        .map(|(x, y)| frame.to_absolute(x, y).into())
}

/// Axis indicators of length `range * fraction` from the frame center.
pub fn axis_indicators(frame: &ScanFrame, fraction: f64) -> [AxisIndicator; 2] {
    let length = frame.range * fraction;
    let start = PlotPoint {
        x: frame.center_x,
        y: frame.center_y,
    };
    let tip = |dx: f64, dy: f64| {
        let (rx, ry) = rotate(dx, dy, frame.angle);
        PlotPoint {
            x: frame.center_x + rx,
            y: frame.center_y + ry,
        }
    };
    [
        AxisIndicator {
            axis: Axis::X,
            start,
            end: tip(length, 0.0),
        },
        AxisIndicator {
            axis: Axis::Y,
            start,
            end: tip(0.0, length),
        },
    ]
}

/// Project a frame and plan with the default axis length.
pub fn project(frame: &ScanFrame, plan: &MeasurementPlan) -> PreviewGeometry {
    project_with(frame, plan, DEFAULT_AXIS_FRACTION)
}

/// Project a frame and plan, with axis indicators of `axis_fraction * range`.
///
/// `frame` must be the frame the plan was composed against; the markers
/// carry coordinates already transformed by it.
pub fn project_with(frame: &ScanFrame, plan: &MeasurementPlan, axis_fraction: f64) -> PreviewGeometry {
    debug_assert_eq!(frame, plan.frame(), "preview frame differs from the plan's frame");
    let areas = plan.areas();
    let area_count = areas.len();

    let markers = plan
        .iter()
        .map(|point| {
            let corner = areas.get(point.area_index).and_then(|area| {
                if point.i == 0 && point.j == 0 {
                    Some(Corner::Start)
                } else if point.i == area.nx() - 1 && point.j == area.ny() - 1 {
                    Some(Corner::End)
                } else {
                    None
                }
            });
            PointMarker {
                area_index: point.area_index,
                hue_index: point.area_index,
                hue_degrees: hue_degrees(point.area_index, area_count),
                i: point.i,
                j: point.j,
                x: point.x,
                y: point.y,
                corner,
            }
        })
        .collect();

    PreviewGeometry {
        outline: frame_outline(frame),
        axes: axis_indicators(frame, axis_fraction),
        markers,
        total_points: plan.total_points(),
    }
}

/// Polyline of an auto-move route with its endpoints flagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePreview {
    /// Scan centers in visit order.
    pub path: Vec<PlotPoint>,
    /// First center.
    pub start: Option<PlotPoint>,
    /// Last center.
    pub end: Option<PlotPoint>,
    /// Frame outline at every visited center.
    pub outlines: Vec<[PlotPoint; 4]>,
}

/// Preview of a route: the path plus the scan window at each stop.
pub fn project_route(frame: &ScanFrame, route: &AutoMoveRoute) -> RoutePreview {
    let path: Vec<PlotPoint> = route.centers.iter().copied().map(PlotPoint::from).collect();
    let outlines = route
        .centers
        .iter()
        .map(|&(center_x, center_y)| {
            frame_outline(&ScanFrame {
                center_x,
                center_y,
                ..*frame
            })
        })
        .collect();

    RoutePreview {
        start: path.first().copied(),
        end: path.last().copied(),
        path,
        outlines,
    }
}
