//! Scan-line distribution.
//!
//! While a CITS run is in progress the microscope keeps imaging. Between
//! spectroscopy rows the controller advances the scan by a number of lines,
//! so the spectra land on the right part of the image. These functions work
//! out those line counts.

use std::collections::BTreeSet;

use crate::error::{CitsError, CitsResult};
use crate::frame::ScanFrame;
use crate::plan::MeasurementPlan;

/// Split `total_lines` for a full-frame grid of `ny` rows.
///
/// The result is `[edge, seg_1, .., seg_{ny-1}, edge]` where
/// `edge = floor(total_lines * safe_margin / 2)` and the segments share the
/// remaining lines as evenly as whole numbers allow (cumulative rounding,
/// halves rounded to even). The entries always sum to `total_lines`.
pub fn standard_distribution(total_lines: u32, ny: u32, safe_margin: f64) -> CitsResult<Vec<u32>> {
    if total_lines == 0 {
        return Err(CitsError::InvalidScanlines(
            "total_lines must be at least 1".to_string(),
        ));
    }
    if ny < 2 {
        return Err(CitsError::InvalidScanlines(format!(
            "need at least 2 rows to distribute scan lines, got {ny}"
        )));
    }
    if !(0.0..1.0).contains(&safe_margin) {
        return Err(CitsError::InvalidScanlines(format!(
            "safe_margin {safe_margin} must be in [0, 1)"
        )));
    }

    let edge = (f64::from(total_lines) * safe_margin / 2.0).floor() as u32;
    let middle = total_lines - 2 * edge;
    let segments = ny - 1;
    let ideal = f64::from(middle) / f64::from(segments);

    let mut lines = Vec::with_capacity(ny as usize + 1);
    lines.push(edge);
    let mut accumulated = 0u32;
    for k in 1..=segments {
        let target = if k == segments {
            middle
        } else {
            (f64::from(k) * ideal).round_ties_even() as u32
        };
        lines.push(target - accumulated);
        accumulated = target;
    }
    lines.push(edge);

    Ok(lines)
}

/// Line runs for a plan's points.
///
/// The frame height is cut into `total_lines` bands from the bottom edge.
/// Each band that holds a point becomes a run of one line, and each stretch
/// of empty bands between them becomes a single run. Points are placed in
/// the frame's own axes, so rotation is accounted for. The runs sum to
/// `frame.total_lines`.
pub fn local_distribution(plan: &MeasurementPlan) -> Vec<u32> {
    let frame = plan.frame();
    let total = frame.total_lines;
    let occupied = occupied_bands(frame, plan);

    let mut runs = Vec::with_capacity(occupied.len() * 2 + 1);
    let mut next_band = 0u32;
    for &band in &occupied {
        if band > next_band {
            runs.push(band - next_band);
        }
        runs.push(1);
        next_band = band + 1;
    }
    if total > next_band {
        runs.push(total - next_band);
    }

    tracing::debug!(
        runs = runs.len(),
        occupied = occupied.len(),
        total_lines = total,
        "Computed local scan-line distribution"
    );
    runs
}

/// Sorted indices of the bands holding at least one point. Memory is bounded
/// by the plan's point count, not by `total_lines`.
fn occupied_bands(frame: &ScanFrame, plan: &MeasurementPlan) -> BTreeSet<u32> {
    let mut occupied = BTreeSet::new();
    let total = frame.total_lines;
    if total == 0 || !(frame.range.is_finite() && frame.range > 0.0) {
        return occupied;
    }

    let half = frame.range / 2.0;
    let spacing = frame.range / f64::from(total);
    for point in plan {
        let (_, rel_y) = frame.to_relative(point.x, point.y);
        if rel_y < -half || rel_y > half {
            continue;
        }
        // Bands are (lo, hi]; the bottom edge belongs to band 0.
        let band = ((rel_y + half) / spacing).ceil() as u32;
        occupied.insert(band.saturating_sub(1).min(total - 1));
    }
    occupied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::AreaParams;
    use crate::plan::compose;

    #[test]
    fn test_standard_known_split() {
        // Cumulative targets 124.5, 249, 373.5, 498 round half to even.
        assert_eq!(
            standard_distribution(500, 5, 0.004).unwrap(),
            vec![1, 124, 125, 124, 125, 1]
        );
    }

    #[test]
    fn test_standard_ties_round_to_even() {
        // 10 lines over 4 segments: targets 2.5, 5, 7.5 become 2, 5, 8.
        assert_eq!(standard_distribution(10, 5, 0.0).unwrap(), vec![0, 2, 3, 3, 2, 0]);
        // 6 lines over 4 segments: targets 1.5, 3, 4.5 become 2, 3, 4.
        assert_eq!(standard_distribution(6, 5, 0.0).unwrap(), vec![0, 2, 1, 1, 2, 0]);
    }

    #[test]
    fn test_standard_sums_to_total() {
        for &total in &[1u32, 7, 256, 500, 1024] {
            for &ny in &[2u32, 3, 9, 64, 512] {
                for &margin in &[0.0, 0.004, 0.02, 0.5] {
                    let lines = standard_distribution(total, ny, margin).unwrap();
                    assert_eq!(lines.len(), ny as usize + 1);
                    assert_eq!(lines.iter().sum::<u32>(), total, "{total} {ny} {margin}");
                }
            }
        }
    }

    #[test]
    fn test_standard_rejects_bad_input() {
        assert!(standard_distribution(500, 1, 0.004).is_err());
        assert!(standard_distribution(0, 5, 0.004).is_err());
        assert!(standard_distribution(500, 5, 1.0).is_err());
    }

    #[test]
    fn test_local_distribution() {
        // 100nm frame, 10 lines: bands of 10nm starting at y = -50.
        let frame = ScanFrame::new(0.0, 0.0, 100.0, 0.0).with_total_lines(10);
        // Rows at y = -25 (band 2) and y = 15 (band 6).
        let plan = compose(&frame, &[AreaParams::new(0.0, -25.0, 5.0, 40.0, 2, 2)]).unwrap();

        let runs = local_distribution(&plan);
        assert_eq!(runs, vec![2, 1, 3, 1, 3]);
        assert_eq!(runs.iter().sum::<u32>(), 10);
    }

    #[test]
    fn test_local_distribution_edges_and_outside() {
        let frame = ScanFrame::new(0.0, 0.0, 100.0, 0.0).with_total_lines(4);
        let plan = compose(
            &frame,
            &[
                AreaParams::new(0.0, -50.0, 1.0, 100.0, 1, 2),
                AreaParams::new(0.0, 80.0, 1.0, 1.0, 1, 1),
            ],
        )
        .unwrap();
        // Bottom edge lands in the first band, top edge in the last; y=80 is ignored.
        assert_eq!(local_distribution(&plan), vec![1, 2, 1]);
    }

    #[test]
    fn test_local_distribution_uses_frame_axes() {
        // Rotated a quarter turn, the area's Y rows become stage X offsets.
        let frame = ScanFrame::new(0.0, 0.0, 100.0, 90.0).with_total_lines(10);
        let plan = compose(&frame, &[AreaParams::new(0.0, -25.0, 5.0, 40.0, 2, 2)]).unwrap();
        assert_eq!(local_distribution(&plan), vec![2, 1, 3, 1, 3]);
    }

    #[test]
    fn test_local_distribution_huge_line_count() {
        let frame = ScanFrame::new(0.0, 0.0, 100.0, 0.0).with_total_lines(u32::MAX);
        let plan = compose(&frame, &[AreaParams::new(0.0, 0.0, 1.0, 1.0, 1, 1)]).unwrap();

        let runs = local_distribution(&plan);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1], 1);
        assert_eq!(runs.iter().map(|&r| u64::from(r)).sum::<u64>(), u64::from(u32::MAX));
    }
}
